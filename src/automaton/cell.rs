//! Cell representation and the deterministic colour policy

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Cell type given to newly born cells and to live cells of generated patterns
pub const LIVE_CELL_TYPE: u32 = 1;

/// Colours handed out on birth, indexed by the grid's preset id (wrapping)
pub const PRESET_COLOURS: [u32; 6] = [
    0xff0000, // red
    0x2ecc71, // green
    0xdc7633, // brown
    0x3498db, // blue
    0xf1c40f, // yellow
    0x9b59b6, // purple
];

/// Largest colour value, `0xRRGGBB`
pub const MAX_COLOUR: u32 = 0xff_ffff;

/// Mapping from cell type to display colour
pub type Palette = BTreeMap<u32, u32>;

/// A single lattice cell. `cell_type == 0` is dead; the colour never affects simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: u32,
    pub colour: u32,
}

impl Cell {
    pub const DEAD: Cell = Cell { cell_type: 0, colour: 0 };

    pub fn new(cell_type: u32, colour: u32) -> Self {
        Self { cell_type, colour }
    }

    /// A live cell of the default type with the given colour
    pub fn alive(colour: u32) -> Self {
        Self::new(LIVE_CELL_TYPE, colour)
    }

    #[inline]
    pub fn is_alive(&self) -> bool {
        self.cell_type > 0
    }

    /// The same cell, or [`Cell::DEAD`] for any dead cell
    pub fn normalised(self) -> Self {
        if self.is_alive() {
            self
        } else {
            Self::DEAD
        }
    }
}

/// Reject colours outside 24-bit RGB
pub fn check_colour(colour: u32) -> Result<u32> {
    if colour > MAX_COLOUR {
        return Err(EngineError::Validation(format!(
            "colour {:#x} is outside the RGB range 0x0..=0xffffff",
            colour
        )));
    }
    Ok(colour)
}

/// Colour of a cell born under the given preset id.
///
/// Pure function of the preset id so that stepping stays reproducible.
pub fn birth_colour(predefined_update: u32) -> u32 {
    PRESET_COLOURS[predefined_update as usize % PRESET_COLOURS.len()]
}

/// Resolve the colour of `cell_type`, falling back to the preset colour for live types
pub fn resolve_colour(palette: &Palette, cell_type: u32, predefined_update: u32) -> u32 {
    match palette.get(&cell_type) {
        Some(&colour) => colour,
        None if cell_type == 0 => 0,
        None => birth_colour(predefined_update),
    }
}
