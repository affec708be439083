//! Neighbor counting for the two supported topologies

use super::Grid;
use crate::error::{EngineError, Result};
use itertools::iproduct;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

pub type Offset = (isize, isize, isize);

const VON_NEUMANN_OFFSETS: [Offset; 6] = [
    (-1, 0, 0),
    (1, 0, 0),
    (0, -1, 0),
    (0, 1, 0),
    (0, 0, -1),
    (0, 0, 1),
];

/// Neighborhood topology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Neighborhood {
    /// The 26 cells sharing a face, edge or corner
    Moore,
    /// The 6 cells sharing a face
    VonNeumann,
}

impl Neighborhood {
    pub fn max_neighbors(self) -> u8 {
        match self {
            Neighborhood::Moore => 26,
            Neighborhood::VonNeumann => 6,
        }
    }

    /// Rule-string code. `N` is Moore and `M` is Von Neumann.
    pub fn code(self) -> char {
        match self {
            Neighborhood::Moore => 'N',
            Neighborhood::VonNeumann => 'M',
        }
    }

    /// Case-insensitive inverse of [`Neighborhood::code`]
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" | "n" => Some(Neighborhood::Moore),
            "M" | "m" => Some(Neighborhood::VonNeumann),
            _ => None,
        }
    }

    pub fn offsets(self) -> &'static [Offset] {
        match self {
            Neighborhood::Moore => moore_offsets(),
            Neighborhood::VonNeumann => &VON_NEUMANN_OFFSETS,
        }
    }
}

impl fmt::Display for Neighborhood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Neighborhood::Moore => write!(f, "Moore"),
            Neighborhood::VonNeumann => write!(f, "Von Neumann"),
        }
    }
}

fn moore_offsets() -> &'static [Offset] {
    static MOORE: OnceLock<Vec<Offset>> = OnceLock::new();
    MOORE.get_or_init(|| {
        iproduct!(-1..=1isize, -1..=1isize, -1..=1isize)
            .filter(|&offset| offset != (0, 0, 0))
            .collect()
    })
}

/// Count live neighbors of (x, y, z).
///
/// Offsets that land outside the lattice count as dead; there is no wraparound.
pub fn count_live_neighbors(
    grid: &Grid,
    x: usize,
    y: usize,
    z: usize,
    topology: Neighborhood,
) -> Result<u8> {
    if !grid.contains(x, y, z) {
        return Err(EngineError::OutOfRange {
            x,
            y,
            z,
            size: grid.size(),
        });
    }
    Ok(count_unchecked(grid, x, y, z, topology))
}

/// Same as [`count_live_neighbors`] for coordinates already known to be in range
#[inline]
pub(crate) fn count_unchecked(grid: &Grid, x: usize, y: usize, z: usize, topology: Neighborhood) -> u8 {
    let (x, y, z) = (x as isize, y as isize, z as isize);
    topology
        .offsets()
        .iter()
        .filter(|(dx, dy, dz)| grid.is_live_at(x + dx, y + dy, z + dz))
        .count() as u8
}
