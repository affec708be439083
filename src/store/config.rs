//! Persisted grid configuration record

use crate::automaton::{check_colour, Palette};
use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};

const MAX_NAME_LEN: usize = 128;

/// A named, persisted description of a grid.
///
/// `cells` holds cell types nested x → y → z; when absent the grid is
/// generated at access time instead of replayed. `cell_colours` is only
/// written when one cell type appears in more than one colour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub name: String,
    pub size: usize,
    #[serde(default)]
    pub predefined_update: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cells: Option<Vec<Vec<Vec<u32>>>>,
    #[serde(default, skip_serializing_if = "Palette::is_empty")]
    pub colours: Palette,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cell_colours: Option<Vec<Vec<Vec<u32>>>>,
}

impl GridConfig {
    /// A configuration whose grid is generated when it is accessed
    pub fn generated(name: impl Into<String>, size: usize, predefined_update: u32) -> Self {
        Self {
            name: name.into(),
            size,
            predefined_update,
            cells: None,
            colours: Palette::new(),
            cell_colours: None,
        }
    }

    /// Check the name, the size, colour ranges and, when present, the cell dimensions
    pub fn validate(&self) -> Result<()> {
        validate_name(&self.name)?;
        if self.size == 0 {
            return Err(EngineError::InvalidSize(self.size));
        }
        for &colour in self.colours.values() {
            check_colour(colour)?;
        }

        if let Some(cells) = &self.cells {
            self.check_cube("cells", cells)?;
        }
        if let Some(colours) = &self.cell_colours {
            if self.cells.is_none() {
                return Err(EngineError::InvalidDimension(format!(
                    "'{}' has per-cell colours but no cells",
                    self.name
                )));
            }
            self.check_cube("cell colours", colours)?;
            for &colour in colours.iter().flatten().flatten() {
                check_colour(colour)?;
            }
        }
        Ok(())
    }

    fn check_cube(&self, what: &str, cube: &[Vec<Vec<u32>>]) -> Result<()> {
        let n = self.size;
        let consistent = cube.len() == n
            && cube
                .iter()
                .all(|plane| plane.len() == n && plane.iter().all(|row| row.len() == n));
        if !consistent {
            return Err(EngineError::InvalidDimension(format!(
                "{} of '{}' are not {}x{}x{}",
                what, self.name, n, n, n
            )));
        }
        Ok(())
    }
}

/// Names are store keys and file stems: ASCII letters, digits, `_`, `-` and `.`
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EngineError::Validation("name cannot be empty".to_string()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(EngineError::Validation(format!(
            "name is {} characters long, maximum is {}",
            name.len(),
            MAX_NAME_LEN
        )));
    }
    if name.starts_with('.') {
        return Err(EngineError::Validation(format!("name '{}' cannot start with '.'", name)));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
    {
        return Err(EngineError::Validation(format!(
            "name '{}' contains invalid character '{}'",
            name, bad
        )));
    }
    Ok(())
}
