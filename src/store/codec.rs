//! Snapshot encoding and strict decoding

use super::config::validate_name;
use super::GridConfig;
use crate::automaton::{cell_count, check_colour, Cell, Grid, Palette, Pattern};
use crate::error::{EngineError, Result};
use serde::Deserialize;
use std::path::Path;

/// Serialize a grid into a named configuration holding the full cell cube.
///
/// Colours go into the palette when each cell type has a single colour and
/// into `cell_colours` otherwise, so decoding gives back the same grid.
pub fn encode(grid: &Grid, name: &str) -> Result<GridConfig> {
    validate_name(name)?;

    let mut colours = grid.palette();
    colours.remove(&0);
    let cell_colours = (!grid.has_uniform_colours()).then(|| grid.cell_colours());

    Ok(GridConfig {
        name: name.to_string(),
        size: grid.size(),
        predefined_update: grid.predefined_update(),
        cells: Some(grid.cell_types()),
        colours,
        cell_colours,
    })
}

/// Rebuild a grid from a configuration, rejecting malformed dimensions, sizes or colours
pub fn decode(config: &GridConfig) -> Result<Grid> {
    cell_count(config.size)?;
    Grid::from_config(config, Pattern::default())
}

/// A parsed snapshot document, not yet expanded into a grid
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Snapshot {
    Config(GridConfig),
    Cells(Vec<Vec<Vec<Cell>>>),
    Types(Vec<Vec<Vec<u32>>>),
}

impl Snapshot {
    /// Side length the document claims, known before any cells are allocated
    pub fn size(&self) -> usize {
        match self {
            Snapshot::Config(config) => config.size,
            Snapshot::Cells(cells) => cells.len(),
            Snapshot::Types(types) => types.len(),
        }
    }

    pub fn into_grid(self) -> Result<Grid> {
        match self {
            Snapshot::Config(config) => decode(&config),
            Snapshot::Cells(cells) => Grid::from_nested(cells, 0),
            Snapshot::Types(types) => {
                let mut config = GridConfig::generated("snapshot", types.len(), 0);
                config.cells = Some(types);
                decode(&config)
            }
        }
    }
}

/// Parse a snapshot document without building the grid.
///
/// JSON documents are an encoded configuration or a bare 3D array whose outer
/// length is the size; anything else is read as the plain text save format.
pub fn parse_document(text: &str) -> Result<Snapshot> {
    let trimmed = text.trim_start();
    if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
        return parse_text_save(text).map(Snapshot::Config);
    }

    serde_json::from_str(text).map_err(|e| {
        EngineError::Parse(format!(
            "snapshot is neither a grid configuration nor a 3D array of non-negative integer cells: {}",
            e
        ))
    })
}

/// Parse a snapshot and build its grid
pub fn parse_snapshot(text: &str) -> Result<Grid> {
    parse_document(text)?.into_grid()
}

/// Parse the plain text save format.
///
/// `<N> <N³ type digits> [<type> <hex colour>]... <preset id>`, whitespace separated,
/// with the digits in x, y, z order.
pub fn parse_text_save(text: &str) -> Result<GridConfig> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [size_token, digits, rest @ ..] = tokens.as_slice() else {
        return Err(EngineError::Parse(
            "text snapshot needs a size, the cell digits and a preset id".to_string(),
        ));
    };
    let Some((preset_token, colour_tokens)) = rest.split_last() else {
        return Err(EngineError::Parse("text snapshot has no preset id".to_string()));
    };

    let size = size_token
        .parse::<usize>()
        .map_err(|_| EngineError::Parse(format!("text snapshot size '{}' is not an integer", size_token)))?;
    let expected = cell_count(size)?;
    if digits.len() != expected {
        return Err(EngineError::Parse(format!(
            "text snapshot has {} cell digits, a grid of size {} needs {}",
            digits.len(),
            size,
            expected
        )));
    }
    if let Some(bad) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(EngineError::Parse(format!("text snapshot cell '{}' is not a digit", bad)));
    }

    if colour_tokens.len() % 2 != 0 {
        return Err(EngineError::Parse(
            "text snapshot colours must come in <type> <hex colour> pairs".to_string(),
        ));
    }
    let mut colours = Palette::new();
    for pair in colour_tokens.chunks(2) {
        let cell_type = pair[0]
            .parse::<u32>()
            .map_err(|_| EngineError::Parse(format!("text snapshot cell type '{}' is not an integer", pair[0])))?;
        let hex = pair[1].strip_prefix("0x").unwrap_or(pair[1]);
        let colour = u32::from_str_radix(hex, 16)
            .map_err(|_| EngineError::Parse(format!("text snapshot colour '{}' is not hexadecimal", pair[1])))?;
        if cell_type != 0 {
            colours.insert(cell_type, check_colour(colour)?);
        }
    }

    let predefined_update = preset_token
        .parse::<u32>()
        .map_err(|_| EngineError::Parse(format!("text snapshot preset id '{}' is not an integer", preset_token)))?;

    let types: Vec<u32> = digits.bytes().map(|b| u32::from(b - b'0')).collect();
    let cells: Vec<Vec<Vec<u32>>> = types
        .chunks(size * size)
        .map(|plane| plane.chunks(size).map(|row| row.to_vec()).collect())
        .collect();

    Ok(GridConfig {
        name: "snapshot".to_string(),
        size,
        predefined_update,
        cells: Some(cells),
        colours,
        cell_colours: None,
    })
}

/// Read a snapshot file without building the grid
pub fn read_document<P: AsRef<Path>>(path: P) -> Result<Snapshot> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(|e| EngineError::io(format!("Failed to read snapshot {}", path.display()), e))?;
    parse_document(&content)
}

/// Read and parse a snapshot file
pub fn read_snapshot<P: AsRef<Path>>(path: P) -> Result<Grid> {
    read_document(path)?.into_grid()
}

/// Write an encoded configuration as pretty JSON, creating parent directories
pub fn write_snapshot<P: AsRef<Path>>(config: &GridConfig, path: P) -> Result<()> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| EngineError::Storage(format!("Failed to serialize '{}': {}", config.name, e)))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| EngineError::io(format!("Failed to create directory {}", parent.display()), e))?;
    }
    std::fs::write(path, content)
        .map_err(|e| EngineError::io(format!("Failed to write snapshot {}", path.display()), e))
}
