//! Cubic grid representation

use super::cell::{birth_colour, check_colour, resolve_colour, Cell, Palette};
use crate::error::{EngineError, Result};
use crate::store::GridConfig;
use serde::{Deserialize, Serialize};

/// Pattern used when a grid has to be generated rather than replayed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Every cell dead
    Empty,
    /// Live wherever `x + y + z` is even
    #[default]
    Checkerboard,
}

impl Pattern {
    fn is_live(self, x: usize, y: usize, z: usize) -> bool {
        match self {
            Pattern::Empty => false,
            Pattern::Checkerboard => (x + y + z) % 2 == 0,
        }
    }
}

/// Number of cells in a grid of side `size`; zero or an overflowing cube is rejected
pub fn cell_count(size: usize) -> Result<usize> {
    if size == 0 {
        return Err(EngineError::InvalidSize(size));
    }
    size.checked_mul(size)
        .and_then(|square| square.checked_mul(size))
        .ok_or(EngineError::InvalidSize(size))
}

/// An N×N×N lattice of cells stored flat in x, y, z order.
///
/// Dead cells always carry colour 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    size: usize,
    cells: Vec<Cell>,
    predefined_update: u32,
}

impl Grid {
    /// Create a grid with every cell dead
    pub fn new(size: usize) -> Result<Self> {
        let count = cell_count(size)?;
        Ok(Self {
            size,
            cells: vec![Cell::DEAD; count],
            predefined_update: 0,
        })
    }

    /// Generate a grid from a pattern, colouring live cells for the preset id
    pub fn generate(size: usize, pattern: Pattern, predefined_update: u32) -> Result<Self> {
        let mut grid = Self::new(size)?;
        grid.predefined_update = predefined_update;

        let live = Cell::alive(birth_colour(predefined_update));
        for x in 0..size {
            for y in 0..size {
                for z in 0..size {
                    if pattern.is_live(x, y, z) {
                        let idx = grid.index(x, y, z);
                        grid.cells[idx] = live;
                    }
                }
            }
        }
        Ok(grid)
    }

    /// Build a grid from a stored configuration.
    ///
    /// Configurations without cells are generated from `fallback`. Per-cell
    /// colours, when present, take precedence over the palette.
    pub fn from_config(config: &GridConfig, fallback: Pattern) -> Result<Self> {
        let size = config.size;
        cell_count(size)?;
        for &colour in config.colours.values() {
            check_colour(colour)?;
        }

        let Some(types) = &config.cells else {
            if config.cell_colours.is_some() {
                return Err(EngineError::InvalidDimension(
                    "per-cell colours given without cells".to_string(),
                ));
            }
            return Self::generate(size, fallback, config.predefined_update);
        };

        check_cube("", types, size)?;
        if let Some(colours) = &config.cell_colours {
            check_cube("colours ", colours, size)?;
        }

        let mut cells = Vec::with_capacity(size * size * size);
        for (x, plane) in types.iter().enumerate() {
            for (y, row) in plane.iter().enumerate() {
                for (z, &cell_type) in row.iter().enumerate() {
                    let colour = match &config.cell_colours {
                        Some(colours) => check_colour(colours[x][y][z])?,
                        None => resolve_colour(&config.colours, cell_type, config.predefined_update),
                    };
                    cells.push(Cell::new(cell_type, colour).normalised());
                }
            }
        }

        Ok(Self {
            size,
            cells,
            predefined_update: config.predefined_update,
        })
    }

    /// Build a grid from a nested x → y → z array; the size is the outer length
    pub fn from_nested(nested: Vec<Vec<Vec<Cell>>>, predefined_update: u32) -> Result<Self> {
        let size = nested.len();
        check_cube("", &nested, size)?;

        let mut cells = Vec::with_capacity(size * size * size);
        for cell in nested.into_iter().flatten().flatten() {
            check_colour(cell.colour)?;
            cells.push(cell.normalised());
        }

        Ok(Self {
            size,
            cells,
            predefined_update,
        })
    }

    /// Assemble a grid from flat cells already known to have `size³` entries
    pub(crate) fn from_flat(size: usize, cells: Vec<Cell>, predefined_update: u32) -> Self {
        debug_assert_eq!(cells.len(), size * size * size);
        Self {
            size,
            cells,
            predefined_update,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Preset id the grid was created under; selects the birth colour
    pub fn predefined_update(&self) -> u32 {
        self.predefined_update
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        (x * self.size + y) * self.size + z
    }

    /// Inverse of [`Grid::index`]
    #[inline]
    pub fn coordinates(&self, idx: usize) -> (usize, usize, usize) {
        let z = idx % self.size;
        let y = (idx / self.size) % self.size;
        let x = idx / (self.size * self.size);
        (x, y, z)
    }

    pub fn contains(&self, x: usize, y: usize, z: usize) -> bool {
        x < self.size && y < self.size && z < self.size
    }

    pub fn get(&self, x: usize, y: usize, z: usize) -> Result<Cell> {
        self.check_bounds(x, y, z)?;
        Ok(self.cells[self.index(x, y, z)])
    }

    /// Replace one cell; a dead cell is stored without colour
    pub fn set(&mut self, x: usize, y: usize, z: usize, cell: Cell) -> Result<()> {
        self.check_bounds(x, y, z)?;
        let idx = self.index(x, y, z);
        self.cells[idx] = cell.normalised();
        Ok(())
    }

    /// Liveness at signed coordinates; anything outside the lattice is dead
    #[inline]
    pub(crate) fn is_live_at(&self, x: isize, y: isize, z: isize) -> bool {
        let n = self.size as isize;
        if x < 0 || y < 0 || z < 0 || x >= n || y >= n || z >= n {
            return false;
        }
        self.cells[self.index(x as usize, y as usize, z as usize)].is_alive()
    }

    fn check_bounds(&self, x: usize, y: usize, z: usize) -> Result<()> {
        if self.contains(x, y, z) {
            Ok(())
        } else {
            Err(EngineError::OutOfRange {
                x,
                y,
                z,
                size: self.size,
            })
        }
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_alive()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(|cell| !cell.is_alive())
    }

    /// Colours in use, keyed by cell type (dead cells included); the first colour seen wins
    pub fn palette(&self) -> Palette {
        let mut palette = Palette::new();
        for cell in &self.cells {
            palette.entry(cell.cell_type).or_insert(cell.colour);
        }
        palette
    }

    /// Whether every cell of a type shares one colour, so [`Grid::palette`] describes the grid fully
    pub fn has_uniform_colours(&self) -> bool {
        let palette = self.palette();
        self.cells
            .iter()
            .all(|cell| palette.get(&cell.cell_type) == Some(&cell.colour))
    }

    /// Cell types as a nested x → y → z array
    pub fn cell_types(&self) -> Vec<Vec<Vec<u32>>> {
        self.nested(|cell| cell.cell_type)
    }

    /// Cell colours as a nested x → y → z array
    pub fn cell_colours(&self) -> Vec<Vec<Vec<u32>>> {
        self.nested(|cell| cell.colour)
    }

    /// The nested x → y → z array of cells handed to display clients
    pub fn to_nested(&self) -> Vec<Vec<Vec<Cell>>> {
        self.nested(|cell| *cell)
    }

    fn nested<T>(&self, f: impl Fn(&Cell) -> T + Copy) -> Vec<Vec<Vec<T>>> {
        self.cells
            .chunks(self.size * self.size)
            .map(|plane| {
                plane
                    .chunks(self.size)
                    .map(|row| row.iter().map(f).collect())
                    .collect()
            })
            .collect()
    }
}

/// Check that a nested array is `size` long on every axis
fn check_cube<T>(label: &str, cube: &[Vec<Vec<T>>], size: usize) -> Result<()> {
    if size == 0 {
        return Err(EngineError::InvalidSize(size));
    }
    check_len(&format!("{}x axis", label), cube.len(), size)?;
    for (x, plane) in cube.iter().enumerate() {
        check_len(&format!("{}plane x={}", label, x), plane.len(), size)?;
        for (y, row) in plane.iter().enumerate() {
            check_len(&format!("{}row x={}, y={}", label, x, y), row.len(), size)?;
        }
    }
    Ok(())
}

fn check_len(what: &str, actual: usize, expected: usize) -> Result<()> {
    if actual != expected {
        return Err(EngineError::InvalidDimension(format!(
            "{} has length {}, expected {}",
            what, actual, expected
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn config(size: usize, cells: Option<Vec<Vec<Vec<u32>>>>) -> GridConfig {
        GridConfig {
            name: "test".to_string(),
            size,
            predefined_update: 0,
            cells,
            colours: Palette::new(),
            cell_colours: None,
        }
    }

    #[test]
    fn test_grid_creation() {
        let grid = Grid::new(3).unwrap();
        assert_eq!(grid.size(), 3);
        assert_eq!(grid.cells().len(), 27);
        assert!(grid.is_empty());
        assert!(grid.cells().iter().all(|cell| cell.cell_type == 0));
    }

    #[test]
    fn test_zero_size_rejected() {
        let err = Grid::new(0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidSize(0)));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_overflowing_size_rejected() {
        assert!(matches!(Grid::new(3_000_000_000), Err(EngineError::InvalidSize(_))));
        assert!(matches!(Grid::new(usize::MAX), Err(EngineError::InvalidSize(_))));
        assert_eq!(cell_count(4).unwrap(), 64);
    }

    #[test]
    fn test_set_clears_dead_colour() {
        let mut grid = Grid::new(2).unwrap();
        grid.set(0, 1, 0, Cell::new(0, 0x123456)).unwrap();
        assert_eq!(grid.get(0, 1, 0).unwrap(), Cell::DEAD);
        assert!(grid.has_uniform_colours());

        grid.set(0, 0, 0, Cell::new(1, 0x00ff00)).unwrap();
        grid.set(1, 1, 1, Cell::new(1, 0x0000ff)).unwrap();
        assert!(!grid.has_uniform_colours());
        assert_eq!(grid.cell_colours()[1][1][1], 0x0000ff);
    }

    #[test]
    fn test_get_and_set() {
        let mut grid = Grid::new(4).unwrap();
        grid.set(1, 2, 3, Cell::new(2, 0x00ff00)).unwrap();

        assert_eq!(grid.get(1, 2, 3).unwrap(), Cell::new(2, 0x00ff00));
        assert_eq!(grid.get(3, 2, 1).unwrap(), Cell::DEAD);
        assert_eq!(grid.live_count(), 1);
    }

    #[test]
    fn test_out_of_range() {
        let mut grid = Grid::new(3).unwrap();
        assert!(matches!(
            grid.get(3, 0, 0),
            Err(EngineError::OutOfRange { x: 3, size: 3, .. })
        ));
        assert!(grid.set(0, 0, 5, Cell::alive(1)).is_err());
        assert!(grid.is_empty());
    }

    #[test]
    fn test_index_round_trip() {
        let grid = Grid::new(5).unwrap();
        for idx in [0, 7, 31, 124] {
            let (x, y, z) = grid.coordinates(idx);
            assert_eq!(grid.index(x, y, z), idx);
        }
    }

    #[test]
    fn test_checkerboard_pattern() {
        let grid = Grid::generate(3, Pattern::Checkerboard, 0).unwrap();
        assert_eq!(grid.live_count(), 14);
        assert_eq!(grid.get(0, 0, 0).unwrap(), Cell::alive(0xff0000));
        assert_eq!(grid.get(0, 0, 1).unwrap(), Cell::DEAD);

        let empty = Grid::generate(3, Pattern::Empty, 0).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_from_config_with_cells() {
        let mut cells = vec![vec![vec![0; 2]; 2]; 2];
        cells[1][0][1] = 2;
        let mut cfg = config(2, Some(cells));
        cfg.colours.insert(2, 0xdc7633);

        let grid = Grid::from_config(&cfg, Pattern::Empty).unwrap();
        assert_eq!(grid.get(1, 0, 1).unwrap(), Cell::new(2, 0xdc7633));
        assert_eq!(grid.live_count(), 1);
    }

    #[test]
    fn test_from_config_without_cells_generates() {
        let grid = Grid::from_config(&config(4, None), Pattern::Checkerboard).unwrap();
        assert_eq!(grid.size(), 4);
        assert_eq!(grid.live_count(), 32);
    }

    #[test]
    fn test_from_config_dimension_mismatch() {
        let cfg = config(3, Some(vec![vec![vec![0; 3]; 3]; 2]));
        let err = Grid::from_config(&cfg, Pattern::Empty).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDimension(_)));

        let mut ragged = vec![vec![vec![0; 2]; 2]; 2];
        ragged[1][1] = vec![0; 3];
        let err = Grid::from_config(&config(2, Some(ragged)), Pattern::Empty).unwrap_err();
        assert!(err.to_string().contains("row x=1, y=1"));
    }

    #[test]
    fn test_nested_round_trip() {
        let grid = Grid::generate(3, Pattern::Checkerboard, 1).unwrap();
        let nested = grid.to_nested();
        assert_eq!(nested.len(), 3);
        assert_eq!(nested[2][1].len(), 3);

        let rebuilt = Grid::from_nested(nested, 1).unwrap();
        assert_eq!(rebuilt, grid);
    }

    #[test]
    fn test_from_config_with_cell_colours() {
        let mut cfg = config(2, Some(vec![vec![vec![1; 2]; 2]; 2]));
        let mut colours = vec![vec![vec![0x00ff00; 2]; 2]; 2];
        colours[1][1][0] = 0x0000ff;
        cfg.cell_colours = Some(colours);

        let grid = Grid::from_config(&cfg, Pattern::Empty).unwrap();
        assert_eq!(grid.get(1, 1, 0).unwrap(), Cell::new(1, 0x0000ff));
        assert_eq!(grid.get(0, 0, 0).unwrap(), Cell::new(1, 0x00ff00));

        cfg.cell_colours = Some(vec![vec![vec![0; 2]; 2]; 1]);
        let err = Grid::from_config(&cfg, Pattern::Empty).unwrap_err();
        assert!(err.to_string().contains("colours x axis"));
    }

    #[test]
    fn test_from_nested_rejects_ragged() {
        let nested = vec![vec![vec![Cell::DEAD; 2]; 2], vec![vec![Cell::DEAD; 2]]];
        assert!(Grid::from_nested(nested, 0).is_err());
        assert!(Grid::from_nested(Vec::new(), 0).is_err());
    }

    #[test]
    fn test_cell_types_layout() {
        let mut grid = Grid::new(2).unwrap();
        grid.set(1, 0, 1, Cell::new(3, 0)).unwrap();
        let types = grid.cell_types();
        assert_eq!(types[1][0][1], 3);
        assert_eq!(types[0][1][1], 0);
    }
}
