//! 3D cellular automaton core: cells, grids, topologies, rules and stepping

pub mod cell;
pub mod grid;
pub mod neighborhood;
pub mod rules;
pub mod stepper;

pub use cell::{birth_colour, check_colour, Cell, Palette, MAX_COLOUR};
pub use grid::{cell_count, Grid, Pattern};
pub use neighborhood::{count_live_neighbors, Neighborhood};
pub use rules::RuleSet;
pub use stepper::{step, step_generations};
