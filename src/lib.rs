//! Three-dimensional cellular automaton engine
//!
//! This library owns the grid state of a cubic automaton, counts neighbors
//! under Moore or Von Neumann topologies, applies survive/birth rules, and
//! persists named grid configurations.

pub mod automaton;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod utils;

pub use automaton::{Cell, Grid, Neighborhood, RuleSet};
pub use config::Settings;
pub use error::{EngineError, ErrorKind};
pub use session::Session;
pub use store::{GridConfig, GridStore};

