//! Console formatting helpers

pub mod display;

pub use display::{Color, ColorOutput, GridFormatter};
