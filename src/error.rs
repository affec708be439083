//! Error types for the automaton engine

use thiserror::Error;

/// Result alias used throughout the engine
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors raised by the grid model, rule parser, codec, store and session
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid grid size {0}: size must be positive")]
    InvalidSize(usize),

    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    #[error("coordinates ({x}, {y}, {z}) out of range for a grid of size {size}")]
    OutOfRange {
        x: usize,
        y: usize,
        z: usize,
        size: usize,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no grid configuration named '{0}'")]
    NotFound(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Coarse classification of an [`EngineError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Storage,
    Parse,
    Io,
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::InvalidSize(_)
            | EngineError::InvalidDimension(_)
            | EngineError::OutOfRange { .. }
            | EngineError::Validation(_) => ErrorKind::Validation,
            EngineError::Parse(_) => ErrorKind::Parse,
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::Storage(_) => ErrorKind::Storage,
            EngineError::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        EngineError::Io {
            context: context.into(),
            source,
        }
    }
}
