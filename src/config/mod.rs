//! Configuration management for the automaton engine

pub mod settings;

pub use settings::{
    Settings, EngineConfig, StoreConfig, BootstrapConfig, LoggingConfig,
    StoreBackend, LogLevel, CliOverrides
};
