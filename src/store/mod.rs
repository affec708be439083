//! Named, idempotent persistence of grid configurations

pub mod bootstrap;
pub mod codec;
pub mod config;
pub mod file;
pub mod memory;

pub use bootstrap::{seed, seed_from_file, seed_from_str, SeedEntry, SeedOutcome, SeedReport};
pub use codec::{
    decode, encode, parse_document, parse_snapshot, parse_text_save, read_document, read_snapshot, write_snapshot,
    Snapshot,
};
pub use config::GridConfig;
pub use file::FileStore;
pub use memory::MemoryStore;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which branch an upsert took
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpsertOutcome {
    Inserted,
    Replaced,
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Inserted => write!(f, "inserted"),
            UpsertOutcome::Replaced => write!(f, "replaced"),
        }
    }
}

/// Keyed store of grid configurations.
///
/// `upsert` is the only write: insert when the name is absent, full replace
/// otherwise, atomically with respect to other writers of the same name.
pub trait GridStore: Send + Sync {
    fn upsert(&self, config: GridConfig) -> Result<UpsertOutcome>;

    fn find(&self, name: &str) -> Result<GridConfig>;

    /// All stored names in ascending order
    fn names(&self) -> Result<Vec<String>>;

    /// First configuration (by name order) whose size matches
    fn find_by_size(&self, size: usize) -> Result<Option<GridConfig>> {
        for name in self.names()? {
            let config = self.find(&name)?;
            if config.size == size {
                return Ok(Some(config));
            }
        }
        Ok(None)
    }
}
