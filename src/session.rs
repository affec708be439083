//! Session service owning the current grid and rule set
//!
//! Every operation that reads and replaces session state holds the state
//! lock for its whole sequence, so concurrent callers are serialized and a
//! failed operation never leaves a partial update behind.

use crate::automaton::{step, Cell, Grid, Pattern, RuleSet};
use crate::config::{EngineConfig, Settings, StoreBackend};
use crate::error::{EngineError, Result};
use crate::store::{self, FileStore, GridStore, MemoryStore, SeedReport, Snapshot, UpsertOutcome};
use anyhow::Context;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Nested x → y → z cell array exchanged with display clients
pub type CellArray = Vec<Vec<Vec<Cell>>>;

/// Text-only reply used by save and rule edits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug)]
struct SessionState {
    grid: Option<Grid>,
    rules: RuleSet,
}

pub struct Session {
    store: Arc<dyn GridStore>,
    max_size: usize,
    pattern: Pattern,
    state: Mutex<SessionState>,
}

impl Session {
    pub fn new(store: Arc<dyn GridStore>, engine: &EngineConfig) -> Result<Self> {
        let rules = RuleSet::parse(&engine.default_rules)?;
        Ok(Self {
            store,
            max_size: engine.max_size,
            pattern: engine.default_pattern,
            state: Mutex::new(SessionState { grid: None, rules }),
        })
    }

    /// Open the configured store, seed presets if configured, and start a session
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let store: Arc<dyn GridStore> = match settings.store.backend {
            StoreBackend::Memory => Arc::new(MemoryStore::new()),
            StoreBackend::File => Arc::new(
                FileStore::open(&settings.store.directory)
                    .with_context(|| format!("Failed to open store at {}", settings.store.directory.display()))?,
            ),
        };

        if let Some(presets) = &settings.bootstrap.presets_file {
            store::seed_from_file(store.as_ref(), presets)
                .with_context(|| format!("Failed to seed presets from {}", presets.display()))?;
        }

        Session::new(store, &settings.engine).context("Failed to create session")
    }

    pub fn store(&self) -> &Arc<dyn GridStore> {
        &self.store
    }

    /// Start a fresh grid of `size`, replaying a stored preset of that size if one exists
    pub fn initial_state(&self, size: usize) -> Result<CellArray> {
        self.check_size(size)?;

        let grid = match self.store.find_by_size(size)? {
            Some(preset) => {
                info!(name = %preset.name, size, "initial state from preset");
                Grid::from_config(&preset, self.pattern)?
            }
            None => {
                info!(size, pattern = ?self.pattern, "initial state generated");
                Grid::generate(size, self.pattern, 0)?
            }
        };

        let nested = grid.to_nested();
        self.state.lock().grid = Some(grid);
        Ok(nested)
    }

    /// Step the current grid once under the current rules and make the result current
    pub fn advance(&self, size: usize) -> Result<CellArray> {
        let mut state = self.state.lock();
        let current = state.grid.as_ref().ok_or_else(|| {
            EngineError::Validation("no grid has been initialised; request an initial state first".to_string())
        })?;
        if current.size() != size {
            return Err(EngineError::Validation(format!(
                "requested size {} does not match the current grid size {}",
                size,
                current.size()
            )));
        }

        let next = step(current, &state.rules);
        debug!(size, live = next.live_count(), rules = %state.rules, "advanced one generation");

        let nested = next.to_nested();
        state.grid = Some(next);
        Ok(nested)
    }

    /// Persist the current grid under `name`
    pub fn try_save(&self, name: &str) -> Result<UpsertOutcome> {
        let config = {
            let state = self.state.lock();
            let grid = state.grid.as_ref().ok_or_else(|| {
                EngineError::Validation("there is no grid to save".to_string())
            })?;
            store::encode(grid, name)?
        };

        let outcome = self.store.upsert(config)?;
        info!(name, %outcome, "saved grid");
        Ok(outcome)
    }

    /// Persist the current grid, reporting success or failure as text
    pub fn save(&self, name: &str) -> MessageResponse {
        match self.try_save(name) {
            Ok(_) => MessageResponse::new(format!("Grid saved successfully as '{}'", name)),
            Err(e) => {
                warn!(name, error = %e, "save failed");
                MessageResponse::new(format!("Failed to save grid '{}': {}", name, e))
            }
        }
    }

    /// Write the current grid as a snapshot file that [`Session::load_file`] accepts
    pub fn export_file<P: AsRef<Path>>(&self, name: &str, path: P) -> Result<()> {
        let config = {
            let state = self.state.lock();
            let grid = state.grid.as_ref().ok_or_else(|| {
                EngineError::Validation("there is no grid to export".to_string())
            })?;
            store::encode(grid, name)?
        };
        store::write_snapshot(&config, path)
    }

    /// Replace the current grid with a stored configuration
    pub fn load_named(&self, name: &str) -> Result<CellArray> {
        let config = self.store.find(name)?;
        self.check_size(config.size)?;
        let grid = store::decode(&config)?;
        self.replace_grid(grid)
    }

    /// Replace the current grid with a snapshot document
    pub fn load(&self, snapshot: &str) -> Result<CellArray> {
        self.load_document(store::parse_document(snapshot)?)
    }

    /// Replace the current grid with a snapshot file
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<CellArray> {
        self.load_document(store::read_document(path)?)
    }

    fn load_document(&self, document: Snapshot) -> Result<CellArray> {
        self.check_size(document.size())?;
        let grid = document.into_grid()?;
        self.replace_grid(grid)
    }

    /// Parse and install new rules; the old rules stay in place on failure
    pub fn edit_rules(&self, expression: &str) -> Result<RuleSet> {
        let rules = RuleSet::parse(expression)?;
        self.state.lock().rules = rules;
        info!(rules = %rules, "rules updated");
        Ok(rules)
    }

    /// Seed loosely typed preset records into the store
    pub fn seed(&self, records: &[Value]) -> SeedReport {
        store::seed(self.store.as_ref(), records)
    }

    pub fn rules(&self) -> RuleSet {
        self.state.lock().rules
    }

    /// Copy of the current grid, if any
    pub fn snapshot(&self) -> Option<Grid> {
        self.state.lock().grid.clone()
    }

    fn replace_grid(&self, grid: Grid) -> Result<CellArray> {
        self.check_size(grid.size())?;
        info!(size = grid.size(), live = grid.live_count(), "grid loaded");
        let nested = grid.to_nested();
        self.state.lock().grid = Some(grid);
        Ok(nested)
    }

    fn check_size(&self, size: usize) -> Result<()> {
        if size == 0 {
            return Err(EngineError::InvalidSize(size));
        }
        if size > self.max_size {
            return Err(EngineError::Validation(format!(
                "grid size {} exceeds the configured maximum of {}",
                size, self.max_size
            )));
        }
        Ok(())
    }
}
