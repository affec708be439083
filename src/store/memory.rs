//! In-process grid store

use super::{GridConfig, GridStore, UpsertOutcome};
use crate::error::{EngineError, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct MemoryStore {
    configs: RwLock<BTreeMap<String, GridConfig>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.configs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.read().is_empty()
    }
}

impl GridStore for MemoryStore {
    fn upsert(&self, config: GridConfig) -> Result<UpsertOutcome> {
        config.validate()?;
        let mut configs = self.configs.write();
        match configs.insert(config.name.clone(), config) {
            None => Ok(UpsertOutcome::Inserted),
            Some(_) => Ok(UpsertOutcome::Replaced),
        }
    }

    fn find(&self, name: &str) -> Result<GridConfig> {
        self.configs
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(name.to_string()))
    }

    fn names(&self) -> Result<Vec<String>> {
        Ok(self.configs.read().keys().cloned().collect())
    }

    fn find_by_size(&self, size: usize) -> Result<Option<GridConfig>> {
        Ok(self
            .configs
            .read()
            .values()
            .find(|config| config.size == size)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::sync::Arc;

    #[test]
    fn test_insert_then_replace() {
        let store = MemoryStore::new();
        assert_eq!(
            store.upsert(GridConfig::generated("tree", 5, 1)).unwrap(),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert(GridConfig::generated("tree", 7, 0)).unwrap(),
            UpsertOutcome::Replaced
        );

        let found = store.find("tree").unwrap();
        assert_eq!(found.size, 7);
        assert_eq!(found.predefined_update, 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let store = MemoryStore::new();
        let mut config = GridConfig::generated("cube", 2, 0);
        config.cells = Some(vec![vec![vec![1, 0], vec![0, 1]], vec![vec![0, 0], vec![1, 1]]]);

        store.upsert(config.clone()).unwrap();
        let after_first = store.find("cube").unwrap();
        store.upsert(config).unwrap();

        assert_eq!(store.find("cube").unwrap(), after_first);
        assert_eq!(store.names().unwrap(), vec!["cube".to_string()]);
    }

    #[test]
    fn test_find_missing() {
        let store = MemoryStore::new();
        let err = store.find("nothing").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let store = MemoryStore::new();
        assert!(store.upsert(GridConfig::generated("bad name", 3, 0)).is_err());
        assert!(store.upsert(GridConfig::generated("zero", 0, 0)).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_by_size() {
        let store = MemoryStore::new();
        store.upsert(GridConfig::generated("b", 5, 0)).unwrap();
        store.upsert(GridConfig::generated("a", 5, 1)).unwrap();
        store.upsert(GridConfig::generated("c", 8, 0)).unwrap();

        assert_eq!(store.find_by_size(5).unwrap().unwrap().name, "a");
        assert_eq!(store.find_by_size(8).unwrap().unwrap().name, "c");
        assert!(store.find_by_size(3).unwrap().is_none());
    }

    #[test]
    fn test_concurrent_upserts_of_one_name() {
        let store = Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || store.upsert(GridConfig::generated("shared", i + 1, 0)).unwrap())
            })
            .collect();

        let outcomes: Vec<UpsertOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let inserted = outcomes.iter().filter(|o| **o == UpsertOutcome::Inserted).count();

        assert_eq!(inserted, 1);
        assert_eq!(store.len(), 1);
    }
}
