//! Directory-backed grid store: one JSON document per name

use super::{GridConfig, GridStore, UpsertOutcome};
use crate::error::{EngineError, Result};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct FileStore {
    directory: PathBuf,
    // Serializes the exists-check and rename of every upsert
    writer: Mutex<()>,
}

impl FileStore {
    /// Open a store rooted at `directory`, creating it if needed
    pub fn open<P: AsRef<Path>>(directory: P) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();
        std::fs::create_dir_all(&directory).map_err(|e| {
            EngineError::Storage(format!(
                "Failed to create store directory {}: {}",
                directory.display(),
                e
            ))
        })?;
        Ok(Self {
            directory,
            writer: Mutex::new(()),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.json", name))
    }
}

impl GridStore for FileStore {
    fn upsert(&self, config: GridConfig) -> Result<UpsertOutcome> {
        config.validate()?;
        let content = serde_json::to_string_pretty(&config)
            .map_err(|e| EngineError::Storage(format!("Failed to serialize '{}': {}", config.name, e)))?;

        let path = self.path_for(&config.name);
        let staging = self.directory.join(format!(".{}.json.tmp", config.name));

        let _guard = self.writer.lock();
        let existed = path.exists();

        std::fs::write(&staging, content).map_err(|e| {
            EngineError::Storage(format!("Failed to write {}: {}", staging.display(), e))
        })?;
        if let Err(e) = std::fs::rename(&staging, &path) {
            let _ = std::fs::remove_file(&staging);
            return Err(EngineError::Storage(format!(
                "Failed to replace {}: {}",
                path.display(),
                e
            )));
        }

        Ok(if existed {
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Inserted
        })
    }

    fn find(&self, name: &str) -> Result<GridConfig> {
        super::config::validate_name(name).map_err(|_| EngineError::NotFound(name.to_string()))?;
        let path = self.path_for(name);

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(EngineError::NotFound(name.to_string()))
            }
            Err(e) => {
                return Err(EngineError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&content).map_err(|e| {
            EngineError::Storage(format!("Stored record {} is corrupt: {}", path.display(), e))
        })
    }

    fn names(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.directory).map_err(|e| {
            EngineError::Storage(format!(
                "Failed to read store directory {}: {}",
                self.directory.display(),
                e
            ))
        })?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| EngineError::Storage(format!("Failed to read directory entry: {}", e)))?;
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    if !stem.starts_with('.') {
                        names.push(stem.to_string());
                    }
                }
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_persistence_across_instances() {
        let dir = tempdir().unwrap();
        let mut config = GridConfig::generated("oak", 2, 1);
        config.cells = Some(vec![vec![vec![2, 0], vec![0, 0]], vec![vec![0, 0], vec![0, 3]]]);
        config.colours.insert(2, 0xdc7633);

        {
            let store = FileStore::open(dir.path()).unwrap();
            assert_eq!(store.upsert(config.clone()).unwrap(), UpsertOutcome::Inserted);
        }

        let reopened = FileStore::open(dir.path()).unwrap();
        assert_eq!(reopened.find("oak").unwrap(), config);
        assert_eq!(reopened.upsert(config.clone()).unwrap(), UpsertOutcome::Replaced);
        assert_eq!(reopened.find("oak").unwrap(), config);
    }

    #[test]
    fn test_names_skip_staging_files() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();
        store.upsert(GridConfig::generated("zeta", 3, 0)).unwrap();
        store.upsert(GridConfig::generated("alpha", 4, 0)).unwrap();
        std::fs::write(dir.path().join(".beta.json.tmp"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        assert_eq!(store.names().unwrap(), vec!["alpha", "zeta"]);
        assert_eq!(store.find_by_size(4).unwrap().unwrap().name, "alpha");
    }

    #[test]
    fn test_missing_and_corrupt_records() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.find("absent").unwrap_err().kind(), ErrorKind::NotFound);
        assert_eq!(store.find("../etc").unwrap_err().kind(), ErrorKind::NotFound);

        std::fs::write(dir.path().join("broken.json"), "{\"name\": 3").unwrap();
        assert_eq!(store.find("broken").unwrap_err().kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_rejects_invalid_config() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path().join("grids")).unwrap();
        let mut config = GridConfig::generated("bad", 3, 0);
        config.cells = Some(vec![vec![vec![0; 3]; 3]; 2]);

        assert!(store.upsert(config).is_err());
        assert!(store.names().unwrap().is_empty());
    }
}
