//! Configuration settings for the automaton engine

use crate::automaton::{Pattern, RuleSet};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub engine: EngineConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub default_size: usize,
    pub max_size: usize,
    pub default_rules: String,
    pub default_pattern: Pattern,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BootstrapConfig {
    /// JSON preset file seeded into the store at start-up
    pub presets_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: LogLevel,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_tracing(self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_size: 5,
            max_size: 64,
            default_rules: RuleSet::default().to_string(),
            default_pattern: Pattern::Checkerboard,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            store: StoreConfig {
                backend: StoreBackend::File,
                directory: PathBuf::from("data/grids"),
            },
            bootstrap: BootstrapConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl EngineConfig {
    /// The configured starting rule set
    pub fn rules(&self) -> Result<RuleSet> {
        RuleSet::parse(&self.default_rules)
            .with_context(|| format!("Invalid default rules '{}'", self.default_rules))
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a YAML file
    pub fn to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .context("Failed to serialize settings")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.engine.max_size == 0 {
            anyhow::bail!("Maximum grid size must be positive");
        }

        if self.engine.default_size == 0 || self.engine.default_size > self.engine.max_size {
            anyhow::bail!(
                "Default grid size {} must be between 1 and {}",
                self.engine.default_size,
                self.engine.max_size
            );
        }

        self.engine.rules()?;

        if self.store.backend == StoreBackend::File && self.store.directory.as_os_str().is_empty() {
            anyhow::bail!("File store requires a directory");
        }

        if let Some(presets) = &self.bootstrap.presets_file {
            if !presets.exists() {
                anyhow::bail!("Presets file does not exist: {}", presets.display());
            }
        }

        Ok(())
    }

    /// Merge settings with command line overrides
    pub fn merge_with_cli(&mut self, cli_overrides: &CliOverrides) {
        if let Some(ref rules) = cli_overrides.rules {
            self.engine.default_rules = rules.clone();
        }
        if let Some(pattern) = cli_overrides.pattern {
            self.engine.default_pattern = pattern;
        }
        if let Some(ref store_dir) = cli_overrides.store_dir {
            self.store.directory = store_dir.clone();
            self.store.backend = StoreBackend::File;
        }
        if cli_overrides.in_memory {
            self.store.backend = StoreBackend::Memory;
        }
        if let Some(ref presets) = cli_overrides.presets_file {
            self.bootstrap.presets_file = Some(presets.clone());
        }
        if let Some(level) = cli_overrides.log_level {
            self.logging.level = level;
        }
    }
}

/// Command line overrides for settings
#[derive(Debug, Default)]
pub struct CliOverrides {
    pub rules: Option<String>,
    pub pattern: Option<Pattern>,
    pub store_dir: Option<PathBuf>,
    pub in_memory: bool,
    pub presets_file: Option<PathBuf>,
    pub log_level: Option<LogLevel>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_settings_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.engine.rules().unwrap(), RuleSet::default());
    }

    #[test]
    fn test_yaml_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config/default.yaml");

        let mut settings = Settings::default();
        settings.engine.default_rules = "3/3/M".to_string();
        settings.engine.default_pattern = Pattern::Empty;
        settings.to_file(&path).unwrap();

        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded.engine.default_rules, "3/3/M");
        assert_eq!(loaded.engine.default_pattern, Pattern::Empty);
        assert_eq!(loaded.store.backend, StoreBackend::File);
        assert_eq!(loaded.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_optional_sections_default() {
        let yaml = "engine:\n  default_size: 4\n  max_size: 10\n  default_rules: 2/4/N\n  default_pattern: checkerboard\nstore:\n  backend: memory\n  directory: ''\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert!(settings.validate().is_ok());
        assert!(settings.bootstrap.presets_file.is_none());
        assert_eq!(settings.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_validation_failures() {
        let mut settings = Settings::default();
        settings.engine.default_rules = "30/3/M".to_string();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.engine.default_size = 100;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.bootstrap.presets_file = Some(PathBuf::from("/definitely/not/here.json"));
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_cli_overrides() {
        let mut settings = Settings::default();
        settings.merge_with_cli(&CliOverrides {
            rules: Some("1/1/M".to_string()),
            in_memory: true,
            log_level: Some(LogLevel::Debug),
            ..Default::default()
        });

        assert_eq!(settings.engine.default_rules, "1/1/M");
        assert_eq!(settings.store.backend, StoreBackend::Memory);
        assert_eq!(settings.logging.level, LogLevel::Debug);
    }
}
