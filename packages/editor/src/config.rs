use crate::errors::EditorResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_NAME: &str = "quire.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub normalize: NormalizeConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryConfig {
    /// Record undo batches at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Cap for both the undo and the redo stack
    #[serde(default = "default_max_batches")]
    pub max_batches: usize,

    /// Record selection-only operations
    #[serde(default)]
    pub save_selection: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizeConfig {
    /// Initial state of the normalizing flag
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// A pass may pop at most `initial dirty paths * iteration_factor` paths
    #[serde(default = "default_iteration_factor")]
    pub iteration_factor: usize,
}

fn default_true() -> bool {
    true
}

fn default_max_batches() -> usize {
    100
}

fn default_iteration_factor() -> usize {
    42
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_batches: default_max_batches(),
            save_selection: false,
        }
    }
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            iteration_factor: default_iteration_factor(),
        }
    }
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when the
    /// file is absent.
    pub fn load(dir: impl AsRef<Path>) -> EditorResult<Self> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: EditorConfig = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(EditorConfig::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{
            "history": { "maxBatches": 10, "saveSelection": true },
            "normalize": { "iterationFactor": 5 }
        }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert!(config.history.enabled);
        assert_eq!(config.history.max_batches, 10);
        assert!(config.history.save_selection);
        assert!(config.normalize.enabled);
        assert_eq!(config.normalize.iteration_factor, 5);
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.history.max_batches, 100);
        assert!(!config.history.save_selection);
        assert_eq!(config.normalize.iteration_factor, 42);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = std::env::temp_dir().join("quire-config-missing");
        let config = EditorConfig::load(&dir).unwrap();
        assert_eq!(config, EditorConfig::default());
    }
}
