use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app::types::ModelKey;
use crate::error::{Error, Result};

pub const DEFAULT_MAX_MODELS_PER_TURN: usize = 4;
pub const DEFAULT_BRANCH_SEED_WINDOW: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct PlaygroundConfig {
    #[serde(default)]
    pub compare: CompareConfig,

    #[serde(default)]
    pub models: ModelsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareConfig {
    /// Upper bound on how many models one compare turn (and one selection) may hold.
    #[serde(default = "default_max_models_per_turn")]
    pub max_models_per_turn: usize,

    /// How many messages of a model's sub-thread are copied into a split chat.
    #[serde(default = "default_branch_seed_window")]
    pub branch_seed_window: usize,

    /// Models preselected when compare mode is switched on.
    #[serde(default)]
    pub default_models: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ModelsConfig {
    /// Extra model catalog files merged over the built-in one.
    #[serde(default)]
    pub catalogs: Vec<PathBuf>,
}

fn default_max_models_per_turn() -> usize {
    DEFAULT_MAX_MODELS_PER_TURN
}

fn default_branch_seed_window() -> usize {
    DEFAULT_BRANCH_SEED_WINDOW
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            max_models_per_turn: default_max_models_per_turn(),
            branch_seed_window: default_branch_seed_window(),
            default_models: Vec::new(),
        }
    }
}

impl CompareConfig {
    pub fn default_model_keys(&self) -> Vec<ModelKey> {
        self.default_models
            .iter()
            .take(self.max_models_per_turn)
            .map(|m| ModelKey::new(m.clone()))
            .collect()
    }
}

impl PlaygroundConfig {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::Configuration("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("playground").join("config.toml"))
    }

    /// Load the config from the standard location, or return defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from a specific file. A missing file yields defaults; a file that
    /// does not parse is logged and replaced by defaults as well.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config = match toml::from_str::<Self>(&contents) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    "Failed to parse config file at {:?}: {}. Using defaults.",
                    path,
                    e
                );
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.compare.max_models_per_turn == 0 {
            return Err(Error::Configuration(
                "compare.max_models_per_turn must be > 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Save the config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, contents)?;

        Ok(())
    }
}
