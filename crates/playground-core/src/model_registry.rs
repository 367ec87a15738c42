use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::app::types::ModelKey;
use crate::error::{Error, Result};

const DEFAULT_MODELS_TOML: &str = include_str!("../assets/default_models.toml");

/// A model the playground can send turns to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub id: String,
    pub display_name: String,
    pub provider: String,

    /// Alternative names that resolve to this model.
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Root structure for TOML deserialization.
#[derive(Debug, Deserialize, Serialize)]
struct ModelsFile {
    models: Vec<ModelInfo>,
}

/// Read-only lookup from model keys to display information.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    /// Models in catalog order.
    models: IndexMap<String, ModelInfo>,
    /// Map of aliases to model ids.
    aliases: HashMap<String, String>,
}

impl ModelRegistry {
    /// Load the built-in catalog, then merge the given catalog files over it.
    /// Later files override earlier ones by model id.
    pub fn load(catalog_paths: &[impl AsRef<Path>]) -> Result<Self> {
        let builtin: ModelsFile = toml::from_str(DEFAULT_MODELS_TOML)
            .map_err(|e| Error::Configuration(format!("Failed to parse default models: {e}")))?;

        let mut registry = Self::from_models(builtin.models);
        for path in catalog_paths {
            let path = path.as_ref();
            let content = std::fs::read_to_string(path)?;
            let file: ModelsFile = toml::from_str(&content).map_err(|e| {
                Error::Configuration(format!(
                    "Failed to parse models at {}: {}",
                    path.display(),
                    e
                ))
            })?;
            for model in file.models {
                registry.insert(model);
            }
        }

        Ok(registry)
    }

    pub fn from_models(models: impl IntoIterator<Item = ModelInfo>) -> Self {
        let mut registry = Self::default();
        for model in models {
            registry.insert(model);
        }
        registry
    }

    fn insert(&mut self, model: ModelInfo) {
        for alias in &model.aliases {
            self.aliases.insert(alias.clone(), model.id.clone());
        }
        self.models.insert(model.id.clone(), model);
    }

    /// Find a model by id or alias.
    pub fn get(&self, key: &str) -> Option<&ModelInfo> {
        self.models.get(key).or_else(|| {
            self.aliases
                .get(key)
                .and_then(|id| self.models.get(id.as_str()))
        })
    }

    /// Human-readable label for a model key; unknown keys show as-is.
    pub fn label_for(&self, key: &ModelKey) -> String {
        self.get(key.as_str())
            .map_or_else(|| key.to_string(), |model| model.display_name.clone())
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelInfo> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
