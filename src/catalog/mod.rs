/// Model catalog
///
/// Read-only table of the algorithms the training API understands, keyed by
/// slug. Loaded once at startup (built-in JSON, or a file named by the config)
/// and shared behind an `Arc`, so tests can inject their own.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};

const BUILTIN_CATALOG: &str = include_str!("models.json");

/// One trainable algorithm
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Identifier sent to the training API (e.g. "random-forest")
    pub slug: String,
    pub name: String,
    /// Backing library ("sklearn", "xgboost", "tensorflow", ...)
    pub library: String,
    pub category: String,
    #[serde(default)]
    pub training_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub use_cases: Vec<String>,
}

/// Immutable slug → model table
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    /// Catalog order, as displayed
    models: Vec<ModelSpec>,
    by_slug: HashMap<String, usize>,
}

impl ModelCatalog {
    /// Build a catalog from a list; must not be empty
    pub fn new(models: Vec<ModelSpec>) -> Result<Self> {
        if models.is_empty() {
            return Err(anyhow::anyhow!("Model catalog must contain at least one model"));
        }
        let mut by_slug = HashMap::with_capacity(models.len());
        for (index, model) in models.iter().enumerate() {
            if by_slug.insert(model.slug.clone(), index).is_some() {
                return Err(anyhow::anyhow!("Duplicate model slug in catalog: {}", model.slug));
            }
        }
        Ok(Self { models, by_slug })
    }

    /// Catalog shipped with the crate
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let models: Vec<ModelSpec> = serde_json::from_str(json)?;
        Self::new(models)
    }

    /// Load a catalog from a JSON file on disk
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to read model catalog {}: {}", path.display(), e))?;
        Self::from_json(&json)
    }

    pub fn get(&self, slug: &str) -> Option<&ModelSpec> {
        self.by_slug.get(slug).map(|&i| &self.models[i])
    }

    /// Look up a slug, falling back to the first catalog entry
    pub fn get_or_default(&self, slug: &str) -> &ModelSpec {
        self.get(slug).unwrap_or(&self.models[0])
    }

    pub fn list(&self) -> &[ModelSpec] {
        &self.models
    }
}
