use std::path::Path;

use anyhow::Context;
use apigen_model::{ListModels, ReservedWords};
use indexmap::IndexMap;
use serde::Deserialize;

/// Generator settings loaded from `--config`.
///
/// ```json
/// { "list_models": { "v1": ["AgentCheck"] }, "reserved_words": ["from", "class"] }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
  /// Per API version, the array schemas emitted as named list wrappers.
  #[serde(default)]
  pub list_models: IndexMap<String, Vec<String>>,
  /// Replaces the default reserved-word set when present.
  #[serde(default)]
  pub reserved_words: Option<Vec<String>>,
}

impl GeneratorConfig {
  pub async fn load(path: &Path) -> anyhow::Result<Self> {
    let bytes = tokio::fs::read(path)
      .await
      .with_context(|| format!("failed to read config {}", path.display()))?;
    Self::from_slice(&bytes).with_context(|| format!("invalid config {}", path.display()))
  }

  pub async fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
    match path {
      Some(path) => Self::load(path).await,
      None => Ok(Self::default()),
    }
  }

  /// Parses the JSON form, reporting the exact field of a type mismatch.
  pub fn from_slice(bytes: &[u8]) -> anyhow::Result<Self> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
      let path = err.path().to_string();
      anyhow::anyhow!("at '{path}': {}", err.into_inner())
    })
  }

  #[must_use]
  pub fn list_models(&self, version: &str) -> ListModels {
    self
      .list_models
      .get(version)
      .map(|names| names.iter().map(String::as_str).collect())
      .unwrap_or_default()
  }

  #[must_use]
  pub fn reserved_words(&self) -> ReservedWords {
    self
      .reserved_words
      .as_ref()
      .map_or_else(ReservedWords::default, |words| ReservedWords::new(words.iter().map(String::as_str)))
  }
}
