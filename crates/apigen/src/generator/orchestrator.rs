use std::{path::PathBuf, sync::Arc};

use anyhow::Context;
use apigen_model::{
  CollectOptions, NameRegistry, OpenApi, SchemaDependencyGraph, TypeMapper, collect_named_schemas_into,
};
use indexmap::IndexSet;
use serde_json::Value;
use tokio::task::JoinSet;

use super::{
  manifest::{Manifest, ManifestBuilder, VersionManifest},
  metrics::GenerationStats,
};
use crate::config::GeneratorConfig;

/// One parsed document and the API version it belongs to.
#[derive(Debug, Clone)]
pub struct SpecInput {
  pub version: String,
  pub path: PathBuf,
  pub value: Value,
}

#[derive(Debug, Clone, Default)]
pub struct GenerationOutput {
  pub manifest: Manifest,
  pub stats: GenerationStats,
}

/// Drives model building for every API version. Versions share nothing but the
/// configuration, so each one is built on its own blocking task.
#[derive(Debug, Clone)]
pub struct Orchestrator {
  config: Arc<GeneratorConfig>,
  all_schemas: bool,
}

impl Orchestrator {
  pub fn new(config: GeneratorConfig, all_schemas: bool) -> Self {
    Self {
      config: Arc::new(config),
      all_schemas,
    }
  }

  /// Builds the manifest of a single version from its raw document tree.
  pub fn generate_version(&self, version: &str, value: &Value) -> anyhow::Result<(VersionManifest, GenerationStats)> {
    let document = OpenApi::from_value(value)?;
    let list_models = self.config.list_models(version);
    let reserved_words = self.config.reserved_words();

    let mut registry = NameRegistry::new();
    collect_named_schemas_into(&document, &document, CollectOptions::default(), &mut registry)?;
    if self.all_schemas {
      collect_named_schemas_into(&document, document.components(), CollectOptions::default(), &mut registry)?;
    }
    registry.retain_emittable(&list_models);

    let cycles = SchemaDependencyGraph::build(&document).cycles();

    let mut stats = GenerationStats::default();
    stats.record_version();
    let mapper = TypeMapper::new(&document, &list_models);
    let manifest = ManifestBuilder::new(version, mapper, &reserved_words, &mut stats).build(&registry, cycles)?;

    Ok((manifest, stats))
  }

  /// Builds every version in parallel. The manifest lists versions in input order.
  pub async fn generate_all(&self, inputs: Vec<SpecInput>) -> anyhow::Result<GenerationOutput> {
    let mut versions = IndexSet::new();
    for input in &inputs {
      if !versions.insert(input.version.as_str()) {
        anyhow::bail!(
          "API version '{}' is given more than once (second file: {})",
          input.version,
          input.path.display()
        );
      }
    }

    let mut tasks = JoinSet::new();
    for (index, input) in inputs.into_iter().enumerate() {
      let orchestrator = self.clone();
      tasks.spawn_blocking(move || {
        let result = orchestrator
          .generate_version(&input.version, &input.value)
          .with_context(|| format!("failed to generate {} from {}", input.version, input.path.display()));
        (index, input.version, result)
      });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
      let (index, version, result) = joined.context("generation task panicked")?;
      results.push((index, version, result?));
    }
    results.sort_by_key(|(index, ..)| *index);

    let mut output = GenerationOutput::default();
    for (_, version, (manifest, stats)) in results {
      output.manifest.versions.insert(version, manifest);
      output.stats.merge(stats);
    }
    Ok(output)
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn minimal(title: &str) -> Value {
    json!({
      "openapi": "3.0.3",
      "info": { "title": title, "version": "1" },
      "paths": {
        "/ping": {
          "get": {
            "operationId": "ping",
            "responses": {
              "200": {
                "description": "ok",
                "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Pong" } } }
              }
            }
          }
        }
      },
      "components": {
        "schemas": {
          "Pong": { "type": "object", "properties": { "at": { "type": "string", "format": "date-time" } } },
          "Orphan": { "type": "object", "properties": { "x": { "type": "integer" } } }
        }
      }
    })
  }

  fn input(version: &str, value: Value) -> SpecInput {
    SpecInput {
      version: version.to_string(),
      path: PathBuf::from(format!("spec/{version}/openapi.json")),
      value,
    }
  }

  #[test]
  fn test_all_schemas_adds_unreachable_components() {
    let cases = [(false, vec!["Pong"]), (true, vec!["Pong", "Orphan"])];
    for (all_schemas, expected) in cases {
      let orchestrator = Orchestrator::new(GeneratorConfig::default(), all_schemas);
      let (manifest, _) = orchestrator.generate_version("v1", &minimal("t")).unwrap();
      assert_eq!(
        manifest.models.keys().collect::<Vec<_>>(),
        expected,
        "failed for all_schemas={all_schemas}"
      );
    }
  }

  #[tokio::test]
  async fn test_generate_all_keeps_input_order() {
    let orchestrator = Orchestrator::new(GeneratorConfig::default(), false);
    let output = orchestrator
      .generate_all(vec![input("v2", minimal("second")), input("v1", minimal("first"))])
      .await
      .unwrap();

    assert_eq!(output.manifest.versions.keys().collect::<Vec<_>>(), ["v2", "v1"]);
    assert_eq!(output.manifest.versions["v1"].info.title, "first");
    assert_eq!(output.stats.versions, 2);
    assert_eq!(output.stats.operations, 2);
  }

  #[tokio::test]
  async fn test_duplicate_versions_are_rejected() {
    let orchestrator = Orchestrator::new(GeneratorConfig::default(), false);
    let err = orchestrator
      .generate_all(vec![input("v1", minimal("a")), input("v1", minimal("b"))])
      .await
      .unwrap_err();
    assert!(err.to_string().contains("'v1' is given more than once"), "unexpected error: {err}");
  }

  #[tokio::test]
  async fn test_model_errors_name_the_version() {
    let orchestrator = Orchestrator::new(GeneratorConfig::default(), false);
    let err = orchestrator
      .generate_all(vec![input("v3", json!({ "openapi": "3.0.0" }))])
      .await
      .unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("failed to generate v3"), "unexpected error: {message}");
    assert!(message.contains("malformed document"), "unexpected error: {message}");
  }
}
