use std::{
  ffi::OsStr,
  path::{Path, PathBuf},
};

use anyhow::Context;
use fmmap::tokio::{AsyncMmapFile, AsyncMmapFileExt};
use serde_json::Value;
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum SpecFormat {
  #[default]
  Json,
  Yaml,
}

impl SpecFormat {
  #[must_use]
  pub fn from_extension(ext: &str) -> Self {
    match ext.to_ascii_lowercase().as_str() {
      "yaml" | "yml" => Self::Yaml,
      _ => Self::Json,
    }
  }

  #[must_use]
  pub fn from_path(path: &Path) -> Self {
    path
      .extension()
      .and_then(OsStr::to_str)
      .map_or(Self::default(), Self::from_extension)
  }
}

/// A memory-mapped OpenAPI document, parsed into a raw JSON tree on demand.
pub struct SpecLoader {
  path: PathBuf,
  file: AsyncMmapFile,
  format: SpecFormat,
}

impl SpecLoader {
  pub async fn open(path: &Path) -> anyhow::Result<Self> {
    let file = AsyncMmapFile::open(path)
      .await
      .with_context(|| format!("failed to open {}", path.display()))?;

    Ok(Self {
      path: path.to_path_buf(),
      file,
      format: SpecFormat::from_path(path),
    })
  }

  #[must_use]
  pub fn format(&self) -> SpecFormat {
    self.format
  }

  pub fn parse(&self) -> anyhow::Result<Value> {
    let bytes = self.file.as_slice();
    let value = match self.format {
      SpecFormat::Json => serde_json::from_slice(bytes).map_err(anyhow::Error::from),
      SpecFormat::Yaml => serde_yaml::from_slice(bytes).map_err(anyhow::Error::from),
    };
    value.with_context(|| format!("failed to parse {}", self.path.display()))
  }
}

/// The API version a document belongs to: the name of its parent directory.
pub fn api_version(path: &Path) -> anyhow::Result<String> {
  path
    .parent()
    .and_then(Path::file_name)
    .and_then(OsStr::to_str)
    .filter(|name| !name.is_empty())
    .map(str::to_string)
    .with_context(|| format!("cannot derive an API version from {}: no parent directory", path.display()))
}

#[cfg(test)]
mod tests {
  use std::io::Write;

  use super::*;

  #[test]
  fn test_format_from_extension() {
    let cases = [
      ("openapi.yaml", SpecFormat::Yaml),
      ("openapi.YML", SpecFormat::Yaml),
      ("openapi.json", SpecFormat::Json),
      ("openapi", SpecFormat::Json),
    ];
    for (path, expected) in cases {
      assert_eq!(SpecFormat::from_path(Path::new(path)), expected, "failed for {path}");
    }
  }

  #[test]
  fn test_api_version_is_parent_directory() {
    let cases = [
      ("spec/v1/openapi.yaml", Some("v1")),
      ("/abs/spec/v2/openapi.json", Some("v2")),
      ("openapi.yaml", None),
    ];
    for (path, expected) in cases {
      let version = api_version(Path::new(path)).ok();
      assert_eq!(version.as_deref(), expected, "failed for {path}");
    }
  }

  #[tokio::test]
  async fn test_loads_yaml_and_json() {
    let dir = tempfile::tempdir().unwrap();

    let yaml_path = dir.path().join("openapi.yaml");
    std::fs::write(&yaml_path, "openapi: 3.0.0\ninfo:\n  title: t\n  version: '1'\n").unwrap();
    let yaml = SpecLoader::open(&yaml_path).await.unwrap();
    assert_eq!(yaml.format(), SpecFormat::Yaml);
    assert_eq!(yaml.parse().unwrap()["info"]["version"], "1");

    let json_path = dir.path().join("openapi.json");
    let mut file = std::fs::File::create(&json_path).unwrap();
    file
      .write_all(br#"{"openapi":"3.1.0","info":{"title":"t","version":"2"}}"#)
      .unwrap();
    drop(file);
    let json = SpecLoader::open(&json_path).await.unwrap();
    assert_eq!(json.parse().unwrap()["openapi"], "3.1.0");
  }

  #[tokio::test]
  async fn test_parse_error_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.json");
    std::fs::write(&path, "{ not json").unwrap();

    let err = SpecLoader::open(&path).await.unwrap().parse().unwrap_err();
    assert!(err.to_string().contains("broken.json"), "unexpected error: {err}");
  }
}
