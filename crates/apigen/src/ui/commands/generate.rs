use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, Timelike};
use crossterm::style::Stylize;

use crate::{
  config::GeneratorConfig,
  generator::{
    manifest::Manifest,
    metrics::GenerationStats,
    orchestrator::{Orchestrator, SpecInput},
  },
  ui::{Colors, GenerateCommand},
  utils::spec::{SpecLoader, api_version},
};

pub const MANIFEST_FILE: &str = "manifest.json";

fn format_timestamp() -> String {
  let now = Local::now();
  format!("[{:02}:{:02}:{:02}]", now.hour(), now.minute(), now.second())
}

#[derive(Debug, Clone)]
pub struct GenerateConfig {
  pub inputs: Vec<PathBuf>,
  pub output: PathBuf,
  pub config: Option<PathBuf>,
  pub all_schemas: bool,
  pub verbose: bool,
  pub quiet: bool,
}

impl GenerateConfig {
  pub fn from_command(command: GenerateCommand) -> Self {
    let GenerateCommand {
      input,
      output,
      config,
      all_schemas,
      verbose,
      quiet,
    } = command;

    Self {
      inputs: input,
      output,
      config,
      all_schemas,
      verbose,
      quiet,
    }
  }

  pub fn manifest_path(&self) -> PathBuf {
    self.output.join(MANIFEST_FILE)
  }

  async fn load_specs(&self, logger: &GenerateLogger<'_>) -> anyhow::Result<Vec<SpecInput>> {
    let mut specs = Vec::with_capacity(self.inputs.len());
    for path in &self.inputs {
      let version = api_version(path)?;
      let loader = SpecLoader::open(path).await?;
      logger.log_loading(&version, path, &loader);
      specs.push(SpecInput {
        version,
        path: path.clone(),
        value: loader.parse()?,
      });
    }
    Ok(specs)
  }

  async fn write_manifest(&self, manifest: &Manifest) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(&self.output)
      .await
      .with_context(|| format!("failed to create {}", self.output.display()))?;
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    let path = self.manifest_path();
    tokio::fs::write(&path, json)
      .await
      .with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
  }
}

struct GenerateLogger<'a> {
  config: &'a GenerateConfig,
  colors: &'a Colors,
}

impl<'a> GenerateLogger<'a> {
  fn new(config: &'a GenerateConfig, colors: &'a Colors) -> Self {
    Self { config, colors }
  }

  fn info(&self, message: &str) {
    if !self.config.quiet {
      println!("{} {message}", format_timestamp().with(self.colors.timestamp()));
    }
  }

  fn stat(&self, label: &str, value: String) {
    if !self.config.quiet {
      println!(
        "            {:<25} {}",
        label.with(self.colors.label()),
        value.with(self.colors.value())
      );
    }
  }

  fn log_loading(&self, version: &str, path: &std::path::Path, loader: &SpecLoader) {
    self.info(
      &format!("Loading {version} from: {}", path.display())
        .with(self.colors.primary())
        .to_string(),
    );
    if self.config.verbose {
      self.stat("Format:", loader.format().to_string());
    }
  }

  fn log_generating(&self) {
    let message = match self.config.inputs.len() {
      1 => "Building the model...".to_string(),
      count => format!("Building the models of {count} API versions..."),
    };
    self.info(&message.with(self.colors.primary()).to_string());
  }

  fn print_statistics(&self, stats: &GenerationStats) {
    if self.config.quiet {
      return;
    }

    self.stat("API versions:", stats.versions.to_string());
    self.stat("API groups:", stats.api_groups.to_string());
    self.stat("Operations:", stats.operations.to_string());
    self.stat("Models:", stats.models.to_string());
    self.stat("", format!("{} objects", stats.objects));
    self.stat("", format!("{} enums", stats.enums));
    self.stat("", format!("{} unions", stats.unions));
    if stats.list_wrappers > 0 {
      self.stat("", format!("{} list wrappers", stats.list_wrappers));
    }
    if !stats.warnings.is_empty() {
      self.stat("Warnings:", stats.warnings.len().to_string());
    }

    self.print_cycles(stats);
    self.print_warnings(stats);
  }

  fn print_cycles(&self, stats: &GenerationStats) {
    if stats.cycles_detected == 0 {
      return;
    }

    self.stat("Cycles:", stats.cycles_detected.to_string());

    if self.config.verbose {
      for (i, cycle) in stats.cycle_details.iter().enumerate() {
        println!(
          "              {}: {}",
          format!("Cycle {}", i + 1).with(self.colors.accent()),
          cycle.join(" -> ").with(self.colors.info())
        );
      }
    }
  }

  fn print_warnings(&self, stats: &GenerationStats) {
    if stats.warnings.is_empty() || self.config.quiet {
      return;
    }

    let mut printed_header = false;
    for warning in &stats.warnings {
      if !warning.is_skipped_item() && !self.config.verbose {
        continue;
      }

      if !printed_header {
        println!();
        printed_header = true;
      }

      let label = if warning.is_skipped_item() { "Skipped:" } else { "Warning:" };
      eprintln!(
        "{} {}",
        label.with(self.colors.accent()),
        warning.to_string().with(self.colors.primary())
      );
    }
  }

  fn log_writing(&self) {
    self.info(
      &format!("Writing to: {}", self.config.manifest_path().display())
        .with(self.colors.primary())
        .to_string(),
    );
  }

  fn log_success(&self) {
    if !self.config.quiet {
      println!();
      println!(
        "{} {}",
        format_timestamp().with(self.colors.timestamp()),
        "Successfully generated the manifest".with(self.colors.success())
      );
    }
  }
}

pub async fn generate_code(config: GenerateConfig, colors: &Colors) -> anyhow::Result<()> {
  let logger = GenerateLogger::new(&config, colors);

  let generator_config = GeneratorConfig::load_or_default(config.config.as_deref()).await?;
  let specs = config.load_specs(&logger).await?;

  logger.log_generating();
  let orchestrator = Orchestrator::new(generator_config, config.all_schemas);
  let output = orchestrator.generate_all(specs).await?;
  logger.print_statistics(&output.stats);

  logger.log_writing();
  config.write_manifest(&output.manifest).await?;

  logger.log_success();
  Ok(())
}
