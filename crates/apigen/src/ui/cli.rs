use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use super::colors::{ColorMode, Colors, ThemeMode};

#[derive(Parser, Debug)]
#[command(name = "apigen")]
#[command(author, version, about = "Builds a typed, cross-referenced model of OpenAPI documents for client generators")]
#[command(styles = Colors::clap_styles())]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,

  /// Control color output
  #[arg(long, value_enum, default_value = "auto", global = true)]
  pub color: ColorMode,

  /// Terminal theme (dark or light background)
  #[arg(long, value_enum, default_value = "auto", global = true)]
  pub theme: ThemeMode,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Inspect a single OpenAPI document
  List {
    #[command(subcommand)]
    list_command: ListCommands,
  },
  /// Build the generation manifest for one or more API versions
  Generate(GenerateCommand),
}

#[derive(Args, Debug, Clone)]
pub struct GenerateCommand {
  /// OpenAPI documents (JSON or YAML). The parent directory name is the API version,
  /// e.g. `spec/v2/openapi.yaml` is version `v2`
  #[arg(short, long, value_name = "FILE", required = true, num_args = 1..)]
  pub input: Vec<PathBuf>,

  /// Directory the manifest is written to
  #[arg(short, long, value_name = "DIR")]
  pub output: PathBuf,

  /// Generator configuration (list-model allow-lists, reserved words)
  #[arg(short, long, value_name = "FILE")]
  pub config: Option<PathBuf>,

  /// Emit every component schema, including ones no operation reaches
  #[arg(long, default_value_t = false)]
  pub all_schemas: bool,

  /// Enable verbose output with detailed progress information
  #[arg(short, long, default_value_t = false, conflicts_with = "quiet")]
  pub verbose: bool,

  /// Suppress non-essential output (errors only)
  #[arg(short, long, default_value_t = false)]
  pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum ListCommands {
  /// List all operations, grouped by their first tag
  Operations {
    /// Path to the OpenAPI document
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,
  },
  /// List the models a generator would emit
  Models {
    /// Path to the OpenAPI document
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Generator configuration (list-model allow-lists)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Include component schemas no operation reaches
    #[arg(long, default_value_t = false)]
    all_schemas: bool,
  },
}

#[cfg(test)]
mod tests {
  use clap::CommandFactory;

  use super::*;

  #[test]
  fn test_cli_definition_is_consistent() {
    Cli::command().debug_assert();
  }

  #[test]
  fn test_generate_accepts_several_inputs() {
    let cli = Cli::try_parse_from([
      "apigen",
      "generate",
      "-i",
      "spec/v1/openapi.yaml",
      "spec/v2/openapi.yaml",
      "-o",
      "out",
      "--config",
      "config/datadog.json",
    ])
    .unwrap();

    let Commands::Generate(command) = cli.command else {
      panic!("expected the generate command");
    };
    assert_eq!(command.input.len(), 2);
    assert_eq!(command.output, PathBuf::from("out"));
    assert_eq!(command.config, Some(PathBuf::from("config/datadog.json")));
    assert!(!command.all_schemas);
  }

  #[test]
  fn test_verbose_conflicts_with_quiet() {
    let result = Cli::try_parse_from(["apigen", "generate", "-i", "a.json", "-o", "out", "-v", "-q"]);
    assert!(result.is_err());
  }

  #[test]
  fn test_list_models_flags() {
    let cli = Cli::try_parse_from(["apigen", "--color", "never", "list", "models", "-i", "spec.yaml", "--all-schemas"])
      .unwrap();
    let Commands::List {
      list_command: ListCommands::Models { all_schemas, config, .. },
    } = cli.command
    else {
      panic!("expected list models");
    };
    assert!(all_schemas);
    assert!(config.is_none());
  }
}
