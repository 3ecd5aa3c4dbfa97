use std::path::Path;

use apigen_model::{NameOrigin, OpenApi};
use comfy_table::{Attribute, Cell, CellAlignment, ContentArrangement, Row, Table};

use crate::{
  config::GeneratorConfig,
  generator::{manifest::operation_id, orchestrator::Orchestrator},
  ui::{Colors, colors::Role, term_width},
  utils::spec::{SpecLoader, api_version},
};

fn table(colors: &Colors, headers: &[&str]) -> Table {
  let mut table = Table::new();
  table
    .load_preset("  ── ──            ")
    .set_content_arrangement(ContentArrangement::Dynamic)
    .set_width(term_width());

  let mut row = Row::new();
  for header in headers {
    row.add_cell(Cell::new(header).fg(colors.cell(Role::Label)));
  }
  table.set_header(row);
  table
}

pub async fn list_operations(input: &Path, colors: &Colors) -> anyhow::Result<()> {
  let value = SpecLoader::open(input).await?.parse()?;
  let document = OpenApi::from_value(&value)?;

  let mut table = table(colors, &["TAG", "OPERATION ID", "METHOD", "PATH"]);
  for (group, entries) in document.group_operations_by_tag() {
    for entry in entries {
      let mut row = Row::new();
      row.add_cell(Cell::new(group.to_string()).fg(colors.cell(Role::Info)));
      row.add_cell(
        Cell::new(operation_id(&entry))
          .fg(colors.cell(Role::Value))
          .add_attribute(Attribute::Bold),
      );
      row.add_cell(
        Cell::new(entry.method.as_str())
          .fg(colors.cell(Role::Accent))
          .set_alignment(CellAlignment::Right),
      );
      row.add_cell(Cell::new(entry.path).fg(colors.cell(Role::Primary)));
      table.add_row(row);
    }
  }

  println!("{table}");

  Ok(())
}

pub async fn list_models(
  input: &Path,
  config: Option<&Path>,
  all_schemas: bool,
  colors: &Colors,
) -> anyhow::Result<()> {
  let value = SpecLoader::open(input).await?.parse()?;
  let config = GeneratorConfig::load_or_default(config).await?;
  let version = api_version(input).unwrap_or_default();
  let (manifest, _) = Orchestrator::new(config, all_schemas).generate_version(&version, &value)?;

  let mut table = table(colors, &["MODEL", "KIND", "ORIGIN", "TYPE", "REFERENCES"]);
  for (name, model) in &manifest.models {
    let origin_role = match model.origin {
      NameOrigin::Component => Role::Primary,
      NameOrigin::Synthetic => Role::Info,
    };

    let mut row = Row::new();
    row.add_cell(
      Cell::new(name)
        .fg(colors.cell(Role::Value))
        .add_attribute(Attribute::Bold),
    );
    row.add_cell(Cell::new(model.kind).fg(colors.cell(Role::Accent)));
    row.add_cell(Cell::new(model.origin.to_string()).fg(colors.cell(origin_role)));
    row.add_cell(Cell::new(model.type_ref.to_string()).fg(colors.cell(Role::Primary)));
    row.add_cell(Cell::new(model.references.join(", ")).fg(colors.cell(Role::Timestamp)));
    table.add_row(row);
  }

  println!("{table}");

  Ok(())
}
