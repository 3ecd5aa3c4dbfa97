use apigen_model::SchemaKind;
use strum::Display;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerationStats {
  pub versions: usize,
  pub operations: usize,
  pub api_groups: usize,
  pub models: usize,
  pub objects: usize,
  pub enums: usize,
  pub unions: usize,
  pub list_wrappers: usize,
  pub cycles_detected: usize,
  pub cycle_details: Vec<Vec<String>>,
  pub warnings: Vec<GenerationWarning>,
}

impl GenerationStats {
  pub fn record_version(&mut self) {
    self.versions += 1;
  }

  pub fn record_api_group(&mut self, operations: usize) {
    self.api_groups += 1;
    self.operations += operations;
  }

  pub fn record_model(&mut self, kind: &SchemaKind) {
    self.models += 1;
    match kind {
      SchemaKind::Object { .. } | SchemaKind::AllOf(_) => self.objects += 1,
      SchemaKind::Enum { .. } => self.enums += 1,
      SchemaKind::OneOf(_) => self.unions += 1,
      SchemaKind::Array { .. } => self.list_wrappers += 1,
      SchemaKind::AnyOf(_) | SchemaKind::Primitive(_) => {}
    }
  }

  pub fn record_cycles(&mut self, cycles: Vec<Vec<String>>) {
    self.cycles_detected += cycles.len();
    self.cycle_details.extend(cycles);
  }

  pub fn record_warning(&mut self, warning: GenerationWarning) {
    self.warnings.push(warning);
  }

  /// Folds the counters of another version's run into this one.
  pub fn merge(&mut self, other: Self) {
    self.versions += other.versions;
    self.operations += other.operations;
    self.api_groups += other.api_groups;
    self.models += other.models;
    self.objects += other.objects;
    self.enums += other.enums;
    self.unions += other.unions;
    self.list_wrappers += other.list_wrappers;
    self.cycles_detected += other.cycles_detected;
    self.cycle_details.extend(other.cycle_details);
    self.warnings.extend(other.warnings);
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum GenerationWarning {
  #[strum(to_string = "[{version}] parameter '{parameter}' of '{operation_id}' has no schema")]
  ParameterWithoutSchema {
    version: String,
    operation_id: String,
    parameter: String,
  },
  #[strum(to_string = "[{version}] '{operation_id}' has a response without content, accepting */*")]
  AcceptWildcard { version: String, operation_id: String },
  #[strum(to_string = "[{version}] property '{property}' of '{model}' is an object without properties")]
  OpaqueProperty {
    version: String,
    model: String,
    property: String,
  },
}

impl GenerationWarning {
  pub fn is_skipped_item(&self) -> bool {
    matches!(self, Self::ParameterWithoutSchema { .. })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_merge_adds_counters_and_keeps_details() {
    let mut total = GenerationStats::default();
    let mut v1 = GenerationStats::default();
    v1.record_version();
    v1.record_api_group(3);
    v1.record_cycles(vec![vec!["A".to_string(), "B".to_string()]]);
    let mut v2 = GenerationStats::default();
    v2.record_version();
    v2.record_api_group(2);
    v2.record_warning(GenerationWarning::AcceptWildcard {
      version: "v2".to_string(),
      operation_id: "health".to_string(),
    });

    total.merge(v1);
    total.merge(v2);

    assert_eq!(total.versions, 2);
    assert_eq!(total.operations, 5);
    assert_eq!(total.api_groups, 2);
    assert_eq!(total.cycles_detected, 1);
    assert_eq!(total.cycle_details, vec![vec!["A".to_string(), "B".to_string()]]);
    assert_eq!(total.warnings.len(), 1);
  }

  #[test]
  fn test_warning_messages() {
    let cases = [
      (
        GenerationWarning::ParameterWithoutSchema {
          version: "v1".to_string(),
          operation_id: "findPets".to_string(),
          parameter: "X-Trace".to_string(),
        },
        "[v1] parameter 'X-Trace' of 'findPets' has no schema",
        true,
      ),
      (
        GenerationWarning::OpaqueProperty {
          version: "v2".to_string(),
          model: "Pet".to_string(),
          property: "extra".to_string(),
        },
        "[v2] property 'extra' of 'Pet' is an object without properties",
        false,
      ),
    ];
    for (warning, expected, skipped) in cases {
      assert_eq!(warning.to_string(), expected);
      assert_eq!(warning.is_skipped_item(), skipped, "failed for {expected}");
    }
  }
}
