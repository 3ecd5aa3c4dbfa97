use serde_json::{Value, json};

use crate::{OpenApi, Operation, SchemaNode};

const PETSTORE_YAML: &str = include_str!("../../fixtures/petstore.yaml");

pub(super) fn petstore_value() -> Value {
  serde_yaml::from_str(PETSTORE_YAML).expect("petstore fixture is valid YAML")
}

pub(super) fn petstore() -> OpenApi {
  OpenApi::from_value(&petstore_value()).expect("petstore fixture parses")
}

/// A document whose only content is the given `components.schemas`.
pub(super) fn with_schemas(schemas: Value) -> OpenApi {
  OpenApi::from_value(&json!({
    "openapi": "3.0.3",
    "info": { "title": "Test", "version": "1.0.0" },
    "paths": {},
    "components": { "schemas": schemas }
  }))
  .expect("test document parses")
}

pub(super) fn component<'d>(doc: &'d OpenApi, name: &str) -> &'d SchemaNode {
  doc
    .schema(name)
    .unwrap_or_else(|| panic!("component '{name}' is declared"))
    .resolve(doc)
    .expect("component resolves")
}

pub(super) fn operation<'d>(doc: &'d OpenApi, operation_id: &str) -> &'d Operation {
  doc
    .operations()
    .find(|entry| entry.operation.operation_id.as_deref() == Some(operation_id))
    .unwrap_or_else(|| panic!("operation '{operation_id}' is declared"))
    .operation
}
