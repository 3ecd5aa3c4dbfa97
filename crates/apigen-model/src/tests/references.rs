use std::ptr;

use serde_json::json;

use super::support::{component, petstore, petstore_value, with_schemas};
use crate::{ModelError, OpenApi, SchemaKind};

#[test]
fn test_resolution_is_memoized_per_reference() {
  let doc = petstore();
  let new_pet = component(&doc, "NewPet");
  let reference = new_pet.property("category").unwrap().as_reference().unwrap();

  assert!(!reference.is_resolved());
  let first = reference.resolve(&doc).unwrap();
  assert!(reference.is_resolved());
  let second = reference.resolve(&doc).unwrap();

  assert!(ptr::eq(first, second));
  assert!(ptr::eq(first, doc.schema("Category").unwrap()));
}

#[test]
fn test_cloned_reference_keeps_the_memo() {
  let doc = petstore();
  let reference = component(&doc, "NewPet").property("category").unwrap().as_reference().unwrap();
  reference.resolve(&doc).unwrap();

  let cloned = reference.clone();
  assert!(cloned.is_resolved());
  assert!(ptr::eq(cloned.resolve(&doc).unwrap(), reference.resolve(&doc).unwrap()));
}

#[test]
fn test_self_reference_resolves_to_enclosing_component() {
  let doc = petstore();
  let category = component(&doc, "Category");
  let parent = category.property("parent").unwrap().resolve(&doc).unwrap();

  assert!(ptr::eq(parent, category));
}

#[test]
fn test_foreign_document_is_rejected() {
  let value = petstore_value();
  let first = OpenApi::from_value(&value).unwrap();
  let second = OpenApi::from_value(&value).unwrap();
  assert_ne!(first.id(), second.id());

  let slot = component(&first, "NewPet").property("category").unwrap();
  let err = slot.resolve(&second).unwrap_err();
  assert_eq!(
    err,
    ModelError::ForeignDocument {
      reference: "#/components/schemas/Category".to_string(),
    }
  );

  assert!(slot.resolve(&first).is_ok(), "the owning document still resolves");
}

#[test]
fn test_alias_chains_resolve_to_the_owned_node() {
  let doc = with_schemas(json!({
    "Id": { "type": "string", "format": "uuid" },
    "PetId": { "$ref": "#/components/schemas/Id" },
    "OwnerPetId": { "$ref": "#/components/schemas/PetId" }
  }));

  let resolved = doc.schema("OwnerPetId").unwrap().resolve(&doc).unwrap();
  assert_eq!(resolved.name(), Some("Id"));
  assert!(matches!(resolved.kind, SchemaKind::Primitive(_)));
}

#[test]
fn test_alias_cycle_is_reported() {
  let doc = with_schemas(json!({
    "A": { "$ref": "#/components/schemas/B" },
    "B": { "$ref": "#/components/schemas/A" }
  }));

  let err = doc.schema("A").unwrap().resolve(&doc).unwrap_err();
  assert!(
    matches!(&err, ModelError::UnresolvedReference { reason, .. } if reason.contains("alias chain")),
    "unexpected error: {err}"
  );
}

#[test]
fn test_component_parameters_and_responses_resolve() {
  let doc = petstore();
  let path_item = &doc.paths["/pet/{petId}"];

  let parameter = doc.resolve_parameter(&path_item.parameters[0]).unwrap();
  assert_eq!(parameter.name, "petId");
  assert!(parameter.required);

  let get = &path_item.operations[&http::Method::GET];
  let not_found = doc.resolve_response(&get.responses["404"]).unwrap();
  assert_eq!(not_found.description.as_deref(), Some("Pet not found"));
  assert!(not_found.content.is_empty());
}
