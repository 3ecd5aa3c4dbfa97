use serde_json::json;

use super::support::{component, petstore, with_schemas};
use crate::{
  CollectOptions, ListModels, ModelError, NameOrigin, NameRegistry, TypeMapper, collect_named_schemas,
  collect_named_schemas_into, model_references, schema::flatten_all_of,
};

#[test]
fn test_petstore_models_reachable_from_paths() {
  let doc = petstore();
  let registry = doc.collect_named_schemas(CollectOptions::default()).unwrap();

  assert_eq!(
    registry.names().collect::<Vec<_>>(),
    ["Pet", "NewPet", "NewPetStatus", "Category", "PetOwner", "Error"],
    "Unused is only reachable through components"
  );

  let origins = registry
    .iter()
    .map(|(name, model)| (name, model.origin))
    .collect::<Vec<_>>();
  assert!(origins.contains(&("NewPetStatus", NameOrigin::Synthetic)));
  assert!(origins.contains(&("PetOwner", NameOrigin::Synthetic)));
  assert!(origins.contains(&("Category", NameOrigin::Component)));
}

#[test]
fn test_components_walk_reaches_every_schema() {
  let doc = petstore();
  let registry = collect_named_schemas(&doc, doc.components(), CollectOptions::default()).unwrap();

  assert_eq!(
    registry.names().collect::<Vec<_>>(),
    ["NewPet", "NewPetStatus", "Category", "Pet", "PetOwner", "Error", "Unused"]
  );
}

#[test]
fn test_pet_all_of_flattens_new_pet() {
  let doc = petstore();
  let pet = component(&doc, "Pet");
  let flattened = flatten_all_of(&doc, pet).unwrap();

  assert_eq!(
    flattened.properties.keys().copied().collect::<Vec<_>>(),
    ["name", "tag", "status", "category", "id", "owner"]
  );
  assert!(flattened.is_required("name"));
  assert!(flattened.is_required("id"));
  assert!(!flattened.is_required("tag"));

  let new_pet = flatten_all_of(&doc, component(&doc, "NewPet")).unwrap();
  assert!(new_pet.is_required("name"));
  assert!(!new_pet.properties.contains_key("id"));
}

#[test]
fn test_acyclic_shared_schema_is_registered_once() {
  let doc = with_schemas(json!({
    "Order": {
      "type": "object",
      "properties": {
        "billing": { "$ref": "#/components/schemas/Address" },
        "shipping": { "$ref": "#/components/schemas/Address" },
        "lines": { "type": "array", "items": { "$ref": "#/components/schemas/Line" } }
      }
    },
    "Line": {
      "type": "object",
      "properties": { "ship_to": { "$ref": "#/components/schemas/Address" } }
    },
    "Address": { "type": "object", "properties": { "street": { "type": "string" } } }
  }));

  let registry = collect_named_schemas(&doc, doc.schema("Order").unwrap(), CollectOptions::default()).unwrap();
  assert_eq!(registry.names().collect::<Vec<_>>(), ["Order", "Address", "Line"]);
}

#[test]
fn test_self_and_mutual_references_terminate() {
  let doc = with_schemas(json!({
    "Node": {
      "type": "object",
      "properties": {
        "children": { "type": "array", "items": { "$ref": "#/components/schemas/Node" } },
        "parent": { "$ref": "#/components/schemas/Node" }
      }
    },
    "Ping": { "type": "object", "properties": { "pong": { "$ref": "#/components/schemas/Pong" } } },
    "Pong": { "type": "object", "properties": { "ping": { "$ref": "#/components/schemas/Ping" } } }
  }));

  let cases = [("Node", vec!["Node"]), ("Ping", vec!["Ping", "Pong"]), ("Pong", vec!["Pong", "Ping"])];
  for (root, expected) in cases {
    let registry = collect_named_schemas(&doc, doc.schema(root).unwrap(), CollectOptions::default()).unwrap();
    assert_eq!(registry.names().collect::<Vec<_>>(), expected, "failed for root {root}");
  }
}

#[test]
fn test_self_reference_without_root_registers_root_on_return() {
  let doc = with_schemas(json!({
    "Node": {
      "type": "object",
      "properties": { "next": { "$ref": "#/components/schemas/Node" } }
    }
  }));
  let options = CollectOptions {
    recursive: true,
    include_root: false,
  };

  let registry = collect_named_schemas(&doc, doc.schema("Node").unwrap(), options).unwrap();
  assert_eq!(registry.names().collect::<Vec<_>>(), ["Node"]);
}

#[test]
fn test_independent_calls_do_not_share_state() {
  let doc = petstore();
  let first = doc.collect_named_schemas(CollectOptions::default()).unwrap();
  let second = doc.collect_named_schemas(CollectOptions::default()).unwrap();

  assert_eq!(first.len(), second.len());
  assert_eq!(first.names().collect::<Vec<_>>(), second.names().collect::<Vec<_>>());
}

#[test]
fn test_caller_owned_registry_accumulates() {
  let doc = petstore();
  let mut registry = NameRegistry::new();

  collect_named_schemas_into(&doc, doc.schema("Error").unwrap(), CollectOptions::default(), &mut registry).unwrap();
  assert_eq!(registry.names().collect::<Vec<_>>(), ["Error"]);

  collect_named_schemas_into(&doc, &doc, CollectOptions::default(), &mut registry).unwrap();
  assert_eq!(
    registry.names().collect::<Vec<_>>(),
    ["Error", "Pet", "NewPet", "NewPetStatus", "Category", "PetOwner"],
    "names already present keep their position"
  );
}

#[test]
fn test_synthetic_name_colliding_with_component_is_ambiguous() {
  let doc = with_schemas(json!({
    "Pet": {
      "type": "object",
      "properties": {
        "owner": { "type": "object", "properties": { "name": { "type": "string" } } }
      }
    },
    "PetOwner": { "type": "object", "properties": { "id": { "type": "integer" } } }
  }));

  let err = collect_named_schemas(&doc, doc.components(), CollectOptions::default()).unwrap_err();
  assert_eq!(
    err,
    ModelError::AmbiguousName {
      name: "PetOwner".to_string(),
      first: "#/components/schemas/Pet/properties/owner".to_string(),
      second: "#/components/schemas/PetOwner".to_string(),
    }
  );
}

#[test]
fn test_anonymous_shapes_take_context_names() {
  let doc = with_schemas(json!({
    "Dashboard": {
      "type": "object",
      "properties": {
        "layout": { "type": "string", "enum": ["free", "ordered"] },
        "widgets": {
          "type": "array",
          "items": { "type": "object", "properties": { "id": { "type": "integer" } } }
        },
        "definition": {
          "oneOf": [
            { "type": "object", "properties": { "query": { "type": "object", "properties": { "q": { "type": "string" } } } } },
            { "type": "string" }
          ]
        },
        "labels": { "type": "object", "additionalProperties": { "type": "string" } },
        "wrapped": { "allOf": [{ "type": "object", "properties": { "w": { "type": "string" } } }] }
      }
    },
    "Series": { "type": "array", "items": { "type": "object", "properties": { "x": { "type": "number" } } } }
  }));

  let registry = collect_named_schemas(&doc, doc.components(), CollectOptions::default()).unwrap();
  assert_eq!(
    registry.names().collect::<Vec<_>>(),
    [
      "Dashboard",
      "DashboardLayout",
      "DashboardWidgets",
      "DashboardDefinition",
      "DashboardWrapped",
      "Series",
      "SeriesItem",
    ]
  );
}

#[test]
fn test_unresolved_reference_is_fatal() {
  let doc = with_schemas(json!({
    "Pet": {
      "type": "object",
      "properties": {
        "missing": { "$ref": "#/components/schemas/Missing" }
      }
    },
    "WrongSection": {
      "type": "object",
      "properties": {
        "param": { "$ref": "#/components/parameters/Missing" }
      }
    }
  }));

  let cases = [
    ("Pet", "#/components/schemas/Missing"),
    ("WrongSection", "#/components/parameters/Missing"),
  ];
  for (root, expected) in cases {
    let err = collect_named_schemas(&doc, doc.schema(root).unwrap(), CollectOptions::default()).unwrap_err();
    assert!(
      matches!(&err, ModelError::UnresolvedReference { reference, .. } if reference == expected),
      "unexpected error for {root}: {err}"
    );
  }
}

#[test]
fn test_retain_emittable_on_petstore() {
  let doc = petstore();
  let mut registry = doc.collect_named_schemas(CollectOptions::default()).unwrap();
  let before = registry.len();

  registry.retain_emittable(&ListModels::new());
  assert_eq!(registry.len(), before, "every petstore model is an object, enum or composition");
}

#[test]
fn test_anonymous_union_members_are_not_named() {
  let doc = with_schemas(json!({
    "Shape": {
      "oneOf": [
        { "type": "object", "properties": { "kind": { "type": "string", "enum": ["circle"] } } },
        { "type": "object", "properties": { "kind": { "type": "string", "enum": ["square"] } } }
      ]
    },
    "Figure": {
      "anyOf": [
        { "type": "object", "properties": { "kind": { "type": "string", "enum": ["line"] } } },
        { "type": "object", "properties": { "kind": { "type": "string", "enum": ["dot"] } } }
      ]
    }
  }));

  let registry = collect_named_schemas(&doc, doc.components(), CollectOptions::default()).unwrap();
  assert_eq!(registry.names().collect::<Vec<_>>(), ["Shape", "Figure"]);
}

#[test]
fn test_union_member_names_match_references() {
  let doc = with_schemas(json!({
    "Shape": {
      "oneOf": [
        {
          "type": "object",
          "properties": {
            "kind": { "type": "string", "enum": ["circle"] },
            "center": { "type": "object", "properties": { "x": { "type": "number" } } }
          }
        },
        { "type": "string" }
      ]
    }
  }));
  let list_models = ListModels::new();
  let shape = component(&doc, "Shape");

  let registry = collect_named_schemas(&doc, doc.components(), CollectOptions::default()).unwrap();
  let registered = registry.names().filter(|&name| name != "Shape").collect::<Vec<_>>();
  let references = model_references(&doc, shape, "Shape", &list_models).unwrap();
  assert_eq!(registered, references, "every registered name is referenced by the union");
  assert!(references.is_empty());

  let members = TypeMapper::new(&doc, &list_models).union_members(shape).unwrap();
  let rendered = members.iter().map(|m| m.type_ref.to_string()).collect::<Vec<_>>();
  assert_eq!(rendered, ["map<string, any>", "text"]);
}
