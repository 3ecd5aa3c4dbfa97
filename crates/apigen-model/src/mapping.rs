//! Maps schema nodes onto target-language type descriptors.
//!
//! The mapping is language neutral: [`TypeRef`] names the basic scalar kinds, the
//! container shapes, and models. Templates turn those into concrete spellings.

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::{
  document::OpenApi,
  error::Result,
  naming::{item_name, synthetic_name},
  schema::{AdditionalProperties, SchemaKind, SchemaNode, SchemaRef, SchemaType, flatten_all_of},
};

/// Array schemas that are emitted as named list wrappers instead of inline lists.
/// Supplied per API version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListModels(IndexSet<String>);

impl ListModels {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  #[must_use]
  pub fn contains(&self, name: &str) -> bool {
    self.0.contains(name)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }
}

impl<S: Into<String>> FromIterator<S> for ListModels {
  fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
    Self(iter.into_iter().map(Into::into).collect())
  }
}

/// A language-neutral type descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
  Model(String),
  Int,
  Float,
  Text,
  DateTime,
  File,
  Uuid,
  Bool,
  List(Box<TypeRef>),
  Map(Box<TypeRef>),
  /// An object with neither properties nor a value schema.
  OpaqueMap,
  /// The untyped schema: any JSON value.
  Any,
  Union(Vec<TypeRef>),
  Nullable(Box<TypeRef>),
}

impl TypeRef {
  #[must_use]
  pub fn model(&self) -> Option<&str> {
    match self {
      Self::Model(name) => Some(name),
      _ => None,
    }
  }

  fn nullable_if(self, nullable: bool) -> Self {
    if nullable { Self::Nullable(Box::new(self)) } else { self }
  }

  /// Every model named anywhere inside this type, outermost first.
  pub fn collect_models<'a>(&'a self, out: &mut IndexSet<&'a str>) {
    match self {
      Self::Model(name) => {
        out.insert(name);
      }
      Self::List(inner) | Self::Map(inner) | Self::Nullable(inner) => inner.collect_models(out),
      Self::Union(members) => members.iter().for_each(|member| member.collect_models(out)),
      Self::Int
      | Self::Float
      | Self::Text
      | Self::DateTime
      | Self::File
      | Self::Uuid
      | Self::Bool
      | Self::OpaqueMap
      | Self::Any => {}
    }
  }
}

impl fmt::Display for TypeRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Model(name) => f.write_str(name),
      Self::Int => f.write_str("int"),
      Self::Float => f.write_str("float"),
      Self::Text => f.write_str("text"),
      Self::DateTime => f.write_str("datetime"),
      Self::File => f.write_str("file"),
      Self::Uuid => f.write_str("uuid"),
      Self::Bool => f.write_str("bool"),
      Self::List(inner) => write!(f, "list<{inner}>"),
      Self::Map(inner) => write!(f, "map<string, {inner}>"),
      Self::OpaqueMap => f.write_str("map<string, any>"),
      Self::Any => f.write_str("any"),
      Self::Union(members) => write!(f, "union<{}>", members.iter().format(", ")),
      Self::Nullable(inner) => write!(f, "nullable<{inner}>"),
    }
  }
}

impl Serialize for TypeRef {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(self)
  }
}

/// One member of a `oneOf`, as the emitted sum type sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnionMember {
  pub type_ref: TypeRef,
  /// Set when the member is a model rather than an inlined scalar.
  pub model: Option<String>,
}

/// The basic scalar descriptor for a `(type, format)` pair.
#[must_use]
pub fn scalar_type(schema_type: Option<SchemaType>, format: Option<&str>) -> TypeRef {
  match schema_type {
    None => TypeRef::Any,
    Some(SchemaType::Integer) => TypeRef::Int,
    Some(SchemaType::Number) => TypeRef::Float,
    Some(SchemaType::Boolean) => TypeRef::Bool,
    Some(SchemaType::String) => match format {
      Some("date" | "date-time") => TypeRef::DateTime,
      Some("binary") => TypeRef::File,
      Some("uuid") => TypeRef::Uuid,
      _ => TypeRef::Text,
    },
    Some(SchemaType::Array) => TypeRef::List(Box::new(TypeRef::Any)),
    Some(SchemaType::Object) => TypeRef::OpaqueMap,
  }
}

/// Enums with exactly one value default to it; everything else uses `default`.
#[must_use]
pub fn default_value(node: &SchemaNode) -> Option<Value> {
  match node.enum_values() {
    Some([only]) => Some(only.to_value()),
    _ => node.meta.default.clone(),
  }
}

/// Type resolution for one document and one API version's list-model allow-list.
#[derive(Debug, Clone, Copy)]
pub struct TypeMapper<'d> {
  document: &'d OpenApi,
  list_models: &'d ListModels,
}

impl<'d> TypeMapper<'d> {
  #[must_use]
  pub fn new(document: &'d OpenApi, list_models: &'d ListModels) -> Self {
    Self { document, list_models }
  }

  #[must_use]
  pub fn document(&self) -> &'d OpenApi {
    self.document
  }

  #[must_use]
  pub fn list_models(&self) -> &'d ListModels {
    self.list_models
  }

  #[must_use]
  pub fn is_list_model(&self, name: &str) -> bool {
    self.list_models.contains(name)
  }

  /// Whether a named node is emitted as a model of its own.
  #[must_use]
  pub fn emits_model(&self, node: &SchemaNode) -> bool {
    let Some(name) = node.name() else {
      return false;
    };
    match &node.kind {
      SchemaKind::Object { .. } | SchemaKind::Enum { .. } | SchemaKind::OneOf(_) | SchemaKind::AllOf(_) => true,
      SchemaKind::Array { .. } => self.is_list_model(name),
      SchemaKind::AnyOf(_) | SchemaKind::Primitive(_) => node.meta.declared_type == Some(SchemaType::Object),
    }
  }

  pub fn resolve_type(&self, slot: &'d SchemaRef) -> Result<TypeRef> {
    self.resolve_type_in(slot, None)
  }

  pub fn resolve_type_name(&self, slot: &'d SchemaRef) -> Result<String> {
    Ok(self.resolve_type(slot)?.to_string())
  }

  /// The type of `property` inside the model `parent`, with anonymous nested models
  /// named the same way the registry names them.
  pub fn property_type(&self, parent: &str, property: &str, slot: &'d SchemaRef) -> Result<TypeRef> {
    let candidate = synthetic_name(parent, property);
    self.resolve_type_in(slot, Some(&candidate))
  }

  /// Resolves `slot`, using `candidate` as the model name of an anonymous node that
  /// wants one.
  pub fn resolve_type_in(&self, slot: &'d SchemaRef, candidate: Option<&str>) -> Result<TypeRef> {
    let node = slot.resolve(self.document)?;
    self.node_type(node, candidate)
  }

  /// The type of a node as the body of its own model: a named array maps to its list
  /// shape here even when it is emitted as a wrapper.
  pub fn model_type(&self, name: &str, node: &'d SchemaNode) -> Result<TypeRef> {
    match &node.kind {
      SchemaKind::Array { items, .. } => self.list_type(items, Some(&item_name(name))),
      _ => self.node_type(node, Some(name)),
    }
  }

  pub fn node_type(&self, node: &'d SchemaNode, candidate: Option<&str>) -> Result<TypeRef> {
    if let Some(name) = node.name()
      && self.emits_model(node)
    {
      return Ok(TypeRef::Model(name.to_string()));
    }

    if let Some(member) = node.single_all_of_member() {
      return self.resolve_type_in(member, candidate);
    }

    if node.name().is_none()
      && node.wants_synthetic_name()
      && let Some(candidate) = candidate
    {
      return Ok(TypeRef::Model(candidate.to_string()));
    }

    match &node.kind {
      SchemaKind::Primitive(primitive) => Ok(scalar_type(
        primitive.primitive.map(|p| p.schema_type()),
        node.meta.format.as_deref(),
      )),
      SchemaKind::Enum { .. } | SchemaKind::AnyOf(_) => {
        Ok(scalar_type(node.schema_type(), node.meta.format.as_deref()))
      }
      SchemaKind::Array { items, .. } => {
        let items_candidate = node.name().map(item_name);
        self.list_type(items, items_candidate.as_deref().or(candidate))
      }
      SchemaKind::Object {
        additional_properties, ..
      } => match additional_properties {
        AdditionalProperties::Schema(value) => {
          let value_node = value.resolve(self.document)?;
          let value_type = self.node_type(value_node, None)?.nullable_if(value_node.is_nullable());
          Ok(TypeRef::Map(Box::new(value_type)))
        }
        AdditionalProperties::Absent | AdditionalProperties::Allowed(_) => Ok(TypeRef::OpaqueMap),
      },
      SchemaKind::OneOf(_) => {
        let members = self.union_members(node)?;
        Ok(TypeRef::Union(members.into_iter().map(|member| member.type_ref).collect()))
      }
      SchemaKind::AllOf(_) => Ok(TypeRef::OpaqueMap),
    }
  }

  fn list_type(&self, items: &'d SchemaRef, candidate: Option<&str>) -> Result<TypeRef> {
    let items_node = items.resolve(self.document)?;
    let items_type = self.node_type(items_node, candidate)?.nullable_if(items_node.is_nullable());
    Ok(TypeRef::List(Box::new(items_type)))
  }

  /// The members of a `oneOf`: objects and allow-listed arrays keep their model name,
  /// anything else is inlined as its basic type.
  pub fn union_members(&self, node: &'d SchemaNode) -> Result<Vec<UnionMember>> {
    node
      .variants()
      .iter()
      .map(|variant| {
        let member = variant.resolve(self.document)?;
        let schema_type = member.schema_type().unwrap_or(SchemaType::Object);
        match member.name() {
          Some(name) if schema_type == SchemaType::Object || self.is_list_model(name) => Ok(UnionMember {
            type_ref: TypeRef::Model(name.to_string()),
            model: Some(name.to_string()),
          }),
          _ => Ok(UnionMember {
            type_ref: self.node_type(member, None)?,
            model: None,
          }),
        }
      })
      .collect()
  }

  /// First-seen union of the properties of every object member of a `oneOf`, typed in
  /// the context of the member that declares them.
  pub fn union_parameters(&self, node: &'d SchemaNode) -> Result<IndexMap<&'d str, TypeRef>> {
    let mut parameters = IndexMap::new();
    for variant in node.variants() {
      let member = variant.resolve(self.document)?;
      let Some(properties) = member.properties() else {
        continue;
      };
      for (name, property) in properties {
        if parameters.contains_key(name.as_str()) {
          continue;
        }
        let type_ref = match member.name() {
          Some(parent) => self.property_type(parent, name, property)?,
          None => self.resolve_type(property)?,
        };
        parameters.insert(name.as_str(), type_ref);
      }
    }
    Ok(parameters)
  }

  /// Other models the emitted type of `model_name` refers to, in first-seen order.
  pub fn model_references(&self, model_name: &str, node: &'d SchemaNode) -> Result<Vec<String>> {
    let mut types = vec![];
    match &node.kind {
      SchemaKind::Object {
        properties,
        additional_properties,
        ..
      } => {
        for (property, slot) in properties {
          types.push(self.property_type(model_name, property, slot)?);
        }
        if let AdditionalProperties::Schema(value) = additional_properties {
          types.push(self.resolve_type(value)?);
        }
      }
      SchemaKind::AllOf(_) => {
        let flattened = flatten_all_of(self.document, node)?;
        for (&property, &slot) in &flattened.properties {
          let parent = flattened.declaring_model(property).unwrap_or(model_name);
          types.push(self.property_type(parent, property, slot)?);
        }
      }
      SchemaKind::OneOf(_) => {
        types.extend(self.union_members(node)?.into_iter().map(|member| member.type_ref));
      }
      SchemaKind::Array { .. } => types.push(self.model_type(model_name, node)?),
      SchemaKind::Enum { .. } | SchemaKind::AnyOf(_) | SchemaKind::Primitive(_) => {}
    }

    let mut names = IndexSet::new();
    for type_ref in &types {
      type_ref.collect_models(&mut names);
    }
    names.shift_remove(model_name);
    Ok(names.into_iter().map(String::from).collect())
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  fn document(schemas: Value) -> OpenApi {
    OpenApi::from_value(&json!({
      "openapi": "3.0.3",
      "info": { "title": "t", "version": "1" },
      "paths": {},
      "components": { "schemas": schemas }
    }))
    .unwrap()
  }

  fn type_of(doc: &OpenApi, list_models: &ListModels, name: &str) -> String {
    let mapper = TypeMapper::new(doc, list_models);
    mapper.resolve_type_name(doc.schema(name).unwrap()).unwrap()
  }

  #[test]
  fn test_scalar_table() {
    let cases = [
      (Some(SchemaType::Integer), None, "int"),
      (Some(SchemaType::Number), Some("double"), "float"),
      (Some(SchemaType::String), None, "text"),
      (Some(SchemaType::String), Some("date"), "datetime"),
      (Some(SchemaType::String), Some("date-time"), "datetime"),
      (Some(SchemaType::String), Some("binary"), "file"),
      (Some(SchemaType::String), Some("uuid"), "uuid"),
      (Some(SchemaType::String), Some("email"), "text"),
      (Some(SchemaType::Boolean), None, "bool"),
      (None, None, "any"),
    ];
    for (schema_type, format, expected) in cases {
      assert_eq!(
        scalar_type(schema_type, format).to_string(),
        expected,
        "failed for {schema_type:?} / {format:?}"
      );
    }
  }

  #[test]
  fn test_named_and_anonymous_types() {
    let doc = document(json!({
      "Pet": { "type": "object", "properties": { "id": { "type": "integer" } } },
      "Status": { "type": "string", "enum": ["a", "b"] },
      "Pets": { "type": "array", "items": { "$ref": "#/components/schemas/Pet" } },
      "Points": { "type": "array", "items": { "type": "number" } },
      "Labels": { "type": "object", "additionalProperties": { "type": "string", "nullable": true } },
      "Blob": { "type": "object" },
      "Anything": {},
      "Alias": { "$ref": "#/components/schemas/Pet" },
      "Id": { "type": "string", "format": "uuid" },
      "Grid": { "type": "array", "items": { "type": "array", "items": { "type": "integer", "nullable": true } } }
    }));
    let list_models = ["Points"].into_iter().collect::<ListModels>();

    let cases = [
      ("Pet", "Pet"),
      ("Status", "Status"),
      ("Pets", "list<Pet>"),
      ("Points", "Points"),
      ("Labels", "Labels"),
      ("Blob", "Blob"),
      ("Anything", "any"),
      ("Alias", "Pet"),
      ("Id", "uuid"),
      ("Grid", "list<list<nullable<int>>>"),
    ];
    for (name, expected) in cases {
      assert_eq!(type_of(&doc, &list_models, name), expected, "failed for {name}");
    }
  }

  #[test]
  fn test_property_types_use_synthetic_names() {
    let doc = document(json!({
      "Pet": {
        "type": "object",
        "properties": {
          "owner": { "type": "object", "properties": { "name": { "type": "string" } } },
          "status": { "type": "string", "enum": ["available", "sold"] },
          "tags": { "type": "array", "items": { "type": "object", "properties": { "k": { "type": "string" } } } },
          "meta": { "type": "object", "additionalProperties": { "type": "integer" } },
          "extra": { "type": "object" },
          "category": { "allOf": [{ "$ref": "#/components/schemas/Category" }], "description": "wrapped" }
        }
      },
      "Category": { "type": "object", "properties": { "id": { "type": "integer" } } }
    }));
    let list_models = ListModels::new();
    let mapper = TypeMapper::new(&doc, &list_models);
    let pet = doc.schema("Pet").unwrap().as_owned().unwrap();

    let cases = [
      ("owner", "PetOwner"),
      ("status", "PetStatus"),
      ("tags", "list<PetTags>"),
      ("meta", "map<string, int>"),
      ("extra", "map<string, any>"),
      ("category", "Category"),
    ];
    for (property, expected) in cases {
      let slot = pet.property(property).unwrap();
      assert_eq!(
        mapper.property_type("Pet", property, slot).unwrap().to_string(),
        expected,
        "failed for {property}"
      );
    }
  }

  #[test]
  fn test_union_members_and_parameters() {
    let doc = document(json!({
      "Cat": { "type": "object", "properties": { "name": { "type": "string" }, "lives": { "type": "integer" } } },
      "Dog": { "type": "object", "properties": { "name": { "type": "string" }, "breed": { "type": "string" } } },
      "Tags": { "type": "array", "items": { "type": "string" } },
      "Animal": {
        "oneOf": [
          { "$ref": "#/components/schemas/Cat" },
          { "$ref": "#/components/schemas/Dog" },
          { "$ref": "#/components/schemas/Tags" },
          { "type": "string" }
        ]
      }
    }));
    let list_models = ["Tags"].into_iter().collect::<ListModels>();
    let mapper = TypeMapper::new(&doc, &list_models);
    let animal = doc.schema("Animal").unwrap().as_owned().unwrap();

    let members = mapper.union_members(animal).unwrap();
    let rendered = members.iter().map(|m| m.type_ref.to_string()).collect::<Vec<_>>();
    assert_eq!(rendered, ["Cat", "Dog", "Tags", "text"]);
    assert_eq!(members[3].model, None);
    assert!(mapper.is_list_model("Tags"));
    assert!(!mapper.is_list_model("Cat"));

    let parameters = mapper
      .union_parameters(animal)
      .unwrap()
      .into_iter()
      .map(|(name, type_ref)| (name, type_ref.to_string()))
      .collect::<Vec<_>>();
    assert_eq!(
      parameters,
      [
        ("name", "text".to_string()),
        ("lives", "int".to_string()),
        ("breed", "text".to_string())
      ]
    );

    assert_eq!(mapper.model_type("Animal", animal).unwrap().to_string(), "Animal");
    assert_eq!(
      mapper.model_references("Animal", animal).unwrap(),
      ["Cat", "Dog", "Tags"]
    );
  }

  #[test]
  fn test_anonymous_one_of_renders_as_union() {
    let doc = document(json!({
      "Holder": {
        "type": "object",
        "properties": { "value": { "oneOf": [{ "type": "string" }, { "type": "integer" }] } }
      }
    }));
    let list_models = ListModels::new();
    let mapper = TypeMapper::new(&doc, &list_models);
    let holder = doc.schema("Holder").unwrap().as_owned().unwrap();
    let value = holder.property("value").unwrap();

    assert_eq!(mapper.resolve_type_name(value).unwrap(), "union<text, int>");
    assert_eq!(mapper.property_type("Holder", "value", value).unwrap().to_string(), "HolderValue");
  }

  #[test]
  fn test_default_value() {
    let doc = document(json!({
      "Single": { "type": "string", "enum": ["only"] },
      "Many": { "type": "string", "enum": ["a", "b"], "default": "b" },
      "Plain": { "type": "integer", "default": 7 },
      "None": { "type": "integer" }
    }));
    let cases = [
      ("Single", Some(json!("only"))),
      ("Many", Some(json!("b"))),
      ("Plain", Some(json!(7))),
      ("None", None),
    ];
    for (name, expected) in cases {
      let node = doc.schema(name).unwrap().as_owned().unwrap();
      assert_eq!(default_value(node), expected, "failed for {name}");
    }
  }

  #[test]
  fn test_model_references() {
    let doc = document(json!({
      "Pet": {
        "type": "object",
        "properties": {
          "category": { "$ref": "#/components/schemas/Category" },
          "tags": { "type": "array", "items": { "$ref": "#/components/schemas/Tag" } },
          "owner": { "type": "object", "properties": { "name": { "type": "string" } } },
          "parent": { "$ref": "#/components/schemas/Pet" },
          "name": { "type": "string" }
        },
        "additionalProperties": { "$ref": "#/components/schemas/Category" }
      },
      "Category": { "type": "object", "properties": { "id": { "type": "integer" } } },
      "Tag": { "type": "object", "properties": { "id": { "type": "integer" } } }
    }));
    let list_models = ListModels::new();
    let mapper = TypeMapper::new(&doc, &list_models);
    let pet = doc.schema("Pet").unwrap().as_owned().unwrap();

    assert_eq!(
      mapper.model_references("Pet", pet).unwrap(),
      ["Category", "Tag", "PetOwner"]
    );
  }
}
