//! The typed schema graph.
//!
//! Every schema position in a document is a [`SchemaRef`]: either an owned
//! [`SchemaNode`] or a lazy reference to a component schema. Nodes own their children
//! by value, so the tree mirrors the document while cycles only ever pass through
//! references.

mod flatten;
mod parse;
mod serialize;

use indexmap::{IndexMap, IndexSet};
use serde_json::{Number, Value};
use strum::{Display, EnumString, IntoStaticStr};

pub use self::flatten::{FlattenedObject, flatten_all_of};
use crate::{
  document::Components,
  reference::{Component, ComponentSection, ObjectOrRef},
};

pub type SchemaRef = ObjectOrRef<SchemaNode>;

/// The values accepted by the `type` keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase")]
pub enum SchemaType {
  String,
  Number,
  Integer,
  Boolean,
  Array,
  Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum PrimitiveType {
  String,
  Number,
  Integer,
  Boolean,
}

impl PrimitiveType {
  #[must_use]
  pub const fn schema_type(self) -> SchemaType {
    match self {
      Self::String => SchemaType::String,
      Self::Number => SchemaType::Number,
      Self::Integer => SchemaType::Integer,
      Self::Boolean => SchemaType::Boolean,
    }
  }

  fn from_schema_type(schema_type: SchemaType) -> Option<Self> {
    match schema_type {
      SchemaType::String => Some(Self::String),
      SchemaType::Number => Some(Self::Number),
      SchemaType::Integer => Some(Self::Integer),
      SchemaType::Boolean => Some(Self::Boolean),
      SchemaType::Array | SchemaType::Object => None,
    }
  }
}

/// Validation keywords kept on primitives. They are carried through for emitters and
/// never enforced here.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
  pub minimum: Option<Number>,
  pub maximum: Option<Number>,
  pub exclusive_minimum: bool,
  pub exclusive_maximum: bool,
  pub min_length: Option<u64>,
  pub max_length: Option<u64>,
  pub pattern: Option<String>,
}

impl Constraints {
  #[must_use]
  pub fn is_empty(&self) -> bool {
    *self == Self::default()
  }
}

/// Fields every schema variant carries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaMeta {
  /// Model name. Set for component schemas, empty for inline nodes.
  pub name: Option<String>,
  /// JSON pointer of the node inside its document.
  pub pointer: String,
  pub title: Option<String>,
  pub description: Option<String>,
  pub declared_type: Option<SchemaType>,
  pub format: Option<String>,
  pub nullable: bool,
  pub deprecated: bool,
  pub read_only: bool,
  pub write_only: bool,
  pub default: Option<Value>,
  pub example: Option<Value>,
  pub extensions: IndexMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveSchema {
  /// `None` is the untyped schema that accepts any value.
  pub primitive: Option<PrimitiveType>,
  pub constraints: Constraints,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
  String(String),
  Number(Number),
}

impl EnumValue {
  #[must_use]
  pub fn to_value(&self) -> Value {
    match self {
      Self::String(s) => Value::String(s.clone()),
      Self::Number(n) => Value::Number(n.clone()),
    }
  }
}

#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
  #[default]
  Absent,
  Allowed(bool),
  Schema(Box<SchemaRef>),
}

impl AdditionalProperties {
  #[must_use]
  pub fn schema(&self) -> Option<&SchemaRef> {
    match self {
      Self::Schema(schema) => Some(schema),
      Self::Absent | Self::Allowed(_) => None,
    }
  }

  #[must_use]
  pub fn is_absent(&self) -> bool {
    matches!(self, Self::Absent)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
#[strum(serialize_all = "camelCase")]
pub enum SchemaKindTag {
  Primitive,
  Array,
  Object,
  Enum,
  OneOf,
  AllOf,
  AnyOf,
}

#[derive(Debug, Clone)]
pub enum SchemaKind {
  Primitive(PrimitiveSchema),
  Array {
    items: Box<SchemaRef>,
    min_items: Option<u64>,
    max_items: Option<u64>,
  },
  Object {
    properties: IndexMap<String, SchemaRef>,
    required: IndexSet<String>,
    additional_properties: AdditionalProperties,
  },
  Enum {
    values: Vec<EnumValue>,
  },
  OneOf(Vec<SchemaRef>),
  AllOf(Vec<SchemaRef>),
  AnyOf(Vec<SchemaRef>),
}

#[derive(Debug, Clone)]
pub struct SchemaNode {
  pub meta: SchemaMeta,
  pub kind: SchemaKind,
}

impl SchemaNode {
  #[must_use]
  pub fn name(&self) -> Option<&str> {
    self.meta.name.as_deref()
  }

  #[must_use]
  pub fn is_named(&self) -> bool {
    self.meta.name.is_some()
  }

  #[must_use]
  pub fn is_nullable(&self) -> bool {
    self.meta.nullable
  }

  #[must_use]
  pub fn tag(&self) -> SchemaKindTag {
    match &self.kind {
      SchemaKind::Primitive(_) => SchemaKindTag::Primitive,
      SchemaKind::Array { .. } => SchemaKindTag::Array,
      SchemaKind::Object { .. } => SchemaKindTag::Object,
      SchemaKind::Enum { .. } => SchemaKindTag::Enum,
      SchemaKind::OneOf(_) => SchemaKindTag::OneOf,
      SchemaKind::AllOf(_) => SchemaKindTag::AllOf,
      SchemaKind::AnyOf(_) => SchemaKindTag::AnyOf,
    }
  }

  /// The `type` this node stands for: the declared one, or the one implied by its shape.
  #[must_use]
  pub fn schema_type(&self) -> Option<SchemaType> {
    if let Some(declared) = self.meta.declared_type {
      return Some(declared);
    }
    match &self.kind {
      SchemaKind::Primitive(primitive) => primitive.primitive.map(PrimitiveType::schema_type),
      SchemaKind::Array { .. } => Some(SchemaType::Array),
      SchemaKind::Object { .. } => Some(SchemaType::Object),
      SchemaKind::Enum { values } => match values.first() {
        Some(EnumValue::String(_)) => Some(SchemaType::String),
        Some(EnumValue::Number(n)) if n.is_f64() => Some(SchemaType::Number),
        Some(EnumValue::Number(_)) => Some(SchemaType::Integer),
        None => None,
      },
      SchemaKind::OneOf(_) | SchemaKind::AllOf(_) | SchemaKind::AnyOf(_) => None,
    }
  }

  /// Whether an anonymous node of this shape becomes a model of its own and so needs a
  /// synthesized name. Objects without declared properties are maps, and an `allOf`
  /// with a single member stands for that member.
  #[must_use]
  pub fn wants_synthetic_name(&self) -> bool {
    match &self.kind {
      SchemaKind::Object { properties, .. } => !properties.is_empty(),
      SchemaKind::Enum { .. } | SchemaKind::OneOf(_) => true,
      SchemaKind::AllOf(members) => members.len() > 1,
      SchemaKind::Primitive(_) | SchemaKind::Array { .. } | SchemaKind::AnyOf(_) => false,
    }
  }

  /// The wrapped schema of an `allOf` with exactly one member.
  #[must_use]
  pub fn single_all_of_member(&self) -> Option<&SchemaRef> {
    match &self.kind {
      SchemaKind::AllOf(members) if members.len() == 1 => members.first(),
      _ => None,
    }
  }

  #[must_use]
  pub fn is_object(&self) -> bool {
    matches!(self.kind, SchemaKind::Object { .. })
  }

  #[must_use]
  pub fn is_array(&self) -> bool {
    matches!(self.kind, SchemaKind::Array { .. })
  }

  #[must_use]
  pub fn is_enum(&self) -> bool {
    matches!(self.kind, SchemaKind::Enum { .. })
  }

  #[must_use]
  pub fn is_one_of(&self) -> bool {
    matches!(self.kind, SchemaKind::OneOf(_))
  }

  #[must_use]
  pub fn properties(&self) -> Option<&IndexMap<String, SchemaRef>> {
    match &self.kind {
      SchemaKind::Object { properties, .. } => Some(properties),
      _ => None,
    }
  }

  #[must_use]
  pub fn property(&self, name: &str) -> Option<&SchemaRef> {
    self.properties().and_then(|properties| properties.get(name))
  }

  #[must_use]
  pub fn is_required(&self, property: &str) -> bool {
    match &self.kind {
      SchemaKind::Object { required, .. } => required.contains(property),
      _ => false,
    }
  }

  #[must_use]
  pub fn additional_properties(&self) -> Option<&AdditionalProperties> {
    match &self.kind {
      SchemaKind::Object {
        additional_properties, ..
      } => Some(additional_properties),
      _ => None,
    }
  }

  #[must_use]
  pub fn items(&self) -> Option<&SchemaRef> {
    match &self.kind {
      SchemaKind::Array { items, .. } => Some(items),
      _ => None,
    }
  }

  #[must_use]
  pub fn enum_values(&self) -> Option<&[EnumValue]> {
    match &self.kind {
      SchemaKind::Enum { values } => Some(values),
      _ => None,
    }
  }

  /// Members of a `oneOf`, `allOf` or `anyOf`; empty for every other variant.
  #[must_use]
  pub fn variants(&self) -> &[SchemaRef] {
    match &self.kind {
      SchemaKind::OneOf(variants) | SchemaKind::AllOf(variants) | SchemaKind::AnyOf(variants) => variants,
      _ => &[],
    }
  }
}

impl Component for SchemaNode {
  const SECTION: ComponentSection = ComponentSection::Schemas;

  fn section(components: &Components) -> &IndexMap<String, SchemaRef> {
    &components.schemas
  }
}
