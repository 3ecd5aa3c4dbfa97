use serde::{Serialize, Serializer, ser::SerializeMap};
use serde_json::Value;

use super::{AdditionalProperties, EnumValue, SchemaKind, SchemaNode, SchemaType};

impl SchemaNode {
  /// Re-serializes the node into raw document form. Property, `required` and `enum`
  /// order are kept as parsed.
  pub fn to_value(&self) -> serde_json::Result<Value> {
    serde_json::to_value(self)
  }
}

impl Serialize for SchemaType {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(<&'static str>::from(*self))
  }
}

impl Serialize for EnumValue {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::String(s) => serializer.serialize_str(s),
      Self::Number(n) => n.serialize(serializer),
    }
  }
}

impl Serialize for AdditionalProperties {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Absent => serializer.serialize_none(),
      Self::Allowed(allowed) => serializer.serialize_bool(*allowed),
      Self::Schema(schema) => schema.serialize(serializer),
    }
  }
}

impl Serialize for SchemaNode {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let meta = &self.meta;
    let mut map = serializer.serialize_map(None)?;

    if let Some(schema_type) = meta.declared_type {
      map.serialize_entry("type", &schema_type)?;
    }
    if let Some(format) = &meta.format {
      map.serialize_entry("format", format)?;
    }
    if let Some(title) = &meta.title {
      map.serialize_entry("title", title)?;
    }
    if let Some(description) = &meta.description {
      map.serialize_entry("description", description)?;
    }

    match &self.kind {
      SchemaKind::Primitive(primitive) => {
        let constraints = &primitive.constraints;
        if let Some(minimum) = &constraints.minimum {
          map.serialize_entry("minimum", minimum)?;
        }
        if constraints.exclusive_minimum {
          map.serialize_entry("exclusiveMinimum", &true)?;
        }
        if let Some(maximum) = &constraints.maximum {
          map.serialize_entry("maximum", maximum)?;
        }
        if constraints.exclusive_maximum {
          map.serialize_entry("exclusiveMaximum", &true)?;
        }
        if let Some(min_length) = constraints.min_length {
          map.serialize_entry("minLength", &min_length)?;
        }
        if let Some(max_length) = constraints.max_length {
          map.serialize_entry("maxLength", &max_length)?;
        }
        if let Some(pattern) = &constraints.pattern {
          map.serialize_entry("pattern", pattern)?;
        }
      }
      SchemaKind::Array {
        items,
        min_items,
        max_items,
      } => {
        map.serialize_entry("items", items)?;
        if let Some(min_items) = min_items {
          map.serialize_entry("minItems", min_items)?;
        }
        if let Some(max_items) = max_items {
          map.serialize_entry("maxItems", max_items)?;
        }
      }
      SchemaKind::Object {
        properties,
        required,
        additional_properties,
      } => {
        if !properties.is_empty() {
          map.serialize_entry("properties", properties)?;
        }
        if !required.is_empty() {
          map.serialize_entry("required", required)?;
        }
        if !additional_properties.is_absent() {
          map.serialize_entry("additionalProperties", additional_properties)?;
        }
      }
      SchemaKind::Enum { values } => map.serialize_entry("enum", values)?,
      SchemaKind::OneOf(variants) => map.serialize_entry("oneOf", variants)?,
      SchemaKind::AllOf(variants) => map.serialize_entry("allOf", variants)?,
      SchemaKind::AnyOf(variants) => map.serialize_entry("anyOf", variants)?,
    }

    if meta.nullable {
      map.serialize_entry("nullable", &true)?;
    }
    if meta.deprecated {
      map.serialize_entry("deprecated", &true)?;
    }
    if meta.read_only {
      map.serialize_entry("readOnly", &true)?;
    }
    if meta.write_only {
      map.serialize_entry("writeOnly", &true)?;
    }
    if let Some(default) = &meta.default {
      map.serialize_entry("default", default)?;
    }
    if let Some(example) = &meta.example {
      map.serialize_entry("example", example)?;
    }
    for (key, value) in &meta.extensions {
      map.serialize_entry(key, value)?;
    }

    map.end()
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use crate::{raw::ParseContext, schema::SchemaNode};

  fn round_trip(raw: &serde_json::Value) -> serde_json::Value {
    let slot = SchemaNode::parse(raw, &ParseContext::new(), "#", None).unwrap();
    serde_json::to_value(&slot).unwrap()
  }

  #[test]
  fn test_required_order_survives_round_trip() {
    let raw = json!({
      "type": "object",
      "properties": { "zeta": { "type": "string" }, "alpha": { "type": "integer" }, "mid": {} },
      "required": ["zeta", "mid", "alpha"]
    });
    let value = round_trip(&raw);
    assert_eq!(value["required"], json!(["zeta", "mid", "alpha"]));
    let keys = value["properties"].as_object().unwrap().keys().collect::<Vec<_>>();
    assert_eq!(keys, ["zeta", "alpha", "mid"]);
  }

  #[test]
  fn test_enum_order_and_nullable_survive_round_trip() {
    let cases = [
      (json!({ "type": "string", "enum": ["z", "a", "m"] }), json!(["z", "a", "m"]), false),
      (json!({ "type": "integer", "enum": [3, 1, 2], "nullable": true }), json!([3, 1, 2]), true),
      (json!({ "type": "string", "enum": ["only"] }), json!(["only"]), false),
    ];
    for (raw, expected_values, nullable) in cases {
      let value = round_trip(&raw);
      assert_eq!(value["enum"], expected_values, "enum order changed for {raw}");
      assert_eq!(value.get("nullable").is_some(), nullable, "nullable changed for {raw}");
    }
  }

  #[test]
  fn test_refs_serialize_as_pointers() {
    let raw = json!({
      "type": "array",
      "items": { "$ref": "#/components/schemas/Pet" }
    });
    let value = round_trip(&raw);
    assert_eq!(value["items"], json!({ "$ref": "#/components/schemas/Pet" }));
  }

  #[test]
  fn test_extensions_and_constraints_are_kept() {
    let raw = json!({
      "type": "string",
      "minLength": 1,
      "pattern": "^[a-z]+$",
      "x-enum-varnames": ["A"]
    });
    let value = round_trip(&raw);
    assert_eq!(value, raw);
  }
}
