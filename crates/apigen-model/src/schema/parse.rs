use std::str::FromStr;

use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use super::{
  AdditionalProperties, Constraints, EnumValue, PrimitiveSchema, PrimitiveType, SchemaKind, SchemaMeta, SchemaNode,
  SchemaRef, SchemaType,
};
use crate::{
  error::{ModelError, Result},
  raw::{ParseContext, RawNode, kind_of, pointer_child},
};

const NULL_TYPE: &str = "null";

impl SchemaNode {
  /// Builds the slot found at `path`. `name` is only given for component schemas.
  ///
  /// Dispatch follows keyword priority: `$ref`, `oneOf`, `allOf`, `anyOf`, `enum`, array,
  /// object (`type: object` or `properties`), and finally primitive, which includes the
  /// untyped case.
  pub(crate) fn parse(value: &Value, ctx: &ParseContext, path: &str, name: Option<&str>) -> Result<SchemaRef> {
    ctx.slot(value, path, |raw| Self::from_raw(raw, ctx, name))
  }

  fn from_raw(raw: RawNode<'_>, ctx: &ParseContext, name: Option<&str>) -> Result<Self> {
    let (declared_type, nullable_type) = parse_type(&raw)?;

    let mut meta = SchemaMeta {
      name: name.map(String::from),
      pointer: raw.path().to_string(),
      title: raw.string("title")?,
      description: raw.string("description")?,
      declared_type,
      format: raw.string("format")?,
      nullable: nullable_type || raw.flag("nullable")?,
      deprecated: raw.flag("deprecated")?,
      read_only: raw.flag("readOnly")?,
      write_only: raw.flag("writeOnly")?,
      default: raw.get("default").cloned(),
      example: raw.get("example").cloned(),
      extensions: raw.extensions(),
    };

    let kind = if raw.contains("oneOf") {
      SchemaKind::OneOf(parse_variants(&raw, ctx, "oneOf")?)
    } else if raw.contains("allOf") {
      SchemaKind::AllOf(parse_variants(&raw, ctx, "allOf")?)
    } else if raw.contains("anyOf") {
      SchemaKind::AnyOf(parse_variants(&raw, ctx, "anyOf")?)
    } else if raw.contains("enum") {
      parse_enum(&raw, &mut meta)?
    } else if declared_type == Some(SchemaType::Array) {
      parse_array(&raw, ctx)?
    } else if declared_type == Some(SchemaType::Object) || raw.contains("properties") {
      parse_object(&raw, ctx)?
    } else {
      SchemaKind::Primitive(PrimitiveSchema {
        primitive: declared_type.and_then(PrimitiveType::from_schema_type),
        constraints: parse_constraints(&raw)?,
      })
    };

    Ok(Self { meta, kind })
  }
}

/// Reads `type`, accepting the `[T, "null"]` list form. Returns the type and whether
/// `null` was listed.
fn parse_type(raw: &RawNode<'_>) -> Result<(Option<SchemaType>, bool)> {
  let path = raw.child_path("type");
  match raw.get("type") {
    None | Some(Value::Null) => Ok((None, false)),
    Some(Value::String(name)) => Ok((Some(schema_type_from_str(name, &path)?), false)),
    Some(Value::Array(names)) => {
      let mut nullable = false;
      let mut types = vec![];
      for (index, entry) in names.iter().enumerate() {
        let entry_path = pointer_child(&path, &index.to_string());
        match entry {
          Value::String(name) if name == NULL_TYPE => nullable = true,
          Value::String(name) => types.push(schema_type_from_str(name, &entry_path)?),
          other => {
            return Err(ModelError::malformed(
              entry_path,
              format!("expected a type name, found {}", kind_of(other)),
            ));
          }
        }
      }
      match types.as_slice() {
        [] => Ok((None, nullable)),
        [single] => Ok((Some(*single), nullable)),
        _ => Err(ModelError::malformed(
          path,
          "multiple non-null types in one schema are not supported",
        )),
      }
    }
    Some(other) => Err(ModelError::malformed(
      path,
      format!("expected a string or an array, found {}", kind_of(other)),
    )),
  }
}

fn schema_type_from_str(name: &str, path: &str) -> Result<SchemaType> {
  SchemaType::from_str(name).map_err(|_| ModelError::malformed(path, format!("unknown schema type '{name}'")))
}

fn parse_variants(raw: &RawNode<'_>, ctx: &ParseContext, key: &str) -> Result<Vec<SchemaRef>> {
  let base = raw.child_path(key);
  let Some(items) = raw.array(key)? else {
    return Err(ModelError::malformed(base, format!("'{key}' must be an array of schemas")));
  };

  items
    .iter()
    .enumerate()
    .map(|(index, item)| SchemaNode::parse(item, ctx, &pointer_child(&base, &index.to_string()), None))
    .collect()
}

/// A `null` member marks the enum nullable and is not kept as a value.
fn parse_enum(raw: &RawNode<'_>, meta: &mut SchemaMeta) -> Result<SchemaKind> {
  let base = raw.child_path("enum");
  let Some(items) = raw.array("enum")? else {
    return Err(ModelError::malformed(base, "'enum' must be an array"));
  };

  let mut values = Vec::with_capacity(items.len());
  for (index, item) in items.iter().enumerate() {
    match item {
      Value::String(s) => values.push(EnumValue::String(s.clone())),
      Value::Number(n) => values.push(EnumValue::Number(n.clone())),
      Value::Null => meta.nullable = true,
      other => {
        return Err(ModelError::malformed(
          pointer_child(&base, &index.to_string()),
          format!("enum members must be strings or numbers, found {}", kind_of(other)),
        ));
      }
    }
  }

  Ok(SchemaKind::Enum { values })
}

fn parse_array(raw: &RawNode<'_>, ctx: &ParseContext) -> Result<SchemaKind> {
  let Some(items) = raw.get("items") else {
    return Err(ModelError::malformed(raw.path(), "array schema without 'items'"));
  };

  Ok(SchemaKind::Array {
    items: Box::new(SchemaNode::parse(items, ctx, &raw.child_path("items"), None)?),
    min_items: raw.u64("minItems")?,
    max_items: raw.u64("maxItems")?,
  })
}

fn parse_object(raw: &RawNode<'_>, ctx: &ParseContext) -> Result<SchemaKind> {
  let mut properties = IndexMap::new();
  if let Some(declared) = raw.object("properties")? {
    let base = raw.child_path("properties");
    for (key, value) in declared {
      let property = SchemaNode::parse(value, ctx, &pointer_child(&base, key), None)?;
      properties.insert(key.clone(), property);
    }
  }

  let required = raw.string_list("required")?.into_iter().collect::<IndexSet<_>>();

  let additional_properties = match raw.get("additionalProperties") {
    None | Some(Value::Null) => AdditionalProperties::Absent,
    Some(Value::Bool(allowed)) => AdditionalProperties::Allowed(*allowed),
    Some(value @ Value::Object(_)) => AdditionalProperties::Schema(Box::new(SchemaNode::parse(
      value,
      ctx,
      &raw.child_path("additionalProperties"),
      None,
    )?)),
    Some(other) => {
      return Err(ModelError::malformed(
        raw.child_path("additionalProperties"),
        format!("expected a boolean or a schema, found {}", kind_of(other)),
      ));
    }
  };

  Ok(SchemaKind::Object {
    properties,
    required,
    additional_properties,
  })
}

/// `exclusiveMinimum` / `exclusiveMaximum` are booleans in 3.0 and bounds in 3.1.
fn parse_constraints(raw: &RawNode<'_>) -> Result<Constraints> {
  let mut constraints = Constraints {
    minimum: raw.number("minimum")?,
    maximum: raw.number("maximum")?,
    min_length: raw.u64("minLength")?,
    max_length: raw.u64("maxLength")?,
    pattern: raw.string("pattern")?,
    ..Constraints::default()
  };

  if let Some(Value::Number(bound)) = raw.get("exclusiveMinimum") {
    constraints.minimum = Some(bound.clone());
    constraints.exclusive_minimum = true;
  } else {
    constraints.exclusive_minimum = raw.flag("exclusiveMinimum")?;
  }

  if let Some(Value::Number(bound)) = raw.get("exclusiveMaximum") {
    constraints.maximum = Some(bound.clone());
    constraints.exclusive_maximum = true;
  } else {
    constraints.exclusive_maximum = raw.flag("exclusiveMaximum")?;
  }

  Ok(constraints)
}
