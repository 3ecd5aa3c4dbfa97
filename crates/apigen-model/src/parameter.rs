use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::{
  document::{Components, OpenApi},
  error::{ModelError, Result},
  raw::{ParseContext, RawNode},
  reference::{Component, ComponentSection, ObjectOrRef},
  schema::{SchemaNode, SchemaRef},
};

pub type ParameterRef = ObjectOrRef<Parameter>;

/// Where a parameter travels. `body` and `form` only appear on parameters synthesized
/// from a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ParameterLocation {
  Query,
  Header,
  Path,
  Cookie,
  Body,
  Form,
}

impl ParameterLocation {
  /// The serialization style used when a parameter declares none.
  #[must_use]
  pub fn default_style(self) -> ParameterStyle {
    match self {
      Self::Query | Self::Cookie | Self::Body | Self::Form => ParameterStyle::Form,
      Self::Path | Self::Header => ParameterStyle::Simple,
    }
  }
}

/// The `style` keyword. Values outside the OpenAPI set are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, EnumString)]
#[strum(serialize_all = "camelCase")]
pub enum ParameterStyle {
  Matrix,
  Label,
  Form,
  Simple,
  SpaceDelimited,
  PipeDelimited,
  DeepObject,
  #[strum(default)]
  Other(String),
}

impl ParameterStyle {
  #[must_use]
  pub fn as_str(&self) -> &str {
    match self {
      Self::Matrix => "matrix",
      Self::Label => "label",
      Self::Form => "form",
      Self::Simple => "simple",
      Self::SpaceDelimited => "spaceDelimited",
      Self::PipeDelimited => "pipeDelimited",
      Self::DeepObject => "deepObject",
      Self::Other(style) => style,
    }
  }
}

impl Serialize for ParameterStyle {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

/// Wire encoding of an array-valued parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CollectionFormat {
  Csv,
  Multi,
}

/// Maps `(location, style, explode)` to a collection format.
///
/// Missing `style` falls back to the location default and missing `explode` is true
/// exactly for `form`. Only `(form, false)` is `csv`; every other pair, including
/// styles this table does not know, is `multi`.
#[must_use]
pub fn collection_format(
  location: ParameterLocation,
  style: Option<&ParameterStyle>,
  explode: Option<bool>,
) -> CollectionFormat {
  let style = style.cloned().unwrap_or_else(|| location.default_style());
  let explode = explode.unwrap_or(style == ParameterStyle::Form);

  match (style, explode) {
    (ParameterStyle::Form, false) => CollectionFormat::Csv,
    _ => CollectionFormat::Multi,
  }
}

#[derive(Debug, Clone)]
pub struct Parameter {
  pub name: String,
  pub location: ParameterLocation,
  pub description: Option<String>,
  pub required: bool,
  pub deprecated: bool,
  pub schema: Option<SchemaRef>,
  pub style: Option<ParameterStyle>,
  pub explode: Option<bool>,
  pub example: Option<Value>,
  pub extensions: IndexMap<String, Value>,
}

impl Parameter {
  pub(crate) fn parse(value: &Value, ctx: &ParseContext, path: &str) -> Result<ParameterRef> {
    ctx.slot(value, path, |raw| Self::from_raw(raw, ctx))
  }

  fn from_raw(raw: RawNode<'_>, ctx: &ParseContext) -> Result<Self> {
    let location = raw.required_string("in")?;
    let location = ParameterLocation::from_str(&location)
      .map_err(|_| ModelError::malformed(raw.child_path("in"), format!("unknown parameter location '{location}'")))?;

    let schema = raw
      .get("schema")
      .map(|value| SchemaNode::parse(value, ctx, &raw.child_path("schema"), None))
      .transpose()?;

    Ok(Self {
      name: raw.required_string("name")?,
      location,
      description: raw.string("description")?,
      required: raw.flag("required")?,
      deprecated: raw.flag("deprecated")?,
      schema,
      style: raw.str("style")?.and_then(|style| ParameterStyle::from_str(style).ok()),
      explode: raw.bool("explode")?,
      example: raw.get("example").cloned(),
      extensions: raw.extensions(),
    })
  }

  /// The collection format for an array-typed parameter, `None` for every other schema.
  pub fn collection_format(&self, document: &OpenApi) -> Result<Option<CollectionFormat>> {
    array_collection_format(
      document,
      self.schema.as_ref(),
      self.location,
      self.style.as_ref(),
      self.explode,
    )
  }
}

impl Component for Parameter {
  const SECTION: ComponentSection = ComponentSection::Parameters;

  fn section(components: &Components) -> &IndexMap<String, ParameterRef> {
    &components.parameters
  }
}

/// One entry of an operation's effective parameter list.
///
/// Declared parameters borrow everything from their [`Parameter`]; parameters
/// synthesized from a request body borrow from the body and its schema.
#[derive(Debug, Clone)]
pub struct EffectiveParameter<'d> {
  pub logical_name: &'d str,
  pub name: &'d str,
  pub location: ParameterLocation,
  pub schema: &'d SchemaRef,
  pub required: bool,
  pub description: Option<&'d str>,
  pub deprecated: bool,
  pub style: Option<&'d ParameterStyle>,
  pub explode: Option<bool>,
  pub example: Option<&'d Value>,
  /// The declaring parameter, `None` for synthesized ones.
  pub declared: Option<&'d Parameter>,
}

impl<'d> EffectiveParameter<'d> {
  pub(crate) fn declared(parameter: &'d Parameter, schema: &'d SchemaRef) -> Self {
    Self {
      logical_name: &parameter.name,
      name: &parameter.name,
      location: parameter.location,
      schema,
      required: parameter.required,
      description: parameter.description.as_deref(),
      deprecated: parameter.deprecated,
      style: parameter.style.as_ref(),
      explode: parameter.explode,
      example: parameter.example.as_ref(),
      declared: Some(parameter),
    }
  }

  #[must_use]
  pub fn is_synthesized(&self) -> bool {
    self.declared.is_none()
  }

  pub fn collection_format(&self, document: &OpenApi) -> Result<Option<CollectionFormat>> {
    array_collection_format(document, Some(self.schema), self.location, self.style, self.explode)
  }
}

fn array_collection_format(
  document: &OpenApi,
  schema: Option<&SchemaRef>,
  location: ParameterLocation,
  style: Option<&ParameterStyle>,
  explode: Option<bool>,
) -> Result<Option<CollectionFormat>> {
  let Some(schema) = schema else {
    return Ok(None);
  };
  if !schema.resolve(document)?.is_array() {
    return Ok(None);
  }
  Ok(Some(collection_format(location, style, explode)))
}
