use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::{
  document::Components,
  error::Result,
  raw::{ParseContext, RawNode},
  reference::{Component, ComponentSection, ObjectOrRef},
};

pub type SecuritySchemeRef = ObjectOrRef<SecurityScheme>;

/// An authentication scheme from `components.securitySchemes`. Flows are kept raw;
/// emitters only need to know which schemes exist and where their credentials go.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityScheme {
  #[serde(rename = "type")]
  pub scheme_type: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(rename = "in", skip_serializing_if = "Option::is_none")]
  pub location: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub scheme: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub bearer_format: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub flows: Option<Value>,
  #[serde(rename = "openIdConnectUrl", skip_serializing_if = "Option::is_none")]
  pub open_id_connect_url: Option<String>,
}

impl SecurityScheme {
  pub(crate) fn parse(value: &Value, ctx: &ParseContext, path: &str) -> Result<SecuritySchemeRef> {
    ctx.slot(value, path, |raw| Self::from_raw(&raw))
  }

  fn from_raw(raw: &RawNode<'_>) -> Result<Self> {
    Ok(Self {
      scheme_type: raw.required_string("type")?,
      description: raw.string("description")?,
      name: raw.string("name")?,
      location: raw.string("in")?,
      scheme: raw.string("scheme")?,
      bearer_format: raw.string("bearerFormat")?,
      flows: raw.get("flows").cloned(),
      open_id_connect_url: raw.string("openIdConnectUrl")?,
    })
  }
}

impl Component for SecurityScheme {
  const SECTION: ComponentSection = ComponentSection::SecuritySchemes;

  fn section(components: &Components) -> &IndexMap<String, SecuritySchemeRef> {
    &components.security_schemes
  }
}
