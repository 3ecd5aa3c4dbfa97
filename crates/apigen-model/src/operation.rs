use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::{
  document::{Components, ExternalDocs, OpenApi, SecurityRequirement, Server, parse_security, parse_servers},
  error::{ModelError, Result},
  parameter::{EffectiveParameter, Parameter, ParameterLocation, ParameterRef},
  raw::{ParseContext, RawNode, pointer_child},
  reference::{Component, ComponentSection, ObjectOrRef},
  schema::{SchemaNode, SchemaRef, flatten_all_of},
};

pub type ResponseRef = ObjectOrRef<Response>;

pub const MULTIPART_FORM_DATA: &str = "multipart/form-data";
/// Accept value used when any response may come back without a body.
pub const ACCEPT_ANY: &str = "*/*";
/// Logical name of the parameter synthesized from a non-form request body.
pub const BODY_PARAMETER: &str = "body";

#[derive(Debug, Clone)]
pub struct MediaType {
  pub schema: Option<SchemaRef>,
  pub example: Option<Value>,
}

impl MediaType {
  fn parse(value: &Value, ctx: &ParseContext, path: &str) -> Result<Self> {
    let raw = RawNode::new(value, path)?;
    let schema = raw
      .get("schema")
      .map(|schema| SchemaNode::parse(schema, ctx, &raw.child_path("schema"), None))
      .transpose()?;

    Ok(Self {
      schema,
      example: raw.get("example").cloned(),
    })
  }
}

fn parse_content(raw: &RawNode<'_>, ctx: &ParseContext) -> Result<IndexMap<String, MediaType>> {
  let mut content = IndexMap::new();
  if let Some(entries) = raw.object("content")? {
    let base = raw.child_path("content");
    for (media_type, value) in entries {
      content.insert(
        media_type.clone(),
        MediaType::parse(value, ctx, &pointer_child(&base, media_type))?,
      );
    }
  }
  Ok(content)
}

#[derive(Debug, Clone)]
pub struct RequestBody {
  pub content: IndexMap<String, MediaType>,
  pub description: Option<String>,
  pub required: bool,
}

impl RequestBody {
  fn parse(value: &Value, ctx: &ParseContext, path: &str) -> Result<Self> {
    let raw = RawNode::new(value, path)?;
    if raw.contains("$ref") {
      return Err(ModelError::malformed(
        path,
        "request bodies cannot be references; only schemas, parameters, responses and security schemes are",
      ));
    }

    Ok(Self {
      content: parse_content(&raw, ctx)?,
      description: raw.string("description")?,
      required: raw.flag("required")?,
    })
  }
}

#[derive(Debug, Clone)]
pub struct Response {
  pub description: Option<String>,
  pub content: IndexMap<String, MediaType>,
}

impl Response {
  pub(crate) fn parse(value: &Value, ctx: &ParseContext, path: &str) -> Result<ResponseRef> {
    ctx.slot(value, path, |raw| {
      Ok(Self {
        description: raw.string("description")?,
        content: parse_content(&raw, ctx)?,
      })
    })
  }

  /// The schema of the first media type that declares one.
  #[must_use]
  pub fn first_schema(&self) -> Option<&SchemaRef> {
    self.content.values().find_map(|media| media.schema.as_ref())
  }
}

impl Component for Response {
  const SECTION: ComponentSection = ComponentSection::Responses;

  fn section(components: &Components) -> &IndexMap<String, ResponseRef> {
    &components.responses
  }
}

#[derive(Debug, Clone, Default)]
pub struct Operation {
  pub tags: Vec<String>,
  pub summary: Option<String>,
  pub description: Option<String>,
  pub operation_id: Option<String>,
  pub parameters: Vec<ParameterRef>,
  pub request_body: Option<RequestBody>,
  /// Keyed by status code or `default`, in document order.
  pub responses: IndexMap<String, ResponseRef>,
  pub deprecated: bool,
  pub servers: Vec<Server>,
  pub security: Option<Vec<SecurityRequirement>>,
  pub external_docs: Option<ExternalDocs>,
  pub extensions: IndexMap<String, Value>,
}

impl Operation {
  pub(crate) fn parse(value: &Value, ctx: &ParseContext, path: &str) -> Result<Self> {
    let raw = RawNode::new(value, path)?;

    let parameters = parse_parameter_list(&raw, ctx)?;

    let request_body = raw
      .get("requestBody")
      .map(|body| RequestBody::parse(body, ctx, &raw.child_path("requestBody")))
      .transpose()?;

    let mut responses = IndexMap::new();
    if let Some(entries) = raw.object("responses")? {
      let base = raw.child_path("responses");
      for (status, value) in entries {
        responses.insert(status.clone(), Response::parse(value, ctx, &pointer_child(&base, status))?);
      }
    }

    Ok(Self {
      tags: raw.string_list("tags")?,
      summary: raw.string("summary")?,
      description: raw.string("description")?,
      operation_id: raw.string("operationId")?,
      parameters,
      request_body,
      responses,
      deprecated: raw.flag("deprecated")?,
      servers: parse_servers(&raw)?,
      security: parse_security(&raw)?,
      external_docs: ExternalDocs::parse_field(&raw)?,
      extensions: raw.extensions(),
    })
  }

  /// Declared parameters that carry a schema, followed by the parameters synthesized
  /// from the request body.
  ///
  /// A `multipart/form-data` body contributes one `form` parameter per property of
  /// its schema. Any other body contributes a single `body` parameter built from the
  /// first media type that declares a schema.
  pub fn effective_parameters<'d>(&'d self, document: &'d OpenApi) -> Result<Vec<EffectiveParameter<'d>>> {
    let mut parameters = declared_parameters(&self.parameters, document)?;
    self.push_body_parameters(document, &mut parameters)?;
    Ok(parameters)
  }

  pub(crate) fn push_body_parameters<'d>(
    &'d self,
    document: &'d OpenApi,
    parameters: &mut Vec<EffectiveParameter<'d>>,
  ) -> Result<()> {
    let Some(body) = &self.request_body else {
      return Ok(());
    };

    if let Some(form) = body.content.get(MULTIPART_FORM_DATA) {
      let Some(schema) = &form.schema else {
        return Ok(());
      };
      let flattened = flatten_all_of(document, schema.resolve(document)?)?;
      for (&name, &property) in &flattened.properties {
        let node = property.resolve(document)?;
        parameters.push(EffectiveParameter {
          logical_name: name,
          name,
          location: ParameterLocation::Form,
          schema: property,
          required: flattened.is_required(name),
          description: body.description.as_deref().or(node.meta.description.as_deref()),
          deprecated: node.meta.deprecated,
          style: None,
          explode: None,
          example: None,
          declared: None,
        });
      }
      return Ok(());
    }

    if let Some(schema) = body.content.values().find_map(|media| media.schema.as_ref()) {
      parameters.push(EffectiveParameter {
        logical_name: BODY_PARAMETER,
        name: BODY_PARAMETER,
        location: ParameterLocation::Body,
        schema,
        required: body.required,
        description: body.description.as_deref(),
        deprecated: false,
        style: None,
        explode: None,
        example: None,
        declared: None,
      });
    }
    Ok(())
  }

  /// Media types across all responses, first-seen order. A single response without
  /// content turns the whole list into `*/*`.
  pub fn accept_headers<'d>(&'d self, document: &'d OpenApi) -> Result<Vec<&'d str>> {
    let mut seen = IndexSet::new();
    for slot in self.responses.values() {
      let response = slot.resolve(document)?;
      if response.content.is_empty() {
        return Ok(vec![ACCEPT_ANY]);
      }
      seen.extend(response.content.keys().map(String::as_str));
    }
    Ok(seen.into_iter().collect())
  }

  /// The first schema of the first declared response. Later responses are never
  /// consulted.
  pub fn return_schema<'d>(&'d self, document: &'d OpenApi) -> Result<Option<&'d SchemaRef>> {
    let Some(first) = self.responses.values().next() else {
      return Ok(None);
    };
    Ok(first.resolve(document)?.first_schema())
  }
}

pub(crate) fn parse_parameter_list(raw: &RawNode<'_>, ctx: &ParseContext) -> Result<Vec<ParameterRef>> {
  let Some(items) = raw.array("parameters")? else {
    return Ok(vec![]);
  };
  let base = raw.child_path("parameters");
  items
    .iter()
    .enumerate()
    .map(|(index, item)| Parameter::parse(item, ctx, &pointer_child(&base, &index.to_string())))
    .collect()
}

/// Resolves a parameter list, dropping parameters that declare no schema.
pub(crate) fn declared_parameters<'d>(
  slots: &'d [ParameterRef],
  document: &'d OpenApi,
) -> Result<Vec<EffectiveParameter<'d>>> {
  let mut parameters = Vec::with_capacity(slots.len());
  for slot in slots {
    let parameter = slot.resolve(document)?;
    if let Some(schema) = &parameter.schema {
      parameters.push(EffectiveParameter::declared(parameter, schema));
    }
  }
  Ok(parameters)
}
