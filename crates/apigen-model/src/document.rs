//! The root aggregate of one loaded document.

use std::fmt;

use http::Method;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use crate::{
  error::{ModelError, Result},
  operation::{Operation, Response, ResponseRef, declared_parameters, parse_parameter_list},
  parameter::{EffectiveParameter, Parameter, ParameterRef},
  raw::{ParseContext, RawNode, pointer_child},
  reference::{DocumentId, ObjectOrRef},
  registry::{CollectOptions, NameRegistry, collect_named_schemas},
  schema::{SchemaNode, SchemaRef},
  security::{SecurityScheme, SecuritySchemeRef},
};

/// `scheme name → required scopes`.
pub type SecurityRequirement = IndexMap<String, Vec<String>>;

/// Methods a path item may declare, in the order operations are reported.
pub const PATH_METHODS: [Method; 8] = [
  Method::GET,
  Method::PUT,
  Method::POST,
  Method::DELETE,
  Method::OPTIONS,
  Method::HEAD,
  Method::PATCH,
  Method::TRACE,
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct Contact {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Info {
  pub title: String,
  pub version: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub contact: Option<Contact>,
}

impl Info {
  fn parse(value: &Value, path: &str) -> Result<Self> {
    let raw = RawNode::new(value, path)?;
    let contact = match raw.get("contact") {
      Some(value) => {
        let contact_path = raw.child_path("contact");
        let contact = RawNode::new(value, &contact_path)?;
        Some(Contact {
          name: contact.string("name")?,
          url: contact.string("url")?,
          email: contact.string("email")?,
        })
      }
      None => None,
    };

    Ok(Self {
      title: raw.required_string("title")?,
      version: raw.required_string("version")?,
      description: raw.string("description")?,
      contact,
    })
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerVariable {
  pub default: String,
  #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
  pub enum_values: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Server {
  pub url: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "IndexMap::is_empty")]
  pub variables: IndexMap<String, ServerVariable>,
}

impl Server {
  fn parse(value: &Value, path: &str) -> Result<Self> {
    let raw = RawNode::new(value, path)?;
    let mut variables = IndexMap::new();
    if let Some(entries) = raw.object("variables")? {
      let base = raw.child_path("variables");
      for (name, value) in entries {
        let variable_path = pointer_child(&base, name);
        let variable = RawNode::new(value, &variable_path)?;
        variables.insert(
          name.clone(),
          ServerVariable {
            default: variable.required_string("default")?,
            enum_values: variable.string_list("enum")?,
            description: variable.string("description")?,
          },
        );
      }
    }

    Ok(Self {
      url: raw.required_string("url")?,
      description: raw.string("description")?,
      variables,
    })
  }
}

pub(crate) fn parse_servers(raw: &RawNode<'_>) -> Result<Vec<Server>> {
  let Some(items) = raw.array("servers")? else {
    return Ok(vec![]);
  };
  let base = raw.child_path("servers");
  items
    .iter()
    .enumerate()
    .map(|(index, item)| Server::parse(item, &pointer_child(&base, &index.to_string())))
    .collect()
}

pub(crate) fn parse_security(raw: &RawNode<'_>) -> Result<Option<Vec<SecurityRequirement>>> {
  let Some(items) = raw.array("security")? else {
    return Ok(None);
  };
  let base = raw.child_path("security");
  items
    .iter()
    .enumerate()
    .map(|(index, item)| {
      let item_path = pointer_child(&base, &index.to_string());
      let requirement = RawNode::new(item, &item_path)?;
      requirement
        .entries()
        .map(|(scheme, _)| Ok((scheme.clone(), requirement.string_list(scheme)?)))
        .collect::<Result<SecurityRequirement>>()
    })
    .collect::<Result<Vec<_>>>()
    .map(Some)
}

#[derive(Debug, Clone, Serialize)]
pub struct ExternalDocs {
  pub url: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
}

impl ExternalDocs {
  pub(crate) fn parse_field(raw: &RawNode<'_>) -> Result<Option<Self>> {
    let Some(value) = raw.get("externalDocs") else {
      return Ok(None);
    };
    let path = raw.child_path("externalDocs");
    let docs = RawNode::new(value, &path)?;
    Ok(Some(Self {
      url: docs.required_string("url")?,
      description: docs.string("description")?,
    }))
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct Tag {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(rename = "externalDocs", skip_serializing_if = "Option::is_none")]
  pub external_docs: Option<ExternalDocs>,
}

/// The dereferenceable component sections.
#[derive(Debug, Clone, Default)]
pub struct Components {
  pub schemas: IndexMap<String, SchemaRef>,
  pub parameters: IndexMap<String, ParameterRef>,
  pub responses: IndexMap<String, ResponseRef>,
  pub security_schemes: IndexMap<String, SecuritySchemeRef>,
}

impl Components {
  fn parse(value: &Value, ctx: &ParseContext, path: &str) -> Result<Self> {
    let raw = RawNode::new(value, path)?;
    Ok(Self {
      schemas: parse_section(&raw, "schemas", |value, path, name| {
        SchemaNode::parse(value, ctx, path, Some(name))
      })?,
      parameters: parse_section(&raw, "parameters", |value, path, _| Parameter::parse(value, ctx, path))?,
      responses: parse_section(&raw, "responses", |value, path, _| Response::parse(value, ctx, path))?,
      security_schemes: parse_section(&raw, "securitySchemes", |value, path, _| {
        SecurityScheme::parse(value, ctx, path)
      })?,
    })
  }
}

fn parse_section<T>(
  raw: &RawNode<'_>,
  key: &str,
  mut parse: impl FnMut(&Value, &str, &str) -> Result<ObjectOrRef<T>>,
) -> Result<IndexMap<String, ObjectOrRef<T>>> {
  let mut section = IndexMap::new();
  if let Some(entries) = raw.object(key)? {
    let base = raw.child_path(key);
    for (name, value) in entries {
      section.insert(name.clone(), parse(value, &pointer_child(&base, name), name)?);
    }
  }
  Ok(section)
}

#[derive(Debug, Clone, Default)]
pub struct PathItem {
  pub summary: Option<String>,
  pub description: Option<String>,
  pub servers: Vec<Server>,
  /// Parameters shared by every operation of the path.
  pub parameters: Vec<ParameterRef>,
  pub operations: IndexMap<Method, Operation>,
}

impl PathItem {
  fn parse(value: &Value, ctx: &ParseContext, path: &str) -> Result<Self> {
    let raw = RawNode::new(value, path)?;
    if raw.contains("$ref") {
      return Err(ModelError::malformed(path, "path item references are not supported"));
    }

    let mut operations = IndexMap::new();
    for method in PATH_METHODS {
      let key = method.as_str().to_ascii_lowercase();
      if let Some(value) = raw.get(&key) {
        operations.insert(method, Operation::parse(value, ctx, &raw.child_path(&key))?);
      }
    }

    Ok(Self {
      summary: raw.string("summary")?,
      description: raw.string("description")?,
      servers: parse_servers(&raw)?,
      parameters: parse_parameter_list(&raw, ctx)?,
      operations,
    })
  }
}

/// An operation together with where it was declared.
#[derive(Debug, Clone, Copy)]
pub struct OperationEntry<'d> {
  pub path: &'d str,
  pub method: &'d Method,
  pub path_item: &'d PathItem,
  pub operation: &'d Operation,
}

impl<'d> OperationEntry<'d> {
  /// Path-level parameters merged with the operation's own, then the body parameters.
  ///
  /// An operation parameter replaces a path-level one with the same `(in, name)` and
  /// takes its position.
  pub fn effective_parameters(&self, document: &'d OpenApi) -> Result<Vec<EffectiveParameter<'d>>> {
    let mut parameters = declared_parameters(&self.path_item.parameters, document)?;

    for parameter in declared_parameters(&self.operation.parameters, document)? {
      let overridden = parameters
        .iter()
        .position(|existing| existing.location == parameter.location && existing.name == parameter.name);
      match overridden {
        Some(index) => parameters[index] = parameter,
        None => parameters.push(parameter),
      }
    }

    self.operation.push_body_parameters(document, &mut parameters)?;
    Ok(parameters)
  }

  /// The first tag, used to group operations into API classes.
  #[must_use]
  pub fn group(&self) -> TagGroup<'d> {
    self
      .operation
      .tags
      .first()
      .map_or(TagGroup::Untagged, |tag| TagGroup::Tag(tag))
  }
}

/// Grouping key of an operation: its first tag, or the sentinel for tagless operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TagGroup<'d> {
  Tag(&'d str),
  Untagged,
}

impl TagGroup<'_> {
  #[must_use]
  pub fn tag(&self) -> Option<&str> {
    match self {
      Self::Tag(tag) => Some(tag),
      Self::Untagged => None,
    }
  }
}

impl fmt::Display for TagGroup<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Tag(tag) => f.write_str(tag),
      Self::Untagged => f.write_str("<untagged>"),
    }
  }
}

/// One parsed OpenAPI document. Owns every node and is the context all references
/// resolve through.
#[derive(Debug)]
pub struct OpenApi {
  id: DocumentId,
  pub openapi: String,
  pub info: Info,
  pub servers: Vec<Server>,
  pub paths: IndexMap<String, PathItem>,
  pub components: Components,
  pub tags: Vec<Tag>,
  pub external_docs: Option<ExternalDocs>,
  pub security: Option<Vec<SecurityRequirement>>,
  pub extensions: IndexMap<String, Value>,
}

impl OpenApi {
  /// Builds the model from a raw tree. References are wired to this document but left
  /// unresolved; the first lookup of each one happens on use.
  pub fn from_value(value: &Value) -> Result<Self> {
    let ctx = ParseContext::new();
    let raw = RawNode::new(value, "#")?;

    let openapi = raw.required_string("openapi")?;
    if !openapi.starts_with("3.") {
      return Err(ModelError::malformed(
        raw.child_path("openapi"),
        format!("unsupported OpenAPI version '{openapi}', expected 3.x"),
      ));
    }

    let Some(info) = raw.get("info") else {
      return Err(ModelError::malformed("#", "missing required field 'info'"));
    };
    let info = Info::parse(info, &raw.child_path("info"))?;

    let mut paths = IndexMap::new();
    if let Some(entries) = raw.object("paths")? {
      let base = raw.child_path("paths");
      for (path, value) in entries {
        if path.starts_with(crate::raw::EXTENSION_PREFIX) {
          continue;
        }
        paths.insert(path.clone(), PathItem::parse(value, &ctx, &pointer_child(&base, path))?);
      }
    }

    let components = match raw.get("components") {
      Some(value) => Components::parse(value, &ctx, &raw.child_path("components"))?,
      None => Components::default(),
    };

    let mut tags = vec![];
    if let Some(items) = raw.array("tags")? {
      let base = raw.child_path("tags");
      for (index, item) in items.iter().enumerate() {
        let tag_path = pointer_child(&base, &index.to_string());
        let tag = RawNode::new(item, &tag_path)?;
        tags.push(Tag {
          name: tag.required_string("name")?,
          description: tag.string("description")?,
          external_docs: ExternalDocs::parse_field(&tag)?,
        });
      }
    }

    Ok(Self {
      id: ctx.document,
      openapi,
      info,
      servers: parse_servers(&raw)?,
      paths,
      components,
      tags,
      external_docs: ExternalDocs::parse_field(&raw)?,
      security: parse_security(&raw)?,
      extensions: raw.extensions(),
    })
  }

  #[must_use]
  pub fn id(&self) -> DocumentId {
    self.id
  }

  #[must_use]
  pub fn components(&self) -> &Components {
    &self.components
  }

  /// The canonical component schema registered under `name`.
  #[must_use]
  pub fn schema(&self, name: &str) -> Option<&SchemaRef> {
    self.components.schemas.get(name)
  }

  pub fn resolve_schema<'d>(&'d self, slot: &'d SchemaRef) -> Result<&'d SchemaNode> {
    slot.resolve(self)
  }

  pub fn resolve_parameter<'d>(&'d self, slot: &'d ParameterRef) -> Result<&'d Parameter> {
    slot.resolve(self)
  }

  pub fn resolve_response<'d>(&'d self, slot: &'d ResponseRef) -> Result<&'d Response> {
    slot.resolve(self)
  }

  #[must_use]
  pub fn tags_by_name(&self) -> IndexMap<&str, &Tag> {
    self.tags.iter().map(|tag| (tag.name.as_str(), tag)).collect()
  }

  /// Every operation in document order: paths as declared, methods in canonical order.
  pub fn operations(&self) -> impl Iterator<Item = OperationEntry<'_>> {
    self.paths.iter().flat_map(|(path, path_item)| {
      path_item.operations.iter().map(move |(method, operation)| OperationEntry {
        path,
        method,
        path_item,
        operation,
      })
    })
  }

  /// Operations partitioned by their first tag. Groups appear in first-seen order.
  #[must_use]
  pub fn group_operations_by_tag(&self) -> IndexMap<TagGroup<'_>, Vec<OperationEntry<'_>>> {
    let mut groups: IndexMap<TagGroup<'_>, Vec<OperationEntry<'_>>> = IndexMap::new();
    for entry in self.operations() {
      groups.entry(entry.group()).or_default().push(entry);
    }
    groups
  }

  /// Named schemas reachable from the paths of this document.
  pub fn collect_named_schemas(&self, options: CollectOptions) -> Result<NameRegistry<'_>> {
    collect_named_schemas(self, self, options)
  }
}
