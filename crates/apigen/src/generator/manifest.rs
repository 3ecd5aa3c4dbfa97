//! The generation manifest: everything a template engine needs to emit one client per
//! API version, serialized as JSON.

use apigen_model::{
  CollectionFormat, EffectiveParameter, NameOrigin, NameRegistry, OpenApi, OperationEntry, ParameterLocation,
  ReservedWords, SchemaKind, SchemaNode, TagGroup, TypeMapper, TypeRef, collect_polymorphic_member_names,
  default_value, document::{Info, Server},
  naming::{module_name, pascal_case},
  operation::ACCEPT_ANY,
  schema::flatten_all_of,
};
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

use super::metrics::{GenerationStats, GenerationWarning};

#[derive(Debug, Clone, Default, Serialize)]
pub struct Manifest {
  pub versions: IndexMap<String, VersionManifest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VersionManifest {
  pub info: Info,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub servers: Vec<Server>,
  pub apis: Vec<ApiManifest>,
  pub models: IndexMap<String, ModelManifest>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub cycles: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiManifest {
  /// `None` for the group of untagged operations.
  pub tag: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub module: String,
  pub class_name: String,
  pub operations: Vec<OperationManifest>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OperationManifest {
  pub operation_id: String,
  pub method_name: String,
  pub method: String,
  pub path: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub deprecated: bool,
  pub parameters: Vec<ParameterManifest>,
  pub accept: Vec<String>,
  pub return_type: Option<TypeRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParameterManifest {
  pub name: String,
  pub attribute: String,
  pub location: ParameterLocation,
  pub required: bool,
  #[serde(rename = "type")]
  pub type_ref: TypeRef,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub collection_format: Option<CollectionFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelManifest {
  pub kind: &'static str,
  pub module: String,
  pub origin: NameOrigin,
  #[serde(rename = "type")]
  pub type_ref: TypeRef,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "IndexMap::is_empty")]
  pub properties: IndexMap<String, PropertyManifest>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub additional_properties: Option<TypeRef>,
  #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
  pub enum_values: Vec<Value>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub one_of: Vec<TypeRef>,
  #[serde(skip_serializing_if = "IndexMap::is_empty")]
  pub union_parameters: IndexMap<String, TypeRef>,
  pub references: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub polymorphic_members: Vec<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyManifest {
  pub attribute: String,
  #[serde(rename = "type")]
  pub type_ref: TypeRef,
  pub required: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub default: Option<Value>,
}

/// Operation id used when a document leaves `operationId` out, e.g. `get_pets_by_id`
/// for `GET /pets/{id}`.
pub fn fallback_operation_id(method: &str, path: &str) -> String {
  let path_parts = path
    .split('/')
    .filter(|s| !s.is_empty())
    .map(|s| if s.starts_with('{') && s.ends_with('}') { "by_id" } else { s })
    .collect::<Vec<_>>();

  let method_lower = method.to_lowercase();
  if path_parts.is_empty() {
    method_lower
  } else {
    format!("{}_{}", method_lower, path_parts.join("_"))
  }
}

pub fn operation_id(entry: &OperationEntry<'_>) -> String {
  entry
    .operation
    .operation_id
    .clone()
    .unwrap_or_else(|| fallback_operation_id(entry.method.as_str(), entry.path))
}

/// Builds the manifest of one API version, recording counters and warnings as it goes.
pub struct ManifestBuilder<'d, 's> {
  version: &'s str,
  document: &'d OpenApi,
  mapper: TypeMapper<'d>,
  reserved_words: &'s ReservedWords,
  stats: &'s mut GenerationStats,
}

impl<'d, 's> ManifestBuilder<'d, 's> {
  pub fn new(
    version: &'s str,
    mapper: TypeMapper<'d>,
    reserved_words: &'s ReservedWords,
    stats: &'s mut GenerationStats,
  ) -> Self {
    Self {
      version,
      document: mapper.document(),
      mapper,
      reserved_words,
      stats,
    }
  }

  pub fn build(mut self, registry: &NameRegistry<'d>, cycles: Vec<Vec<String>>) -> anyhow::Result<VersionManifest> {
    let apis = self.apis()?;
    let models = self.models(registry)?;
    self.stats.record_cycles(cycles.clone());

    Ok(VersionManifest {
      info: self.document.info.clone(),
      servers: self.document.servers.clone(),
      apis,
      models,
      cycles,
    })
  }

  fn apis(&mut self) -> anyhow::Result<Vec<ApiManifest>> {
    let document = self.document;
    let tags = document.tags_by_name();
    let mut apis = vec![];

    for (group, entries) in document.group_operations_by_tag() {
      let operations = entries
        .iter()
        .map(|entry| self.operation(entry))
        .collect::<anyhow::Result<Vec<_>>>()?;
      self.stats.record_api_group(operations.len());

      let description = group
        .tag()
        .and_then(|tag| tags.get(tag))
        .and_then(|tag| tag.description.clone());
      apis.push(ApiManifest {
        tag: group.tag().map(String::from),
        description,
        module: module_name(&group.to_string()),
        class_name: api_class_name(group),
        operations,
      });
    }
    Ok(apis)
  }

  fn operation(&mut self, entry: &OperationEntry<'d>) -> anyhow::Result<OperationManifest> {
    let document = self.document;
    let operation_id = operation_id(entry);
    let operation = entry.operation;

    for parameter in entry.path_item.parameters.iter().chain(&operation.parameters) {
      let parameter = document.resolve_parameter(parameter)?;
      if parameter.schema.is_none() {
        self.stats.record_warning(GenerationWarning::ParameterWithoutSchema {
          version: self.version.to_string(),
          operation_id: operation_id.clone(),
          parameter: parameter.name.clone(),
        });
      }
    }

    let parameters = entry
      .effective_parameters(self.document)?
      .iter()
      .map(|parameter| self.parameter(parameter))
      .collect::<anyhow::Result<Vec<_>>>()?;

    let accept = operation
      .accept_headers(self.document)?
      .into_iter()
      .map(String::from)
      .collect::<Vec<_>>();
    if accept == [ACCEPT_ANY] {
      self.stats.record_warning(GenerationWarning::AcceptWildcard {
        version: self.version.to_string(),
        operation_id: operation_id.clone(),
      });
    }

    let return_type = operation
      .return_schema(self.document)?
      .map(|schema| self.mapper.resolve_type(schema))
      .transpose()?;

    Ok(OperationManifest {
      method_name: self.reserved_words.attribute_name(&operation_id),
      operation_id,
      method: entry.method.as_str().to_string(),
      path: entry.path.to_string(),
      summary: operation.summary.clone(),
      description: operation.description.clone(),
      deprecated: operation.deprecated,
      parameters,
      accept,
      return_type,
    })
  }

  fn parameter(&self, parameter: &EffectiveParameter<'d>) -> anyhow::Result<ParameterManifest> {
    let schema = parameter.schema.resolve(self.document)?;
    Ok(ParameterManifest {
      name: parameter.name.to_string(),
      attribute: self.reserved_words.attribute_name(parameter.logical_name),
      location: parameter.location,
      required: parameter.required,
      type_ref: self.mapper.resolve_type(parameter.schema)?,
      collection_format: parameter.collection_format(self.document)?,
      description: parameter.description.map(String::from),
      default: default_value(schema),
    })
  }

  fn models(&mut self, registry: &NameRegistry<'d>) -> anyhow::Result<IndexMap<String, ModelManifest>> {
    let mut models = IndexMap::new();
    for (name, model) in registry.iter() {
      self.stats.record_model(&model.schema.kind);
      let manifest = self.model(name, model.schema, model.origin)?;
      models.insert(name.to_string(), manifest);
    }
    Ok(models)
  }

  fn model(&mut self, name: &str, node: &'d SchemaNode, origin: NameOrigin) -> anyhow::Result<ModelManifest> {
    let list_models = self.mapper.list_models();
    let mut properties = IndexMap::new();
    let mut additional_properties = None;

    if matches!(node.kind, SchemaKind::Object { .. } | SchemaKind::AllOf(_)) {
      let flattened = flatten_all_of(self.document, node)?;
      for (&property, &slot) in &flattened.properties {
        let parent = flattened.declaring_model(property).unwrap_or(name);
        let type_ref = self.mapper.property_type(parent, property, slot)?;
        if matches!(&type_ref, TypeRef::OpaqueMap) {
          self.stats.record_warning(GenerationWarning::OpaqueProperty {
            version: self.version.to_string(),
            model: name.to_string(),
            property: property.to_string(),
          });
        }
        let resolved = slot.resolve(self.document)?;
        properties.insert(
          property.to_string(),
          PropertyManifest {
            attribute: self.reserved_words.attribute_name(property),
            type_ref,
            required: flattened.is_required(property),
            description: resolved.meta.description.clone(),
            default: default_value(resolved),
          },
        );
      }
      if let Some(value) = flattened.additional_properties.and_then(|ap| ap.schema()) {
        additional_properties = Some(self.mapper.resolve_type(value)?);
      }
    }

    let (one_of, union_parameters) = match &node.kind {
      SchemaKind::OneOf(_) => (
        self
          .mapper
          .union_members(node)?
          .into_iter()
          .map(|member| member.type_ref)
          .collect(),
        self
          .mapper
          .union_parameters(node)?
          .into_iter()
          .map(|(name, type_ref)| (name.to_string(), type_ref))
          .collect(),
      ),
      _ => (vec![], IndexMap::new()),
    };

    Ok(ModelManifest {
      kind: node.tag().into(),
      module: module_name(name),
      origin,
      type_ref: self.mapper.model_type(name, node)?,
      description: node.meta.description.clone(),
      properties,
      additional_properties,
      enum_values: node
        .enum_values()
        .map(|values| values.iter().map(|value| value.to_value()).collect())
        .unwrap_or_default(),
      one_of,
      union_parameters,
      references: self.mapper.model_references(name, node)?,
      polymorphic_members: collect_polymorphic_member_names(self.document, node, name, list_models)?,
      default: default_value(node),
    })
  }
}

fn api_class_name(group: TagGroup<'_>) -> String {
  match group.tag() {
    Some(tag) => format!("{}Api", pascal_case(tag)),
    None => "DefaultApi".to_string(),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fallback_operation_id() {
    let cases = [
      ("GET", "/pets", "get_pets"),
      ("POST", "/pets/{petId}/photos", "post_pets_by_id_photos"),
      ("DELETE", "/", "delete"),
    ];
    for (method, path, expected) in cases {
      assert_eq!(fallback_operation_id(method, path), expected, "failed for {method} {path}");
    }
  }

  #[test]
  fn test_api_class_name() {
    let cases = [
      (TagGroup::Tag("pet"), "PetApi"),
      (TagGroup::Tag("Service Level Objectives"), "ServiceLevelObjectivesApi"),
      (TagGroup::Untagged, "DefaultApi"),
    ];
    for (group, expected) in cases {
      assert_eq!(api_class_name(group), expected, "failed for {group}");
    }
  }
}
