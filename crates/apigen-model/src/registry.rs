//! The named-model registry and the graph walker that fills it.
//!
//! A walk starts from any [`SchemaWalk`] root and records every schema that needs an
//! emitted type of its own under its model name. Deduplication by name is also the
//! cycle guard: a name is descended at most once per registry, so self-referencing
//! and mutually-referencing schemas terminate.

use std::ptr;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use strum::Display;

use crate::{
  document::{Components, OpenApi, PathItem},
  error::{ModelError, Result},
  mapping::{ListModels, TypeMapper},
  naming::{item_name, synthetic_name},
  operation::Operation,
  parameter::Parameter,
  schema::{SchemaKind, SchemaNode, SchemaRef, SchemaType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectOptions {
  /// Descend into the children of every registered model, not only the root.
  pub recursive: bool,
  /// Register a named root itself, not only what it reaches.
  pub include_root: bool,
}

impl Default for CollectOptions {
  fn default() -> Self {
    Self {
      recursive: true,
      include_root: true,
    }
  }
}

/// How a registered model got its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NameOrigin {
  /// Declared under `components.schemas`.
  Component,
  /// Built from the enclosing model and the property it sits under.
  Synthetic,
}

#[derive(Debug, Clone, Copy)]
pub struct RegisteredModel<'d> {
  pub schema: &'d SchemaNode,
  pub origin: NameOrigin,
}

/// Ordered `model name → schema` map, in registration order.
#[derive(Debug, Clone, Default)]
pub struct NameRegistry<'d> {
  models: IndexMap<String, RegisteredModel<'d>>,
}

impl<'d> NameRegistry<'d> {
  #[must_use]
  pub fn new() -> Self {
    Self::default()
  }

  /// Records `node` under `name`. Returns `false` when the very same node is already
  /// registered; a different node under a taken name is an [`ModelError::AmbiguousName`].
  pub fn register(&mut self, name: &str, node: &'d SchemaNode, origin: NameOrigin) -> Result<bool> {
    if let Some(existing) = self.models.get(name) {
      if ptr::eq(existing.schema, node) {
        return Ok(false);
      }
      return Err(ModelError::AmbiguousName {
        name: name.to_string(),
        first: existing.schema.meta.pointer.clone(),
        second: node.meta.pointer.clone(),
      });
    }

    self.models.insert(name.to_string(), RegisteredModel { schema: node, origin });
    Ok(true)
  }

  #[must_use]
  pub fn get(&self, name: &str) -> Option<&RegisteredModel<'d>> {
    self.models.get(name)
  }

  #[must_use]
  pub fn contains(&self, name: &str) -> bool {
    self.models.contains_key(name)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisteredModel<'d>)> {
    self.models.iter().map(|(name, model)| (name.as_str(), model))
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.models.keys().map(String::as_str)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.models.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.models.is_empty()
  }

  /// Drops everything that is not emitted as a model file: only enums, objects,
  /// compositions and allow-listed arrays stay.
  pub fn retain_emittable(&mut self, list_models: &ListModels) {
    self.models.retain(|name, model| match &model.schema.kind {
      SchemaKind::Object { .. } | SchemaKind::Enum { .. } | SchemaKind::OneOf(_) | SchemaKind::AllOf(_) => true,
      SchemaKind::Array { .. } => list_models.contains(name),
      SchemaKind::AnyOf(_) | SchemaKind::Primitive(_) => model.schema.meta.declared_type == Some(SchemaType::Object),
    });
  }
}

impl<'d> IntoIterator for NameRegistry<'d> {
  type Item = (String, RegisteredModel<'d>);
  type IntoIter = indexmap::map::IntoIter<String, RegisteredModel<'d>>;

  fn into_iter(self) -> Self::IntoIter {
    self.models.into_iter()
  }
}

/// Walk state: the document everything resolves through and the registry being filled.
pub struct SchemaWalker<'d, 'r> {
  document: &'d OpenApi,
  registry: &'r mut NameRegistry<'d>,
  recursive: bool,
  include_root: bool,
}

impl<'d, 'r> SchemaWalker<'d, 'r> {
  pub fn new(document: &'d OpenApi, registry: &'r mut NameRegistry<'d>, options: CollectOptions) -> Self {
    Self {
      document,
      registry,
      recursive: options.recursive,
      include_root: options.include_root,
    }
  }

  #[must_use]
  pub fn document(&self) -> &'d OpenApi {
    self.document
  }

  pub fn visit_root(&mut self, slot: &'d SchemaRef) -> Result<()> {
    let node = slot.resolve(self.document)?;
    self.visit_root_node(node)
  }

  /// Entry for a walk root. A named root is registered (when asked to) and always
  /// descended; an anonymous one is walked in place with no naming context.
  pub fn visit_root_node(&mut self, node: &'d SchemaNode) -> Result<()> {
    let Some(name) = node.name() else {
      return self.visit_node(node, None, None);
    };

    if self.include_root && !self.registry.register(name, node, NameOrigin::Component)? {
      return Ok(());
    }
    self.descend(node, Some(name))
  }

  fn visit_named(&mut self, name: &str, node: &'d SchemaNode) -> Result<()> {
    if self.registry.register(name, node, NameOrigin::Component)? && self.recursive {
      self.descend(node, Some(name))?;
    }
    Ok(())
  }

  fn visit_synthetic(&mut self, name: &str, node: &'d SchemaNode) -> Result<()> {
    if self.registry.register(name, node, NameOrigin::Synthetic)? && self.recursive {
      self.descend(node, Some(name))?;
    }
    Ok(())
  }

  /// Visits a child position. `candidate` is the synthetic name the child takes if it
  /// is anonymous and needs one; `owner` is the model the position belongs to.
  fn visit_child(&mut self, slot: &'d SchemaRef, candidate: Option<&str>, owner: Option<&str>) -> Result<()> {
    let node = slot.resolve(self.document)?;
    if let Some(name) = node.name() {
      return self.visit_named(name, node);
    }
    self.visit_node(node, candidate, owner)
  }

  fn visit_node(&mut self, node: &'d SchemaNode, candidate: Option<&str>, owner: Option<&str>) -> Result<()> {
    if let Some(member) = node.single_all_of_member() {
      return self.visit_child(member, candidate, owner);
    }

    match &node.kind {
      SchemaKind::Primitive(_) => Ok(()),
      SchemaKind::Array { items, .. } => self.visit_child(items, candidate, owner),
      SchemaKind::Enum { .. } => match (candidate, owner) {
        (Some(candidate), _) => self.registry.register(candidate, node, NameOrigin::Synthetic).map(|_| ()),
        (None, Some(owner)) => Err(ModelError::malformed(
          &node.meta.pointer,
          format!("anonymous enum inside '{owner}' has no position to take a model name from"),
        )),
        (None, None) => Ok(()),
      },
      _ if node.wants_synthetic_name() => match candidate {
        Some(candidate) => self.visit_synthetic(candidate, node),
        None if self.recursive => self.descend(node, None),
        None => Ok(()),
      },
      _ if self.recursive => self.descend(node, candidate),
      _ => Ok(()),
    }
  }

  fn descend(&mut self, node: &'d SchemaNode, context: Option<&str>) -> Result<()> {
    match &node.kind {
      SchemaKind::Object {
        properties,
        additional_properties,
        ..
      } => {
        for (property, slot) in properties {
          let candidate = context.map(|parent| synthetic_name(parent, property));
          self.visit_child(slot, candidate.as_deref(), context)?;
        }
        if let Some(value) = additional_properties.schema() {
          self.visit_child(value, None, context)?;
        }
        Ok(())
      }
      SchemaKind::Array { items, .. } => {
        let candidate = context.map(item_name);
        self.visit_child(items, candidate.as_deref(), context)
      }
      SchemaKind::AllOf(variants) => {
        for variant in variants {
          self.visit_variant(variant, context)?;
        }
        Ok(())
      }
      SchemaKind::OneOf(variants) | SchemaKind::AnyOf(variants) => {
        for variant in variants {
          self.visit_variant(variant, None)?;
        }
        Ok(())
      }
      SchemaKind::Enum { .. } | SchemaKind::Primitive(_) => Ok(()),
    }
  }

  /// Composition members never take a synthetic name themselves. Anonymous object and
  /// composition members are descended in `context`: the parent's name for `allOf`,
  /// whose properties are flattened into it, and none for `oneOf`/`anyOf`, whose
  /// members are inlined as their basic type. Anything else is inlined as well.
  fn visit_variant(&mut self, slot: &'d SchemaRef, context: Option<&str>) -> Result<()> {
    let node = slot.resolve(self.document)?;
    if let Some(name) = node.name() {
      return self.visit_named(name, node);
    }
    if !self.recursive {
      return Ok(());
    }

    match &node.kind {
      SchemaKind::Object { .. } | SchemaKind::OneOf(_) | SchemaKind::AllOf(_) | SchemaKind::AnyOf(_) => {
        self.descend(node, context)
      }
      SchemaKind::Array { items, .. } => self.visit_child(items, None, None),
      SchemaKind::Enum { .. } | SchemaKind::Primitive(_) => Ok(()),
    }
  }
}

/// Anything a registry walk can start from.
pub trait SchemaWalk {
  fn walk<'d>(&'d self, walker: &mut SchemaWalker<'d, '_>) -> Result<()>;
}

impl SchemaWalk for SchemaRef {
  fn walk<'d>(&'d self, walker: &mut SchemaWalker<'d, '_>) -> Result<()> {
    walker.visit_root(self)
  }
}

impl SchemaWalk for SchemaNode {
  fn walk<'d>(&'d self, walker: &mut SchemaWalker<'d, '_>) -> Result<()> {
    walker.visit_root_node(self)
  }
}

impl SchemaWalk for Parameter {
  fn walk<'d>(&'d self, walker: &mut SchemaWalker<'d, '_>) -> Result<()> {
    match &self.schema {
      Some(schema) => walker.visit_root(schema),
      None => Ok(()),
    }
  }
}

impl SchemaWalk for Operation {
  fn walk<'d>(&'d self, walker: &mut SchemaWalker<'d, '_>) -> Result<()> {
    let document = walker.document();
    for slot in &self.parameters {
      slot.resolve(document)?.walk(walker)?;
    }

    if let Some(body) = &self.request_body {
      for schema in body.content.values().filter_map(|media| media.schema.as_ref()) {
        walker.visit_root(schema)?;
      }
    }

    for slot in self.responses.values() {
      let response = slot.resolve(document)?;
      for schema in response.content.values().filter_map(|media| media.schema.as_ref()) {
        walker.visit_root(schema)?;
      }
    }
    Ok(())
  }
}

impl SchemaWalk for PathItem {
  fn walk<'d>(&'d self, walker: &mut SchemaWalker<'d, '_>) -> Result<()> {
    let document = walker.document();
    for slot in &self.parameters {
      slot.resolve(document)?.walk(walker)?;
    }
    for operation in self.operations.values() {
      operation.walk(walker)?;
    }
    Ok(())
  }
}

impl SchemaWalk for Components {
  fn walk<'d>(&'d self, walker: &mut SchemaWalker<'d, '_>) -> Result<()> {
    for slot in self.schemas.values() {
      walker.visit_root(slot)?;
    }
    Ok(())
  }
}

/// Walks the paths only; unused components are not part of the generated surface.
impl SchemaWalk for OpenApi {
  fn walk<'d>(&'d self, walker: &mut SchemaWalker<'d, '_>) -> Result<()> {
    for path_item in self.paths.values() {
      path_item.walk(walker)?;
    }
    Ok(())
  }
}

/// Collects the named schemas reachable from `root` into a fresh registry.
pub fn collect_named_schemas<'d, R>(document: &'d OpenApi, root: &'d R, options: CollectOptions) -> Result<NameRegistry<'d>>
where
  R: SchemaWalk + ?Sized,
{
  let mut registry = NameRegistry::new();
  collect_named_schemas_into(document, root, options, &mut registry)?;
  Ok(registry)
}

/// Like [`collect_named_schemas`], accumulating into a caller-owned registry. Names
/// already present are neither re-registered nor descended again.
pub fn collect_named_schemas_into<'d, R>(
  document: &'d OpenApi,
  root: &'d R,
  options: CollectOptions,
  registry: &mut NameRegistry<'d>,
) -> Result<()>
where
  R: SchemaWalk + ?Sized,
{
  let mut walker = SchemaWalker::new(document, registry, options);
  root.walk(&mut walker)
}

/// Member names of every `oneOf` reachable from `model` through properties, their array
/// items and their map values, in first-seen order.
///
/// Object members and allow-listed arrays contribute their own name; other arrays
/// contribute the name of their items. `model_name` itself never appears.
pub fn collect_polymorphic_member_names(
  document: &OpenApi,
  model: &SchemaNode,
  model_name: &str,
  list_models: &ListModels,
) -> Result<Vec<String>> {
  let mut seen = IndexSet::new();
  let mut result = IndexSet::new();
  polymorphic_members(document, model, list_models, &mut seen, &mut result)?;
  result.shift_remove(model_name);
  Ok(result.into_iter().collect())
}

fn polymorphic_members<'d>(
  document: &'d OpenApi,
  model: &'d SchemaNode,
  list_models: &ListModels,
  seen: &mut IndexSet<&'d str>,
  result: &mut IndexSet<String>,
) -> Result<()> {
  if let Some(name) = model.name()
    && !seen.insert(name)
  {
    return Ok(());
  }

  if let SchemaKind::OneOf(variants) = &model.kind {
    for variant in variants {
      let member = variant.resolve(document)?;
      let schema_type = member.schema_type().unwrap_or(SchemaType::Object);
      if schema_type == SchemaType::Object || member.name().is_some_and(|name| list_models.contains(name)) {
        if let Some(name) = member.name() {
          result.insert(name.to_string());
        }
      } else if let Some(items) = member.items()
        && let Some(name) = items.resolve(document)?.name()
      {
        result.insert(name.to_string());
      }
    }
  }

  if let Some(properties) = model.properties() {
    for slot in properties.values() {
      let definition = slot.resolve(document)?;
      polymorphic_members(document, definition, list_models, seen, result)?;
      if let Some(items) = definition.items() {
        polymorphic_members(document, items.resolve(document)?, list_models, seen, result)?;
      }
      if let Some(value) = definition.additional_properties().and_then(|ap| ap.schema()) {
        polymorphic_members(document, value.resolve(document)?, list_models, seen, result)?;
      }
    }
  }
  Ok(())
}

/// Other models the emitted type of `model_name` refers to, in first-seen order.
pub fn model_references(
  document: &OpenApi,
  model: &SchemaNode,
  model_name: &str,
  list_models: &ListModels,
) -> Result<Vec<String>> {
  TypeMapper::new(document, list_models).model_references(model_name, model)
}
