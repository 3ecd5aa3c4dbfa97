use std::collections::HashSet;

use indexmap::{IndexMap, IndexSet};

use super::{AdditionalProperties, SchemaKind, SchemaNode, SchemaRef};
use crate::{document::OpenApi, error::Result};

/// The property set an `allOf` composition stands for once all members are merged.
#[derive(Debug, Default)]
pub struct FlattenedObject<'d> {
  pub properties: IndexMap<&'d str, &'d SchemaRef>,
  pub required: IndexSet<&'d str>,
  pub additional_properties: Option<&'d AdditionalProperties>,
  /// The named schema each property was last declared by. Properties of anonymous
  /// members belong to the nearest named schema above them.
  pub declared_in: IndexMap<&'d str, &'d str>,
}

impl<'d> FlattenedObject<'d> {
  #[must_use]
  pub fn is_required(&self, property: &str) -> bool {
    self.required.contains(property)
  }

  #[must_use]
  pub fn declaring_model(&self, property: &str) -> Option<&'d str> {
    self.declared_in.get(property).copied()
  }

  fn merge_from(&mut self, source: &'d SchemaNode, owner: Option<&'d str>) {
    let SchemaKind::Object {
      properties,
      required,
      additional_properties,
    } = &source.kind
    else {
      return;
    };

    for (name, property) in properties {
      self.properties.insert(name.as_str(), property);
      match owner {
        Some(owner) => self.declared_in.insert(name.as_str(), owner),
        None => self.declared_in.shift_remove(name.as_str()),
      };
    }
    self.required.extend(required.iter().map(String::as_str));
    if self.additional_properties.is_none() && !additional_properties.is_absent() {
      self.additional_properties = Some(additional_properties);
    }
  }
}

/// Merges an `allOf` (following references and nested `allOf`s) into one property set.
///
/// Members are merged in declaration order: a property declared again by a later
/// member replaces the earlier schema but keeps its original position. `required` is
/// the union of every member's list and the first `additionalProperties` wins. Members
/// that are neither objects nor compositions contribute nothing. A plain object
/// flattens to itself.
pub fn flatten_all_of<'d>(document: &'d OpenApi, node: &'d SchemaNode) -> Result<FlattenedObject<'d>> {
  let mut acc = FlattenedObject::default();
  let mut visiting = HashSet::new();
  if let Some(name) = node.name() {
    visiting.insert(name);
  }
  merge_node(document, node, &mut acc, &mut visiting, node.name())?;
  Ok(acc)
}

fn merge_node<'d>(
  document: &'d OpenApi,
  node: &'d SchemaNode,
  acc: &mut FlattenedObject<'d>,
  visiting: &mut HashSet<&'d str>,
  owner: Option<&'d str>,
) -> Result<()> {
  match &node.kind {
    SchemaKind::AllOf(members) => {
      for member in members {
        merge_slot(document, member, acc, visiting, owner)?;
      }
    }
    SchemaKind::Object { .. } => acc.merge_from(node, owner),
    _ => {}
  }
  Ok(())
}

fn merge_slot<'d>(
  document: &'d OpenApi,
  slot: &'d SchemaRef,
  acc: &mut FlattenedObject<'d>,
  visiting: &mut HashSet<&'d str>,
  owner: Option<&'d str>,
) -> Result<()> {
  let target = slot.resolve(document)?;
  let name = target.name();
  if let Some(name) = name
    && !visiting.insert(name)
  {
    return Ok(());
  }

  merge_node(document, target, acc, visiting, name.or(owner))?;

  if let Some(name) = name {
    visiting.remove(name);
  }
  Ok(())
}
