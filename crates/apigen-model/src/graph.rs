use std::collections::BTreeSet;

use indexmap::{IndexMap, IndexSet};
use petgraph::{algo::kosaraju_scc, graphmap::DiGraphMap};

use crate::{
  document::OpenApi,
  reference::ObjectOrRef,
  schema::{SchemaKind, SchemaNode, SchemaRef},
};

/// Which component schemas each component schema refers to by `$ref`.
///
/// Built from the raw references only, without resolving them, so it also works on
/// documents with dangling references.
#[derive(Debug, Default)]
pub struct SchemaDependencyGraph<'d> {
  dependencies: IndexMap<&'d str, IndexSet<&'d str>>,
}

impl<'d> SchemaDependencyGraph<'d> {
  #[must_use]
  pub fn build(document: &'d OpenApi) -> Self {
    let dependencies = document
      .components
      .schemas
      .iter()
      .map(|(name, slot)| {
        let mut refs = IndexSet::new();
        collect_refs(slot, &mut refs);
        (name.as_str(), refs)
      })
      .collect();
    Self { dependencies }
  }

  #[must_use]
  pub fn dependencies(&self, name: &str) -> Option<&IndexSet<&'d str>> {
    self.dependencies.get(name)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.dependencies.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.dependencies.is_empty()
  }

  /// Groups of schemas that reach each other, including self-references. Members of a
  /// group are sorted by name and groups by their first member.
  #[must_use]
  pub fn cycles(&self) -> Vec<Vec<String>> {
    let mut graph = DiGraphMap::<&str, ()>::new();
    for (&node, deps) in &self.dependencies {
      graph.add_node(node);
      for &dep in deps {
        graph.add_edge(node, dep, ());
      }
    }

    let mut cycles = kosaraju_scc(&graph)
      .into_iter()
      .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
      .map(|scc| {
        scc
          .into_iter()
          .map(String::from)
          .collect::<BTreeSet<_>>()
          .into_iter()
          .collect::<Vec<_>>()
      })
      .collect::<Vec<_>>();
    cycles.sort();
    cycles
  }
}

fn collect_refs<'d>(slot: &'d SchemaRef, refs: &mut IndexSet<&'d str>) {
  match slot {
    ObjectOrRef::Ref(reference) => {
      refs.insert(reference.name());
    }
    ObjectOrRef::Owned(node) => collect_node_refs(node, refs),
  }
}

fn collect_node_refs<'d>(node: &'d SchemaNode, refs: &mut IndexSet<&'d str>) {
  match &node.kind {
    SchemaKind::Object {
      properties,
      additional_properties,
      ..
    } => {
      for property in properties.values() {
        collect_refs(property, refs);
      }
      if let Some(value) = additional_properties.schema() {
        collect_refs(value, refs);
      }
    }
    SchemaKind::Array { items, .. } => collect_refs(items, refs),
    SchemaKind::OneOf(variants) | SchemaKind::AllOf(variants) | SchemaKind::AnyOf(variants) => {
      for variant in variants {
        collect_refs(variant, refs);
      }
    }
    SchemaKind::Enum { .. } | SchemaKind::Primitive(_) => {}
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_cycles_and_dependencies() {
    let doc = OpenApi::from_value(&json!({
      "openapi": "3.0.0",
      "info": { "title": "t", "version": "1" },
      "components": {
        "schemas": {
          "Node": {
            "type": "object",
            "properties": { "children": { "type": "array", "items": { "$ref": "#/components/schemas/Node" } } }
          },
          "A": { "type": "object", "properties": { "b": { "$ref": "#/components/schemas/B" } } },
          "B": { "allOf": [{ "$ref": "#/components/schemas/A" }, { "$ref": "#/components/schemas/Leaf" }] },
          "Leaf": { "type": "string" },
          "Alias": { "$ref": "#/components/schemas/Leaf" }
        }
      }
    }))
    .unwrap();

    let graph = SchemaDependencyGraph::build(&doc);
    assert_eq!(graph.len(), 5);
    assert_eq!(
      graph.dependencies("B").unwrap().iter().copied().collect::<Vec<_>>(),
      ["A", "Leaf"]
    );
    assert_eq!(
      graph.dependencies("Alias").unwrap().iter().copied().collect::<Vec<_>>(),
      ["Leaf"]
    );

    assert_eq!(graph.cycles(), vec![vec!["A".to_string(), "B".to_string()], vec!["Node".to_string()]]);
  }
}
