//! Typed, cross-referenced model of an OpenAPI 3 document for client generators.
//!
//! [`OpenApi::from_value`] turns a raw JSON tree into owned nodes whose `$ref`s stay
//! unresolved until first use. On top of that model the crate provides the walks a
//! template-driven emitter needs: the named-model [`registry`], per-operation
//! parameter and response data, and a language-neutral [`mapping`] of schemas to
//! types.
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

pub mod document;
pub mod error;
pub mod graph;
pub mod mapping;
pub mod naming;
pub mod operation;
pub mod parameter;
mod raw;
pub mod reference;
pub mod registry;
pub mod schema;
pub mod security;

#[cfg(test)]
mod tests;

pub use document::{OpenApi, OperationEntry, PathItem, TagGroup};
pub use error::{ModelError, Result};
pub use graph::SchemaDependencyGraph;
pub use mapping::{ListModels, TypeMapper, TypeRef, default_value};
pub use naming::ReservedWords;
pub use operation::{Operation, Response};
pub use parameter::{CollectionFormat, EffectiveParameter, Parameter, ParameterLocation, collection_format};
pub use reference::{DocumentId, ObjectOrRef, Reference};
pub use registry::{
  CollectOptions, NameOrigin, NameRegistry, RegisteredModel, SchemaWalk, collect_named_schemas,
  collect_named_schemas_into, collect_polymorphic_member_names, model_references,
};
pub use schema::{SchemaKind, SchemaNode, SchemaRef, SchemaType};
