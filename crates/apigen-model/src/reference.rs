//! Lazy `$ref` resolution against the owning document.
//!
//! A [`Reference`] is parsed without looking at its target. Resolution happens on
//! first use and always goes through the [`OpenApi`] handed to `resolve`, never
//! through a pointer captured at parse time, so forward references and cycles cost
//! nothing during construction.

use std::{
  fmt,
  marker::PhantomData,
  str::FromStr,
  sync::{
    OnceLock,
    atomic::{AtomicU64, Ordering},
  },
};

use indexmap::IndexMap;
use serde::{Serialize, Serializer, ser::SerializeMap};
use strum::{AsRefStr, Display, EnumString};

use crate::{
  document::{Components, OpenApi},
  error::{ModelError, Result},
  raw::unescape_pointer_segment,
};

/// Upper bound on `$ref` hops when a component is itself an alias of another one.
const MAX_ALIAS_DEPTH: usize = 32;

/// Identity of one loaded document. Every [`Reference`] remembers the document it was
/// parsed for, so two documents processed side by side can never cross-resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(u64);

impl DocumentId {
  pub(crate) fn next() -> Self {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    Self(NEXT.fetch_add(1, Ordering::Relaxed))
  }
}

/// The dereferenceable sections of `components`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum ComponentSection {
  Schemas,
  Parameters,
  Responses,
  SecuritySchemes,
}

impl ComponentSection {
  #[must_use]
  pub const fn label(self) -> &'static str {
    match self {
      Self::Schemas => "schema",
      Self::Parameters => "parameter",
      Self::Responses => "response",
      Self::SecuritySchemes => "security scheme",
    }
  }
}

/// A value that can live under one of the `components` sections.
pub trait Component: Sized {
  const SECTION: ComponentSection;

  fn section(components: &Components) -> &IndexMap<String, ObjectOrRef<Self>>;
}

/// An unresolved pointer to a named component.
pub struct Reference<T> {
  path: String,
  section: String,
  name: String,
  document: DocumentId,
  target: OnceLock<usize>,
  kind: PhantomData<fn() -> T>,
}

impl<T> Reference<T> {
  /// Splits a `$ref` string on `/` and keeps the last two segments as `(section, name)`.
  pub(crate) fn parse(ref_path: &str, document: DocumentId, at: &str) -> Result<Self> {
    let mut segments = ref_path.rsplit('/');
    let (Some(name), Some(section)) = (segments.next(), segments.next()) else {
      return Err(ModelError::malformed(
        at,
        format!("'$ref' value '{ref_path}' does not name a component section"),
      ));
    };

    if name.is_empty() || section.is_empty() {
      return Err(ModelError::malformed(
        at,
        format!("'$ref' value '{ref_path}' has an empty segment"),
      ));
    }

    Ok(Self {
      path: ref_path.to_string(),
      section: unescape_pointer_segment(section),
      name: unescape_pointer_segment(name),
      document,
      target: OnceLock::new(),
      kind: PhantomData,
    })
  }

  /// The raw `$ref` string as written in the document.
  #[must_use]
  pub fn path(&self) -> &str {
    &self.path
  }

  #[must_use]
  pub fn section(&self) -> &str {
    &self.section
  }

  /// The component name, which doubles as the model name of the target.
  #[must_use]
  pub fn name(&self) -> &str {
    &self.name
  }

  #[must_use]
  pub fn is_resolved(&self) -> bool {
    self.target.get().is_some()
  }
}

impl<T: Component> Reference<T> {
  /// Resolves one hop: the entry stored under `components[section][name]`.
  ///
  /// The position of the hit is memoized, so only the first call per instance performs
  /// the name lookup. The memo is write-once; racing first calls store the same index.
  pub fn resolve<'d>(&self, document: &'d OpenApi) -> Result<&'d ObjectOrRef<T>> {
    if document.id() != self.document {
      return Err(ModelError::ForeignDocument {
        reference: self.path.clone(),
      });
    }

    let entries = T::section(document.components());

    if let Some(&index) = self.target.get() {
      return entries
        .get_index(index)
        .map(|(_, target)| target)
        .ok_or_else(|| ModelError::unresolved(&self.path, "memoized target vanished"));
    }

    match ComponentSection::from_str(&self.section) {
      Ok(section) if section == T::SECTION => {}
      Ok(section) => {
        return Err(ModelError::unresolved(
          &self.path,
          format!(
            "section '{section}' cannot be used where a {} is expected",
            T::SECTION.label()
          ),
        ));
      }
      Err(_) => {
        return Err(ModelError::unresolved(
          &self.path,
          format!("unknown component section '{}'", self.section),
        ));
      }
    }

    let (index, _, target) = entries.get_full(self.name.as_str()).ok_or_else(|| {
      ModelError::unresolved(
        &self.path,
        format!("no {} named '{}' in components.{}", T::SECTION.label(), self.name, T::SECTION),
      )
    })?;

    let _ = self.target.set(index);
    Ok(target)
  }
}

impl<T> Clone for Reference<T> {
  fn clone(&self) -> Self {
    Self {
      path: self.path.clone(),
      section: self.section.clone(),
      name: self.name.clone(),
      document: self.document,
      target: self.target.clone(),
      kind: PhantomData,
    }
  }
}

impl<T> fmt::Debug for Reference<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Reference")
      .field("path", &self.path)
      .field("resolved", &self.is_resolved())
      .finish_non_exhaustive()
  }
}

/// A slot that either owns its value (inlined in the document) or points at a
/// named component.
#[derive(Debug, Clone)]
pub enum ObjectOrRef<T> {
  Owned(T),
  Ref(Reference<T>),
}

impl<T> ObjectOrRef<T> {
  #[must_use]
  pub fn as_owned(&self) -> Option<&T> {
    match self {
      Self::Owned(object) => Some(object),
      Self::Ref(_) => None,
    }
  }

  #[must_use]
  pub fn as_reference(&self) -> Option<&Reference<T>> {
    match self {
      Self::Owned(_) => None,
      Self::Ref(reference) => Some(reference),
    }
  }

  #[must_use]
  pub fn is_ref(&self) -> bool {
    matches!(self, Self::Ref(_))
  }
}

impl<T: Component> ObjectOrRef<T> {
  /// Follows references (including component aliases) down to the owned value.
  pub fn resolve<'d>(&'d self, document: &'d OpenApi) -> Result<&'d T> {
    let mut current = self;
    for _ in 0..=MAX_ALIAS_DEPTH {
      match current {
        Self::Owned(object) => return Ok(object),
        Self::Ref(reference) => current = reference.resolve(document)?,
      }
    }

    let origin = self.as_reference().map_or("<inline>", Reference::path);
    Err(ModelError::unresolved(
      origin,
      format!("alias chain exceeds {MAX_ALIAS_DEPTH} hops"),
    ))
  }
}

impl<T: Serialize> Serialize for ObjectOrRef<T> {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    match self {
      Self::Owned(object) => object.serialize(serializer),
      Self::Ref(reference) => {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry("$ref", reference.path())?;
        map.end()
      }
    }
  }
}
