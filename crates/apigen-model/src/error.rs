use thiserror::Error;

/// Fatal conditions raised while building or walking a document model.
///
/// Every variant aborts generation for the document it was raised on. Recoverable
/// situations (a response without content, a parameter without a schema) never
/// surface here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
  /// The raw tree does not have the minimal shape needed to build the model.
  #[error("malformed document at '{path}': {message}")]
  MalformedDocument { path: String, message: String },

  /// A `$ref` names a section or component that does not exist.
  #[error("unresolved reference '{reference}': {reason}")]
  UnresolvedReference { reference: String, reason: String },

  /// Two distinct schemas claim the same model name.
  #[error("ambiguous model name '{name}': {first} collides with {second}")]
  AmbiguousName { name: String, first: String, second: String },

  /// A reference was resolved against a document other than the one it was parsed from.
  #[error("reference '{reference}' does not belong to this document")]
  ForeignDocument { reference: String },
}

impl ModelError {
  pub(crate) fn malformed(path: impl Into<String>, message: impl Into<String>) -> Self {
    Self::MalformedDocument {
      path: path.into(),
      message: message.into(),
    }
  }

  pub(crate) fn unresolved(reference: impl Into<String>, reason: impl Into<String>) -> Self {
    Self::UnresolvedReference {
      reference: reference.into(),
      reason: reason.into(),
    }
  }

  /// Returns the JSON pointer the error is attached to, when it has one.
  #[must_use]
  pub fn path(&self) -> Option<&str> {
    match self {
      Self::MalformedDocument { path, .. } => Some(path),
      _ => None,
    }
  }
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;
