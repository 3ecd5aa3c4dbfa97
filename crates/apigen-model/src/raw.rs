//! Typed accessors over the generic value tree handed to us by the loader.
//!
//! Every accessor knows the JSON pointer of the node it reads so shape errors can be
//! reported with their location inside the document.

use indexmap::IndexMap;
use serde_json::{Map, Number, Value};

use crate::{
  error::{ModelError, Result},
  reference::{DocumentId, ObjectOrRef, Reference},
};

pub(crate) const EXTENSION_PREFIX: &str = "x-";

/// State shared by every constructor while one document is being built.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ParseContext {
  pub(crate) document: DocumentId,
}

impl ParseContext {
  pub(crate) fn new() -> Self {
    Self {
      document: DocumentId::next(),
    }
  }

  /// Builds a component slot: a `$ref` becomes an unresolved [`Reference`], anything else
  /// is handed to `owned`.
  pub(crate) fn slot<T>(
    &self,
    value: &Value,
    path: &str,
    owned: impl FnOnce(RawNode<'_>) -> Result<T>,
  ) -> Result<ObjectOrRef<T>> {
    let node = RawNode::new(value, path)?;
    match node.str("$ref")? {
      Some(ref_path) => Ok(ObjectOrRef::Ref(Reference::parse(ref_path, self.document, path)?)),
      None => owned(node).map(ObjectOrRef::Owned),
    }
  }
}

/// Appends `key` to a JSON pointer, escaping `~` and `/` as RFC 6901 requires.
pub(crate) fn pointer_child(path: &str, key: &str) -> String {
  let escaped = key.replace('~', "~0").replace('/', "~1");
  format!("{path}/{escaped}")
}

pub(crate) fn unescape_pointer_segment(segment: &str) -> String {
  segment.replace("~1", "/").replace("~0", "~")
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct RawNode<'v> {
  map: &'v Map<String, Value>,
  path: &'v str,
}

impl<'v> RawNode<'v> {
  pub(crate) fn new(value: &'v Value, path: &'v str) -> Result<Self> {
    match value {
      Value::Object(map) => Ok(Self { map, path }),
      other => Err(ModelError::malformed(
        path,
        format!("expected an object, found {}", kind_of(other)),
      )),
    }
  }

  pub(crate) fn path(&self) -> &'v str {
    self.path
  }

  pub(crate) fn child_path(&self, key: &str) -> String {
    pointer_child(self.path, key)
  }

  pub(crate) fn contains(&self, key: &str) -> bool {
    self.map.contains_key(key)
  }

  pub(crate) fn get(&self, key: &str) -> Option<&'v Value> {
    self.map.get(key)
  }

  pub(crate) fn entries(&self) -> impl Iterator<Item = (&'v String, &'v Value)> + use<'v> {
    self.map.iter()
  }

  pub(crate) fn str(&self, key: &str) -> Result<Option<&'v str>> {
    match self.map.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::String(s)) => Ok(Some(s.as_str())),
      Some(other) => Err(self.unexpected(key, "a string", other)),
    }
  }

  pub(crate) fn string(&self, key: &str) -> Result<Option<String>> {
    Ok(self.str(key)?.map(String::from))
  }

  pub(crate) fn required_string(&self, key: &str) -> Result<String> {
    self
      .string(key)?
      .ok_or_else(|| ModelError::malformed(self.path, format!("missing required field '{key}'")))
  }

  /// Reads a boolean keyword. String spellings `"true"` / `"false"` are accepted in any case.
  pub(crate) fn bool(&self, key: &str) -> Result<Option<bool>> {
    match self.map.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Bool(b)) => Ok(Some(*b)),
      Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
      Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
      Some(other) => Err(self.unexpected(key, "a boolean", other)),
    }
  }

  pub(crate) fn flag(&self, key: &str) -> Result<bool> {
    Ok(self.bool(key)?.unwrap_or(false))
  }

  pub(crate) fn u64(&self, key: &str) -> Result<Option<u64>> {
    match self.map.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Number(n)) if n.as_u64().is_some() => Ok(n.as_u64()),
      Some(other) => Err(self.unexpected(key, "a non-negative integer", other)),
    }
  }

  pub(crate) fn number(&self, key: &str) -> Result<Option<Number>> {
    match self.map.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Number(n)) => Ok(Some(n.clone())),
      Some(other) => Err(self.unexpected(key, "a number", other)),
    }
  }

  pub(crate) fn array(&self, key: &str) -> Result<Option<&'v Vec<Value>>> {
    match self.map.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Array(items)) => Ok(Some(items)),
      Some(other) => Err(self.unexpected(key, "an array", other)),
    }
  }

  pub(crate) fn object(&self, key: &str) -> Result<Option<&'v Map<String, Value>>> {
    match self.map.get(key) {
      None | Some(Value::Null) => Ok(None),
      Some(Value::Object(map)) => Ok(Some(map)),
      Some(other) => Err(self.unexpected(key, "an object", other)),
    }
  }

  pub(crate) fn string_list(&self, key: &str) -> Result<Vec<String>> {
    let Some(items) = self.array(key)? else {
      return Ok(vec![]);
    };

    items
      .iter()
      .enumerate()
      .map(|(index, item)| match item {
        Value::String(s) => Ok(s.clone()),
        other => Err(ModelError::malformed(
          pointer_child(&self.child_path(key), &index.to_string()),
          format!("expected a string, found {}", kind_of(other)),
        )),
      })
      .collect()
  }

  /// Collects every `x-*` key in document order.
  pub(crate) fn extensions(&self) -> IndexMap<String, Value> {
    self
      .map
      .iter()
      .filter(|(key, _)| key.starts_with(EXTENSION_PREFIX))
      .map(|(key, value)| (key.clone(), value.clone()))
      .collect()
  }

  fn unexpected(&self, key: &str, expected: &str, found: &Value) -> ModelError {
    ModelError::malformed(
      self.child_path(key),
      format!("expected {expected}, found {}", kind_of(found)),
    )
  }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_pointer_child_escapes_segments() {
    let cases = [
      ("#/paths", "/pets/{id}", "#/paths/~1pets~1{id}"),
      ("#/components/schemas", "a~b", "#/components/schemas/a~0b"),
      ("#", "info", "#/info"),
    ];
    for (base, key, expected) in cases {
      assert_eq!(pointer_child(base, key), expected, "failed for {base:?} + {key:?}");
      let last = expected.rsplit('/').next().unwrap();
      assert_eq!(unescape_pointer_segment(last), key, "unescape failed for {key:?}");
    }
  }

  #[test]
  fn test_bool_accepts_string_spellings() {
    let value = json!({ "a": true, "b": "False", "c": "TRUE", "d": 1 });
    let node = RawNode::new(&value, "#").unwrap();

    assert_eq!(node.bool("a").unwrap(), Some(true));
    assert_eq!(node.bool("b").unwrap(), Some(false));
    assert_eq!(node.bool("c").unwrap(), Some(true));
    assert_eq!(node.bool("missing").unwrap(), None);

    let err = node.bool("d").unwrap_err();
    assert_eq!(err.path(), Some("#/d"));
  }

  #[test]
  fn test_extensions_keep_document_order() {
    let value = json!({ "x-b": 1, "type": "string", "x-a": { "nested": true } });
    let node = RawNode::new(&value, "#").unwrap();

    let extensions = node.extensions();
    assert_eq!(extensions.keys().collect::<Vec<_>>(), ["x-b", "x-a"]);
  }

  #[test]
  fn test_non_object_is_malformed() {
    let value = json!(["not", "an", "object"]);
    let err = RawNode::new(&value, "#/components/schemas/Pet").unwrap_err();
    assert!(
      matches!(err, ModelError::MalformedDocument { ref path, .. } if path == "#/components/schemas/Pet"),
      "unexpected error: {err}"
    );
  }
}
