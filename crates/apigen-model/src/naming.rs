use std::{borrow::Cow, collections::HashSet, sync::LazyLock};

use any_ascii::any_ascii;
use inflections::Inflect;
use regex::Regex;

/// Python keywords plus the builtins generated clients must not shadow.
pub const PYTHON_RESERVED_WORDS: &[&str] = &[
  "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
  "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda", "nonlocal",
  "not", "or", "pass", "raise", "return", "try", "while", "with", "yield", "property", "cls",
];

/// Acronyms that snake-case badly, rewritten before conversion.
const SNAKE_CASE_FIXUPS: &[(&str, &str)] = &[
  ("IdP", "Idp"),
  ("AuthNMapping", "AuthnMapping"),
  ("AuthN ", "Authn "),
  ("IoT", "Iot"),
  ("SLOs", "Slos"),
];

const ITEM_SUFFIX: &str = "Item";

static INVALID_CHARS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]+").unwrap());
static MULTI_UNDERSCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_+").unwrap());

/// Transliterates to ASCII, replaces everything outside `[A-Za-z0-9_]` with `_`, collapses
/// runs of `_` and trims them from both ends.
#[must_use]
pub fn sanitize(input: &str) -> String {
  if input.is_empty() {
    return String::new();
  }

  let ascii = any_ascii(input);
  let replaced = INVALID_CHARS_RE.replace_all(&ascii, "_");
  let collapsed = MULTI_UNDERSCORE_RE.replace_all(&replaced, "_");

  collapsed.trim_matches('_').to_string()
}

#[must_use]
pub fn pascal_case(input: &str) -> String {
  sanitize(input).to_snake_case().to_pascal_case()
}

#[must_use]
pub fn snake_case(input: &str) -> String {
  sanitize(input).to_snake_case()
}

/// Name given to an anonymous schema found under `member` of the model `parent`.
#[must_use]
pub fn synthetic_name(parent: &str, member: &str) -> String {
  format!("{parent}{}", pascal_case(member))
}

/// Name given to the anonymous item schema of the named array `parent`.
#[must_use]
pub fn item_name(parent: &str) -> String {
  format!("{parent}{ITEM_SUFFIX}")
}

/// File-system friendly module name of a model or API group.
#[must_use]
pub fn module_name(name: &str) -> String {
  let fixed = SNAKE_CASE_FIXUPS
    .iter()
    .fold(name.to_string(), |acc, (token, replacement)| acc.replace(token, replacement));
  snake_case(&fixed)
}

/// Identifiers the target language reserves. Generated names that collide get a `_`
/// prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedWords(HashSet<String>);

impl ReservedWords {
  pub fn new<I, S>(words: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    Self(words.into_iter().map(Into::into).collect())
  }

  #[must_use]
  pub fn contains(&self, word: &str) -> bool {
    self.0.contains(word)
  }

  #[must_use]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  #[must_use]
  pub fn escape<'a>(&self, word: &'a str) -> Cow<'a, str> {
    if self.contains(word) {
      Cow::Owned(format!("_{word}"))
    } else {
      Cow::Borrowed(word)
    }
  }

  /// `snake_case` attribute name for a property or parameter, escaped when reserved.
  /// Empty results become `_`, and a leading digit gets a `_` prefix.
  #[must_use]
  pub fn attribute_name(&self, raw: &str) -> String {
    let ident = snake_case(raw);
    if ident.is_empty() {
      return "_".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
      return format!("_{ident}");
    }
    self.escape(&ident).into_owned()
  }
}

impl Default for ReservedWords {
  fn default() -> Self {
    Self::new(PYTHON_RESERVED_WORDS.iter().copied())
  }
}
