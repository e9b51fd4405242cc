//! Movie identity, the join key between a displayed movie and the
//! favorites collection.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, stable movie identifier.
///
/// The core never interprets the value; it is only compared and echoed back
/// to the favorites service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(String);

impl MovieId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for MovieId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
}

impl From<&str> for MovieId {
  fn from(value: &str) -> Self { Self(value.to_owned()) }
}

impl From<String> for MovieId {
  fn from(value: String) -> Self { Self(value) }
}

/// A movie as displayed by the client. Only `id` matters to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
  pub id:    MovieId,
  #[serde(default)]
  pub title: String,
}

impl Movie {
  /// Display title, falling back to the identifier when no title is known.
  pub fn label(&self) -> &str {
    if self.title.trim().is_empty() {
      self.id.as_str()
    } else {
      &self.title
    }
  }
}
