//! Flake lookup specifications.
//!
//! A [`FlakeSpec`] describes what flake is wanted, possibly underspecified:
//! no version means "whatever the catalogue considers latest". Specs are
//! transient lookup keys; they are never persisted beyond the resolution
//! call that consumes them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A query for a flake descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlakeSpec {
  /// Name of the wanted package.
  pub name: String,

  /// Wanted version, or `None` for the latest known version.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub version: Option<String>,

  /// Locator hint. When present and different from the locator of the
  /// descriptor a lookup finds, this one wins (caller-supplied override).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub locator: Option<String>,
}

impl FlakeSpec {
  /// Create a spec for an exact version.
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: Some(version.into()),
      locator: None,
    }
  }

  /// Create a spec for the latest version of a package.
  pub fn latest(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: None,
      locator: None,
    }
  }

  /// Attach a locator override.
  pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
    self.locator = Some(locator.into());
    self
  }
}

impl fmt::Display for FlakeSpec {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.version {
      Some(version) => write!(f, "{}@{}", self.name, version),
      None => write!(f, "{}@latest", self.name),
    }
  }
}
