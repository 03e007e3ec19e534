//! Dependency declarations attached to code requests.
//!
//! A [`DependencyDeclaration`] is what a consumer states it needs, before
//! the catalogue has been consulted. Declarations carry an origin flag:
//! framework-internal dependencies additionally pull the shared domain
//! runtime into the baseline during expansion, arbitrary external ones do
//! not.

use serde::{Deserialize, Serialize};

/// Where a declared dependency comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyOrigin {
  /// A package of the framework itself. Declaring one makes the shared
  /// domain runtime part of the baseline.
  Framework,

  /// An arbitrary third-party package.
  External,
}

/// One required package, as declared by a consumer.
///
/// A request's declaration list is order-preserving and may contain
/// duplicates by name; expansion collapses them to one descriptor per
/// identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyDeclaration {
  /// Name of the required package.
  pub name: String,

  /// Required version token.
  pub version: String,

  /// Optional source locator, pinning an alternate source of the package.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub locator: Option<String>,

  /// Origin of the dependency.
  pub origin: DependencyOrigin,
}

impl DependencyDeclaration {
  /// Declare a framework-internal dependency.
  pub fn framework(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
      locator: None,
      origin: DependencyOrigin::Framework,
    }
  }

  /// Declare an external dependency.
  pub fn external(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
      locator: None,
      origin: DependencyOrigin::External,
    }
  }

  /// Pin the dependency to a specific source locator.
  pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
    self.locator = Some(locator.into());
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn framework_constructor_sets_origin() {
    let decl = DependencyDeclaration::framework("yard-git", "0.2.0");
    assert_eq!(decl.origin, DependencyOrigin::Framework);
    assert!(decl.locator.is_none());
  }

  #[test]
  fn origin_serializes_lowercase() {
    let decl = DependencyDeclaration::external("widget", "3.0");
    let json = serde_json::to_string(&decl).unwrap();
    assert!(json.contains(r#""origin":"external""#));
  }
}
