//! Flake descriptor values.
//!
//! A [`FlakeDescriptor`] is the immutable, resolved representation of one
//! flake: its identity, the locator its sources come from, and the flakes it
//! declares as inputs. Descriptors are produced by a catalogue lookup and
//! never mutated afterwards.
//!
//! Identity is the `(name, version, locator)` tuple. Two descriptors with
//! the same tuple are the same flake regardless of their input lists, which
//! is what makes deduplication during expansion well-defined. The locator is
//! deliberately part of the identity so that the same logical package pinned
//! to two different sources survives as two distinct inputs.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing flake values.
#[derive(Debug, Error)]
pub enum FlakeError {
  /// A flake must have a non-empty name.
  #[error("flake name cannot be empty")]
  EmptyName,
}

/// A resolved flake, usable as a build input.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlakeDescriptor {
  /// Logical package name (e.g. "nixpkgs", "yard-domain").
  name: String,

  /// Version token. Opaque: the core never orders or compares versions
  /// beyond equality.
  version: String,

  /// URI-like locator of the flake source (e.g. "github:org/repo/v1").
  locator: String,

  /// Transitive inputs of this flake. Never contains a descriptor named
  /// like this flake itself, and never contains two descriptors with the
  /// same identity.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  inputs: Vec<FlakeDescriptor>,

  /// Human-readable description, when the catalogue knows one.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  description: Option<String>,
}

impl FlakeDescriptor {
  /// Create a descriptor without inputs.
  pub fn new(
    name: impl Into<String>,
    version: impl Into<String>,
    locator: impl Into<String>,
  ) -> Result<Self, FlakeError> {
    let name = name.into();
    if name.is_empty() {
      return Err(FlakeError::EmptyName);
    }
    Ok(Self {
      name,
      version: version.into(),
      locator: locator.into(),
      inputs: Vec::new(),
      description: None,
    })
  }

  /// Add one input, preserving the descriptor invariants: inputs named like
  /// this flake itself and inputs already present (by identity) are skipped.
  pub fn with_input(mut self, input: FlakeDescriptor) -> Self {
    if input.name != self.name && !self.inputs.contains(&input) {
      self.inputs.push(input);
    }
    self
  }

  /// Add several inputs. Equivalent to chained [`FlakeDescriptor::with_input`].
  pub fn with_inputs(self, inputs: impl IntoIterator<Item = FlakeDescriptor>) -> Self {
    inputs.into_iter().fold(self, Self::with_input)
  }

  /// Replace the locator. Used when a caller-supplied locator overrides the
  /// one the catalogue knows.
  pub fn with_locator(mut self, locator: impl Into<String>) -> Self {
    self.locator = locator.into();
    self
  }

  /// Attach a description.
  pub fn with_description(mut self, description: impl Into<String>) -> Self {
    self.description = Some(description.into());
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn version(&self) -> &str {
    &self.version
  }

  pub fn locator(&self) -> &str {
    &self.locator
  }

  pub fn inputs(&self) -> &[FlakeDescriptor] {
    &self.inputs
  }

  pub fn description(&self) -> Option<&str> {
    self.description.as_deref()
  }

  /// The identity tuple equality, ordering and hashing are based on.
  pub fn identity(&self) -> (&str, &str, &str) {
    (&self.name, &self.version, &self.locator)
  }
}

impl PartialEq for FlakeDescriptor {
  fn eq(&self, other: &Self) -> bool {
    self.identity() == other.identity()
  }
}

impl Eq for FlakeDescriptor {}

impl Hash for FlakeDescriptor {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.identity().hash(state);
  }
}

impl PartialOrd for FlakeDescriptor {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for FlakeDescriptor {
  fn cmp(&self, other: &Self) -> Ordering {
    self.identity().cmp(&other.identity())
  }
}

impl fmt::Display for FlakeDescriptor {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}@{}", self.name, self.version)
  }
}
