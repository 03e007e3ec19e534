//! In-memory catalogue backend.
//!
//! [`MemoryRegistry`] keeps its whole registry in one immutable
//! [`Snapshot`] behind an `Arc`. Readers grab the current `Arc` and work
//! against that snapshot for the rest of their lookup, so a concurrent
//! [`MemoryRegistry::refresh`] swaps the registry atomically: every reader
//! observes either the full old contents or the full new contents, never a
//! half-updated mixture.
//!
//! Lookups never block on I/O, so this backend never reports a timeout.

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use flakeyard_core::catalogue::{CatalogueError, FlakeCatalogue, PackageKey};
use flakeyard_core::flake::{FlakeDescriptor, FlakeError};
use flakeyard_core::spec::FlakeSpec;
use tracing::{debug, info};

/// One immutable registry state: every known descriptor plus a latest-
/// version index.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
  /// Descriptors keyed by `(name, version)`.
  entries: BTreeMap<(String, String), FlakeDescriptor>,

  /// The version currently considered newest, per package name. Version
  /// tokens are opaque; "newest" is whatever was registered last.
  latest: BTreeMap<String, String>,
}

impl Snapshot {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a descriptor and make its version the latest for its name.
  pub fn register(&mut self, flake: FlakeDescriptor) -> &mut Self {
    self
      .latest
      .insert(flake.name().to_string(), flake.version().to_string());
    self
      .entries
      .insert((flake.name().to_string(), flake.version().to_string()), flake);
    self
  }

  /// Register a descriptor without touching the latest index. Used for
  /// keeping older versions queryable by exact version.
  pub fn register_superseded(&mut self, flake: FlakeDescriptor) -> &mut Self {
    self
      .entries
      .insert((flake.name().to_string(), flake.version().to_string()), flake);
    self
  }

  /// Force the latest index for a name, regardless of registered entries.
  /// Mainly useful for exercising the inconsistency path in tests of
  /// catalogue consumers.
  pub fn pin_latest(&mut self, name: impl Into<String>, version: impl Into<String>) -> &mut Self {
    self.latest.insert(name.into(), version.into());
    self
  }

  /// Convenience: register a freshly built descriptor.
  pub fn add(
    &mut self,
    name: &str,
    version: &str,
    locator: &str,
  ) -> Result<&mut Self, FlakeError> {
    let flake = FlakeDescriptor::new(name, version, locator)?;
    Ok(self.register(flake))
  }

  /// Number of registered descriptors.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// A [`FlakeCatalogue`] backed by an in-memory snapshot.
#[derive(Debug, Default)]
pub struct MemoryRegistry {
  snapshot: RwLock<Arc<Snapshot>>,
}

impl MemoryRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a registry from an initial snapshot.
  pub fn from_snapshot(snapshot: Snapshot) -> Self {
    Self {
      snapshot: RwLock::new(Arc::new(snapshot)),
    }
  }

  /// Atomically replace the registry contents.
  pub fn refresh(&self, snapshot: Snapshot) {
    info!(entries = snapshot.len(), "refreshing flake registry");
    let mut guard = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
    *guard = Arc::new(snapshot);
  }

  /// The current snapshot. The returned `Arc` stays valid (and unchanged)
  /// across concurrent refreshes.
  pub fn current(&self) -> Arc<Snapshot> {
    self
      .snapshot
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}

impl FlakeCatalogue for MemoryRegistry {
  fn latest_version_of(&self, key: PackageKey) -> Result<String, CatalogueError> {
    self
      .current()
      .latest
      .get(key.package_name())
      .cloned()
      .ok_or(CatalogueError::UnknownKey { key })
  }

  fn find(&self, key: PackageKey, version: &str) -> Result<Option<FlakeDescriptor>, CatalogueError> {
    Ok(
      self
        .current()
        .entries
        .get(&(key.package_name().to_string(), version.to_string()))
        .cloned(),
    )
  }

  fn lookup(&self, spec: &FlakeSpec) -> Result<Option<FlakeDescriptor>, CatalogueError> {
    let snapshot = self.current();

    let version = match &spec.version {
      Some(version) => version.clone(),
      None => match snapshot.latest.get(&spec.name) {
        Some(version) => version.clone(),
        None => return Ok(None),
      },
    };

    let found = snapshot.entries.get(&(spec.name.clone(), version)).cloned();
    debug!(%spec, found = found.is_some(), "registry lookup");
    Ok(found)
  }
}
