//! The flake catalogue contract.
//!
//! A catalogue maps lookup specifications to resolved flake descriptors and
//! exposes a fixed registry of well-known package keys, each answering both
//! "what is the latest version?" and "give me that exact version". Concrete
//! data sources (static tables, remote indexes, local caches) implement
//! [`FlakeCatalogue`]; the core never depends on a concrete source and
//! receives the catalogue by constructor injection.
//!
//! Absence is not an error: a merely unknown `(name, version)` pair comes
//! back as `Ok(None)`. Errors are reserved for genuinely broken situations:
//! an unregistered well-known key, a latest-version token with no matching
//! descriptor, or a backing source that misbehaves or times out.

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::error;

use crate::flake::FlakeDescriptor;
use crate::spec::FlakeSpec;

/// Well-known package keys every catalogue is expected to register.
///
/// Each key corresponds to one logical package the framework knows by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageKey {
  /// The core OS package set.
  Nixpkgs,
  /// Build utilities used by every generated flake.
  FlakeUtils,
  /// The banner/display package.
  Banner,
  /// The shared domain runtime.
  Domain,
  Infrastructure,
  Application,
  GitShared,
  NixFlakeShared,
  ChangesShared,
  ChangesEvents,
  ChangesEventsInfra,
  CodeRequestsShared,
  CodeRequestsEvents,
  CodeRequestsEventsInfra,
  /// The interactive notebook runtime.
  Jupyterlab,
}

impl PackageKey {
  /// Every well-known key, in a stable order.
  pub const ALL: [PackageKey; 15] = [
    PackageKey::Nixpkgs,
    PackageKey::FlakeUtils,
    PackageKey::Banner,
    PackageKey::Domain,
    PackageKey::Infrastructure,
    PackageKey::Application,
    PackageKey::GitShared,
    PackageKey::NixFlakeShared,
    PackageKey::ChangesShared,
    PackageKey::ChangesEvents,
    PackageKey::ChangesEventsInfra,
    PackageKey::CodeRequestsShared,
    PackageKey::CodeRequestsEvents,
    PackageKey::CodeRequestsEventsInfra,
    PackageKey::Jupyterlab,
  ];

  /// The package name this key stands for.
  pub fn package_name(self) -> &'static str {
    match self {
      PackageKey::Nixpkgs => "nixpkgs",
      PackageKey::FlakeUtils => "flake-utils",
      PackageKey::Banner => "yard-banner",
      PackageKey::Domain => "yard-domain",
      PackageKey::Infrastructure => "yard-infrastructure",
      PackageKey::Application => "yard-application",
      PackageKey::GitShared => "yard-git",
      PackageKey::NixFlakeShared => "yard-nix-flake",
      PackageKey::ChangesShared => "yard-changes",
      PackageKey::ChangesEvents => "yard-change-events",
      PackageKey::ChangesEventsInfra => "yard-change-events-infrastructure",
      PackageKey::CodeRequestsShared => "yard-code-requests",
      PackageKey::CodeRequestsEvents => "yard-code-request-events",
      PackageKey::CodeRequestsEventsInfra => "yard-code-request-events-infrastructure",
      PackageKey::Jupyterlab => "jupyterlab",
    }
  }

  /// Look up the key for a package name, if the name is well-known.
  pub fn from_package_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|key| key.package_name() == name)
  }
}

impl fmt::Display for PackageKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.package_name())
  }
}

/// Errors a catalogue can report.
///
/// Variants are cloneable so that per-declaration failures can be carried
/// in expansion diagnostics.
#[derive(Debug, Clone, Error)]
pub enum CatalogueError {
  /// A well-known key is not registered with this catalogue at all.
  #[error("package key '{key}' is not registered in the catalogue")]
  UnknownKey { key: PackageKey },

  /// The catalogue reported a latest version for which no descriptor
  /// exists. A contract violation between the two catalogue operations,
  /// always logged at error severity.
  #[error("catalogue inconsistency: latest version '{version}' of '{key}' has no descriptor")]
  Inconsistent { key: PackageKey, version: String },

  /// The backing source did not answer within its latency bound. Retryable,
  /// but retrying is the data source's business, not this crate's.
  #[error("catalogue lookup timed out after {waited:?}")]
  Timeout { waited: Duration },

  /// The backing source failed in some source-specific way.
  #[error("catalogue backend error: {0}")]
  Backend(String),
}

/// The resolution engine contract.
///
/// Implementations must be safe for concurrent read access: many expansions
/// may query the same catalogue simultaneously. If the backing data is
/// refreshed at runtime, readers must observe either the full old or the
/// full new registry, never a half-updated one.
pub trait FlakeCatalogue: Send + Sync {
  /// The version token currently considered newest for a well-known key.
  fn latest_version_of(&self, key: PackageKey) -> Result<String, CatalogueError>;

  /// The descriptor for an exact `(key, version)` pair, or `None` if that
  /// version is simply absent.
  fn find(&self, key: PackageKey, version: &str) -> Result<Option<FlakeDescriptor>, CatalogueError>;

  /// General lookup by arbitrary specification. A spec without a version
  /// behaves as a latest lookup. Implementations return what they know;
  /// locator overrides are applied by [`FlakeCatalogue::resolve`].
  fn lookup(&self, spec: &FlakeSpec) -> Result<Option<FlakeDescriptor>, CatalogueError>;

  /// The latest descriptor for a well-known key.
  ///
  /// A missing descriptor for the reported latest version is a data
  /// integrity problem in the backing source and surfaces as
  /// [`CatalogueError::Inconsistent`].
  fn latest(&self, key: PackageKey) -> Result<FlakeDescriptor, CatalogueError> {
    let version = self.latest_version_of(key)?;
    match self.find(key, &version)? {
      Some(flake) => Ok(flake),
      None => {
        error!(%key, version, "catalogue reports a latest version with no descriptor");
        Err(CatalogueError::Inconsistent { key, version })
      }
    }
  }

  /// Resolve a specification, applying the caller's locator override: when
  /// the spec carries a locator that differs from the found descriptor's,
  /// the spec's locator wins.
  fn resolve(&self, spec: &FlakeSpec) -> Result<Option<FlakeDescriptor>, CatalogueError> {
    let found = self.lookup(spec)?;
    Ok(found.map(|flake| match &spec.locator {
      Some(locator) if *locator != flake.locator() => flake.with_locator(locator.clone()),
      _ => flake,
    }))
  }

  /// The packages every consumer needs regardless of what it declares:
  /// the core OS package set, the build utilities, and the banner.
  ///
  /// The composition and order are fixed, so repeated calls against the
  /// same catalogue contents produce the same list.
  fn default_baseline(&self) -> Result<Vec<FlakeDescriptor>, CatalogueError> {
    Ok(vec![
      self.latest(PackageKey::Nixpkgs)?,
      self.latest(PackageKey::FlakeUtils)?,
      self.latest(PackageKey::Banner)?,
    ])
  }
}
