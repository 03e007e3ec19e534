//! Dependency expansion.
//!
//! Expansion turns a consumer's declared dependencies into the complete,
//! deduplicated set of flake descriptors it needs to build:
//!
//! 1. Start from the caller's already-resolved inputs.
//! 2. Add the catalogue's default baseline (nixpkgs, flake-utils, banner).
//! 3. If any declaration is framework-internal, add the shared domain
//!    runtime, unless the package being built *is* the domain runtime or a
//!    declaration already names it.
//! 4. Resolve each declaration in list order, collecting misses as
//!    diagnostics instead of aborting.
//! 5. Deduplicate by the `(name, version, locator)` identity tuple.
//!
//! Baseline failures are fatal: a consumer cannot build without nixpkgs or
//! the banner. Per-declaration failures are not: the caller receives the
//! partial result together with one diagnostic per unresolved declaration
//! and decides whether that is acceptable.
//!
//! Expansion never mutates the caller's input list; it always returns a new
//! collection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalogue::{CatalogueError, FlakeCatalogue, PackageKey};
use crate::dependency::{DependencyDeclaration, DependencyOrigin};
use crate::flake::FlakeDescriptor;
use crate::spec::FlakeSpec;

/// Errors fatal to a whole expansion.
#[derive(Debug, Error)]
pub enum ExpandError {
  /// A mandatory baseline package could not be resolved.
  #[error("failed to resolve baseline inputs: {0}")]
  Baseline(#[source] CatalogueError),
}

/// Why a single declaration could not be resolved.
#[derive(Debug, Clone)]
pub enum UnresolvedReason {
  /// The catalogue has no descriptor matching the declaration.
  NotFound,

  /// The catalogue failed while looking the declaration up (e.g. a lookup
  /// timeout). The error is carried for the caller; this crate does not
  /// retry.
  Lookup(CatalogueError),
}

/// Diagnostic record for one declaration that did not resolve.
#[derive(Debug, Clone)]
pub struct UnresolvedDependency {
  /// Name from the declaration.
  pub name: String,
  /// Version from the declaration.
  pub version: String,
  /// Locator from the declaration, if any.
  pub locator: Option<String>,
  /// Why resolution failed.
  pub reason: UnresolvedReason,
}

impl UnresolvedDependency {
  fn from_declaration(declaration: &DependencyDeclaration, reason: UnresolvedReason) -> Self {
    Self {
      name: declaration.name.clone(),
      version: declaration.version.clone(),
      locator: declaration.locator.clone(),
      reason,
    }
  }
}

/// The outcome of one expansion: the resolved input set plus diagnostics
/// for everything that did not resolve.
#[derive(Debug)]
pub struct Expansion {
  /// Deduplicated resolved inputs. Membership is deterministic for fixed
  /// catalogue contents; callers must not depend on the ordering.
  pub inputs: Vec<FlakeDescriptor>,

  /// One record per declaration that failed to resolve, in declaration
  /// order.
  pub unresolved: Vec<UnresolvedDependency>,
}

impl Expansion {
  /// Whether every declaration resolved.
  pub fn is_complete(&self) -> bool {
    self.unresolved.is_empty()
  }
}

/// Serializable summary of an expansion, suitable for host-side reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionReport {
  /// Identities of the resolved inputs.
  pub resolved: Vec<String>,
  /// `name@version` pairs that failed to resolve.
  pub unresolved: Vec<String>,
}

impl From<&Expansion> for ExpansionReport {
  fn from(expansion: &Expansion) -> Self {
    Self {
      resolved: expansion.inputs.iter().map(ToString::to_string).collect(),
      unresolved: expansion
        .unresolved
        .iter()
        .map(|entry| format!("{}@{}", entry.name, entry.version))
        .collect(),
    }
  }
}

/// Expand a declaration list into the full resolved input set.
///
/// `self_name` is the identity of the package being built; when it equals
/// the domain runtime's own name, or a declaration names the domain runtime
/// directly, the domain runtime is never injected on top of itself.
/// `preseeded` are inputs the caller already resolved (e.g.
/// inputs attached to an enclosing flake); they are copied, never mutated.
///
/// # Errors
///
/// Returns [`ExpandError::Baseline`] when a mandatory baseline package
/// (including the conditionally injected domain runtime) cannot be
/// resolved. Per-declaration failures are reported through
/// [`Expansion::unresolved`] instead.
pub fn expand(
  catalogue: &dyn FlakeCatalogue,
  declarations: &[DependencyDeclaration],
  self_name: Option<&str>,
  preseeded: &[FlakeDescriptor],
) -> Result<Expansion, ExpandError> {
  let mut working: BTreeSet<FlakeDescriptor> = preseeded.iter().cloned().collect();
  let mut unresolved = Vec::new();

  working.extend(catalogue.default_baseline().map_err(ExpandError::Baseline)?);

  if needs_domain_runtime(declarations, self_name) {
    let domain = catalogue.latest(PackageKey::Domain).map_err(ExpandError::Baseline)?;
    working.insert(domain);
  }

  debug!(
    declarations = declarations.len(),
    preseeded = preseeded.len(),
    "expanding dependencies"
  );

  for declaration in declarations {
    let mut spec = FlakeSpec::new(&declaration.name, &declaration.version);
    spec.locator = declaration.locator.clone();

    match catalogue.resolve(&spec) {
      Ok(Some(flake)) => {
        working.insert(flake);
      }
      Ok(None) => {
        warn!(%spec, "cannot resolve flake for declared dependency");
        unresolved.push(UnresolvedDependency::from_declaration(
          declaration,
          UnresolvedReason::NotFound,
        ));
      }
      Err(e) => {
        warn!(%spec, error = %e, "catalogue lookup failed for declared dependency");
        unresolved.push(UnresolvedDependency::from_declaration(
          declaration,
          UnresolvedReason::Lookup(e),
        ));
      }
    }
  }

  Ok(Expansion {
    inputs: working.into_iter().collect(),
    unresolved,
  })
}

/// The domain runtime joins the baseline when any declaration is
/// framework-internal, except when the package being built is the domain
/// runtime itself or a declaration already names it (the declared version
/// then stands on its own). Both exclusions are identity checks against the
/// domain package's name, not the origin flag.
fn needs_domain_runtime(declarations: &[DependencyDeclaration], self_name: Option<&str>) -> bool {
  let domain = PackageKey::Domain.package_name();
  if self_name == Some(domain) {
    return false;
  }
  if declarations.iter().any(|declaration| declaration.name == domain) {
    return false;
  }
  declarations
    .iter()
    .any(|declaration| declaration.origin == DependencyOrigin::Framework)
}
