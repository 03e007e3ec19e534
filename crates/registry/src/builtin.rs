//! The built-in registry table.
//!
//! Seeds a [`Snapshot`] with every well-known package, pinned to the
//! versions the framework currently ships against. Locators follow the
//! usual github flake pattern; framework packages layer their inputs the
//! same way their flakes do: the banner builds on nixpkgs and flake-utils,
//! the domain runtime builds on those plus the banner, and everything else
//! builds on the full set.

use flakeyard_core::catalogue::PackageKey;
use flakeyard_core::flake::FlakeDescriptor;

use crate::memory::Snapshot;

/// Pinned versions of the built-in packages.
const NIXPKGS_VERSION: &str = "23.05";
const FLAKE_UTILS_VERSION: &str = "v1.0.0";
const BANNER_VERSION: &str = "0.0.1a16";
const DOMAIN_VERSION: &str = "0.0.1a28";
const JUPYTERLAB_VERSION: &str = "4.0.4";

/// Version shared by the remaining framework packages.
const FRAMEWORK_VERSION: &str = "0.0.1a12";

fn descriptor(key: PackageKey, version: &str, locator: String) -> FlakeDescriptor {
  FlakeDescriptor::new(key.package_name(), version, locator)
    .expect("well-known package names are non-empty")
}

/// Build a snapshot containing the built-in packages.
pub fn builtin() -> Snapshot {
  let nixpkgs = descriptor(
    PackageKey::Nixpkgs,
    NIXPKGS_VERSION,
    format!("github:NixOS/nixpkgs/{NIXPKGS_VERSION}"),
  )
  .with_description("Nixpkgs package collection");

  let flake_utils = descriptor(
    PackageKey::FlakeUtils,
    FLAKE_UTILS_VERSION,
    format!("github:numtide/flake-utils/{FLAKE_UTILS_VERSION}"),
  )
  .with_description("Pure Nix flake utility functions");

  let banner = descriptor(
    PackageKey::Banner,
    BANNER_VERSION,
    format!("github:flakeyard/banner/{BANNER_VERSION}"),
  )
  .with_description("Banner displayed by framework packages")
  .with_inputs([nixpkgs.clone(), flake_utils.clone()]);

  let domain = descriptor(
    PackageKey::Domain,
    DOMAIN_VERSION,
    format!("github:flakeyard/domain/{DOMAIN_VERSION}?dir=domain"),
  )
  .with_description("Shared domain runtime for event-driven packages")
  .with_inputs([nixpkgs.clone(), flake_utils.clone(), banner.clone()]);

  let jupyterlab = descriptor(
    PackageKey::Jupyterlab,
    JUPYTERLAB_VERSION,
    format!("github:flakeyard/jupyterlab/{JUPYTERLAB_VERSION}"),
  )
  .with_description("Jupyterlab notebook runtime")
  .with_inputs([nixpkgs.clone(), flake_utils.clone()]);

  let mut snapshot = Snapshot::new();
  snapshot
    .register(nixpkgs.clone())
    .register(flake_utils.clone())
    .register(banner.clone())
    .register(domain.clone())
    .register(jupyterlab);

  // The remaining framework packages all layer on the same base inputs.
  let framework_keys = [
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
  ];

  for key in framework_keys {
    let flake = descriptor(
      key,
      FRAMEWORK_VERSION,
      format!("github:flakeyard/{}/{FRAMEWORK_VERSION}", key.package_name()),
    )
    .with_inputs([
      nixpkgs.clone(),
      flake_utils.clone(),
      banner.clone(),
      domain.clone(),
    ]);
    snapshot.register(flake);
  }

  snapshot
}
