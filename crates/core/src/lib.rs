//! flakeyard-core: catalogue and dependency expansion for Nix flakes
//!
//! This crate turns abstract dependency declarations attached to a code
//! request into the complete, deduplicated set of flake inputs needed to
//! build a package for it:
//! - `flake`: resolved flake descriptors (identity, locator, inputs)
//! - `spec`: lookup specifications, possibly underspecified
//! - `dependency`: declared dependencies with their origin
//! - `catalogue`: the resolution-engine contract and well-known packages
//! - `expand`: declarations + baseline -> deduplicated resolved inputs
//! - `assembly`: wrapping a code request into a runnable package
//! - `events`: dispatcher glue for event-driven hosts
//!
//! Concrete catalogue backends live elsewhere (see `flakeyard-registry` for
//! the in-memory reference backend) and are injected by constructor.

pub mod assembly;
pub mod catalogue;
pub mod dependency;
pub mod events;
pub mod expand;
pub mod flake;
pub mod spec;

pub use assembly::{AssembledPackage, AssemblyError, CodePackage, CodeRequest, PackageAssembler};
pub use catalogue::{CatalogueError, FlakeCatalogue, PackageKey};
pub use dependency::{DependencyDeclaration, DependencyOrigin};
pub use events::{Dispatcher, Event, EventKind};
pub use expand::{Expansion, ExpansionReport, ExpandError, UnresolvedDependency, UnresolvedReason, expand};
pub use flake::{FlakeDescriptor, FlakeError};
pub use spec::FlakeSpec;
