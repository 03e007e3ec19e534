//! flakeyard-registry: reference catalogue backend
//!
//! An in-memory implementation of the `flakeyard-core` catalogue contract:
//! - `memory`: snapshot-swapped registry safe for concurrent readers
//! - `builtin`: the table of well-known packages the framework ships with
//!
//! Network- or filesystem-backed catalogues would implement the same
//! `FlakeCatalogue` trait; this crate is the backend the tests and local
//! tooling run against.

pub mod builtin;
pub mod memory;

pub use builtin::builtin;
pub use memory::{MemoryRegistry, Snapshot};
