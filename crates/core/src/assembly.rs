//! Package assembly.
//!
//! Assembly builds a runnable package descriptor around a consumer-supplied
//! code request. Two variants share one shape: one package that executes
//! the request's code directly, and one that runs it inside an interactive
//! notebook shell (which additionally needs the notebook runtime in its
//! baseline).
//!
//! Assembly is a stateless transformation pipeline: declarations go in,
//! resolved inputs come out, a descriptor wraps them. It performs no I/O
//! itself; writing generated files or staging changes belongs to the hosts
//! that consume the result. The catalogue arrives by constructor injection
//! so tests can supply fakes per test.

use std::io::{self, Write};

use thiserror::Error;
use tracing::debug;

use crate::catalogue::{CatalogueError, FlakeCatalogue, PackageKey};
use crate::dependency::DependencyDeclaration;
use crate::expand::{ExpandError, UnresolvedDependency, expand};
use crate::flake::{FlakeDescriptor, FlakeError};

/// Version token assigned to generated package descriptors.
const PACKAGE_VERSION: &str = "latest";

/// The request object a package wraps.
///
/// Opaque beyond its identity, its dependency declarations, and the ability
/// to write a serialized representation of its payload. Storage format and
/// location of that payload are the host's concern.
pub trait CodeRequest {
  /// Identifier of the originating request, carried into emitted events.
  fn id(&self) -> &str;

  /// Logical name of the package built for this request. Doubles as the
  /// `self_name` for expansion, so a package never depends on itself.
  fn name(&self) -> &str;

  /// The declared dependencies, in declaration order.
  fn dependencies(&self) -> &[DependencyDeclaration];

  /// Write a serialized representation of the request's payload.
  fn write(&self, out: &mut dyn Write) -> io::Result<()>;
}

/// A package: exactly one request plus its resolved input set.
#[derive(Debug)]
pub struct CodePackage<R> {
  /// The generated package descriptor, inputs attached.
  pub descriptor: FlakeDescriptor,

  /// The wrapped request.
  pub request: R,
}

/// An assembled package together with expansion diagnostics. Callers decide
/// whether unresolved optional dependencies are acceptable; they are never
/// silently dropped.
#[derive(Debug)]
pub struct AssembledPackage<R> {
  pub package: CodePackage<R>,
  pub unresolved: Vec<UnresolvedDependency>,
}

/// Errors fatal to package assembly.
#[derive(Debug, Error)]
pub enum AssemblyError {
  /// Dependency expansion failed (mandatory baseline unresolvable).
  #[error("failed to expand request dependencies: {0}")]
  Expand(#[from] ExpandError),

  /// The notebook runtime could not be resolved for a notebook package.
  #[error("failed to resolve the notebook runtime: {0}")]
  NotebookRuntime(#[source] CatalogueError),

  /// The request does not yield a valid package descriptor.
  #[error("request '{id}' does not yield a valid package: {source}")]
  Package {
    id: String,
    #[source]
    source: FlakeError,
  },
}

/// Builds package descriptors against an injected catalogue.
pub struct PackageAssembler<'a> {
  catalogue: &'a dyn FlakeCatalogue,
}

impl<'a> PackageAssembler<'a> {
  pub fn new(catalogue: &'a dyn FlakeCatalogue) -> Self {
    Self { catalogue }
  }

  /// Build a package that executes the request's code directly.
  ///
  /// `preseeded` are inputs the caller already resolved, e.g. inputs
  /// attached to an enclosing flake.
  pub fn code_execution<R: CodeRequest>(
    &self,
    request: R,
    preseeded: &[FlakeDescriptor],
  ) -> Result<AssembledPackage<R>, AssemblyError> {
    self.assemble(request, preseeded, &[])
  }

  /// Build a package that runs the request inside an interactive notebook
  /// shell. The notebook runtime joins the baseline; failing to resolve it
  /// is fatal.
  pub fn notebook<R: CodeRequest>(
    &self,
    request: R,
    preseeded: &[FlakeDescriptor],
  ) -> Result<AssembledPackage<R>, AssemblyError> {
    let runtime = self
      .catalogue
      .latest(PackageKey::Jupyterlab)
      .map_err(AssemblyError::NotebookRuntime)?;
    self.assemble(request, preseeded, &[runtime])
  }

  fn assemble<R: CodeRequest>(
    &self,
    request: R,
    preseeded: &[FlakeDescriptor],
    extra_baseline: &[FlakeDescriptor],
  ) -> Result<AssembledPackage<R>, AssemblyError> {
    let expansion = expand(
      self.catalogue,
      request.dependencies(),
      Some(request.name()),
      preseeded,
    )?;

    debug!(
      request = request.id(),
      inputs = expansion.inputs.len(),
      unresolved = expansion.unresolved.len(),
      "assembled package inputs"
    );

    let descriptor = FlakeDescriptor::new(
      request.name(),
      PACKAGE_VERSION,
      format!("request:{}", request.id()),
    )
    .map_err(|source| AssemblyError::Package {
      id: request.id().to_string(),
      source,
    })?
    .with_inputs(extra_baseline.iter().cloned())
    .with_inputs(expansion.inputs);

    Ok(AssembledPackage {
      package: CodePackage { descriptor, request },
      unresolved: expansion.unresolved,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalogue::CatalogueError;
  use crate::spec::FlakeSpec;
  use std::collections::BTreeMap;
  use std::fs;

  struct StubCatalogue {
    latest: BTreeMap<String, String>,
    entries: BTreeMap<(String, String), FlakeDescriptor>,
  }

  impl StubCatalogue {
    fn new() -> Self {
      let mut catalogue = Self {
        latest: BTreeMap::new(),
        entries: BTreeMap::new(),
      };
      catalogue.add("nixpkgs", "23.05");
      catalogue.add("flake-utils", "v1.0.0");
      catalogue.add("yard-banner", "0.0.1a16");
      catalogue.add("yard-domain", "0.0.1a28");
      catalogue.add("jupyterlab", "4.0.4");
      catalogue
    }

    fn add(&mut self, name: &str, version: &str) {
      let flake = FlakeDescriptor::new(name, version, format!("github:yard/{name}/{version}")).unwrap();
      self.latest.insert(name.to_string(), version.to_string());
      self.entries.insert((name.to_string(), version.to_string()), flake);
    }

    fn remove(&mut self, name: &str) {
      if let Some(version) = self.latest.remove(name) {
        self.entries.remove(&(name.to_string(), version));
      }
    }
  }

  impl FlakeCatalogue for StubCatalogue {
    fn latest_version_of(&self, key: PackageKey) -> Result<String, CatalogueError> {
      self
        .latest
        .get(key.package_name())
        .cloned()
        .ok_or(CatalogueError::UnknownKey { key })
    }

    fn find(&self, key: PackageKey, version: &str) -> Result<Option<FlakeDescriptor>, CatalogueError> {
      Ok(
        self
          .entries
          .get(&(key.package_name().to_string(), version.to_string()))
          .cloned(),
      )
    }

    fn lookup(&self, spec: &FlakeSpec) -> Result<Option<FlakeDescriptor>, CatalogueError> {
      let version = match &spec.version {
        Some(version) => version.clone(),
        None => match self.latest.get(&spec.name) {
          Some(version) => version.clone(),
          None => return Ok(None),
        },
      };
      Ok(self.entries.get(&(spec.name.clone(), version)).cloned())
    }
  }

  struct TestRequest {
    id: String,
    name: String,
    dependencies: Vec<DependencyDeclaration>,
    payload: serde_json::Value,
  }

  impl TestRequest {
    fn new(name: &str, dependencies: Vec<DependencyDeclaration>) -> Self {
      Self {
        id: format!("req-{name}"),
        name: name.to_string(),
        dependencies,
        payload: serde_json::json!({ "cells": [] }),
      }
    }
  }

  impl CodeRequest for TestRequest {
    fn id(&self) -> &str {
      &self.id
    }

    fn name(&self) -> &str {
      &self.name
    }

    fn dependencies(&self) -> &[DependencyDeclaration] {
      &self.dependencies
    }

    fn write(&self, out: &mut dyn Write) -> io::Result<()> {
      serde_json::to_writer(out, &self.payload).map_err(io::Error::other)
    }
  }

  fn input_names(descriptor: &FlakeDescriptor) -> Vec<&str> {
    let mut names: Vec<_> = descriptor.inputs().iter().map(FlakeDescriptor::name).collect();
    names.sort_unstable();
    names
  }

  mod code_execution {
    use super::*;

    #[test]
    fn wraps_request_and_resolved_inputs() {
      let mut catalogue = StubCatalogue::new();
      catalogue.add("widget", "3.0");
      let assembler = PackageAssembler::new(&catalogue);
      let request = TestRequest::new(
        "my-package",
        vec![DependencyDeclaration::framework("widget", "3.0")],
      );

      let assembled = assembler.code_execution(request, &[]).unwrap();

      let descriptor = &assembled.package.descriptor;
      assert_eq!(descriptor.name(), "my-package");
      assert_eq!(descriptor.locator(), "request:req-my-package");
      assert_eq!(
        input_names(descriptor),
        ["flake-utils", "nixpkgs", "widget", "yard-banner", "yard-domain"]
      );
      assert!(assembled.unresolved.is_empty());
    }

    #[test]
    fn package_never_depends_on_itself() {
      let mut catalogue = StubCatalogue::new();
      catalogue.add("my-package", "1.0");
      let assembler = PackageAssembler::new(&catalogue);
      let request = TestRequest::new(
        "my-package",
        vec![DependencyDeclaration::external("my-package", "1.0")],
      );

      let assembled = assembler.code_execution(request, &[]).unwrap();

      assert!(!input_names(&assembled.package.descriptor).contains(&"my-package"));
    }

    #[test]
    fn unresolved_dependencies_are_reported() {
      let catalogue = StubCatalogue::new();
      let assembler = PackageAssembler::new(&catalogue);
      let request = TestRequest::new(
        "my-package",
        vec![DependencyDeclaration::external("missing", "9.9")],
      );

      let assembled = assembler.code_execution(request, &[]).unwrap();

      assert_eq!(assembled.unresolved.len(), 1);
      assert_eq!(assembled.unresolved[0].name, "missing");
    }
  }

  mod notebook {
    use super::*;

    #[test]
    fn baseline_additionally_includes_the_notebook_runtime() {
      let catalogue = StubCatalogue::new();
      let assembler = PackageAssembler::new(&catalogue);
      let request = TestRequest::new("my-notebook", vec![]);

      let assembled = assembler.notebook(request, &[]).unwrap();

      assert!(input_names(&assembled.package.descriptor).contains(&"jupyterlab"));
    }

    #[test]
    fn missing_notebook_runtime_is_fatal() {
      let mut catalogue = StubCatalogue::new();
      catalogue.remove("jupyterlab");
      let assembler = PackageAssembler::new(&catalogue);
      let request = TestRequest::new("my-notebook", vec![]);

      let result = assembler.notebook(request, &[]);

      assert!(matches!(result, Err(AssemblyError::NotebookRuntime(_))));
    }
  }

  mod request_payload {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn wrapped_request_writes_its_payload() {
      let catalogue = StubCatalogue::new();
      let assembler = PackageAssembler::new(&catalogue);
      let request = TestRequest::new("my-notebook", vec![]);

      let assembled = assembler.notebook(request, &[]).unwrap();

      let temp_dir = TempDir::new().unwrap();
      let path = temp_dir.path().join("request.json");
      let mut file = fs::File::create(&path).unwrap();
      assembled.package.request.write(&mut file).unwrap();

      let written = fs::read_to_string(&path).unwrap();
      assert_eq!(written, r#"{"cells":[]}"#);
    }
  }
}
