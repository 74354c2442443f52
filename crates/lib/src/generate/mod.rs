//! Build-descriptor generation.
//!
//! Generators turn a resolved [`DependencyGraph`] into the files a build
//! system consumes. Rendering is pure: the same graph always produces the
//! same bytes. Nothing is written until every requested generator has
//! rendered successfully, see [`write_outputs`].

mod cmake_deps;
mod cmake_toolchain;
mod pkg_config;

pub use cmake_deps::CMakeDeps;
pub use cmake_toolchain::CMakeToolchain;
pub use pkg_config::PkgConfigDeps;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::resolve::{DependencyGraph, ResolvedNode};
use crate::util::fs::write_atomic;

/// Errors from rendering or writing descriptors.
#[derive(Debug, Error)]
pub enum GenerateError {
  #[error("{generator} cannot describe '{package}': {reason}")]
  GenerationFailure {
    generator: GeneratorKind,
    package: String,
    reason: String,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// The closed set of descriptor generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneratorKind {
  CMakeDeps,
  CMakeToolchain,
  PkgConfigDeps,
}

impl GeneratorKind {
  pub const ALL: [GeneratorKind; 3] = [
    GeneratorKind::CMakeDeps,
    GeneratorKind::CMakeToolchain,
    GeneratorKind::PkgConfigDeps,
  ];

  pub fn as_str(&self) -> &'static str {
    match self {
      GeneratorKind::CMakeDeps => "CMakeDeps",
      GeneratorKind::CMakeToolchain => "CMakeToolchain",
      GeneratorKind::PkgConfigDeps => "PkgConfigDeps",
    }
  }

  fn generator(&self) -> &'static dyn Generator {
    match self {
      GeneratorKind::CMakeDeps => &CMakeDeps,
      GeneratorKind::CMakeToolchain => &CMakeToolchain,
      GeneratorKind::PkgConfigDeps => &PkgConfigDeps,
    }
  }
}

impl FromStr for GeneratorKind {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    GeneratorKind::ALL
      .into_iter()
      .find(|k| k.as_str() == s)
      .ok_or_else(|| s.to_string())
  }
}

impl fmt::Display for GeneratorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// One rendered file, relative to the output folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOutput {
  pub kind: GeneratorKind,
  pub path: PathBuf,
  pub contents: Vec<u8>,
}

/// Renders descriptors for one generator kind.
pub trait Generator: Send + Sync {
  fn kind(&self) -> GeneratorKind;

  fn render(&self, graph: &DependencyGraph) -> Result<Vec<GeneratorOutput>, GenerateError>;
}

/// Render every kind in order. Repeated kinds are rendered once.
pub fn generate(graph: &DependencyGraph, kinds: &[GeneratorKind]) -> Result<Vec<GeneratorOutput>, GenerateError> {
  let mut seen = Vec::new();
  let mut outputs = Vec::new();

  for kind in kinds {
    if seen.contains(kind) {
      continue;
    }
    seen.push(*kind);

    let rendered = kind.generator().render(graph)?;
    debug!(generator = %kind, files = rendered.len(), "rendered descriptors");
    outputs.extend(rendered);
  }

  Ok(outputs)
}

/// Write rendered outputs below `dir` as one unit.
///
/// Every file is first written into a staging directory inside `dir` and
/// then renamed into place. If any step fails, files already moved are put
/// back to their previous contents (or removed when they did not exist) so
/// `dir` never holds a partial descriptor set.
pub fn write_outputs(dir: &Path, outputs: &[GeneratorOutput]) -> Result<Vec<PathBuf>, GenerateError> {
  let write_error = |path: &Path| {
    let path = path.to_path_buf();
    move |source: io::Error| GenerateError::Write { path, source }
  };

  std::fs::create_dir_all(dir).map_err(write_error(dir))?;
  let staging = tempfile::Builder::new()
    .prefix(".cairn-staging")
    .tempdir_in(dir)
    .map_err(write_error(dir))?;

  let mut staged = Vec::with_capacity(outputs.len());
  for output in outputs {
    let from = staging.path().join(&output.path);
    write_atomic(&from, &output.contents).map_err(write_error(&from))?;
    staged.push((from, dir.join(&output.path)));
  }

  let mut placed: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
  for (from, to) in staged {
    match place(&from, &to) {
      Ok(previous) => placed.push((to, previous)),
      Err(source) => {
        roll_back(&placed);
        return Err(GenerateError::Write { path: to, source });
      }
    }
  }

  let written: Vec<PathBuf> = placed.into_iter().map(|(path, _)| path).collect();
  info!(dir = %dir.display(), files = written.len(), "wrote descriptors");
  Ok(written)
}

/// Move one staged file over `to`, returning what `to` held before.
fn place(from: &Path, to: &Path) -> io::Result<Option<Vec<u8>>> {
  if let Some(parent) = to.parent() {
    std::fs::create_dir_all(parent)?;
  }
  let previous = if to.is_file() { Some(std::fs::read(to)?) } else { None };
  std::fs::rename(from, to)?;
  Ok(previous)
}

fn roll_back(placed: &[(PathBuf, Option<Vec<u8>>)]) {
  for (path, previous) in placed.iter().rev() {
    let result = match previous {
      Some(contents) => write_atomic(path, contents),
      None => std::fs::remove_file(path),
    };
    if let Err(err) = result {
      warn!(path = %path.display(), error = %err, "failed to roll back descriptor");
    }
  }
}

/// Header shared by every generated file.
fn header(graph: &DependencyGraph, kind: GeneratorKind) -> String {
  format!(
    "# Generated by cairn ({}). Do not edit.\n# settings fingerprint: {}\n",
    kind,
    graph.settings_fingerprint()
  )
}

/// Reject nodes whose artifacts cannot be described.
fn check_artifacts(kind: GeneratorKind, node: &ResolvedNode) -> Result<(), GenerateError> {
  let failure = |reason: &str| GenerateError::GenerationFailure {
    generator: kind,
    package: node.name.clone(),
    reason: reason.to_string(),
  };

  if node.artifacts.include_dirs.is_empty() {
    return Err(failure("no include directory"));
  }
  if !node.artifacts.libs.is_empty() && node.artifacts.lib_dirs.is_empty() {
    return Err(failure("libraries declared without a library directory"));
  }
  Ok(())
}

/// Forward-slash form of a path, as CMake and pkg-config expect.
fn portable_path(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}
