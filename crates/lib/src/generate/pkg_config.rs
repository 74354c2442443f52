//! pkg-config `.pc` files.

use std::fmt::Write;
use std::path::PathBuf;

use super::{GenerateError, Generator, GeneratorKind, GeneratorOutput, check_artifacts, header, portable_path};
use crate::resolve::{DependencyGraph, ResolvedNode};

/// Writes one `<name>.pc` per package.
pub struct PkgConfigDeps;

impl Generator for PkgConfigDeps {
  fn kind(&self) -> GeneratorKind {
    GeneratorKind::PkgConfigDeps
  }

  fn render(&self, graph: &DependencyGraph) -> Result<Vec<GeneratorOutput>, GenerateError> {
    graph
      .topological_order()
      .into_iter()
      .map(|node| {
        check_artifacts(self.kind(), node)?;
        Ok(GeneratorOutput {
          kind: self.kind(),
          path: PathBuf::from(format!("{}.pc", node.name)),
          contents: pc_file(graph, node).into_bytes(),
        })
      })
      .collect()
  }
}

fn pc_file(graph: &DependencyGraph, node: &ResolvedNode) -> String {
  let artifacts = &node.artifacts;
  let mut out = header(graph, GeneratorKind::PkgConfigDeps);
  out.push('\n');
  let _ = writeln!(out, "prefix={}", portable_path(&node.package_folder));
  out.push('\n');
  let _ = writeln!(out, "Name: {}", node.name);
  let _ = writeln!(out, "Description: {} resolved by cairn", node.name);
  let _ = writeln!(out, "Version: {}", node.version);
  if !node.dependencies.is_empty() {
    let _ = writeln!(out, "Requires: {}", node.dependencies.join(", "));
  }

  let libs: Vec<String> = artifacts
    .lib_dirs
    .iter()
    .map(|d| format!("-L{}", portable_path(d)))
    .chain(artifacts.libs.iter().map(|l| format!("-l{}", l)))
    .collect();
  let _ = writeln!(out, "Libs: {}", libs.join(" "));

  let cflags: Vec<String> = artifacts
    .include_dirs
    .iter()
    .map(|d| format!("-I{}", portable_path(d)))
    .chain(artifacts.definitions.iter().map(|d| format!("-D{}", d)))
    .collect();
  let _ = writeln!(out, "Cflags: {}", cflags.join(" "));
  out
}
