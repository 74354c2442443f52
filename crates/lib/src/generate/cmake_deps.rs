//! `find_package()` config files, one pair per package.

use std::fmt::Write;
use std::path::PathBuf;

use super::{GenerateError, Generator, GeneratorKind, GeneratorOutput, check_artifacts, header, portable_path};
use crate::resolve::{DependencyGraph, ResolvedNode};

/// Writes `<name>-config.cmake` and `<name>-config-version.cmake` for every
/// package, exposing an imported `<name>::<name>` interface target.
pub struct CMakeDeps;

impl Generator for CMakeDeps {
  fn kind(&self) -> GeneratorKind {
    GeneratorKind::CMakeDeps
  }

  fn render(&self, graph: &DependencyGraph) -> Result<Vec<GeneratorOutput>, GenerateError> {
    let mut outputs = Vec::new();

    for node in graph.topological_order() {
      check_artifacts(self.kind(), node)?;
      outputs.push(GeneratorOutput {
        kind: self.kind(),
        path: PathBuf::from(format!("{}-config.cmake", node.name)),
        contents: config_file(graph, node).into_bytes(),
      });
      outputs.push(GeneratorOutput {
        kind: self.kind(),
        path: PathBuf::from(format!("{}-config-version.cmake", node.name)),
        contents: version_file(graph, node).into_bytes(),
      });
    }

    Ok(outputs)
  }
}

fn target(name: &str) -> String {
  format!("{}::{}", name, name)
}

fn cmake_list<I, S>(items: I) -> String
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  items.into_iter().map(|s| s.as_ref().to_string()).collect::<Vec<_>>().join(";")
}

fn config_file(graph: &DependencyGraph, node: &ResolvedNode) -> String {
  let name = &node.name;
  let own_target = target(name);
  let artifacts = &node.artifacts;
  let includes = cmake_list(artifacts.include_dirs.iter().map(|p| portable_path(p)));
  let lib_dirs = cmake_list(artifacts.lib_dirs.iter().map(|p| portable_path(p)));

  let mut out = header(graph, GeneratorKind::CMakeDeps);
  let _ = writeln!(out, "# package: {}/{} ({})", name, node.version, node.fingerprint);
  out.push('\n');

  if !node.dependencies.is_empty() {
    out.push_str("include(CMakeFindDependencyMacro)\n");
    for dep in &node.dependencies {
      let _ = writeln!(out, "find_dependency({} CONFIG)", dep);
    }
    out.push('\n');
  }

  let _ = writeln!(out, "if(NOT TARGET {})", own_target);
  let _ = writeln!(out, "  add_library({} INTERFACE IMPORTED)", own_target);
  let _ = writeln!(out, "  set_target_properties({} PROPERTIES", own_target);
  let _ = writeln!(out, "    INTERFACE_INCLUDE_DIRECTORIES \"{}\"", includes);
  if !artifacts.definitions.is_empty() {
    let _ = writeln!(
      out,
      "    INTERFACE_COMPILE_DEFINITIONS \"{}\"",
      cmake_list(&artifacts.definitions)
    );
  }
  if !lib_dirs.is_empty() {
    let _ = writeln!(out, "    INTERFACE_LINK_DIRECTORIES \"{}\"", lib_dirs);
  }
  out.push_str("  )\n");

  let links: Vec<String> = artifacts
    .libs
    .iter()
    .cloned()
    .chain(node.dependencies.iter().map(|d| target(d)))
    .collect();
  if !links.is_empty() {
    let _ = writeln!(out, "  set_property(TARGET {} APPEND PROPERTY", own_target);
    let _ = writeln!(out, "    INTERFACE_LINK_LIBRARIES \"{}\"", cmake_list(&links));
    out.push_str("  )\n");
  }
  out.push_str("endif()\n\n");

  let _ = writeln!(out, "set({}_FOUND TRUE)", name);
  let _ = writeln!(out, "set({}_VERSION \"{}\")", name, node.version);
  let _ = writeln!(out, "set({}_INCLUDE_DIRS \"{}\")", name, includes);
  let _ = writeln!(out, "set({}_LIBRARIES {})", name, own_target);
  out
}

fn version_file(graph: &DependencyGraph, node: &ResolvedNode) -> String {
  let mut out = header(graph, GeneratorKind::CMakeDeps);
  out.push('\n');
  let _ = writeln!(out, "set(PACKAGE_VERSION \"{}\")", node.version);
  out.push_str(
    "\nif(PACKAGE_FIND_VERSION AND NOT PACKAGE_FIND_VERSION VERSION_EQUAL PACKAGE_VERSION)\n\
     \x20 set(PACKAGE_VERSION_COMPATIBLE FALSE)\n\
     else()\n\
     \x20 set(PACKAGE_VERSION_COMPATIBLE TRUE)\n\
     \x20 if(PACKAGE_FIND_VERSION)\n\
     \x20   set(PACKAGE_VERSION_EXACT TRUE)\n\
     \x20 endif()\n\
     endif()\n",
  );
  out
}
