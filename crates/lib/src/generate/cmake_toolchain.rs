//! The CMake toolchain file.

use std::fmt::Write;
use std::path::PathBuf;

use super::{GenerateError, Generator, GeneratorKind, GeneratorOutput, header};
use crate::resolve::DependencyGraph;
use crate::settings::SettingsAxis;

pub const TOOLCHAIN_FILENAME: &str = "cairn_toolchain.cmake";

/// Writes `cairn_toolchain.cmake` from the settings of the graph.
///
/// Axes without a value are left out rather than guessed.
pub struct CMakeToolchain;

impl Generator for CMakeToolchain {
  fn kind(&self) -> GeneratorKind {
    GeneratorKind::CMakeToolchain
  }

  fn render(&self, graph: &DependencyGraph) -> Result<Vec<GeneratorOutput>, GenerateError> {
    let settings = graph.settings();
    let mut out = header(graph, self.kind());
    out.push('\n');

    if let Ok(os) = settings.get(SettingsAxis::Os) {
      let _ = writeln!(out, "set(CMAKE_SYSTEM_NAME {})", system_name(os));
    }
    if let Ok(arch) = settings.get(SettingsAxis::Arch) {
      let _ = writeln!(out, "set(CMAKE_SYSTEM_PROCESSOR {})", arch);
    }
    if let Ok(compiler) = settings.get(SettingsAxis::Compiler) {
      let (cc, cxx) = compiler_names(compiler);
      let _ = writeln!(out, "set(CMAKE_C_COMPILER {})", cc);
      let _ = writeln!(out, "set(CMAKE_CXX_COMPILER {})", cxx);
    }
    if let Ok(version) = settings.get(SettingsAxis::CompilerVersion) {
      let _ = writeln!(out, "set(CAIRN_COMPILER_VERSION \"{}\")", version);
    }
    if let Ok(build_type) = settings.get(SettingsAxis::BuildType) {
      let _ = writeln!(out, "set(CMAKE_BUILD_TYPE \"{}\" CACHE STRING \"\" FORCE)", build_type);
    }

    out.push('\n');
    out.push_str("list(PREPEND CMAKE_PREFIX_PATH \"${CMAKE_CURRENT_LIST_DIR}\")\n");
    out.push_str("set(CMAKE_FIND_PACKAGE_PREFER_CONFIG ON)\n");
    let _ = writeln!(
      out,
      "set(CAIRN_SETTINGS_FINGERPRINT \"{}\")",
      graph.settings_fingerprint()
    );

    Ok(vec![GeneratorOutput {
      kind: self.kind(),
      path: PathBuf::from(TOOLCHAIN_FILENAME),
      contents: out.into_bytes(),
    }])
  }
}

fn system_name(os: &str) -> &str {
  match os.to_ascii_lowercase().as_str() {
    "linux" => "Linux",
    "macos" | "darwin" => "Darwin",
    "windows" => "Windows",
    "freebsd" => "FreeBSD",
    _ => os,
  }
}

fn compiler_names(compiler: &str) -> (&str, &str) {
  match compiler {
    "gcc" => ("gcc", "g++"),
    "clang" | "apple-clang" => ("clang", "clang++"),
    "msvc" => ("cl", "cl"),
    other => (other, other),
  }
}
