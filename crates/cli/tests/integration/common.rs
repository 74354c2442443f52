//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Settings that make resolution independent of the host.
pub const LINUX_GCC: [&str; 5] = [
  "os=linux",
  "arch=x86_64",
  "compiler=gcc",
  "compiler.version=13",
  "build_type=Release",
];

/// Isolated test environment.
///
/// Each test gets its own temporary directory holding the recipe, the
/// cairn home (cache, package folders, default profile) and the output folder.
pub struct TestEnv {
  pub temp: TempDir,
  pub recipe_path: PathBuf,
}

impl TestEnv {
  /// Create from a recipe fixture, copied to `cairn.toml`.
  pub fn from_fixture(name: &str) -> Self {
    let env = Self::empty();
    std::fs::write(&env.recipe_path, fixture_content(name)).unwrap();
    env
  }

  /// Create from inline recipe content.
  pub fn with_recipe(content: &str) -> Self {
    let env = Self::empty();
    std::fs::write(&env.recipe_path, content).unwrap();
    env
  }

  /// Create an environment without a recipe.
  pub fn empty() -> Self {
    let temp = TempDir::new().unwrap();
    let recipe_path = temp.path().join("cairn.toml");
    Self { temp, recipe_path }
  }

  /// Write a file relative to the temp directory.
  pub fn write_file(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Isolated `CAIRN_HOME`.
  pub fn home_path(&self) -> PathBuf {
    let p = self.temp.path().join("home");
    std::fs::create_dir_all(&p).unwrap();
    dunce::canonicalize(&p).unwrap_or(p)
  }

  /// Folder receiving generated descriptors.
  pub fn output_path(&self) -> PathBuf {
    self.temp.path().join("build")
  }

  pub fn output_file(&self, name: &str) -> PathBuf {
    self.output_path().join(name)
  }

  /// Index directory shared by all tests.
  pub fn index_path(&self) -> PathBuf {
    fixture_path("index")
  }

  /// Get a pre-configured Command for the cairn binary.
  ///
  /// Sets `CAIRN_HOME` to an isolated directory and points `CAIRN_INDEX`
  /// at the fixture index. `RUST_LOG` is cleared so output does not depend
  /// on the caller's environment.
  pub fn cairn_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("cairn");
    cmd.env("CAIRN_HOME", self.home_path());
    cmd.env("CAIRN_INDEX", self.index_path());
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// `cairn <subcommand> <recipe> -s ...` with host-independent settings.
  pub fn resolve_cmd(&self, subcommand: &str) -> Command {
    let mut cmd = self.cairn_cmd();
    cmd.arg(subcommand).arg(&self.recipe_path);
    for setting in LINUX_GCC {
      cmd.arg("-s").arg(setting);
    }
    cmd
  }

  /// `cairn install` writing into [`TestEnv::output_path`].
  pub fn install_cmd(&self) -> Command {
    let mut cmd = self.resolve_cmd("install");
    cmd.arg("--output-folder").arg(self.output_path());
    cmd
  }
}

/// Read every file of a directory, sorted by name.
pub fn read_dir_sorted(dir: &Path) -> Vec<(String, String)> {
  let mut files: Vec<(String, String)> = std::fs::read_dir(dir)
    .unwrap()
    .map(|entry| {
      let entry = entry.unwrap();
      let name = entry.file_name().to_string_lossy().into_owned();
      let content = std::fs::read_to_string(entry.path()).unwrap();
      (name, content)
    })
    .collect();
  files.sort();
  files
}
