//! The project recipe (`cairn.toml`).
//!
//! ```toml
//! name = "sql101"
//! settings = ["os", "compiler", "build_type", "arch"]
//! generators = ["CMakeDeps", "CMakeToolchain"]
//! requires = ["sqlpp11/0.64", "yaml-cpp/0.8.0", "spdlog/1.13.0", "gtest/1.14.0"]
//! ```
//!
//! A [`Recipe`] is immutable once parsed and is passed explicitly to the
//! pipeline.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::generate::GeneratorKind;
use crate::requirements::{PackageRef, RequirementError, RequirementSet};
use crate::settings::{SettingsAxis, SettingsError};

/// Errors from loading a recipe.
#[derive(Debug, Error)]
pub enum RecipeError {
  #[error("failed to read recipe {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse recipe {path}: {message}")]
  Parse { path: PathBuf, message: String },

  #[error("recipe name is empty")]
  EmptyName,

  #[error(transparent)]
  Requirement(#[from] RequirementError),

  #[error(transparent)]
  Settings(#[from] SettingsError),

  #[error("settings axis '{0}' is listed more than once")]
  DuplicateAxis(SettingsAxis),

  #[error("unknown generator '{0}' (expected one of: CMakeDeps, CMakeToolchain, PkgConfigDeps)")]
  UnknownGenerator(String),

  #[error("generator '{0}' is listed more than once")]
  DuplicateGenerator(GeneratorKind),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecipeFile {
  name: String,
  settings: Option<Vec<String>>,
  #[serde(default)]
  generators: Vec<String>,
  #[serde(default)]
  requires: Vec<String>,
}

/// A parsed project recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
  name: String,
  settings: Vec<SettingsAxis>,
  generators: Vec<GeneratorKind>,
  requirements: RequirementSet,
}

impl Recipe {
  pub fn new(
    name: impl Into<String>,
    settings: Vec<SettingsAxis>,
    generators: Vec<GeneratorKind>,
    requirements: RequirementSet,
  ) -> Self {
    Self {
      name: name.into(),
      settings,
      generators,
      requirements,
    }
  }

  /// Load and parse a recipe file.
  pub fn load(path: &Path) -> Result<Self, RecipeError> {
    let content = std::fs::read_to_string(path).map_err(|source| RecipeError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let recipe = Self::parse(&content, path)?;
    debug!(
      path = %path.display(),
      name = %recipe.name,
      requirements = recipe.requirements.len(),
      "loaded recipe"
    );
    Ok(recipe)
  }

  /// Parse recipe text; `path` is used for error messages only.
  pub fn parse(content: &str, path: &Path) -> Result<Self, RecipeError> {
    let file: RecipeFile = toml::from_str(content).map_err(|e| RecipeError::Parse {
      path: path.to_path_buf(),
      message: e.to_string(),
    })?;

    let name = file.name.trim().to_string();
    if name.is_empty() {
      return Err(RecipeError::EmptyName);
    }

    let settings = match file.settings {
      Some(names) => {
        let mut axes = Vec::with_capacity(names.len());
        for n in names {
          let axis: SettingsAxis = n.parse()?;
          if axes.contains(&axis) {
            return Err(RecipeError::DuplicateAxis(axis));
          }
          axes.push(axis);
        }
        axes
      }
      None => SettingsAxis::ALL.to_vec(),
    };

    let mut generators = Vec::with_capacity(file.generators.len());
    for g in file.generators {
      let kind: GeneratorKind = g.parse().map_err(RecipeError::UnknownGenerator)?;
      if generators.contains(&kind) {
        return Err(RecipeError::DuplicateGenerator(kind));
      }
      generators.push(kind);
    }

    let mut requirements = RequirementSet::new();
    for r in file.requires {
      requirements.add(r.parse::<PackageRef>()?)?;
    }

    Ok(Self {
      name,
      settings,
      generators,
      requirements,
    })
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// Axes the project is built for; each must be set before resolving.
  pub fn settings(&self) -> &[SettingsAxis] {
    &self.settings
  }

  pub fn generators(&self) -> &[GeneratorKind] {
    &self.generators
  }

  pub fn requirements(&self) -> &RequirementSet {
    &self.requirements
  }
}
