//! End-to-end flow: recipe, settings, resolution, generation, files.
//!
//! Every stage either completes or fails the whole run. Descriptor files
//! are written only after the graph is resolved and every generator has
//! rendered.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::generate::{self, GenerateError};
use crate::metadata::MetadataSource;
use crate::recipe::{Recipe, RecipeError};
use crate::requirements::RequirementError;
use crate::resolve::{DependencyGraph, ResolveConfig, ResolveError, Resolver};
use crate::settings::{SettingsContext, SettingsError};

/// Any failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
  #[error(transparent)]
  Recipe(#[from] RecipeError),

  #[error(transparent)]
  Settings(#[from] SettingsError),

  #[error(transparent)]
  Resolve(#[from] ResolveError),

  #[error(transparent)]
  Generate(#[from] GenerateError),
}

impl PipelineError {
  /// Stable name of the error kind, for structured output.
  pub fn kind(&self) -> &'static str {
    match self {
      PipelineError::Recipe(e) => match e {
        RecipeError::Read { .. } => "RecipeRead",
        RecipeError::Parse { .. } | RecipeError::EmptyName => "RecipeParse",
        RecipeError::Requirement(r) => requirement_kind(r),
        RecipeError::Settings(s) => settings_kind(s),
        RecipeError::DuplicateAxis(_) => "DuplicateAxis",
        RecipeError::UnknownGenerator(_) => "UnknownGenerator",
        RecipeError::DuplicateGenerator(_) => "DuplicateGenerator",
      },
      PipelineError::Settings(e) => settings_kind(e),
      PipelineError::Resolve(e) => match e {
        ResolveError::MissingAxis { .. } => "MissingAxis",
        ResolveError::VersionConflict { .. } => "VersionConflict",
        ResolveError::CyclicDependency { .. } => "CyclicDependency",
        ResolveError::MetadataUnavailable { .. } => "MetadataUnavailable",
        ResolveError::NoMatchingVersion { .. } => "NoMatchingVersion",
        ResolveError::PackageNotFound { .. } => "PackageNotFound",
        ResolveError::InvalidMetadata { .. } => "InvalidMetadata",
        ResolveError::Cancelled => "Cancelled",
        ResolveError::Cache(_) => "Cache",
      },
      PipelineError::Generate(e) => match e {
        GenerateError::GenerationFailure { .. } => "GenerationFailure",
        GenerateError::Write { .. } => "Write",
      },
    }
  }

  /// The offending requirement path or package, when the error has one.
  pub fn package_path(&self) -> Option<String> {
    match self {
      PipelineError::Resolve(e) => e.path().map(ToString::to_string),
      PipelineError::Generate(GenerateError::GenerationFailure { package, .. }) => Some(package.clone()),
      PipelineError::Recipe(RecipeError::Requirement(RequirementError::DuplicateRequirement { name, .. })) => {
        Some(name.clone())
      }
      _ => None,
    }
  }
}

fn requirement_kind(e: &RequirementError) -> &'static str {
  match e {
    RequirementError::DuplicateRequirement { .. } => "DuplicateRequirement",
    RequirementError::InvalidReference { .. } => "InvalidReference",
    RequirementError::InvalidVersion { .. } => "InvalidVersion",
    RequirementError::InvalidConstraint { .. } => "InvalidConstraint",
  }
}

fn settings_kind(e: &SettingsError) -> &'static str {
  match e {
    SettingsError::MissingAxis { .. } => "MissingAxis",
    SettingsError::UnknownAxis { .. } => "UnknownAxis",
    SettingsError::InvalidAssignment { .. } => "InvalidAssignment",
    SettingsError::ProfileRead { .. } | SettingsError::ProfileParse { .. } => "Profile",
  }
}

/// Result of a successful install.
#[derive(Debug)]
pub struct InstallReport {
  pub graph: DependencyGraph,
  /// Files written, in generation order.
  pub written: Vec<PathBuf>,
}

/// Resolve the recipe's requirements.
///
/// The recipe supplies the root label and the required axes; the rest of
/// `config` is used as given.
pub async fn resolve_recipe(
  recipe: &Recipe,
  settings: &SettingsContext,
  source: Arc<dyn MetadataSource>,
  config: ResolveConfig,
  cancel: &CancellationToken,
) -> Result<DependencyGraph, PipelineError> {
  let config = ResolveConfig {
    root_label: recipe.name().to_string(),
    required_axes: recipe.settings().to_vec(),
    ..config
  };
  let graph = Resolver::new(source, config)
    .resolve(recipe.requirements(), settings, cancel)
    .await?;
  Ok(graph)
}

/// Resolve, render every generator of the recipe, then write the files.
pub async fn install(
  recipe: &Recipe,
  settings: &SettingsContext,
  source: Arc<dyn MetadataSource>,
  config: ResolveConfig,
  output_folder: &Path,
  cancel: &CancellationToken,
) -> Result<InstallReport, PipelineError> {
  info!(recipe = %recipe.name(), output = %output_folder.display(), "installing");

  let graph = resolve_recipe(recipe, settings, source, config, cancel).await?;
  let outputs = generate::generate(&graph, recipe.generators())?;

  if cancel.is_cancelled() {
    return Err(ResolveError::Cancelled.into());
  }

  let written = generate::write_outputs(output_folder, &outputs)?;
  info!(packages = graph.len(), files = written.len(), "install complete");

  Ok(InstallReport { graph, written })
}
