mod graph;
mod install;
mod settings;

pub use graph::cmd_graph;
pub use install::cmd_install;
pub use settings::cmd_settings;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use cairn_lib::consts::RECIPE_FILENAME;
use cairn_lib::metadata::{HttpIndex, IndexDirectory, MetadataSource};
use cairn_lib::pipeline::PipelineError;
use cairn_lib::platform::paths;
use cairn_lib::recipe::Recipe;
use cairn_lib::resolve::ResolveConfig;
use cairn_lib::settings::{SettingsContext, load_profile};

/// Options that build the effective settings context.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
  /// Set a settings axis, e.g. `-s compiler=clang` (repeatable)
  #[arg(short = 's', long = "setting", value_name = "AXIS=VALUE")]
  pub settings: Vec<String>,

  /// Profile file to layer over the detected host settings
  #[arg(long, value_name = "FILE")]
  pub profile: Option<PathBuf>,
}

impl SettingsArgs {
  /// Host detection, then the default profile if present, then `--profile`,
  /// then each `-s` assignment in order.
  pub fn effective_settings(&self) -> Result<SettingsContext, PipelineError> {
    let mut context = SettingsContext::detect();

    let default_profile = paths::default_profile_path();
    if default_profile.is_file() {
      debug!(path = %default_profile.display(), "loading default profile");
      context.merge(&load_profile(&default_profile)?);
    }

    if let Some(profile) = &self.profile {
      debug!(path = %profile.display(), "loading profile");
      context.merge(&load_profile(profile)?);
    }

    for assignment in &self.settings {
      context.assign(assignment)?;
    }

    Ok(context)
  }
}

/// Options shared by every command that resolves a recipe.
#[derive(Args, Debug, Clone)]
pub struct ResolveArgs {
  /// Path to the recipe file
  #[arg(default_value = RECIPE_FILENAME)]
  pub recipe: PathBuf,

  #[command(flatten)]
  pub settings: SettingsArgs,

  /// Metadata index: a directory of `<name>.json` documents or an http(s) URL
  #[arg(long, env = "CAIRN_INDEX", value_name = "DIR|URL")]
  pub index: Option<String>,

  /// Maximum concurrent metadata queries (defaults to available parallelism)
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// Timeout for a single metadata query (e.g., "10s", "500ms")
  #[arg(long, value_parser = humantime::parse_duration, default_value = "10s")]
  pub timeout: Duration,

  /// Retries after a failed or timed-out metadata query
  #[arg(long, default_value_t = 3)]
  pub retries: u32,

  /// Neither read nor update the resolution cache
  #[arg(long)]
  pub no_cache: bool,
}

impl ResolveArgs {
  pub fn load_recipe(&self) -> Result<Recipe, PipelineError> {
    Ok(Recipe::load(&self.recipe)?)
  }

  pub fn resolve_config(&self) -> ResolveConfig {
    let defaults = ResolveConfig::default();
    ResolveConfig {
      concurrency: self.jobs.unwrap_or(defaults.concurrency).max(1),
      query_timeout: self.timeout,
      max_retries: self.retries,
      cache_dir: (!self.no_cache).then(paths::cache_dir),
      ..defaults
    }
  }

  pub fn metadata_source(&self) -> Result<Arc<dyn MetadataSource>> {
    let Some(index) = self.index.as_deref() else {
      bail!("No metadata index configured; pass --index or set CAIRN_INDEX");
    };
    open_index(index)
  }
}

fn open_index(index: &str) -> Result<Arc<dyn MetadataSource>> {
  if index.starts_with("http://") || index.starts_with("https://") {
    let source = HttpIndex::new(index).context("Failed to create HTTP client")?;
    return Ok(Arc::new(source));
  }

  let root = Path::new(index);
  if !root.is_dir() {
    bail!("Index directory not found: {}", root.display());
  }
  Ok(Arc::new(IndexDirectory::new(root)))
}

/// Run `task` on a fresh runtime, cancelling it on Ctrl-C.
pub fn run_cancellable<F, Fut, T>(task: F) -> Result<T>
where
  F: FnOnce(CancellationToken) -> Fut,
  Fut: Future<Output = T>,
{
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let cancel = CancellationToken::new();

  let output = rt.block_on(async {
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        warn!("interrupted, cancelling");
        on_interrupt.cancel();
      }
    });
    task(cancel).await
  });

  Ok(output)
}
