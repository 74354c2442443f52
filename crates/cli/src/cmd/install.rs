//! Implementation of the `cairn install` command.
//!
//! Resolves the recipe's dependency graph and writes a descriptor file for
//! every generator the recipe selects.

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use cairn_lib::pipeline;
use cairn_lib::util::hash::Fingerprint;

use super::{ResolveArgs, run_cancellable};
use crate::output::{OutputFormat, print_info, print_json, print_stat, print_success};

#[derive(Debug, Serialize)]
struct InstallSummary {
  recipe: String,
  settings_fingerprint: Fingerprint,
  packages: Vec<PackageSummary>,
  files: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PackageSummary {
  name: String,
  version: String,
  fingerprint: Fingerprint,
  package_folder: PathBuf,
}

/// Execute the install command.
///
/// Descriptor files land in `output_folder`, which is created if needed.
/// Nothing is written unless resolution and every generator succeed.
pub fn cmd_install(args: &ResolveArgs, output_folder: PathBuf, output: OutputFormat) -> Result<()> {
  let recipe = args.load_recipe()?;
  let settings = args.settings.effective_settings()?;
  let source = args.metadata_source()?;
  let config = args.resolve_config();

  info!(recipe = %recipe.name(), settings = %settings, "resolving");

  let outcome = run_cancellable(|cancel| async move {
    let result = pipeline::install(&recipe, &settings, source, config, &output_folder, &cancel).await;
    result.map(|report| (recipe, report))
  })?;
  let (recipe, report) = outcome?;

  let summary = InstallSummary {
    recipe: recipe.name().to_string(),
    settings_fingerprint: report.graph.settings_fingerprint().clone(),
    packages: report
      .graph
      .topological_order()
      .into_iter()
      .map(|node| PackageSummary {
        name: node.name.clone(),
        version: node.version.to_string(),
        fingerprint: node.fingerprint.clone(),
        package_folder: node.package_folder.clone(),
      })
      .collect(),
    files: report.written,
  };

  if output.is_json() {
    print_json(&summary)?;
    return Ok(());
  }

  print_success(&format!(
    "Installed {} ({} packages)",
    summary.recipe,
    summary.packages.len()
  ));
  print_stat("Settings", &report.graph.settings().to_string());
  print_stat("Fingerprint", summary.settings_fingerprint.as_str());
  println!();
  for package in &summary.packages {
    print_info(&format!("{}/{} ({})", package.name, package.version, package.fingerprint));
  }
  println!();
  print_success(&format!("Wrote {} files", summary.files.len()));
  for file in &summary.files {
    println!("  {}", file.display());
  }

  Ok(())
}
