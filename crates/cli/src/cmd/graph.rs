//! Implementation of the `cairn graph` command.

use anyhow::Result;
use owo_colors::{OwoColorize, Stream};

use cairn_lib::pipeline;
use cairn_lib::resolve::DependencyGraph;

use super::{ResolveArgs, run_cancellable};
use crate::output::{OutputFormat, print_json, print_stat, print_success, symbols};

/// Resolve the recipe and print the graph without generating anything.
///
/// Packages are listed dependencies-first, the order generators use.
pub fn cmd_graph(args: &ResolveArgs, verbose: bool, output: OutputFormat) -> Result<()> {
  let recipe = args.load_recipe()?;
  let settings = args.settings.effective_settings()?;
  let source = args.metadata_source()?;
  let config = args.resolve_config();

  let name = recipe.name().to_string();
  let graph = run_cancellable(|cancel| async move {
    pipeline::resolve_recipe(&recipe, &settings, source, config, &cancel).await
  })??;

  if output.is_json() {
    let order: Vec<&str> = graph.topological_order().iter().map(|node| node.name.as_str()).collect();
    print_json(&serde_json::json!({
      "recipe": name,
      "order": order,
      "graph": graph,
    }))?;
    return Ok(());
  }

  print_success(&format!("Resolved {} ({} packages)", name, graph.len()));
  print_stat("Roots", &graph.roots().join(", "));
  print_stat("Settings", &graph.settings().to_string());
  println!();
  print_graph(&graph, verbose);

  Ok(())
}

fn print_graph(graph: &DependencyGraph, verbose: bool) {
  for node in graph.topological_order() {
    println!(
      "{}/{} {}",
      node.name,
      node.version,
      node.fingerprint.as_str().if_supports_color(Stream::Stdout, |s| s.dimmed())
    );

    for dependency in &node.dependencies {
      let version = graph.get(dependency).map(|d| d.version.to_string()).unwrap_or_default();
      println!("  {} {}/{}", symbols::ARROW, dependency, version);
    }

    if verbose {
      let axes: Vec<&str> = node.relevant_axes.iter().map(|a| a.as_str()).collect();
      print_stat("required by", &node.required_by.to_string());
      print_stat("settings", &axes.join(", "));
      print_stat("folder", &node.package_folder.display().to_string());
    }
  }
}
