//! Resolver output and error types.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::path::PathBuf;

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use thiserror::Error;

use crate::requirements::{PackageRef, Version};
use crate::settings::{SettingsAxis, SettingsContext};
use crate::util::hash::Fingerprint;

/// The chain of requirements leading to a package, starting at the
/// project that declared the root requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequirementPath {
  root: String,
  packages: Vec<String>,
}

impl RequirementPath {
  pub fn root(label: impl Into<String>) -> Self {
    Self {
      root: label.into(),
      packages: Vec::new(),
    }
  }

  /// This path extended by `name`.
  pub fn child(&self, name: &str) -> Self {
    let mut packages = self.packages.clone();
    packages.push(name.to_string());
    Self {
      root: self.root.clone(),
      packages,
    }
  }

  /// Package names after the root, outermost first.
  pub fn packages(&self) -> &[String] {
    &self.packages
  }

  pub fn contains(&self, name: &str) -> bool {
    self.packages.iter().any(|p| p == name)
  }

  /// The packages from the first occurrence of `name` to the end, followed
  /// by `name` again. Empty when `name` is not on the path.
  pub fn cycle_through(&self, name: &str) -> Vec<String> {
    match self.packages.iter().position(|p| p == name) {
      Some(start) => {
        let mut cycle = self.packages[start..].to_vec();
        cycle.push(name.to_string());
        cycle
      }
      None => Vec::new(),
    }
  }
}

impl fmt::Display for RequirementPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.root)?;
    for p in &self.packages {
      write!(f, " -> {}", p)?;
    }
    Ok(())
  }
}

/// Absolute artifact locations of a resolved package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactPaths {
  pub include_dirs: Vec<PathBuf>,
  pub lib_dirs: Vec<PathBuf>,
  pub libs: Vec<String>,
  pub definitions: Vec<String>,
}

/// One package in a resolved graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedNode {
  pub name: String,
  /// The reference that first required this package.
  pub reference: PackageRef,
  pub version: Version,
  /// Identity of the binary: name, version and the relevant settings only.
  pub fingerprint: Fingerprint,
  pub relevant_axes: Vec<SettingsAxis>,
  /// Direct dependencies, in declaration order.
  pub dependencies: Vec<String>,
  pub artifacts: ArtifactPaths,
  pub package_folder: PathBuf,
  pub required_by: RequirementPath,
}

/// A conflict-free, acyclic set of packages with exactly one node per name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
  roots: Vec<String>,
  nodes: BTreeMap<String, ResolvedNode>,
  settings: SettingsContext,
  settings_fingerprint: Fingerprint,
}

impl DependencyGraph {
  pub(crate) fn new(roots: Vec<String>, nodes: BTreeMap<String, ResolvedNode>, settings: SettingsContext) -> Self {
    let settings_fingerprint = settings.fingerprint();
    Self {
      roots,
      nodes,
      settings,
      settings_fingerprint,
    }
  }

  /// Root package names in declaration order.
  pub fn roots(&self) -> &[String] {
    &self.roots
  }

  pub fn get(&self, name: &str) -> Option<&ResolvedNode> {
    self.nodes.get(name)
  }

  /// Nodes ordered by name.
  pub fn nodes(&self) -> impl Iterator<Item = &ResolvedNode> + '_ {
    self.nodes.values()
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  pub fn settings(&self) -> &SettingsContext {
    &self.settings
  }

  pub fn settings_fingerprint(&self) -> &Fingerprint {
    &self.settings_fingerprint
  }

  /// Dependencies before dependents; ties broken by package name.
  pub fn topological_order(&self) -> Vec<&ResolvedNode> {
    let mut in_degree: HashMap<&str, usize> = HashMap::new();
    let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

    for node in self.nodes.values() {
      in_degree.entry(node.name.as_str()).or_insert(0);
      for dep in &node.dependencies {
        if self.nodes.contains_key(dep) {
          *in_degree.entry(node.name.as_str()).or_insert(0) += 1;
          dependents.entry(dep.as_str()).or_default().push(node.name.as_str());
        }
      }
    }

    let mut ready: BTreeSet<&str> = in_degree.iter().filter(|(_, d)| **d == 0).map(|(n, _)| *n).collect();
    let mut order = Vec::with_capacity(self.nodes.len());

    while let Some(name) = ready.pop_first() {
      order.push(&self.nodes[name]);
      for dependent in dependents.get(name).into_iter().flatten() {
        if let Some(deg) = in_degree.get_mut(dependent) {
          *deg -= 1;
          if *deg == 0 {
            ready.insert(*dependent);
          }
        }
      }
    }

    order
  }

  /// Confirm the graph has no cycles, returning one when it does.
  pub(crate) fn verify_acyclic(&self) -> Result<(), Vec<String>> {
    let mut graph: DiGraph<&str, ()> = DiGraph::new();
    let indices: HashMap<&str, NodeIndex> = self
      .nodes
      .keys()
      .map(|name| (name.as_str(), graph.add_node(name.as_str())))
      .collect();

    for node in self.nodes.values() {
      for dep in &node.dependencies {
        if let Some(&dep_idx) = indices.get(dep.as_str()) {
          graph.add_edge(dep_idx, indices[node.name.as_str()], ());
        }
      }
    }

    toposort(&graph, None).map(|_| ()).map_err(|cycle| {
      let start = graph[cycle.node_id()];
      let mut done = HashSet::new();
      self
        .cycle_from(start, &mut Vec::new(), &mut done)
        .unwrap_or_else(|| vec![start.to_string(), start.to_string()])
    })
  }

  /// Depth-first search along dependency edges for a cycle reachable
  /// from `name`.
  fn cycle_from<'a>(
    &'a self,
    name: &'a str,
    stack: &mut Vec<&'a str>,
    done: &mut HashSet<&'a str>,
  ) -> Option<Vec<String>> {
    if let Some(pos) = stack.iter().position(|n| *n == name) {
      let mut cycle: Vec<String> = stack[pos..].iter().map(|n| n.to_string()).collect();
      cycle.push(name.to_string());
      return Some(cycle);
    }
    if !done.insert(name) {
      return None;
    }

    stack.push(name);
    if let Some(node) = self.nodes.get(name) {
      for dep in &node.dependencies {
        if let Some(cycle) = self.cycle_from(dep, stack, done) {
          return Some(cycle);
        }
      }
    }
    stack.pop();
    None
  }
}

/// Errors from dependency resolution. Every variant is terminal.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("missing settings axis '{axis}'{}", path.as_ref().map(|p| format!(" required by {}", p)).unwrap_or_default())]
  MissingAxis {
    axis: SettingsAxis,
    path: Option<RequirementPath>,
  },

  #[error(
    "version conflict for '{package}': {selected} was selected for '{existing}' ({existing_path}) \
     but '{requested}' is required by {requested_path}"
  )]
  VersionConflict {
    package: String,
    selected: Version,
    existing: String,
    existing_path: RequirementPath,
    requested: String,
    requested_path: RequirementPath,
  },

  #[error("cyclic dependency: {}", cycle.join(" -> "))]
  CyclicDependency { cycle: Vec<String>, path: RequirementPath },

  #[error("metadata for '{package}' unavailable after {attempts} attempts ({path}): {reason}")]
  MetadataUnavailable {
    package: String,
    attempts: u32,
    path: RequirementPath,
    reason: String,
  },

  #[error("no version of '{package}' satisfies '{constraint}' ({path}); available: {}", available_list(available))]
  NoMatchingVersion {
    package: String,
    constraint: String,
    available: Vec<String>,
    path: RequirementPath,
  },

  #[error("package '{package}' not found ({path})")]
  PackageNotFound { package: String, path: RequirementPath },

  #[error("invalid metadata for '{package}' ({path}): {reason}")]
  InvalidMetadata {
    package: String,
    path: RequirementPath,
    reason: String,
  },

  #[error("resolution cancelled")]
  Cancelled,

  #[error(transparent)]
  Cache(#[from] super::cache::CacheError),
}

fn available_list(available: &[String]) -> String {
  if available.is_empty() {
    "none".to_string()
  } else {
    available.join(", ")
  }
}

impl ResolveError {
  /// The requirement path of the failing package, when there is one.
  pub fn path(&self) -> Option<&RequirementPath> {
    match self {
      ResolveError::MissingAxis { path, .. } => path.as_ref(),
      ResolveError::VersionConflict { requested_path, .. } => Some(requested_path),
      ResolveError::CyclicDependency { path, .. }
      | ResolveError::MetadataUnavailable { path, .. }
      | ResolveError::NoMatchingVersion { path, .. }
      | ResolveError::PackageNotFound { path, .. }
      | ResolveError::InvalidMetadata { path, .. } => Some(path),
      ResolveError::Cancelled | ResolveError::Cache(_) => None,
    }
  }
}
