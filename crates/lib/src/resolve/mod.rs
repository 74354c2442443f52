//! Dependency resolution.
//!
//! The resolver walks the requirement graph breadth-first, one level at a
//! time. Within a level every unselected package is looked up concurrently
//! (bounded by a semaphore, one lookup per name shared by all waiters).
//! The answers are then applied sequentially in frontier order, so the
//! resulting graph never depends on which lookup finished first.
//!
//! Selection rules:
//! - the first reference to reach a name selects the highest satisfying
//!   version; equal versions keep the earlier candidate
//! - later references must be satisfied by that selection, otherwise the
//!   resolution fails with [`ResolveError::VersionConflict`]
//! - a package reached again through its own requirement path is a
//!   [`ResolveError::CyclicDependency`]

mod cache;
mod query;
mod types;

pub use cache::{CACHE_VERSION, CacheError, ResolutionCache};
pub use query::QueryPolicy;
pub use types::{ArtifactPaths, DependencyGraph, RequirementPath, ResolveError, ResolvedNode};

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{OnceCell, Semaphore};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::metadata::{Candidate, MetadataSource};
use crate::platform::paths;
use crate::requirements::{PackageRef, RequirementSet};
use crate::settings::{SettingsAxis, SettingsContext};
use crate::util::hash::{Fingerprint, fingerprint_bytes};

use query::{QueryFailure, query_with_retry};

/// Resolver configuration.
#[derive(Debug, Clone)]
pub struct ResolveConfig {
  /// Label for the start of every requirement path, usually the project name.
  pub root_label: String,
  /// Axes that must be set before any metadata is queried.
  pub required_axes: Vec<SettingsAxis>,
  /// Maximum concurrent metadata lookups.
  pub concurrency: usize,
  pub query_timeout: Duration,
  pub max_retries: u32,
  pub retry_backoff: Duration,
  /// Directory of the resolution cache; `None` disables it.
  pub cache_dir: Option<PathBuf>,
  /// Root of the package folders.
  pub package_root: PathBuf,
}

impl Default for ResolveConfig {
  fn default() -> Self {
    Self {
      root_label: "root".to_string(),
      required_axes: SettingsAxis::ALL.to_vec(),
      concurrency: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
      query_timeout: Duration::from_secs(10),
      max_retries: 3,
      retry_backoff: Duration::from_millis(200),
      cache_dir: None,
      package_root: paths::packages_dir(),
    }
  }
}

impl ResolveConfig {
  fn query_policy(&self) -> QueryPolicy {
    QueryPolicy {
      timeout: self.query_timeout,
      max_retries: self.max_retries,
      backoff: self.retry_backoff,
    }
  }
}

type LookupResult = Result<Arc<Vec<Candidate>>, QueryFailure>;

/// One lookup per package name; later requests wait for and reuse it.
#[derive(Default)]
struct Lookups {
  cells: Mutex<HashMap<String, Arc<OnceCell<LookupResult>>>>,
}

impl Lookups {
  fn cell(&self, name: &str) -> Arc<OnceCell<LookupResult>> {
    let mut cells = self.cells.lock().unwrap_or_else(PoisonError::into_inner);
    cells.entry(name.to_string()).or_default().clone()
  }
}

/// A reference waiting to be resolved, with the path that reached it.
#[derive(Debug, Clone)]
struct FrontierEntry {
  reference: PackageRef,
  parent: RequirementPath,
}

impl FrontierEntry {
  fn name(&self) -> &str {
    self.reference.name()
  }

  fn path(&self) -> RequirementPath {
    self.parent.child(self.name())
  }
}

/// Computes dependency graphs from a [`MetadataSource`].
pub struct Resolver {
  source: Arc<dyn MetadataSource>,
  config: ResolveConfig,
}

impl Resolver {
  pub fn new(source: Arc<dyn MetadataSource>, config: ResolveConfig) -> Self {
    Self { source, config }
  }

  pub fn config(&self) -> &ResolveConfig {
    &self.config
  }

  /// Resolve `requirements` under `settings`.
  ///
  /// Either the complete graph is returned or an error; partial results are
  /// never exposed.
  pub async fn resolve(
    &self,
    requirements: &RequirementSet,
    settings: &SettingsContext,
    cancel: &CancellationToken,
  ) -> Result<DependencyGraph, ResolveError> {
    if let Some(axis) = settings.first_missing(&self.config.required_axes) {
      return Err(ResolveError::MissingAxis { axis, path: None });
    }

    info!(
      source = %self.source.describe(),
      requirements = requirements.len(),
      settings = %settings,
      "resolving dependencies"
    );

    let settings_fp = settings.fingerprint();
    let cache_path = self.config.cache_dir.as_deref().map(ResolutionCache::path_in);
    let cache = cache_path
      .as_deref()
      .map(ResolutionCache::load_or_default)
      .unwrap_or_default();

    let shared_settings = Arc::new(settings.clone());
    let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
    let lookups = Arc::new(Lookups::default());
    let policy = self.config.query_policy();

    let root = RequirementPath::root(&self.config.root_label);
    let roots: Vec<String> = requirements.all().map(|r| r.name().to_string()).collect();
    let mut frontier: Vec<FrontierEntry> = requirements
      .all()
      .map(|r| FrontierEntry {
        reference: r.clone(),
        parent: root.clone(),
      })
      .collect();

    let mut selected: BTreeMap<String, ResolvedNode> = BTreeMap::new();
    let mut fresh: Vec<(String, Candidate)> = Vec::new();
    let mut level = 0usize;

    while !frontier.is_empty() {
      if cancel.is_cancelled() {
        return Err(ResolveError::Cancelled);
      }
      debug!(level, entries = frontier.len(), "resolving level");

      let mut answers: Vec<Option<LookupResult>> = vec![None; frontier.len()];
      let mut join_set = JoinSet::new();

      for (index, entry) in frontier.iter().enumerate() {
        let name = entry.name();
        if selected.contains_key(name) || entry.parent.contains(name) {
          continue;
        }

        if let Some(pinned) = entry.reference.constraint().exact()
          && let Some(hit) = cache.get(&settings_fp, name, pinned)
        {
          debug!(package = %name, version = %pinned, "resolution cache hit");
          answers[index] = Some(Ok(Arc::new(vec![hit.clone()])));
          continue;
        }

        let cell = lookups.cell(name);
        let name = name.to_string();
        let source = self.source.clone();
        let settings = shared_settings.clone();
        let semaphore = semaphore.clone();
        let policy = policy.clone();
        let cancel = cancel.clone();

        join_set.spawn(async move {
          let result = cell
            .get_or_init(|| lookup(&semaphore, source.as_ref(), &name, &settings, &policy, &cancel))
            .await
            .clone();
          (index, result)
        });
      }

      loop {
        tokio::select! {
          biased;
          _ = cancel.cancelled() => {
            join_set.abort_all();
            return Err(ResolveError::Cancelled);
          }
          next = join_set.join_next() => match next {
            Some(Ok((index, result))) => answers[index] = Some(result),
            Some(Err(e)) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Some(Err(_)) => return Err(ResolveError::Cancelled),
            None => break,
          },
        }
      }

      let mut next = Vec::new();
      for (entry, answer) in frontier.into_iter().zip(answers) {
        let name = entry.name().to_string();
        let path = entry.path();

        if entry.parent.contains(&name) {
          return Err(ResolveError::CyclicDependency {
            cycle: entry.parent.cycle_through(&name),
            path,
          });
        }

        if let Some(existing) = selected.get(&name) {
          if !entry.reference.constraint().matches(&existing.version) {
            return Err(ResolveError::VersionConflict {
              package: name,
              selected: existing.version.clone(),
              existing: existing.reference.constraint().to_string(),
              existing_path: existing.required_by.clone(),
              requested: entry.reference.constraint().to_string(),
              requested_path: path,
            });
          }
          debug!(package = %name, version = %existing.version, required_by = %path, "reusing selected version");
          continue;
        }

        let candidates = match answer {
          Some(Ok(candidates)) => candidates,
          Some(Err(failure)) => return Err(lookup_error(failure, &name, path)),
          None => return Err(ResolveError::Cancelled),
        };

        let Some(chosen) = choose(&candidates, &entry.reference) else {
          return Err(ResolveError::NoMatchingVersion {
            package: name,
            constraint: entry.reference.constraint().to_string(),
            available: candidates.iter().map(|c| c.version.to_string()).collect(),
            path,
          });
        };

        let node = self.build_node(&entry, chosen, settings, path)?;
        debug!(
          package = %node.name,
          version = %node.version,
          fingerprint = %node.fingerprint,
          required_by = %node.required_by,
          "selected version"
        );

        for requirement in &chosen.requires {
          next.push(FrontierEntry {
            reference: requirement.clone(),
            parent: node.required_by.clone(),
          });
        }

        let from_cache = entry
          .reference
          .constraint()
          .exact()
          .is_some_and(|v| cache.get(&settings_fp, &name, v).is_some());
        if !from_cache {
          fresh.push((name.clone(), chosen.clone()));
        }

        selected.insert(name, node);
      }

      frontier = next;
      level += 1;
    }

    let graph = DependencyGraph::new(roots, selected, settings.clone());
    graph
      .verify_acyclic()
      .map_err(|cycle| ResolveError::CyclicDependency { cycle, path: root })?;

    if let Some(path) = cache_path {
      self.update_cache(&path, cache, &settings_fp, fresh)?;
    }

    info!(packages = graph.len(), levels = level, fingerprint = %graph.settings_fingerprint(), "resolution complete");
    Ok(graph)
  }

  fn build_node(
    &self,
    entry: &FrontierEntry,
    chosen: &Candidate,
    settings: &SettingsContext,
    path: RequirementPath,
  ) -> Result<ResolvedNode, ResolveError> {
    let name = entry.name();

    let mut relevant_axes: Vec<SettingsAxis> = match &chosen.settings {
      Some(axes) => axes.clone(),
      None => settings.axes().collect(),
    };
    relevant_axes.sort();
    relevant_axes.dedup();
    if let Some(axis) = settings.first_missing(&relevant_axes) {
      return Err(ResolveError::MissingAxis { axis, path: Some(path) });
    }

    let fingerprint = node_fingerprint(name, chosen, &settings.fingerprint_subset(&relevant_axes));
    let package_folder = self
      .config
      .package_root
      .join(name)
      .join(chosen.version.as_str())
      .join(fingerprint.as_str());

    let mut dependencies: Vec<String> = Vec::new();
    for r in &chosen.requires {
      if !dependencies.iter().any(|d| d == r.name()) {
        dependencies.push(r.name().to_string());
      }
    }

    Ok(ResolvedNode {
      name: name.to_string(),
      reference: entry.reference.clone(),
      version: chosen.version.clone(),
      fingerprint,
      relevant_axes,
      dependencies,
      artifacts: artifact_paths(&package_folder, chosen),
      package_folder,
      required_by: path,
    })
  }

  fn update_cache(
    &self,
    path: &Path,
    mut cache: ResolutionCache,
    settings_fp: &Fingerprint,
    fresh: Vec<(String, Candidate)>,
  ) -> Result<(), ResolveError> {
    let mut added = 0usize;
    for (name, candidate) in fresh {
      if cache.insert(settings_fp, &name, candidate) {
        added += 1;
      }
    }
    if added > 0 {
      cache.save(path)?;
      debug!(path = %path.display(), added, "updated resolution cache");
    }
    Ok(())
  }
}

async fn lookup(
  semaphore: &Semaphore,
  source: &dyn MetadataSource,
  name: &str,
  settings: &SettingsContext,
  policy: &QueryPolicy,
  cancel: &CancellationToken,
) -> LookupResult {
  // The semaphore is never closed, but a closed one means shutdown.
  let Ok(_permit) = semaphore.acquire().await else {
    return Err(QueryFailure::Cancelled);
  };
  query_with_retry(source, name, settings, policy, cancel)
    .await
    .map(Arc::new)
}

/// Highest satisfying version; the earliest candidate wins a tie.
fn choose<'a>(candidates: &'a [Candidate], reference: &PackageRef) -> Option<&'a Candidate> {
  candidates
    .iter()
    .filter(|c| reference.constraint().matches(&c.version))
    .fold(None, |best: Option<&Candidate>, c| match best {
      Some(b) if b.version >= c.version => Some(b),
      _ => Some(c),
    })
}

fn node_fingerprint(name: &str, candidate: &Candidate, settings: &Fingerprint) -> Fingerprint {
  fingerprint_bytes(format!("{}/{}/{}", name, candidate.version, settings).as_bytes())
}

fn artifact_paths(folder: &Path, candidate: &Candidate) -> ArtifactPaths {
  let info = &candidate.cpp_info;
  ArtifactPaths {
    include_dirs: info.include_dirs.iter().map(|d| folder.join(d)).collect(),
    lib_dirs: info.lib_dirs.iter().map(|d| folder.join(d)).collect(),
    libs: info.libs.clone(),
    definitions: info.defines.clone(),
  }
}

fn lookup_error(failure: QueryFailure, name: &str, path: RequirementPath) -> ResolveError {
  let package = name.to_string();
  match failure {
    QueryFailure::NotFound => ResolveError::PackageNotFound { package, path },
    QueryFailure::Invalid(reason) => ResolveError::InvalidMetadata { package, path, reason },
    QueryFailure::Unavailable { attempts, reason } => ResolveError::MetadataUnavailable {
      package,
      attempts,
      path,
      reason,
    },
    QueryFailure::Cancelled => ResolveError::Cancelled,
  }
}
