use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::{Candidate, LookupError, MetadataSource};
use crate::settings::SettingsContext;

/// In-memory metadata table.
#[derive(Debug, Default)]
pub struct MemorySource {
  packages: HashMap<String, Vec<Candidate>>,
  queries: AtomicUsize,
}

impl MemorySource {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add a candidate for `name`, after any already registered.
  pub fn with_package(mut self, name: &str, candidate: Candidate) -> Self {
    self.packages.entry(name.to_string()).or_default().push(candidate);
    self
  }

  /// Number of lookups answered so far.
  pub fn query_count(&self) -> usize {
    self.queries.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl MetadataSource for MemorySource {
  async fn lookup_candidates(&self, name: &str, _settings: &SettingsContext) -> Result<Vec<Candidate>, LookupError> {
    self.queries.fetch_add(1, Ordering::SeqCst);
    self.packages.get(name).cloned().ok_or(LookupError::NotFound)
  }

  fn describe(&self) -> String {
    format!("memory ({} packages)", self.packages.len())
  }
}
