use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::trace;

use super::{Candidate, LookupError, MetadataSource, parse_index_document};
use crate::settings::SettingsContext;

/// A directory holding one `<name>.json` index document per package.
#[derive(Debug, Clone)]
pub struct IndexDirectory {
  root: PathBuf,
}

impl IndexDirectory {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }
}

#[async_trait]
impl MetadataSource for IndexDirectory {
  async fn lookup_candidates(&self, name: &str, _settings: &SettingsContext) -> Result<Vec<Candidate>, LookupError> {
    let path = self.root.join(format!("{}.json", name));
    trace!(path = %path.display(), "reading index document");

    let bytes = match tokio::fs::read(&path).await {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(LookupError::NotFound),
      Err(e) => return Err(LookupError::Transient(format!("{}: {}", path.display(), e))),
    };

    parse_index_document(name, &bytes)
  }

  fn describe(&self) -> String {
    format!("index directory {}", self.root.display())
  }
}
