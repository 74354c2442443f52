use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::trace;

use super::{Candidate, LookupError, MetadataSource, parse_index_document};
use crate::settings::SettingsContext;

/// An index served over HTTP as `<base>/<name>.json`.
///
/// Per-request timeouts are applied by the resolver, not by the client.
#[derive(Debug, Clone)]
pub struct HttpIndex {
  client: reqwest::Client,
  base_url: String,
}

impl HttpIndex {
  pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .user_agent(concat!("cairn/", env!("CARGO_PKG_VERSION")))
      .build()?;

    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
    })
  }

  fn url_for(&self, name: &str) -> String {
    format!("{}/{}.json", self.base_url, name)
  }
}

#[async_trait]
impl MetadataSource for HttpIndex {
  async fn lookup_candidates(&self, name: &str, _settings: &SettingsContext) -> Result<Vec<Candidate>, LookupError> {
    let url = self.url_for(name);
    trace!(url = %url, "fetching index document");

    let response = self
      .client
      .get(&url)
      .send()
      .await
      .map_err(|e| LookupError::Transient(format!("{}: {}", url, e)))?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
      return Err(LookupError::NotFound);
    }
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
      return Err(LookupError::Transient(format!("{}: HTTP {}", url, status)));
    }
    if !status.is_success() {
      return Err(LookupError::Invalid(format!("{}: HTTP {}", url, status)));
    }

    let bytes = response
      .bytes()
      .await
      .map_err(|e| LookupError::Transient(format!("{}: {}", url, e)))?;

    parse_index_document(name, &bytes)
  }

  fn describe(&self) -> String {
    format!("http index {}", self.base_url)
  }
}
