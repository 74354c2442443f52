//! Metadata queries with timeout, retry and cancellation.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};

use crate::metadata::{Candidate, LookupError, MetadataSource};
use crate::settings::SettingsContext;

/// How a single package lookup is attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPolicy {
  /// Limit for one attempt.
  pub timeout: Duration,
  /// Retries after the first attempt.
  pub max_retries: u32,
  /// Delay before the first retry; doubled for each later one.
  pub backoff: Duration,
}

impl QueryPolicy {
  /// Delay before retry number `retry` (1-based).
  pub fn delay_for(&self, retry: u32) -> Duration {
    self.backoff.saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
  }
}

/// Why a lookup produced no candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum QueryFailure {
  NotFound,
  Invalid(String),
  Unavailable { attempts: u32, reason: String },
  Cancelled,
}

/// Look up `name`, retrying timeouts and transient failures.
pub(crate) async fn query_with_retry(
  source: &dyn MetadataSource,
  name: &str,
  settings: &SettingsContext,
  policy: &QueryPolicy,
  cancel: &CancellationToken,
) -> Result<Vec<Candidate>, QueryFailure> {
  let attempts = policy.max_retries.saturating_add(1);
  let mut attempt = 0;

  loop {
    attempt += 1;
    trace!(package = %name, attempt, "querying metadata");

    let outcome = tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(QueryFailure::Cancelled),
      outcome = tokio::time::timeout(policy.timeout, source.lookup_candidates(name, settings)) => outcome,
    };

    let reason = match outcome {
      Ok(Ok(candidates)) => return Ok(candidates),
      Ok(Err(LookupError::NotFound)) => return Err(QueryFailure::NotFound),
      Ok(Err(LookupError::Invalid(reason))) => return Err(QueryFailure::Invalid(reason)),
      Ok(Err(LookupError::Transient(reason))) => reason,
      Err(_) => format!("timed out after {:?}", policy.timeout),
    };

    if attempt >= attempts {
      return Err(QueryFailure::Unavailable { attempts, reason });
    }

    let delay = policy.delay_for(attempt);
    warn!(package = %name, attempt, error = %reason, delay = ?delay, "metadata query failed, retrying");

    tokio::select! {
      biased;
      _ = cancel.cancelled() => return Err(QueryFailure::Cancelled),
      _ = tokio::time::sleep(delay) => {}
    }
  }
}
