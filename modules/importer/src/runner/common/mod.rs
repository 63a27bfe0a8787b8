use reqwest::StatusCode;
use std::{fmt, future::Future};
use vigil_common::id::{AdvisoryId, VulnerabilityId};
use vigil_module_ingestor::service::RawRecord;

/// Transport failure for a single target.
///
/// Always non-fatal at the run level: the runner records it, skips the
/// target, and keeps processing the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,
    #[error("target unreachable or empty")]
    NotFound,
    #[error("rate limited by the source")]
    RateLimited,
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.status() == Some(StatusCode::TOO_MANY_REQUESTS) {
            Self::RateLimited
        } else {
            Self::NotFound
        }
    }
}

/// A single unit of fetch work.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Target {
    Advisory(AdvisoryId),
    Vulnerability(VulnerabilityId),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Advisory(id) => id.fmt(f),
            Self::Vulnerability(id) => id.fmt(f),
        }
    }
}

/// One-shot pull of raw records for a single target.
///
/// Implementations own their transport, timeouts and retry policy;
/// whatever still fails surfaces as a [`FetchError`].
pub trait SourceAdapter: Send + Sync {
    fn fetch(
        &self,
        target: &Target,
    ) -> impl Future<Output = Result<Vec<RawRecord>, FetchError>> + Send;
}
