//! Error types for catalog fetching and entry resolution

use std::time::Duration;

/// Failure of a single HTTP fetch.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),
    #[error("http {status} for {url}")]
    Status { status: u16, url: String },
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("aborted")]
    Aborted,
}

impl FetchError {
    pub fn is_aborted(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        match error.status() {
            Some(status) => FetchError::Status {
                status: status.as_u16(),
                url: error
                    .url()
                    .map(|url| url.to_string())
                    .unwrap_or_default(),
            },
            None => FetchError::Transport(error.to_string()),
        }
    }
}

/// Why one catalog reference did not produce an entry.
///
/// Every variant except `Aborted` is a real failure and gets logged; an abort
/// only means the caller stopped caring about the result.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResolutionFailure {
    #[error("{name}: primary fetch failed: {source}")]
    PrimaryFetchFailed { name: String, source: FetchError },
    #[error("{name}: {resource} fetch failed: {source}")]
    SubresourceFetchFailed {
        name: String,
        resource: &'static str,
        source: FetchError,
    },
    #[error("{name}: resolution task failed: {reason}")]
    Unexpected { name: String, reason: String },
    #[error("{name}: aborted")]
    Aborted { name: String },
}

impl ResolutionFailure {
    pub(crate) fn primary(name: &str, source: FetchError) -> Self {
        if source.is_aborted() {
            return ResolutionFailure::Aborted {
                name: name.to_string(),
            };
        }
        ResolutionFailure::PrimaryFetchFailed {
            name: name.to_string(),
            source,
        }
    }

    pub(crate) fn subresource(name: &str, resource: &'static str, source: FetchError) -> Self {
        if source.is_aborted() {
            return ResolutionFailure::Aborted {
                name: name.to_string(),
            };
        }
        ResolutionFailure::SubresourceFetchFailed {
            name: name.to_string(),
            resource,
            source,
        }
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, ResolutionFailure::Aborted { .. })
    }
}
