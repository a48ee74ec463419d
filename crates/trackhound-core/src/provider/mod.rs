//! Provider contract shared by every source

pub mod scrape;
pub mod ytdlp;

use crate::error::ProviderError;
use crate::validation::Query;
use async_trait::async_trait;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

pub use scrape::ScrapingProvider;
pub use ytdlp::YtDlpProvider;

/// Result of one provider attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// Artifact written and within limits; the caller now owns the file
    Found(PathBuf),
    /// Best match exceeds the duration cap
    TooLong,
    /// Retrieved artifact exceeds the size cap (already deleted)
    TooBig,
    NotFound,
    /// Network, parse or backend failure, contained by the provider
    TransientError,
}

impl ProviderOutcome {
    /// Whether the outcome reflects a property of the track itself
    pub fn is_track_limit(&self) -> bool {
        matches!(self, ProviderOutcome::TooLong | ProviderOutcome::TooBig)
    }
}

impl fmt::Display for ProviderOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderOutcome::Found(path) => write!(f, "found ({})", path.display()),
            ProviderOutcome::TooLong => write!(f, "too long"),
            ProviderOutcome::TooBig => write!(f, "too big"),
            ProviderOutcome::NotFound => write!(f, "not found"),
            ProviderOutcome::TransientError => write!(f, "transient error"),
        }
    }
}

/// A strategy for locating and retrieving one track from one source.
///
/// Implementations never fail: ordinary misses are `NotFound` and every
/// internal fault is reported as `TransientError`. Only the `Found` path may
/// leave a file behind.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn attempt(&self, query: &Query) -> ProviderOutcome;
}

/// A provider together with the name it is reported under.
#[derive(Clone)]
pub struct ProviderDescriptor {
    name: String,
    provider: Arc<dyn Provider>,
}

impl ProviderDescriptor {
    pub fn new(name: impl Into<String>, provider: Arc<dyn Provider>) -> Self {
        Self {
            name: name.into(),
            provider,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &dyn Provider {
        self.provider.as_ref()
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderDescriptor")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Collapse an internal fault into `TransientError`, logging it.
pub(crate) fn contain(
    source: &str,
    result: Result<ProviderOutcome, ProviderError>,
) -> ProviderOutcome {
    match result {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("{} failed: {}", source, e);
            ProviderOutcome::TransientError
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contain_maps_faults_to_transient() {
        let err = ProviderError::YtDlpFailed(Some(1));
        assert_eq!(contain("test", Err(err)), ProviderOutcome::TransientError);
        assert_eq!(
            contain("test", Ok(ProviderOutcome::NotFound)),
            ProviderOutcome::NotFound
        );
    }

    #[test]
    fn test_track_limit_outcomes() {
        assert!(ProviderOutcome::TooLong.is_track_limit());
        assert!(ProviderOutcome::TooBig.is_track_limit());
        assert!(!ProviderOutcome::NotFound.is_track_limit());
        assert!(!ProviderOutcome::Found(PathBuf::from("/tmp/a.mp3")).is_track_limit());
    }
}
