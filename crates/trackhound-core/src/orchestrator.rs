//! Ordered fallback across providers for a single query

use crate::config::{Config, TrackLimitPolicy};
use crate::error::{QueryError, Result};
use crate::http::build_client;
use crate::provider::{
    Provider, ProviderDescriptor, ProviderOutcome, ScrapingProvider, YtDlpProvider,
};
use crate::status::StatusReporter;
use crate::temp::TempArtifactManager;
use crate::validation::Limits;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Provider name reported when every provider came up empty
pub const NOWHERE: &str = "nowhere";

/// Final outcome of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Acquired {
    /// Artifact path; the caller owns it and must release it
    Found(PathBuf),
    TooLong,
    TooBig,
    NotFound,
}

impl Acquired {
    /// Wire form: the artifact path or one of the sentinel strings
    pub fn as_wire(&self) -> String {
        match self {
            Acquired::Found(path) => path.display().to_string(),
            Acquired::TooLong => "TOO_LONG".to_string(),
            Acquired::TooBig => "TOO_BIG".to_string(),
            Acquired::NotFound => "NOT_FOUND".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Acquisition {
    pub outcome: Acquired,
    /// Provider that produced the outcome, or [`NOWHERE`]
    pub provider: String,
}

impl Acquisition {
    fn exhausted() -> Self {
        Self {
            outcome: Acquired::NotFound,
            provider: NOWHERE.to_string(),
        }
    }
}

impl fmt::Display for Acquisition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.outcome.as_wire(), self.provider)
    }
}

pub struct Orchestrator {
    providers: Vec<ProviderDescriptor>,
    limits: Limits,
    backoff: Duration,
    attempt_timeout: Option<Duration>,
    policy: TrackLimitPolicy,
    artifacts: TempArtifactManager,
}

impl Orchestrator {
    /// Providers are tried in the given order, which never changes afterwards.
    pub fn new(providers: Vec<ProviderDescriptor>) -> Self {
        Self {
            providers,
            limits: Limits::default(),
            backoff: Duration::from_millis(1500),
            attempt_timeout: None,
            policy: TrackLimitPolicy::Abort,
            artifacts: TempArtifactManager::default(),
        }
    }

    /// yt-dlp first, then every configured scraping site, sharing one HTTP client.
    ///
    /// Creates the configured temp directory if it is missing.
    pub fn from_config(config: &Config) -> Result<Self> {
        let artifacts = TempArtifactManager::new(config.temp_dir());
        artifacts.ensure_root()?;
        let limits = Limits::from(&config.limits);
        let client = build_client(&config.http)?;

        let mut providers = vec![ProviderDescriptor::new(
            "yt-dlp",
            Arc::new(YtDlpProvider::from_config(config, artifacts.clone())) as Arc<dyn Provider>,
        )];
        for site in &config.scrape.sites {
            let provider =
                ScrapingProvider::new(site.clone(), client.clone(), limits, artifacts.clone())?;
            providers.push(ProviderDescriptor::new(
                provider.name().to_string(),
                Arc::new(provider) as Arc<dyn Provider>,
            ));
        }

        Ok(Self::new(providers)
            .with_limits(limits)
            .with_backoff(config.fallback.backoff())
            .with_attempt_timeout(config.fallback.attempt_timeout())
            .with_policy(config.fallback.on_track_limit)
            .with_artifacts(artifacts))
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// A zero duration disables the per-attempt timeout
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    pub fn with_policy(mut self, policy: TrackLimitPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_artifacts(mut self, artifacts: TempArtifactManager) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.iter().map(ProviderDescriptor::name)
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn artifacts(&self) -> &TempArtifactManager {
        &self.artifacts
    }

    /// Validate `query`, then try providers in order until one settles it.
    ///
    /// `status` is notified before each attempt. Only query validation can
    /// fail; every provider fault ends up as a normal outcome.
    pub async fn acquire<R>(
        &self,
        query: &str,
        status: &mut R,
    ) -> std::result::Result<Acquisition, QueryError>
    where
        R: StatusReporter + ?Sized,
    {
        let query = self.limits.validate_query_length(query)?;
        let mut deferred: Option<Acquisition> = None;

        for (index, descriptor) in self.providers.iter().enumerate() {
            let name = descriptor.name();
            status.attempting(name, query.as_str());
            info!("Trying {} for {:?}", name, query.as_str());

            let outcome = match self.attempt_timeout {
                Some(limit) => tokio::time::timeout(limit, descriptor.provider().attempt(&query))
                    .await
                    .unwrap_or_else(|_| {
                        warn!("{} timed out after {}s", name, limit.as_secs());
                        ProviderOutcome::TransientError
                    }),
                None => descriptor.provider().attempt(&query).await,
            };
            debug!("{} -> {}", name, outcome);

            let acquired = match outcome {
                ProviderOutcome::Found(path) => {
                    info!("Found via {}: {}", name, path.display());
                    return Ok(Acquisition {
                        outcome: Acquired::Found(path),
                        provider: name.to_string(),
                    });
                }
                ProviderOutcome::TooLong => Some(Acquired::TooLong),
                ProviderOutcome::TooBig => Some(Acquired::TooBig),
                ProviderOutcome::NotFound | ProviderOutcome::TransientError => None,
            };

            if let Some(acquired) = acquired {
                let limited = Acquisition {
                    outcome: acquired,
                    provider: name.to_string(),
                };
                match self.policy {
                    TrackLimitPolicy::Abort => {
                        info!("Stopping at {}: {}", name, limited.outcome.as_wire());
                        return Ok(limited);
                    }
                    TrackLimitPolicy::Skip => {
                        deferred.get_or_insert(limited);
                    }
                }
            }

            if index + 1 < self.providers.len() && !self.backoff.is_zero() {
                tokio::time::sleep(self.backoff).await;
            }
        }

        let result = deferred.unwrap_or_else(Acquisition::exhausted);
        info!("No provider produced {:?}: {}", query.as_str(), result);
        Ok(result)
    }

    /// Delete an artifact returned by [`acquire`](Self::acquire). Idempotent.
    pub async fn release(&self, path: &Path) {
        self.artifacts.release(path).await;
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.providers)
            .field("backoff", &self.backoff)
            .field("attempt_timeout", &self.attempt_timeout)
            .field("policy", &self.policy)
            .finish()
    }
}
