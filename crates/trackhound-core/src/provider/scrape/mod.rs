//! Scraping provider: HTML search, detail page, direct media link

pub mod heuristics;
pub mod page;

use super::{contain, Provider, ProviderOutcome};
use crate::config::SiteProfile;
use crate::error::ProviderError;
use crate::temp::{PendingArtifact, TempArtifactManager};
use crate::validation::{Limits, Query};
use async_trait::async_trait;
use futures::StreamExt;
use heuristics::CandidateLink;
use page::SiteMarkup;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use scraper::Html;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug)]
pub struct ScrapingProvider {
    site: SiteProfile,
    origin: Url,
    markup: SiteMarkup,
    client: reqwest::Client,
    limits: Limits,
    temp: TempArtifactManager,
}

/// How a streamed transfer ended
enum Transfer {
    Complete(u64),
    /// Stopped once the body passed the size cap
    Oversize(u64),
}

impl ScrapingProvider {
    pub fn new(
        site: SiteProfile,
        client: reqwest::Client,
        limits: Limits,
        temp: TempArtifactManager,
    ) -> Result<Self, ProviderError> {
        let origin = Url::parse(&site.origin)?;
        let markup = SiteMarkup::compile(&site)?;
        Ok(Self {
            site,
            origin,
            markup,
            client,
            limits,
            temp,
        })
    }

    pub fn name(&self) -> &str {
        &self.site.name
    }

    /// GET a page body. `None` on 404.
    async fn fetch_page(&self, url: &Url) -> Result<Option<String>, ProviderError> {
        debug!("{}: GET {}", self.site.name, url);
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(Some(response.text().await?))
    }

    /// Detail-page URL of the first search hit
    fn find_result(&self, body: &str) -> Option<Url> {
        let document = Html::parse_document(body);
        let href = self.markup.first_result_link(&document)?;
        page::resolve(&self.origin, &href)
    }

    /// Direct media URL on a detail page
    fn find_media(&self, page_url: &Url, body: &str) -> Option<(Url, CandidateLink)> {
        let document = Html::parse_document(body);
        let candidate = heuristics::discover(&document, &self.site.audio_extensions)?;
        debug!(
            "{}: {:?} heuristic found {}",
            self.site.name, candidate.heuristic, candidate.url
        );
        let url = page::resolve_media(&self.origin, page_url, &candidate.url)?;
        Some((url, candidate))
    }

    async fn stream_to(
        &self,
        response: reqwest::Response,
        artifact: &PendingArtifact,
    ) -> Result<Transfer, ProviderError> {
        let mut file = tokio::fs::File::create(artifact.path()).await?;
        let mut written: u64 = 0;
        let mut body = response.bytes_stream();

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            written += chunk.len() as u64;
            if !self.limits.validate_size(written) {
                return Ok(Transfer::Oversize(written));
            }
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(Transfer::Complete(written))
    }

    async fn download(&self, media_url: &Url) -> Result<ProviderOutcome, ProviderError> {
        let response = self.client.get(media_url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            debug!("{}: media request returned {}", self.site.name, status);
            return Ok(ProviderOutcome::NotFound);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !page::is_audio_content_type(content_type.as_deref()) {
            warn!(
                "{}: rejecting {} with content type {:?}",
                self.site.name, media_url, content_type
            );
            return Ok(ProviderOutcome::NotFound);
        }

        if let Some(declared) = response.content_length() {
            if !self.limits.validate_size(declared) {
                warn!("File too large: {} > {}", declared, self.limits.max_size_bytes);
                return Ok(ProviderOutcome::TooBig);
            }
        }

        let extension = page::artifact_extension(media_url, &self.site.audio_extensions);
        // removed on every path except Found, including cancellation
        let artifact = self.temp.pending(&temp_prefix(&self.site.name), &extension)?;

        match self.stream_to(response, &artifact).await? {
            Transfer::Oversize(bytes) => {
                warn!("File too large: {}+ > {}", bytes, self.limits.max_size_bytes);
                Ok(ProviderOutcome::TooBig)
            }
            Transfer::Complete(bytes) if !self.limits.validate_min_size(bytes) => {
                warn!(
                    "{}: body of {} bytes is too small to be audio",
                    self.site.name, bytes
                );
                Ok(ProviderOutcome::NotFound)
            }
            Transfer::Complete(bytes) => {
                info!("{}: downloaded {} bytes", self.site.name, bytes);
                Ok(ProviderOutcome::Found(artifact.persist()))
            }
        }
    }

    async fn try_attempt(&self, query: &Query) -> Result<ProviderOutcome, ProviderError> {
        let search_url = page::search_url(&self.origin, &self.site, query.as_str())?;
        let Some(results) = self.fetch_page(&search_url).await? else {
            return Ok(ProviderOutcome::NotFound);
        };

        let Some(detail_url) = self.find_result(&results) else {
            info!("{}: no results for {:?}", self.site.name, query.as_str());
            return Ok(ProviderOutcome::NotFound);
        };

        let Some(detail) = self.fetch_page(&detail_url).await? else {
            return Ok(ProviderOutcome::NotFound);
        };

        let Some((media_url, candidate)) = self.find_media(&detail_url, &detail) else {
            info!("{}: no media link on {}", self.site.name, detail_url);
            return Ok(ProviderOutcome::NotFound);
        };
        info!(
            "{}: media link via {:?}: {}",
            self.site.name, candidate.heuristic, media_url
        );

        self.download(&media_url).await
    }
}

#[async_trait]
impl Provider for ScrapingProvider {
    async fn attempt(&self, query: &Query) -> ProviderOutcome {
        contain(&self.site.name, self.try_attempt(query).await)
    }
}

fn temp_prefix(site_name: &str) -> String {
    let cleaned: String = site_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    format!("scrape-{}", cleaned)
}
