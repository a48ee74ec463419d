//! Structured-extraction provider backed by yt-dlp

use super::{contain, Provider, ProviderOutcome};
use crate::config::Config;
use crate::error::ProviderError;
use crate::temp::TempArtifactManager;
use crate::validation::{Limits, Query};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Base name yt-dlp writes to inside the per-attempt scratch directory
const OUTPUT_STEM: &str = "track";

#[derive(Debug)]
pub struct YtDlpProvider {
    yt_dlp_path: PathBuf,
    ffmpeg_path: Option<PathBuf>,
    qualifiers: Vec<String>,
    format: String,
    audio_format: String,
    audio_quality: String,
    limits: Limits,
    temp: TempArtifactManager,
}

/// Output of `yt-dlp --dump-single-json "<qualifier>:<query>"`
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub entries: Vec<Option<SearchEntry>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchEntry {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl SearchEntry {
    fn target(&self) -> Option<&str> {
        self.webpage_url
            .as_deref()
            .or(self.url.as_deref())
            .filter(|u| !u.is_empty())
    }
}

impl SearchResult {
    /// First entry that carries a downloadable URL
    pub fn first_usable(&self) -> Option<&SearchEntry> {
        self.entries
            .iter()
            .flatten()
            .find(|entry| entry.target().is_some())
    }
}

impl YtDlpProvider {
    pub fn new(yt_dlp_path: PathBuf, limits: Limits, temp: TempArtifactManager) -> Self {
        let defaults = Config::default().extract;
        Self {
            yt_dlp_path,
            ffmpeg_path: None,
            qualifiers: defaults.qualifiers,
            format: defaults.format,
            audio_format: defaults.audio_format,
            audio_quality: defaults.audio_quality,
            limits,
            temp,
        }
    }

    pub fn from_config(config: &Config, temp: TempArtifactManager) -> Self {
        let yt_dlp_path = config.yt_dlp_path().unwrap_or_else(|e| {
            warn!("{}; falling back to bare \"yt-dlp\"", e);
            PathBuf::from("yt-dlp")
        });
        Self {
            yt_dlp_path,
            ffmpeg_path: config.ffmpeg_path().ok(),
            qualifiers: config.extract.qualifiers.clone(),
            format: config.extract.format.clone(),
            audio_format: config.extract.audio_format.clone(),
            audio_quality: config.extract.audio_quality.clone(),
            limits: Limits::from(&config.limits),
            temp,
        }
    }

    /// Resolve the top match for one qualifier without downloading
    async fn search(&self, qualifier: &str, query: &Query) -> Result<SearchResult, ProviderError> {
        let target = search_target(qualifier, query);
        debug!("yt-dlp search: {}", target);

        let output = Command::new(&self.yt_dlp_path)
            .args([
                "--dump-single-json",
                "--no-warnings",
                "--ignore-errors",
                "--no-playlist",
                target.as_str(),
            ])
            .kill_on_drop(true)
            .output()
            .await
            .map_err(map_spawn_error)?;

        if !output.status.success() && output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(ProviderError::YtDlpFailed(output.status.code()));
        }

        parse_search_output(&output.stdout)
    }

    /// Download and transcode one entry into `scratch`, returning the audio file
    async fn download(&self, url: &str, scratch: &Path) -> Result<PathBuf, ProviderError> {
        let output_template = scratch.join(format!("{}.%(ext)s", OUTPUT_STEM));

        let mut cmd = Command::new(&self.yt_dlp_path);
        cmd.args([
            "-f", self.format.as_str(),
            "--extract-audio",
            "--audio-format", self.audio_format.as_str(),
            "--audio-quality", self.audio_quality.as_str(),
            "--no-playlist",
            "--no-warnings",
            "--quiet",
        ]);
        if let Some(ref ffmpeg) = self.ffmpeg_path {
            cmd.arg("--ffmpeg-location").arg(ffmpeg);
        }
        cmd.arg("-o").arg(&output_template).arg(url);

        let output = cmd.kill_on_drop(true).output().await.map_err(map_spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            debug!("yt-dlp stderr: {}", stderr);
            return Err(ProviderError::YtDlpFailed(output.status.code()));
        }

        let audio_path = scratch.join(format!("{}.{}", OUTPUT_STEM, self.audio_format));
        if tokio::fs::try_exists(&audio_path).await? {
            debug!("Found audio file: {}", audio_path.display());
            Ok(audio_path)
        } else {
            Err(ProviderError::NoAudioFile)
        }
    }

    async fn try_attempt(&self, query: &Query) -> Result<ProviderOutcome, ProviderError> {
        let mut last_error = None;

        for qualifier in &self.qualifiers {
            let result = match self.search(qualifier, query).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("yt-dlp {} search failed: {}", qualifier, e);
                    last_error = Some(e);
                    continue;
                }
            };

            let Some(entry) = result.first_usable() else {
                debug!("yt-dlp {}: no entries for {:?}", qualifier, query.as_str());
                continue;
            };

            let title = entry.title.as_deref().unwrap_or("(untitled)");
            if let Some(duration) = entry.duration {
                if !self.limits.validate_duration(duration) {
                    warn!(
                        "Track too long: {:.0}s > {}s ({})",
                        duration, self.limits.max_duration_secs, title
                    );
                    return Ok(ProviderOutcome::TooLong);
                }
            }

            let Some(url) = entry.target() else {
                continue;
            };
            info!("yt-dlp {} matched: {} ({})", qualifier, title, url);

            // partial downloads and intermediate containers die with the scratch dir
            let scratch = self.temp.scratch_dir("ytdlp")?;
            let audio_path = self.download(url, scratch.path()).await?;

            let size = tokio::fs::metadata(&audio_path).await?.len();
            if !self.limits.validate_size(size) {
                warn!("File too large: {} > {}", size, self.limits.max_size_bytes);
                return Ok(ProviderOutcome::TooBig);
            }

            let artifact = self.temp.pending("ytdlp", &self.audio_format)?;
            tokio::fs::rename(&audio_path, artifact.path()).await?;
            return Ok(ProviderOutcome::Found(artifact.persist()));
        }

        match last_error {
            Some(e) => Err(e),
            None => Ok(ProviderOutcome::NotFound),
        }
    }
}

#[async_trait]
impl Provider for YtDlpProvider {
    async fn attempt(&self, query: &Query) -> ProviderOutcome {
        contain("yt-dlp", self.try_attempt(query).await)
    }
}

/// `ytsearch1:<query>` style search target
pub fn search_target(qualifier: &str, query: &Query) -> String {
    format!("{}:{}", qualifier, query.as_str())
}

fn parse_search_output(stdout: &[u8]) -> Result<SearchResult, ProviderError> {
    let whole = match serde_json::from_slice(stdout) {
        Ok(result) => return Ok(result),
        Err(e) => e,
    };

    // --ignore-errors may emit one JSON document per line; the search result is the last
    let text = String::from_utf8_lossy(stdout);
    let Some(last) = text.lines().rev().find(|line| !line.trim().is_empty()) else {
        return Ok(SearchResult { entries: Vec::new() });
    };
    serde_json::from_str(last).map_err(|_| ProviderError::MetadataParse(whole))
}

fn map_spawn_error(e: std::io::Error) -> ProviderError {
    if e.kind() == std::io::ErrorKind::NotFound {
        ProviderError::YtDlpNotFound
    } else {
        ProviderError::Io(e)
    }
}
