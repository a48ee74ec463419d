//! Configuration management for trackhound

use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub limits: LimitsConfig,
    pub fallback: FallbackConfig,
    pub paths: PathsConfig,
    pub extract: ExtractConfig,
    pub http: HttpConfig,
    pub scrape: ScrapeConfig,
    pub temp: TempConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Shortest accepted query, in characters after trimming
    pub min_query_chars: usize,
    /// Longest accepted query, in characters after trimming
    pub max_query_chars: usize,
    /// Longest track accepted, in seconds
    pub max_duration_secs: u64,
    /// Largest artifact accepted, in bytes
    pub max_size_bytes: u64,
    /// Scraped bodies below this are treated as placeholder pages
    pub min_size_bytes: u64,
}

/// What the orchestrator does when a provider reports a duration or size violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackLimitPolicy {
    /// Stop the fallback chain and report the violation
    Abort,
    /// Treat the violation like a miss and try the next provider
    Skip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// Pause between a failed provider and the next one
    pub backoff_ms: u64,
    /// Upper bound on a single provider attempt
    pub attempt_timeout_secs: u64,
    pub on_track_limit: TrackLimitPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Path to yt-dlp binary (auto-detected if not set)
    pub yt_dlp: Option<PathBuf>,
    /// Path to FFmpeg binary (auto-detected if not set)
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// yt-dlp search prefixes, tried in order (e.g. "ytsearch1", "scsearch1")
    pub qualifiers: Vec<String>,
    /// yt-dlp format selector for the source stream
    pub format: String,
    /// Container the audio is extracted to
    pub audio_format: String,
    /// Bitrate passed to the audio extractor
    pub audio_quality: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapeConfig {
    /// Scraped sites, in fallback order after the extraction provider
    pub sites: Vec<SiteProfile>,
}

/// Markup description of one scraped music site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteProfile {
    pub name: String,
    /// Scheme and host, e.g. "https://example.org"
    pub origin: String,
    /// Search path with a `{query}` placeholder for the encoded query
    pub search_path: String,
    /// Result entry selectors, most current markup first
    pub result_selectors: Vec<String>,
    /// Link selector applied inside a result entry
    pub link_selector: String,
    /// Extensions recognized as direct audio links
    pub audio_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TempConfig {
    /// Custom temp directory (uses system temp if not set)
    pub directory: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            limits: LimitsConfig {
                min_query_chars: 2,
                max_query_chars: 100,
                max_duration_secs: 600,
                max_size_bytes: 50 * 1024 * 1024,
                min_size_bytes: 1000,
            },
            fallback: FallbackConfig {
                backoff_ms: 1500,
                attempt_timeout_secs: 180,
                on_track_limit: TrackLimitPolicy::Abort,
            },
            paths: PathsConfig {
                yt_dlp: None,
                ffmpeg: None,
            },
            extract: ExtractConfig {
                qualifiers: vec!["ytsearch1".to_string(), "scsearch1".to_string()],
                format: "bestaudio[ext=m4a]/bestaudio/best".to_string(),
                audio_format: "mp3".to_string(),
                audio_quality: "192K".to_string(),
            },
            http: HttpConfig {
                user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                             (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                    .to_string(),
                accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"
                    .to_string(),
                accept_language: "en-US,en;q=0.9,ru;q=0.8".to_string(),
                timeout_secs: 30,
            },
            scrape: ScrapeConfig {
                sites: default_sites(),
            },
            temp: TempConfig { directory: None },
        }
    }
}

fn default_sites() -> Vec<SiteProfile> {
    let audio_extensions = vec![".mp3".to_string(), ".m4a".to_string(), ".ogg".to_string()];
    vec![
        SiteProfile {
            name: "freemusicarchive".to_string(),
            origin: "https://freemusicarchive.org".to_string(),
            search_path: "/search?quicksearch={query}".to_string(),
            result_selectors: vec![
                "div.play-item".to_string(),
                "div.ptxt-track".to_string(),
                "ul.search-results li".to_string(),
            ],
            link_selector: "a[href*=\"/music/\"]".to_string(),
            audio_extensions: audio_extensions.clone(),
        },
        SiteProfile {
            name: "archive".to_string(),
            origin: "https://archive.org".to_string(),
            search_path: "/search?query={query}&sin=&and[]=mediatype%3A%22audio%22".to_string(),
            result_selectors: vec![
                "div.item-ia".to_string(),
                "div.results div.item-ttl".to_string(),
            ],
            link_selector: "a[href*=\"/details/\"]".to_string(),
            audio_extensions,
        },
    ]
}

impl FallbackConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_secs(self.attempt_timeout_secs)
    }
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Config::default()));

        // Load from default config directory
        if let Some(default_config) = Self::default_config_file() {
            if default_config.exists() {
                figment = figment.merge(Toml::file(&default_config));
            }
        }

        // Load from specified config file
        if let Some(path) = config_file {
            if !path.exists() {
                return Err(ConfigError::LoadError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment
        figment = figment.merge(Env::prefixed("TRACKHOUND_").split("__"));

        let config: Config = figment
            .extract()
            .map_err(|e| ConfigError::LoadError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Location of the per-user config file
    pub fn default_config_file() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("trackhound/config.toml"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.limits.min_query_chars > self.limits.max_query_chars {
            return Err(ConfigError::InvalidValue(format!(
                "limits.min_query_chars ({}) exceeds limits.max_query_chars ({})",
                self.limits.min_query_chars, self.limits.max_query_chars
            )));
        }
        for site in &self.scrape.sites {
            if !site.search_path.contains("{query}") {
                return Err(ConfigError::InvalidValue(format!(
                    "scrape site {:?}: search_path has no {{query}} placeholder",
                    site.name
                )));
            }
            if site.result_selectors.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "scrape site {:?}: no result selectors",
                    site.name
                )));
            }
        }
        Ok(())
    }

    /// Get yt-dlp path, auto-detecting if not configured
    pub fn yt_dlp_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.yt_dlp {
            Ok(path.clone())
        } else {
            which::which("yt-dlp")
                .map_err(|_| ConfigError::InvalidValue("yt-dlp not found in PATH".to_string()))
        }
    }

    /// Get FFmpeg path, auto-detecting if not configured
    pub fn ffmpeg_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.paths.ffmpeg {
            Ok(path.clone())
        } else {
            which::which("ffmpeg")
                .map_err(|_| ConfigError::InvalidValue("ffmpeg not found in PATH".to_string()))
        }
    }

    /// Get temp directory
    pub fn temp_dir(&self) -> PathBuf {
        self.temp.directory.clone().unwrap_or_else(std::env::temp_dir)
    }
}
