//! Error types for trackhound-core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackhoundError>;

#[derive(Error, Debug)]
pub enum TrackhoundError {
    #[error("Invalid query: {0}")]
    Query(#[from] QueryError),

    #[error("Provider setup failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Rejections raised before any provider runs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query is too short ({len} characters, at least {min} required)")]
    TooShort { len: usize, min: usize },

    #[error("query is too long ({len} characters, at most {max} allowed)")]
    TooLong { len: usize, max: usize },
}

/// Faults inside a single provider attempt.
///
/// These never reach the orchestrator: providers log them and report
/// `ProviderOutcome::TransientError` instead.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("yt-dlp not found. Install with: pip install yt-dlp")]
    YtDlpNotFound,

    #[error("yt-dlp failed with exit code: {0:?}")]
    YtDlpFailed(Option<i32>),

    #[error("yt-dlp produced no audio file")]
    NoAudioFile,

    #[error("Failed to parse extractor output: {0}")]
    MetadataParse(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    LoadError(String),

    #[error("Invalid config value: {0}")]
    InvalidValue(String),
}
