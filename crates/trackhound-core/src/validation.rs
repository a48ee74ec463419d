//! Query and track limit checks
//!
//! Everything here is pure: no I/O, no logging.

use crate::config::LimitsConfig;
use crate::error::QueryError;
use std::fmt;

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_QUERY_CHARS: usize = 100;
pub const MAX_DURATION_SECS: u64 = 600;
pub const MAX_SIZE_BYTES: u64 = 50 * 1024 * 1024;
pub const MIN_SIZE_BYTES: u64 = 1000;

/// A trimmed query whose length is within bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Track limits applied by providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub min_query_chars: usize,
    pub max_query_chars: usize,
    pub max_duration_secs: u64,
    pub max_size_bytes: u64,
    pub min_size_bytes: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            min_query_chars: MIN_QUERY_CHARS,
            max_query_chars: MAX_QUERY_CHARS,
            max_duration_secs: MAX_DURATION_SECS,
            max_size_bytes: MAX_SIZE_BYTES,
            min_size_bytes: MIN_SIZE_BYTES,
        }
    }
}

impl From<&LimitsConfig> for Limits {
    fn from(config: &LimitsConfig) -> Self {
        Self {
            min_query_chars: config.min_query_chars,
            max_query_chars: config.max_query_chars,
            max_duration_secs: config.max_duration_secs,
            max_size_bytes: config.max_size_bytes,
            min_size_bytes: config.min_size_bytes,
        }
    }
}

impl Limits {
    /// Trim and length-check a raw query. Length counts characters, not bytes.
    pub fn validate_query_length(&self, text: &str) -> Result<Query, QueryError> {
        let trimmed = text.trim();
        let len = trimmed.chars().count();
        if len < self.min_query_chars {
            return Err(QueryError::TooShort {
                len,
                min: self.min_query_chars,
            });
        }
        if len > self.max_query_chars {
            return Err(QueryError::TooLong {
                len,
                max: self.max_query_chars,
            });
        }
        Ok(Query(trimmed.to_string()))
    }

    pub fn validate_duration(&self, seconds: f64) -> bool {
        seconds <= self.max_duration_secs as f64
    }

    pub fn validate_size(&self, bytes: u64) -> bool {
        bytes <= self.max_size_bytes
    }

    pub fn validate_min_size(&self, bytes: u64) -> bool {
        bytes >= self.min_size_bytes
    }
}

/// Validate a query against the default bounds
pub fn validate_query_length(text: &str) -> Result<Query, QueryError> {
    Limits::default().validate_query_length(text)
}

pub fn validate_duration(seconds: f64) -> bool {
    Limits::default().validate_duration(seconds)
}

pub fn validate_size(bytes: u64) -> bool {
    Limits::default().validate_size(bytes)
}

pub fn validate_min_size(bytes: u64) -> bool {
    Limits::default().validate_min_size(bytes)
}

const SMALL_TALK: &[&str] = &[
    "привет",
    "hello",
    "как дела",
    "спасибо",
    "пока",
    "hi",
    "hey",
    "добрый день",
    "добрый вечер",
    "thanks",
];

/// Whether free text reads as a greeting rather than a track title.
///
/// The whole text must be a greeting, so "Hey Jude" is not small talk but "hey" is.
pub fn is_small_talk(text: &str) -> bool {
    let normalized = text
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .to_lowercase();
    SMALL_TALK.iter().any(|phrase| normalized == *phrase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_length_bounds() {
        assert_eq!(
            validate_query_length("a"),
            Err(QueryError::TooShort { len: 1, min: 2 })
        );
        assert_eq!(validate_query_length("ab").unwrap().as_str(), "ab");
        assert!(validate_query_length(&"x".repeat(100)).is_ok());
        assert_eq!(
            validate_query_length(&"x".repeat(101)),
            Err(QueryError::TooLong { len: 101, max: 100 })
        );
    }

    #[test]
    fn test_query_is_trimmed_before_counting() {
        assert!(matches!(
            validate_query_length("   a   "),
            Err(QueryError::TooShort { len: 1, .. })
        ));
        let query = validate_query_length("  Imagine Dragons Radioactive \n").unwrap();
        assert_eq!(query.as_str(), "Imagine Dragons Radioactive");
    }

    #[test]
    fn test_query_counts_characters_not_bytes() {
        // two Cyrillic characters are four bytes
        assert!(validate_query_length("ая").is_ok());
        assert!(validate_query_length(&"я".repeat(100)).is_ok());
    }

    #[test]
    fn test_duration_cap() {
        assert!(validate_duration(190.0));
        assert!(validate_duration(600.0));
        assert!(!validate_duration(600.5));
        assert!(!validate_duration(700.0));
    }

    #[test]
    fn test_size_caps() {
        assert!(validate_size(MAX_SIZE_BYTES));
        assert!(!validate_size(MAX_SIZE_BYTES + 1));
        assert!(!validate_min_size(400));
        assert!(validate_min_size(1000));
    }

    #[test]
    fn test_small_talk() {
        assert!(is_small_talk("Hello!"));
        assert!(is_small_talk("  привет "));
        assert!(!is_small_talk("The Beatles Hey Jude"));
        assert!(!is_small_talk("Hi-Fi Serious"));
    }
}
