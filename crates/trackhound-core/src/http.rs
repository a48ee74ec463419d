//! Shared HTTP client for scraping providers

use crate::config::HttpConfig;
use crate::error::ProviderError;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;

/// Build the client every scraping provider shares.
///
/// Sites serve different markup to non-browser clients; keep the defaults
/// browser-like.
pub fn build_client(config: &HttpConfig) -> Result<reqwest::Client, ProviderError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_str(&config.accept)?);
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_str(&config.accept_language)?);

    let client = reqwest::Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn test_build_client_with_defaults() {
        assert!(build_client(&Config::default().http).is_ok());
    }

    #[test]
    fn test_rejects_header_with_newline() {
        let mut http = Config::default().http;
        http.accept_language = "en\r\nX-Injected: 1".to_string();
        assert!(matches!(build_client(&http), Err(ProviderError::Header(_))));
    }
}
