//! Search-page parsing and URL handling for scraped sites

use crate::config::SiteProfile;
use crate::error::ProviderError;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

/// Compiled selectors for one site.
#[derive(Debug)]
pub struct SiteMarkup {
    result_selectors: Vec<(String, Selector)>,
    link_selector: Selector,
    any_link: Selector,
}

impl SiteMarkup {
    pub fn compile(site: &SiteProfile) -> Result<Self, ProviderError> {
        let result_selectors = site
            .result_selectors
            .iter()
            .map(|raw| parse_selector(raw).map(|sel| (raw.clone(), sel)))
            .collect::<Result<Vec<_>, _>>()?;
        let link_selector = parse_selector(&site.link_selector)?;
        Ok(Self {
            result_selectors,
            link_selector,
            any_link: parse_selector("a[href]")?,
        })
    }

    /// Detail-page link of the first search result.
    ///
    /// Selectors are tried in order; a selector that matches no entry, or
    /// whose first entry carries no link, falls through to the next one.
    pub fn first_result_link(&self, document: &Html) -> Option<String> {
        self.result_selectors.iter().find_map(|(raw, selector)| {
            let entry = document.select(selector).next()?;
            let link = self.entry_link(entry);
            debug!("Result selector {:?} -> {:?}", raw, link);
            link
        })
    }

    fn entry_link(&self, entry: ElementRef<'_>) -> Option<String> {
        if let Some(href) = entry.value().attr("href") {
            return non_empty(href);
        }
        entry
            .select(&self.link_selector)
            .chain(entry.select(&self.any_link))
            .filter_map(|a| a.value().attr("href"))
            .find_map(non_empty)
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn parse_selector(raw: &str) -> Result<Selector, ProviderError> {
    Selector::parse(raw).map_err(|e| ProviderError::Selector(format!("{}: {}", raw, e)))
}

/// Site search URL with the query percent-encoded into the path template
pub fn search_url(origin: &Url, site: &SiteProfile, query: &str) -> Result<Url, ProviderError> {
    let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
    let path = site.search_path.replace("{query}", &encoded);
    Ok(origin.join(&path)?)
}

/// Expand protocol-relative, root-relative and page-relative links against `base`.
pub fn resolve(base: &Url, href: &str) -> Option<Url> {
    let url = base.join(href.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

/// Resolve a media link found on a detail page.
///
/// Root-relative and protocol-relative links expand against the site origin,
/// even when the detail page lives on another host. Page-relative links
/// expand against the detail page.
pub fn resolve_media(origin: &Url, page: &Url, href: &str) -> Option<Url> {
    if href.trim().starts_with('/') {
        resolve(origin, href)
    } else {
        resolve(page, href)
    }
}

/// Whether a declared content type can carry an audio body
pub fn is_audio_content_type(content_type: Option<&str>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.starts_with("audio/")
        || matches!(
            mime.as_str(),
            "application/octet-stream" | "binary/octet-stream" | "application/ogg"
        )
}

/// File extension for the artifact, taken from the media URL when recognised
pub fn artifact_extension(url: &Url, extensions: &[String]) -> String {
    let path = url.path().to_ascii_lowercase();
    extensions
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .find(|ext| path.ends_with(&format!(".{}", ext)))
        .unwrap_or_else(|| "mp3".to_string())
}
