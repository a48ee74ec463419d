//! Ordered strategies for finding a direct media link on a detail page
//!
//! Each strategy is a pure function over the parsed document. They run in
//! order and the first non-empty hit wins.

use regex::Regex;
use scraper::{Html, Selector};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heuristic {
    /// `<audio src>` / `<source src>`
    MediaSource,
    /// Any element with a `data-url` attribute
    DataUrl,
    /// `<a href>`
    Anchor,
    /// Quoted string inside an inline `<script>`
    InlineScript,
}

/// A discovered URL plus the heuristic that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateLink {
    pub url: String,
    pub heuristic: Heuristic,
}

type Strategy = fn(&Html, &[String]) -> Option<String>;

const STRATEGIES: [(Heuristic, Strategy); 4] = [
    (Heuristic::MediaSource, media_source),
    (Heuristic::DataUrl, data_url),
    (Heuristic::Anchor, anchor),
    (Heuristic::InlineScript, inline_script),
];

/// Run every strategy in order, stopping at the first hit.
pub fn discover(document: &Html, extensions: &[String]) -> Option<CandidateLink> {
    STRATEGIES.iter().find_map(|(heuristic, strategy)| {
        strategy(document, extensions).map(|url| CandidateLink {
            url,
            heuristic: *heuristic,
        })
    })
}

pub fn has_audio_extension(value: &str, extensions: &[String]) -> bool {
    let lower = value.to_ascii_lowercase();
    extensions
        .iter()
        .any(|ext| lower.contains(&ext.to_ascii_lowercase()))
}

fn first_attr(document: &Html, selector: &str, attr: &str, extensions: &[String]) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty() && has_audio_extension(value, extensions))
        .map(str::to_string)
}

fn media_source(document: &Html, extensions: &[String]) -> Option<String> {
    first_attr(document, "audio[src], audio source[src], source[src]", "src", extensions)
}

fn data_url(document: &Html, extensions: &[String]) -> Option<String> {
    first_attr(document, "[data-url]", "data-url", extensions)
}

fn anchor(document: &Html, extensions: &[String]) -> Option<String> {
    first_attr(document, "a[href]", "href", extensions)
}

fn inline_script(document: &Html, extensions: &[String]) -> Option<String> {
    if extensions.is_empty() {
        return None;
    }
    let selector = Selector::parse("script:not([src])").ok()?;
    let alternatives = extensions
        .iter()
        .map(|ext| regex::escape(ext.trim_start_matches('.')))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = Regex::new(&format!(
        r#"(?i)["']([^"'\s]+?\.(?:{})(?:[?#][^"'\s]*)?)["']"#,
        alternatives
    ))
    .ok()?;

    document.select(&selector).find_map(|script| {
        let body = script.text().collect::<String>();
        pattern
            .captures(&body)
            .and_then(|caps| caps.get(1))
            // JSON-embedded URLs escape their slashes
            .map(|m| m.as_str().replace("\\/", "/"))
    })
}
