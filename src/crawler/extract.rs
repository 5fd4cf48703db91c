//! Link extraction from HTML

use crate::url::{is_internal_link, is_valid_http_url, resolve_relative_url};
use scraper::{Html, Selector};
use serde::Serialize;

/// Maximum length kept for anchor text
const MAX_LINK_TEXT: usize = 200;

/// A hyperlink found on a crawled page
///
/// Many instances may share the same `link_url` (the same target linked
/// from several pages); deduplication happens before verification, and
/// occurrence aggregation is the reporter's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedLink {
    /// URL of the page the link was found on
    pub source_url: String,
    /// Absolute target URL
    pub link_url: String,
    /// Anchor text, truncated to 200 characters
    pub link_text: String,
    /// Whether the target is on the base URL's site
    pub is_internal: bool,
}

/// Extracts every valid hyperlink from a page's HTML
///
/// Each `href` is resolved against the page URL; empty, fragment-only and
/// non-fetchable targets are discarded. Malformed HTML degrades to however
/// much the parser can recover, never an error.
pub fn extract_links(
    page_url: &str,
    html: &str,
    base_url: &str,
    include_subdomains: bool,
) -> Vec<ExtractedLink> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(s) => s,
        Err(_) => return Vec::new(),
    };

    let mut links = Vec::new();

    for element in document.select(&selector) {
        let href = match element.value().attr("href") {
            Some(href) => href,
            None => continue,
        };

        let link_url = match resolve_relative_url(page_url, href) {
            Some(url) => url,
            None => continue,
        };

        if !is_valid_http_url(&link_url) {
            continue;
        }

        let link_text: String = element
            .text()
            .collect::<String>()
            .trim()
            .chars()
            .take(MAX_LINK_TEXT)
            .collect();

        let is_internal = is_internal_link(&link_url, base_url, include_subdomains);

        links.push(ExtractedLink {
            source_url: page_url.to_string(),
            link_url,
            link_text,
            is_internal,
        });
    }

    links
}
