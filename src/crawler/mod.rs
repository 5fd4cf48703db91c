//! Page crawling and link extraction
//!
//! The crawler fetches a page body (rate-limited, HTML only) and extracts
//! every outbound hyperlink with its anchor text and internal/external
//! classification. A single unreachable or non-HTML page yields an empty
//! link list, never an error.

mod extract;
mod fetcher;

pub use extract::{extract_links, ExtractedLink};
pub use fetcher::{build_hop_client, build_http_client};

use crate::config::AuditConfig;
use crate::limiter::RateLimiter;
use reqwest::Client;

/// Crawls pages and extracts links
pub struct PageCrawler {
    client: Client,
    base_url: String,
    include_subdomains: bool,
    limiter: RateLimiter,
}

impl PageCrawler {
    /// Creates a crawler for the given base URL
    ///
    /// The base URL defines the internal/external boundary for extracted
    /// links. The crawler gets its own rate limiter, independent of the
    /// link checker's.
    pub fn new(client: Client, config: &AuditConfig, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            include_subdomains: config.include_subdomains,
            limiter: RateLimiter::new(config.crawl_delay()),
        }
    }

    /// The crawler's rate limiter (for applying crawl-delay hints)
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Fetches a page body, or `None` on any failure or non-HTML content
    pub async fn fetch_page(&self, url: &str) -> Option<String> {
        fetcher::fetch_page(&self.client, &self.limiter, url).await
    }

    /// Extracts all valid links from a page's HTML
    pub fn extract_links(&self, page_url: &str, html: &str) -> Vec<ExtractedLink> {
        extract_links(page_url, html, &self.base_url, self.include_subdomains)
    }

    /// Fetches a page and extracts its links
    ///
    /// A fetch failure yields an empty list; one unreachable page must not
    /// abort the run.
    pub async fn crawl_page(&self, url: &str) -> Vec<ExtractedLink> {
        match self.fetch_page(url).await {
            Some(html) => self.extract_links(url, &html),
            None => Vec::new(),
        }
    }
}
