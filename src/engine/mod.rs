//! Audit orchestration: robots gating, concurrent crawling, link verification

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use reqwest::Client;
use tokio::sync::mpsc::UnboundedSender;

use crate::checker::{CacheStats, LinkChecker, LinkStatus};
use crate::config::AuditConfig;
use crate::crawler::{build_hop_client, build_http_client, ExtractedLink, PageCrawler};
use crate::robots::RobotsFilter;
use crate::url::{host_key, normalize_url};
use crate::Result;

/// Which extracted links get verified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkScope {
    #[default]
    All,
    InternalOnly,
    ExternalOnly,
}

impl LinkScope {
    fn includes(&self, link: &ExtractedLink) -> bool {
        match self {
            LinkScope::All => true,
            LinkScope::InternalOnly => link.is_internal,
            LinkScope::ExternalOnly => !link.is_internal,
        }
    }
}

/// Progress notifications emitted while an audit runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    PageCrawled { completed: usize, total: usize },
    LinkChecked { completed: usize, total: usize },
}

/// Everything an audit run produced
#[derive(Debug)]
pub struct AuditReport {
    /// Every link found, grouped by page in completion order, duplicates
    /// included
    pub links: Vec<ExtractedLink>,
    /// Verification results keyed by normalized link URL
    pub statuses: HashMap<String, LinkStatus>,
    pub pages_crawled: usize,
    /// Pages not fetched because robots.txt disallowed them
    pub pages_skipped: usize,
}

impl AuditReport {
    /// Looks up the status for an extracted link
    pub fn status_for(&self, link: &ExtractedLink) -> Option<&LinkStatus> {
        self.statuses.get(&normalize_url(&link.link_url))
    }
}

/// Drives a full audit: crawl pages, collect links, verify each one
///
/// The crawler and the robots filter share a redirect-following client;
/// the checker has its own client that never follows redirects, since it
/// traces chains hop by hop.
pub struct Auditor {
    config: AuditConfig,
    base_url: String,
    crawler: PageCrawler,
    checker: LinkChecker,
    robots: RobotsFilter,
}

impl Auditor {
    pub fn new(config: AuditConfig, base_url: &str) -> Result<Self> {
        let client: Client = build_http_client(&config)?;
        let crawler = PageCrawler::new(client.clone(), &config, base_url);
        let checker = LinkChecker::new(build_hop_client(&config)?, &config);
        let robots = RobotsFilter::new(client, &config.user_agent, config.ignore_robots);
        Ok(Auditor {
            base_url: base_url.to_string(),
            config,
            crawler,
            checker,
            robots,
        })
    }

    /// Crawls `pages` and verifies every link found on them
    ///
    /// Pages disallowed by robots.txt are skipped and counted. Crawling
    /// and checking each run up to `max_concurrent` requests in flight;
    /// per-host pacing still serializes requests to any single host.
    pub async fn run(
        &self,
        pages: &[String],
        scope: LinkScope,
        progress: Option<UnboundedSender<ProgressEvent>>,
    ) -> AuditReport {
        let mut allowed: Vec<String> = Vec::new();
        let mut pages_skipped = 0;
        for page in pages {
            if self.robots.is_allowed(page, &self.base_url).await {
                allowed.push(page.clone());
            } else {
                tracing::info!(url = %page, "page disallowed by robots.txt, skipping");
                pages_skipped += 1;
            }
        }

        if let Some(delay) = self.robots.crawl_delay(&self.base_url).await {
            if let Some(host) = host_key(&self.base_url) {
                self.crawler
                    .limiter()
                    .ensure_delay_at_least(&host, Duration::from_secs_f64(delay));
            }
        }

        let total_pages = allowed.len();
        let mut links: Vec<ExtractedLink> = Vec::new();
        let mut page_stream = stream::iter(allowed.iter())
            .map(|page| self.crawler.crawl_page(page))
            .buffer_unordered(self.config.max_concurrent);
        let mut pages_done = 0;
        while let Some(page_links) = page_stream.next().await {
            links.extend(page_links);
            pages_done += 1;
            if let Some(tx) = &progress {
                let _ = tx.send(ProgressEvent::PageCrawled {
                    completed: pages_done,
                    total: total_pages,
                });
            }
        }
        drop(page_stream);

        // Dedup by normalized form, keeping the first spelling seen; the
        // request on the wire uses that original spelling
        let mut seen: HashSet<String> = HashSet::new();
        let unique: Vec<String> = links
            .iter()
            .filter(|link| scope.includes(link))
            .filter_map(|link| {
                seen.insert(normalize_url(&link.link_url))
                    .then(|| link.link_url.clone())
            })
            .collect();

        let total_links = unique.len();
        tracing::info!(
            pages = total_pages,
            skipped = pages_skipped,
            links = links.len(),
            unique = total_links,
            "crawl complete, verifying links"
        );

        let mut statuses: HashMap<String, LinkStatus> = HashMap::new();
        let mut check_stream = stream::iter(unique.iter())
            .map(|url| self.checker.check_link(url))
            .buffer_unordered(self.config.max_concurrent);
        let mut links_done = 0;
        while let Some(status) = check_stream.next().await {
            statuses.insert(normalize_url(&status.url), status);
            links_done += 1;
            if let Some(tx) = &progress {
                let _ = tx.send(ProgressEvent::LinkChecked {
                    completed: links_done,
                    total: total_links,
                });
            }
        }
        drop(check_stream);

        AuditReport {
            links,
            statuses,
            pages_crawled: total_pages,
            pages_skipped,
        }
    }

    pub fn crawler(&self) -> &PageCrawler {
        &self.crawler
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.checker.cache_stats()
    }

    pub fn robots_domains_fetched(&self) -> usize {
        self.robots.domains_fetched()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn link(url: &str, internal: bool) -> ExtractedLink {
        ExtractedLink {
            source_url: "https://example.com/".to_string(),
            link_url: url.to_string(),
            link_text: String::new(),
            is_internal: internal,
        }
    }

    #[test]
    fn test_scope_filtering() {
        let internal = link("https://example.com/a", true);
        let external = link("https://other.com/b", false);
        assert!(LinkScope::All.includes(&internal));
        assert!(LinkScope::All.includes(&external));
        assert!(LinkScope::InternalOnly.includes(&internal));
        assert!(!LinkScope::InternalOnly.includes(&external));
        assert!(!LinkScope::ExternalOnly.includes(&internal));
        assert!(LinkScope::ExternalOnly.includes(&external));
    }

    #[test]
    fn test_report_status_lookup_normalizes() {
        let mut statuses = HashMap::new();
        let status = LinkStatus {
            url: "https://example.com/page".to_string(),
            status_code: 200,
            is_redirect: false,
            redirect_chain: vec![(200, "https://example.com/page".to_string())],
            final_url: "https://example.com/page".to_string(),
            is_loop: false,
            is_canonical_redirect: false,
            error: String::new(),
            retries: 0,
        };
        statuses.insert(status.url.clone(), status);
        let report = AuditReport {
            links: vec![link("https://example.com/page/#section", true)],
            statuses,
            pages_crawled: 1,
            pages_skipped: 0,
        };
        let found = report.status_for(&report.links[0]);
        assert!(found.is_some());
        assert_eq!(found.unwrap().status_code, 200);
    }
}
