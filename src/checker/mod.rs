//! Link verification: redirect chain tracing with caching and politeness

mod hop;
mod status;

pub use status::{LinkStatus, Outcome};

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use reqwest::Client;

use crate::config::AuditConfig;
use crate::limiter::RateLimiter;
use crate::url::{is_canonical_redirect, normalize_url};

use hop::HopOutcome;

/// Maximum redirect hops followed before declaring the chain a loop
pub const MAX_REDIRECTS: usize = 10;

/// Verifies links by tracing their full redirect chains
///
/// Results are cached per normalized URL, so checking the same URL twice
/// within a run costs one network round trip. Hosts that reject HEAD are
/// blacklisted and fetched with GET for the rest of the run; hosts that
/// answer 429 get their per-host delay doubled.
pub struct LinkChecker {
    pub(crate) client: Client,
    pub(crate) config: AuditConfig,
    pub(crate) limiter: RateLimiter,
    cache: Mutex<HashMap<String, LinkStatus>>,
    pub(crate) head_blacklist: Mutex<HashSet<String>>,
}

/// Snapshot of checker internals for end-of-run reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStats {
    pub cached_urls: usize,
    pub head_blacklisted_hosts: usize,
    pub hosts_with_raised_delay: usize,
    pub urls_with_retries: usize,
    pub total_retries: u32,
}

impl LinkChecker {
    /// Creates a checker sharing `client` but with its own rate limiter
    ///
    /// Link checks use half the page-crawl delay since HEAD requests are
    /// cheap compared to full page fetches.
    pub fn new(client: Client, config: &AuditConfig) -> Self {
        LinkChecker {
            client,
            limiter: RateLimiter::new(config.check_delay()),
            config: config.clone(),
            cache: Mutex::new(HashMap::new()),
            head_blacklist: Mutex::new(HashSet::new()),
        }
    }

    /// Verifies one URL, tracing redirects hop by hop
    ///
    /// The cache is keyed by normalized URL, so equivalent spellings share
    /// one entry and checking the same URL twice costs one round trip. The
    /// request itself always uses the URL as given.
    pub async fn check_link(&self, url: &str) -> LinkStatus {
        let cache_key = normalize_url(url);
        if let Some(hit) = self.cache.lock().unwrap().get(&cache_key) {
            tracing::trace!(url = %url, "cache hit");
            return hit.clone();
        }

        let mut chain: Vec<(u16, String)> = Vec::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut current = url.to_string();
        let mut is_loop = false;
        let mut error = String::new();
        let mut retries = 0u32;

        for _ in 0..=MAX_REDIRECTS {
            if !visited.insert(current.clone()) {
                is_loop = true;
                break;
            }
            let hop = self.resolve_hop(&current).await;
            retries += hop.retries;
            match hop.outcome {
                HopOutcome::Failed { error: e } => {
                    chain.push((0, current.clone()));
                    error = e;
                    break;
                }
                HopOutcome::RateLimited => {
                    chain.push((429, current.clone()));
                    error = "Rate limited after retries".to_string();
                    break;
                }
                HopOutcome::Terminal { status } => {
                    chain.push((status, current.clone()));
                    break;
                }
                HopOutcome::Redirect { status, target } => {
                    chain.push((status, current.clone()));
                    current = target;
                }
            }
        }

        let (status_code, final_url) = chain
            .last()
            .map(|(status, hop_url)| (*status, hop_url.clone()))
            .unwrap_or((0, url.to_string()));
        let is_redirect = chain.len() > 1;
        let canonical =
            chain.len() == 2 && !is_loop && is_canonical_redirect(url, &final_url);

        let status = LinkStatus {
            url: url.to_string(),
            status_code,
            is_redirect,
            redirect_chain: chain,
            final_url,
            is_loop,
            is_canonical_redirect: canonical,
            error,
            retries,
        };
        tracing::debug!(
            url = %url,
            status = status.status_code,
            outcome = %status.outcome(),
            hops = status.redirect_chain.len(),
            "link checked"
        );
        self.cache
            .lock()
            .unwrap()
            .insert(cache_key, status.clone());
        status
    }

    /// Verifies a batch of URLs sequentially, returning results keyed by URL
    pub async fn check_links<I, S>(&self, urls: I) -> HashMap<String, LinkStatus>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut results = HashMap::new();
        for url in urls {
            let status = self.check_link(url.as_ref()).await;
            results.insert(status.url.clone(), status);
        }
        results
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    pub fn cache_stats(&self) -> CacheStats {
        let cache = self.cache.lock().unwrap();
        let urls_with_retries = cache.values().filter(|s| s.retries > 0).count();
        let total_retries = cache.values().map(|s| s.retries).sum();
        CacheStats {
            cached_urls: cache.len(),
            head_blacklisted_hosts: self.head_blacklist.lock().unwrap().len(),
            hosts_with_raised_delay: self.limiter.raised_host_count(),
            urls_with_retries,
            total_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checker_has_empty_state() {
        let config = AuditConfig::default();
        let checker = LinkChecker::new(Client::new(), &config);
        let stats = checker.cache_stats();
        assert_eq!(stats.cached_urls, 0);
        assert_eq!(stats.head_blacklisted_hosts, 0);
        assert_eq!(stats.total_retries, 0);
    }

    #[test]
    fn test_check_delay_is_half_crawl_delay() {
        let config = AuditConfig::default();
        let checker = LinkChecker::new(Client::new(), &config);
        assert_eq!(
            checker.limiter().default_delay(),
            config.crawl_delay() / 2
        );
    }
}
