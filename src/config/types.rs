use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

/// HTTP basic auth credentials attached to every request
#[derive(Debug, Clone, Deserialize)]
pub struct BasicAuth {
    pub username: String,
    pub password: String,
}

/// Main configuration for an audit run
///
/// Every field has a default, so `AuditConfig::default()` is a working
/// configuration for auditing a public site.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// User-agent string sent with every request (and matched against
    /// robots.txt rule groups)
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Default minimum spacing between requests to one host, in milliseconds.
    /// The page crawler uses this value directly; the link checker uses half
    /// of it, since status checks are lighter than page fetches.
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Maximum retries for transient server errors (502/503/504) and
    /// no-response conditions. Zero disables retrying.
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Initial sleep between retries, in milliseconds
    #[serde(rename = "retry-delay-ms")]
    pub retry_delay_ms: u64,

    /// Multiplier applied to the retry sleep after each attempt
    #[serde(rename = "retry-backoff")]
    pub retry_backoff: f64,

    /// Treat subdomains of the base host as internal links
    #[serde(rename = "include-subdomains")]
    pub include_subdomains: bool,

    /// Maximum number of in-flight page fetches / link checks
    #[serde(rename = "max-concurrent")]
    pub max_concurrent: usize,

    /// Skip robots.txt checks entirely
    #[serde(rename = "ignore-robots")]
    pub ignore_robots: bool,

    /// Basic auth credentials, if the site requires them
    #[serde(rename = "basic-auth")]
    pub basic_auth: Option<BasicAuth>,

    /// Extra headers attached to every request
    pub headers: BTreeMap<String, String>,

    /// Cookies attached to every request as a static `Cookie` header
    pub cookies: BTreeMap<String, String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            user_agent: "Linkscope/1.0".to_string(),
            timeout_secs: 10,
            delay_ms: 500,
            max_retries: 3,
            retry_delay_ms: 1000,
            retry_backoff: 2.0,
            include_subdomains: false,
            max_concurrent: 10,
            ignore_robots: false,
            basic_auth: None,
            headers: BTreeMap::new(),
            cookies: BTreeMap::new(),
        }
    }
}

impl AuditConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Default inter-request delay for the page crawler
    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Default inter-request delay for the link checker (half the crawl
    /// delay; status checks are lighter than full page fetches)
    pub fn check_delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms / 2)
    }

    /// Initial retry sleep
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}
