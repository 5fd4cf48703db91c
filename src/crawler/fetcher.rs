//! HTTP client construction and page fetching

use crate::config::AuditConfig;
use crate::limiter::RateLimiter;
use crate::url::host_key;
use crate::{ConfigError, ConfigResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, COOKIE};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;

/// Redirect hops followed when fetching pages and robots.txt
const MAX_PAGE_REDIRECTS: usize = 10;

/// Builds the HTTP client used by the crawler and the robots filter
///
/// Follows redirects up to 10 hops, so a page or robots.txt that moved
/// (http to https, trailing slash, www canonicalization) is still fetched.
pub fn build_http_client(config: &AuditConfig) -> ConfigResult<Client> {
    client_builder(config)?
        .redirect(Policy::limited(MAX_PAGE_REDIRECTS))
        .build()
        .map_err(|e| ConfigError::Validation(format!("failed to build HTTP client: {}", e)))
}

/// Builds the link checker's HTTP client
///
/// Redirects are never followed automatically here; the chain tracer
/// inspects every 3xx itself.
pub fn build_hop_client(config: &AuditConfig) -> ConfigResult<Client> {
    client_builder(config)?
        .redirect(Policy::none())
        .build()
        .map_err(|e| ConfigError::Validation(format!("failed to build HTTP client: {}", e)))
}

/// Common client settings: custom headers, cookies, and basic-auth
/// credentials are baked into the default headers so every request
/// carries them.
fn client_builder(config: &AuditConfig) -> ConfigResult<reqwest::ClientBuilder> {
    let mut headers = HeaderMap::new();

    for (name, value) in &config.headers {
        let name: HeaderName = name
            .parse()
            .map_err(|_| ConfigError::Validation(format!("invalid header name: {}", name)))?;
        let value: HeaderValue = value
            .parse()
            .map_err(|_| ConfigError::Validation(format!("invalid value for header {}", name)))?;
        headers.insert(name, value);
    }

    if !config.cookies.is_empty() {
        let cookie = config
            .cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ");
        let value: HeaderValue = cookie
            .parse()
            .map_err(|_| ConfigError::Validation("invalid cookie value".to_string()))?;
        headers.insert(COOKIE, value);
    }

    if let Some(auth) = &config.basic_auth {
        let encoded = BASE64.encode(format!("{}:{}", auth.username, auth.password));
        let mut value: HeaderValue = format!("Basic {}", encoded)
            .parse()
            .map_err(|_| ConfigError::Validation("invalid basic-auth credentials".to_string()))?;
        value.set_sensitive(true);
        headers.insert(AUTHORIZATION, value);
    }

    Ok(Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(config.timeout())
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true))
}

/// Fetches a page body, rate-limited per host
///
/// Returns `None` for non-success statuses, non-HTML content types, and
/// timeouts or transport errors; the caller treats all of these as "no
/// links on this page".
pub(crate) async fn fetch_page(client: &Client, limiter: &RateLimiter, url: &str) -> Option<String> {
    if let Some(host) = host_key(url) {
        limiter.throttle(&host).await;
    }

    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) if e.is_timeout() => {
            tracing::warn!("Timeout fetching {}", url);
            return None;
        }
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}", url, e);
            return None;
        }
    };

    let status = response.status();
    if !status.is_success() {
        tracing::warn!("Failed to fetch {}: HTTP {}", url, status.as_u16());
        return None;
    }

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.contains("text/html") && !content_type.contains("application/xhtml") {
        tracing::debug!("Skipping non-HTML content at {}: {}", url, content_type);
        return None;
    }

    match response.text().await {
        Ok(body) => Some(body),
        Err(e) => {
            tracing::warn!("Failed to read body from {}: {}", url, e);
            None
        }
    }
}
