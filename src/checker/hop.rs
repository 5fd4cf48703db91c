//! Single-hop request logic: method selection, retries, and 429 recovery

use std::time::Duration;

use reqwest::Method;
use url::Url;

use crate::url::host_key;

use super::LinkChecker;

/// Raw result of one HTTP request
pub(crate) enum RequestOutcome {
    Response { status: u16, location: Option<String> },
    NoResponse { error: String },
}

/// Interpreted result of resolving one hop of a redirect chain
pub(crate) enum HopOutcome {
    /// 3xx with a usable Location header
    Redirect { status: u16, target: String },
    /// Any non-redirect status, or a 3xx without a resolvable Location
    Terminal { status: u16 },
    /// Still 429 (or unreachable) after adaptive backoff
    RateLimited,
    /// No response obtained even after retries
    Failed { error: String },
}

pub(crate) struct HopResult {
    pub outcome: HopOutcome,
    /// Transient-error retries spent on this hop
    pub retries: u32,
}

impl HopResult {
    fn new(outcome: HopOutcome, retries: u32) -> Self {
        HopResult { outcome, retries }
    }
}

/// Extra GET attempts made after a 429 before giving up
const RATE_LIMIT_ATTEMPTS: u32 = 2;

/// Statuses that trigger a GET fallback and blacklist the host for HEAD
const HEAD_REJECTED: [u16; 3] = [403, 405, 501];

/// Statuses retried with exponential backoff
const TRANSIENT: [u16; 3] = [502, 503, 504];

impl LinkChecker {
    /// Issues a single request without following redirects
    async fn attempt(&self, method: Method, url: &str) -> RequestOutcome {
        if let Some(host) = host_key(url) {
            self.limiter.throttle(&host).await;
        }

        match self.client.request(method, url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .map(|value| value.to_string());
                RequestOutcome::Response { status, location }
            }
            Err(e) => {
                let error = if e.is_timeout() {
                    "request timed out".to_string()
                } else if e.is_connect() {
                    "connection failed".to_string()
                } else {
                    e.to_string()
                };
                RequestOutcome::NoResponse { error }
            }
        }
    }

    /// Retries transient failures (502/503/504 or no response) with
    /// exponential backoff
    ///
    /// `retries` counts attempts already spent on this hop and caps the
    /// total at `max_retries`, so a HEAD that burns retries before the GET
    /// fallback leaves less budget for the GET.
    async fn fetch_with_retry(
        &self,
        method: Method,
        url: &str,
        retries: &mut u32,
    ) -> RequestOutcome {
        let mut outcome = self.attempt(method.clone(), url).await;
        while *retries < self.config.max_retries && is_transient(&outcome) {
            let delay =
                backoff_delay(self.config.retry_delay(), self.config.retry_backoff, *retries);
            tracing::debug!(
                url = %url,
                attempt = *retries + 1,
                delay_ms = delay.as_millis() as u64,
                "transient failure, retrying"
            );
            tokio::time::sleep(delay).await;
            outcome = self.attempt(method.clone(), url).await;
            *retries += 1;
        }
        outcome
    }

    /// Resolves one hop: HEAD-first with GET fallback, transient retries,
    /// and adaptive 429 recovery
    pub(crate) async fn resolve_hop(&self, url: &str) -> HopResult {
        let host = match host_key(url) {
            Some(host) => host,
            None => {
                return HopResult::new(
                    HopOutcome::Failed {
                        error: "invalid URL".to_string(),
                    },
                    0,
                );
            }
        };
        let mut retries = 0u32;

        let head_blacklisted = self.head_blacklist.lock().unwrap().contains(&host);
        let mut outcome = if head_blacklisted {
            self.fetch_with_retry(Method::GET, url, &mut retries).await
        } else {
            match self.fetch_with_retry(Method::HEAD, url, &mut retries).await {
                RequestOutcome::Response { status, .. } if HEAD_REJECTED.contains(&status) => {
                    tracing::debug!(host = %host, status, "HEAD rejected, falling back to GET");
                    self.head_blacklist.lock().unwrap().insert(host.clone());
                    self.fetch_with_retry(Method::GET, url, &mut retries).await
                }
                RequestOutcome::NoResponse { .. } => {
                    // Some servers drop HEAD connections outright
                    self.fetch_with_retry(Method::GET, url, &mut retries).await
                }
                other => other,
            }
        };

        if matches!(outcome, RequestOutcome::Response { status: 429, .. }) {
            for _ in 0..RATE_LIMIT_ATTEMPTS {
                self.limiter.backoff(&host);
                tokio::time::sleep(self.limiter.current_delay(&host)).await;
                outcome = self.attempt(Method::GET, url).await;
                if let RequestOutcome::Response { status, .. } = &outcome {
                    if *status != 429 {
                        break;
                    }
                }
            }
            match outcome {
                RequestOutcome::Response { status: 429, .. } | RequestOutcome::NoResponse { .. } => {
                    return HopResult::new(HopOutcome::RateLimited, retries);
                }
                _ => {}
            }
        }

        let outcome = match outcome {
            RequestOutcome::NoResponse { error } => HopOutcome::Failed { error },
            RequestOutcome::Response { status, location } => {
                if (300..400).contains(&status) {
                    match location.filter(|l| !l.is_empty()) {
                        Some(loc) => match resolve_location(url, &loc) {
                            Some(target) => HopOutcome::Redirect { status, target },
                            None => HopOutcome::Terminal { status },
                        },
                        None => HopOutcome::Terminal { status },
                    }
                } else {
                    HopOutcome::Terminal { status }
                }
            }
        };
        HopResult::new(outcome, retries)
    }
}

fn is_transient(outcome: &RequestOutcome) -> bool {
    match outcome {
        RequestOutcome::NoResponse { .. } => true,
        RequestOutcome::Response { status, .. } => TRANSIENT.contains(status),
    }
}

/// Resolves a Location header value against the hop it came from
fn resolve_location(base: &str, location: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    let target = base.join(location).ok()?;
    Some(target.to_string())
}

/// Sleep duration before transient retry `attempt` (0-based)
fn backoff_delay(base: Duration, backoff: f64, attempt: u32) -> Duration {
    base.mul_f64(backoff.powi(attempt as i32))
}
