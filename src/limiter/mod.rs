//! Per-host adaptive rate limiting
//!
//! Each host gets a current delay and a last-request timestamp. `throttle`
//! enforces minimum spacing between requests to one host; `backoff` doubles
//! the delay (capped at 30 seconds) after an observed HTTP 429. Delays are
//! never reduced for the life of the run.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Upper bound for any host's adaptive delay
const MAX_DELAY: Duration = Duration::from_secs(30);

/// Per-host rate state: current delay and the next free request slot
#[derive(Debug, Clone)]
struct HostRateState {
    current_delay: Duration,
    /// Time at which the next request to this host may start. Reserving the
    /// slot inside the lock keeps concurrent callers for the same host
    /// spaced apart without holding the lock across the sleep.
    next_slot: Instant,
}

/// Adaptive per-host rate limiter
///
/// State is created lazily on first access and is owned by the engine
/// instance that created the limiter; nothing is shared across runs.
#[derive(Debug)]
pub struct RateLimiter {
    default_delay: Duration,
    hosts: Mutex<HashMap<String, HostRateState>>,
}

impl RateLimiter {
    /// Creates a limiter with the given default inter-request delay
    pub fn new(default_delay: Duration) -> Self {
        Self {
            default_delay,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Waits until the host's next request slot, then claims it
    ///
    /// The first request to a host goes through immediately. Subsequent
    /// requests wait until at least the host's current delay has elapsed
    /// since the previously claimed slot.
    pub async fn throttle(&self, host: &str) {
        let now = Instant::now();
        let wait_until = {
            let mut hosts = self.hosts.lock().unwrap();
            match hosts.get_mut(host) {
                Some(state) => {
                    let start = state.next_slot.max(now);
                    state.next_slot = start + state.current_delay;
                    start
                }
                None => {
                    hosts.insert(
                        host.to_string(),
                        HostRateState {
                            current_delay: self.default_delay,
                            next_slot: now + self.default_delay,
                        },
                    );
                    now
                }
            }
        };

        if wait_until > now {
            tokio::time::sleep_until(wait_until).await;
        }
    }

    /// Doubles the host's delay, capped at 30 seconds
    ///
    /// Called after observing HTTP 429 from the host. The raised delay
    /// sticks for the rest of the run.
    pub fn backoff(&self, host: &str) {
        let mut hosts = self.hosts.lock().unwrap();
        let state = hosts.entry(host.to_string()).or_insert(HostRateState {
            current_delay: self.default_delay,
            next_slot: Instant::now(),
        });
        state.current_delay = (state.current_delay * 2).min(MAX_DELAY);
        tracing::info!(
            "Increased delay for {} to {:?}",
            host,
            state.current_delay
        );
    }

    /// The delay applied to hosts that have never misbehaved
    pub fn default_delay(&self) -> Duration {
        self.default_delay
    }

    /// Returns the host's current delay (the default if never seen)
    pub fn current_delay(&self, host: &str) -> Duration {
        self.hosts
            .lock()
            .unwrap()
            .get(host)
            .map(|s| s.current_delay)
            .unwrap_or(self.default_delay)
    }

    /// Raises the host's delay to at least `delay` (never lowers it)
    ///
    /// Used to apply a robots.txt crawl-delay hint.
    pub fn ensure_delay_at_least(&self, host: &str, delay: Duration) {
        let delay = delay.min(MAX_DELAY);
        let mut hosts = self.hosts.lock().unwrap();
        let state = hosts.entry(host.to_string()).or_insert(HostRateState {
            current_delay: self.default_delay,
            next_slot: Instant::now(),
        });
        if delay > state.current_delay {
            tracing::debug!("Raising delay for {} to {:?}", host, delay);
            state.current_delay = delay;
        }
    }

    /// Number of hosts whose delay has been raised above the default
    pub fn raised_host_count(&self) -> usize {
        self.hosts
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.current_delay > self.default_delay)
            .count()
    }
}
