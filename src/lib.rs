//! Linkscope: a site link auditor
//!
//! This crate implements a link verification engine: it crawls a supplied
//! list of pages, extracts every hyperlink, and resolves the final status of
//! each unique link by tracing redirect chains, detecting loops, and
//! classifying canonical redirects. Per-host adaptive rate limiting and a
//! robots.txt compliance filter keep the engine polite.

pub mod checker;
pub mod config;
pub mod crawler;
pub mod engine;
pub mod limiter;
pub mod robots;
pub mod url;

use thiserror::Error;

/// Main error type for linkscope operations
///
/// Per-URL and per-page failures never surface here; they are resolved
/// locally into a `LinkStatus` or an empty extraction result. This type
/// covers setup and driver-level failures only.
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for linkscope operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use checker::{CacheStats, LinkChecker, LinkStatus, Outcome};
pub use config::AuditConfig;
pub use crawler::{ExtractedLink, PageCrawler};
pub use engine::{AuditReport, Auditor, LinkScope, ProgressEvent};
pub use limiter::RateLimiter;
pub use robots::RobotsFilter;
pub use url::{is_internal_link, normalize_url};
