//! URL handling module for linkscope
//!
//! Pure functions for URL normalization, canonical-redirect detection,
//! internal/external classification, and relative-reference resolution.
//! Normalized forms are used only for comparison and deduplication; network
//! requests always use the URL as found.

mod domain;
mod normalize;

pub use domain::{
    host_key, is_internal_link, is_valid_http_url, resolve_relative_url, root_domain,
    should_skip_link,
};
pub use normalize::{is_canonical_redirect, normalize_url};
