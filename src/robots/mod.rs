//! robots.txt compliance for linkscope
//!
//! A line-oriented parser producing ordered rule groups, plus a per-domain
//! caching filter that answers "may this user-agent fetch this URL" and
//! surfaces crawl-delay hints.

mod filter;
mod parser;

pub use filter::RobotsFilter;
pub use parser::{matches_pattern, parse_robots_txt, RobotsRule};
