//! Configuration module for linkscope
//!
//! Configuration can come from a TOML file, from CLI flags, or both (flags
//! win). All knobs carry documented defaults so an empty config is valid.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{AuditConfig, BasicAuth};
pub use validation::validate;
