//! Configuration module for WikipediaBase
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every section is optional; a missing file section falls back to defaults so the
//! server can start with no configuration at all.
//!
//! # Example
//!
//! ```no_run
//! use wikipediabase::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("wikipediabase.toml")).unwrap();
//! println!("Server will listen on port: {}", config.server.port);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{CacheConfig, Config, FetcherConfig, ResolverConfig, ServerConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
