//! Configuration module for Talkscan
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use talkscan::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("talkscan.toml")).unwrap();
//! println!("Scanning section {}", config.forum.section_id);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    ClassifierConfig, Config, CrawlerConfig, ForumConfig, OutputConfig, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_config_with_overrides,
    ConfigOverrides,
};
