//! Configuration module for the warmer
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files.
//!
//! # Example
//!
//! ```no_run
//! use stoker::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Warming against: {}", config.warmer.base_url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, SeedEntry, WarmerConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
