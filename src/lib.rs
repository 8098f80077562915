//! Stoker: a CDN cache warming crawler
//!
//! This crate implements a warming client that requests a site's pages and
//! their statically referenced resources so a downstream cache (CDN, reverse
//! proxy) populates itself before real visitors arrive. Cache status is
//! probed cheaply with header-only requests, and only the misses are fully
//! fetched and expanded.

pub mod config;
pub mod url;
pub mod warmer;

use thiserror::Error;

/// Main error type for warming operations
#[derive(Debug, Error)]
pub enum WarmError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
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

/// Result type alias for warming operations
pub type Result<T> = std::result::Result<T, WarmError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use warmer::{CacheRules, RunMemory, SeedItem, Warmer, WarmerOptions};
