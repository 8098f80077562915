use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure for the warmer
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub warmer: WarmerConfig,

    /// Cache-hit header rules merged over the built-in defaults
    #[serde(default, rename = "cache-headers")]
    pub cache_headers: HashMap<String, Vec<String>>,

    /// Seed URLs to warm, in order
    #[serde(default, rename = "seed")]
    pub seeds: Vec<SeedEntry>,
}

/// Warmer behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WarmerConfig {
    /// Base URL the seeds and relative resources resolve against
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// URLs per request batch
    #[serde(rename = "batch-size", default = "default_batch_size")]
    pub batch_size: usize,

    /// Additional URL prefixes whose resources are warmed too
    #[serde(rename = "allowed-base-urls", default)]
    pub allowed_base_urls: Vec<String>,
}

fn default_batch_size() -> usize {
    10
}

/// One seed entry in the configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SeedEntry {
    /// Relative path or absolute URL
    pub path: String,

    /// Warm unconditionally, skipping the cache probe
    #[serde(default)]
    pub invalidate: bool,
}
