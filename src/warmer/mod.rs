//! Cache warming module
//!
//! This module contains the core warming logic, including:
//! - Batched HTTP probing and fetching with per-run deduplication
//! - Cache-hit classification from response headers
//! - Resource discovery in fetched HTML
//! - Orchestration of the probe, fetch, and re-queue cycle

mod engine;
mod orchestrator;
mod page;

pub use engine::{FetchEngine, RunMemory};
pub use orchestrator::{SeedItem, Warmer, WarmerOptions, WorkItem, WorkQueue};
pub use page::{extract_elements, CacheRules};

use crate::config::Config;
use crate::Result;

/// Runs a complete warming pass from a loaded configuration
///
/// This is the main entry point for the binary. It will:
/// 1. Build a warmer from the configured batch size and header rules
/// 2. Resolve the configured seeds against the base URL
/// 3. Probe, fetch, and warm until no work remains
///
/// # Arguments
///
/// * `config` - The warmer configuration
///
/// # Returns
///
/// * `Ok(())` - Warming pass completed
/// * `Err(WarmError)` - Construction or client setup failed
pub async fn warm(config: Config) -> Result<()> {
    let options = WarmerOptions {
        batch_size: config.warmer.batch_size,
        cache_headers: config.cache_headers.clone(),
    };
    let warmer = Warmer::new(options)?;

    let seeds = config
        .seeds
        .iter()
        .map(|seed| SeedItem {
            path: seed.path.clone(),
            invalidate: seed.invalidate,
        })
        .collect();

    warmer
        .run(
            &config.warmer.base_url,
            seeds,
            &config.warmer.allowed_base_urls,
        )
        .await
}
