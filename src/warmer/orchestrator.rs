//! Warming orchestrator: the batched probe/fetch/discover loop
//!
//! The orchestrator turns a seed list into bounded batches of work:
//! 1. Probe each seed's cache status with a header-only request
//! 2. Fully fetch the misses
//! 3. Extract the resources each fetched page references
//! 4. Probe and warm those resources with the same two-phase cycle
//!
//! Discovery goes exactly one level deep: pages yield elements, elements
//! are warmed but never parsed for further elements. All request
//! deduplication lives in the engine's [`RunMemory`]; the orchestrator
//! additionally collapses equal URLs in its own queues, combining their
//! invalidate flags with a logical OR.

use crate::url::{has_host, join_url, strip_base};
use crate::warmer::engine::{FetchEngine, RunMemory};
use crate::warmer::page::{extract_elements, CacheRules};
use crate::{ConfigError, Result};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use url::Url;

/// Default number of URLs handled per request batch
const DEFAULT_BATCH_SIZE: usize = 10;

/// Constructor-time options for a [`Warmer`]
#[derive(Debug, Clone)]
pub struct WarmerOptions {
    /// URLs per request batch, shared by seed chunking and queue draining
    pub batch_size: usize,

    /// Cache-hit header rules merged over the defaults
    /// (`x-cache` contains "HIT", `cf-cache-status` contains "HIT")
    pub cache_headers: HashMap<String, Vec<String>>,
}

impl Default for WarmerOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            cache_headers: HashMap::new(),
        }
    }
}

/// One seed entry: a path (or absolute URL) plus its invalidate override
#[derive(Debug, Clone)]
pub struct SeedItem {
    /// Relative path resolved against the base URL, or an absolute URL
    pub path: String,

    /// When true the URL is warmed unconditionally, skipping the probe
    pub invalidate: bool,
}

/// A unit of warming work: an absolute URL and its invalidate flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub url: String,
    pub invalidate: bool,
}

/// Insertion-ordered queue of work items, unique per URL
///
/// Pushing a URL that is already queued does not re-queue it; the two
/// invalidate flags combine with a logical OR, so an item inherits "must
/// warm" if any discoverer demanded it.
#[derive(Debug, Default)]
pub struct WorkQueue {
    order: VecDeque<String>,
    flags: HashMap<String, bool>,
}

impl WorkQueue {
    /// Creates an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a URL, OR-merging the flag if the URL is already present
    pub fn push(&mut self, url: String, invalidate: bool) {
        match self.flags.entry(url) {
            Entry::Occupied(mut slot) => {
                let merged = *slot.get() || invalidate;
                slot.insert(merged);
            }
            Entry::Vacant(slot) => {
                self.order.push_back(slot.key().clone());
                slot.insert(invalidate);
            }
        }
    }

    /// Removes and returns up to `size` items in insertion order
    pub fn pop_batch(&mut self, size: usize) -> Vec<WorkItem> {
        let mut batch = Vec::new();

        while batch.len() < size {
            let url = match self.order.pop_front() {
                Some(url) => url,
                None => break,
            };
            let invalidate = self.flags.remove(&url).unwrap_or(false);
            batch.push(WorkItem { url, invalidate });
        }

        batch
    }

    /// Removes and returns all items in insertion order
    pub fn drain(&mut self) -> Vec<WorkItem> {
        self.pop_batch(usize::MAX)
    }

    /// Returns the number of queued items
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Cache warmer entry point
///
/// A `Warmer` is cheap to construct and reusable: each [`Warmer::run`]
/// call builds its own HTTP engine and request memory, so separate runs
/// never share deduplication state.
///
/// # Example
///
/// ```no_run
/// use stoker::warmer::{SeedItem, Warmer, WarmerOptions};
///
/// # async fn example() -> stoker::Result<()> {
/// let warmer = Warmer::new(WarmerOptions::default())?;
/// let seeds = vec![
///     SeedItem { path: "/".to_string(), invalidate: false },
///     SeedItem { path: "/sale".to_string(), invalidate: true },
/// ];
/// warmer.run("https://shop.example.com", seeds, &[]).await?;
/// # Ok(())
/// # }
/// ```
pub struct Warmer {
    batch_size: usize,
    cache_rules: CacheRules,
}

impl Warmer {
    /// Creates a warmer, validating the options
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the batch size is zero. This is the
    /// only fatal configuration problem at this level and it is surfaced
    /// before any network activity.
    pub fn new(options: WarmerOptions) -> std::result::Result<Self, ConfigError> {
        if options.batch_size == 0 {
            return Err(ConfigError::Validation(
                "batch-size must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            batch_size: options.batch_size,
            cache_rules: CacheRules::with_overrides(options.cache_headers),
        })
    }

    /// Runs one complete warming pass
    ///
    /// Seeds are resolved against `base_url` and processed in batches.
    /// Discovered resources are kept if they are relative or prefixed by
    /// `base_url` or any entry of `allowed_base_urls`; everything else is
    /// dropped as foreign.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Absolute URL the seeds and relative resources
    ///   resolve against
    /// * `seeds` - The ordered seed list
    /// * `allowed_base_urls` - Additional URL prefixes whose resources are
    ///   warmed too (a CDN host serving the site's assets, for instance)
    pub async fn run(
        &self,
        base_url: &str,
        seeds: Vec<SeedItem>,
        allowed_base_urls: &[String],
    ) -> Result<()> {
        // Reject unparseable base URLs before any request goes out
        Url::parse(base_url)?;

        let mut allowed = allowed_base_urls.to_vec();
        allowed.push(base_url.to_string());

        let mut orchestrator = Orchestrator {
            batch_size: self.batch_size,
            cache_rules: &self.cache_rules,
            engine: FetchEngine::new()?,
            memory: RunMemory::new(),
            base_url: base_url.to_string(),
            allowed_base_urls: allowed,
        };

        orchestrator.run(&seeds).await;

        Ok(())
    }
}

/// Per-run state driving the batch loop
struct Orchestrator<'a> {
    batch_size: usize,
    cache_rules: &'a CacheRules,
    engine: FetchEngine,
    memory: RunMemory,
    base_url: String,
    allowed_base_urls: Vec<String>,
}

impl Orchestrator<'_> {
    /// Processes all seed batches, draining the work queue as it fills
    async fn run(&mut self, seeds: &[SeedItem]) {
        tracing::info!(
            "Warming URLs for base domain: {}",
            join_url(&self.base_url, "")
        );

        let batches: Vec<&[SeedItem]> = seeds.chunks(self.batch_size).collect();
        let batch_count = batches.len();
        let mut queue = WorkQueue::new();

        for (index, batch) in batches.iter().enumerate() {
            let mut to_probe = Vec::new();
            for item in *batch {
                let url = join_url(&self.base_url, &item.path);
                if item.invalidate {
                    // Caller says this URL changed; skip the probe entirely
                    queue.push(url, true);
                } else {
                    to_probe.push(url);
                }
            }

            let probe_results = self.engine.probe_batch(&mut self.memory, &to_probe).await;
            for (url, headers) in probe_results {
                match headers {
                    None => {
                        tracing::info!(
                            "(cached) {} - URL already warmed up, skipping",
                            self.display(&url)
                        );
                    }
                    Some(headers) if self.cache_rules.is_cached(&headers) => {
                        tracing::info!(
                            "(cached) {} - URL is cached, skipping warm-up",
                            self.display(&url)
                        );
                    }
                    Some(_) => queue.push(url, false),
                }
            }

            // Interior batches only drain full batches of work; the final
            // input batch drains the queue to empty.
            let is_last_batch = index + 1 == batch_count;
            while queue.len() >= self.batch_size || (is_last_batch && !queue.is_empty()) {
                tracing::info!("Processing batch of URLs ...");
                let items = queue.pop_batch(self.batch_size);
                self.process_elements_batch(items).await;
                tracing::info!("... batch completed");
            }
        }
    }

    /// Fetches a batch of pages and warms the resources they reference
    ///
    /// Bodies are parsed for resource references, which are filtered
    /// against the allow list, resolved, merged across the batch with
    /// OR-combined invalidate flags, then probed and warmed in
    /// batch-size chunks. Elements are never parsed for further elements.
    async fn process_elements_batch(&mut self, items: Vec<WorkItem>) {
        let urls: Vec<String> = items.iter().map(|item| item.url.clone()).collect();
        let invalidate_by_url: HashMap<String, bool> = items
            .into_iter()
            .map(|item| (item.url, item.invalidate))
            .collect();

        let bodies = self.engine.fetch_batch(&mut self.memory, &urls).await;

        let mut discovered = WorkQueue::new();
        for url in &urls {
            let body = match bodies.get(url) {
                Some(Some(body)) => body,
                Some(None) => {
                    tracing::info!(
                        "URL: (skipped) {} - already fetched, skipping",
                        self.display(url)
                    );
                    continue;
                }
                None => continue,
            };

            tracing::info!("URL: (processed) {} - warmed up", self.display(url));

            let inherited = invalidate_by_url.get(url).copied().unwrap_or(false);
            for element in extract_elements(body) {
                if has_host(&element) {
                    if self.is_allowed(&element) {
                        discovered.push(element, inherited);
                    }
                } else {
                    discovered.push(join_url(&self.base_url, &element), inherited);
                }
            }
        }

        let mut warm_now = Vec::new();
        let mut needs_probe = Vec::new();
        for WorkItem { url, invalidate } in discovered.drain() {
            if invalidate {
                warm_now.push(url);
            } else {
                needs_probe.push(url);
            }
        }

        if warm_now.is_empty() && needs_probe.is_empty() {
            return;
        }

        tracing::info!("Processing elements of the URL batch ...");

        while !needs_probe.is_empty() {
            let take = needs_probe.len().min(self.batch_size);
            let chunk: Vec<String> = needs_probe.drain(..take).collect();

            let probe_results = self.engine.probe_batch(&mut self.memory, &chunk).await;
            for (url, headers) in probe_results {
                match headers {
                    None => {
                        tracing::info!(
                            "Element: (cached) {} - already warmed up, skipping",
                            self.display(&url)
                        );
                    }
                    Some(headers) if self.cache_rules.is_cached(&headers) => {
                        tracing::info!(
                            "Element: (cached) {} - cached, skipping warm-up",
                            self.display(&url)
                        );
                    }
                    Some(_) => warm_now.push(url),
                }
            }
        }

        for chunk in warm_now.chunks(self.batch_size) {
            // Bodies are discarded; the request itself populates the cache
            let bodies = self.engine.fetch_batch(&mut self.memory, chunk).await;
            for url in chunk {
                match bodies.get(url) {
                    Some(None) => {
                        tracing::info!(
                            "Element: (skipped) {} - already fetched, skipping",
                            self.display(url)
                        );
                    }
                    _ => {
                        tracing::info!(
                            "Element: (processed) {} - warmed up",
                            self.display(url)
                        );
                    }
                }
            }
        }
    }

    /// Returns true if a host-bearing element URL matches the allow list
    fn is_allowed(&self, element: &str) -> bool {
        self.allowed_base_urls
            .iter()
            .any(|base| element.starts_with(base.as_str()))
    }

    /// Shortens a URL for log output by stripping the base prefix
    fn display(&self, url: &str) -> String {
        strip_base(&self.base_url, url)
    }
}
