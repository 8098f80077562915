//! Batch fetch engine with per-run request memoization
//!
//! This module issues the warmer's HTTP requests:
//! - Header-only probes (HEAD) to check cache status without a body
//! - Full-body fetches (GET) whose only purpose is populating the cache
//!
//! Every request of a batch runs concurrently and the batch call returns
//! once all of them have finished. [`RunMemory`] records which URLs have
//! already been probed or fetched so repeats within one run are answered
//! with a sentinel instead of a network call.

use reqwest::header::HeaderMap;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use tokio::task::JoinSet;

/// Per-request time budget, covering connect, redirects, and body transfer
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Request history for one warming run
///
/// Two independent append-only sets: URLs that have been probed and URLs
/// that have been fetched. Created empty at run start and dropped with the
/// run; nothing is persisted. A URL in either set is final for the run,
/// failed requests included, since the warmer never retries.
#[derive(Debug, Default)]
pub struct RunMemory {
    probed: HashSet<String>,
    fetched: HashSet<String>,
}

impl RunMemory {
    /// Creates an empty run memory
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a probe was already issued (or skipped) for this URL
    pub fn was_probed(&self, url: &str) -> bool {
        self.probed.contains(url)
    }

    /// Returns true if a fetch was already issued for this URL
    pub fn was_fetched(&self, url: &str) -> bool {
        self.fetched.contains(url)
    }
}

/// HTTP engine shared by all batches of a run
///
/// Holds a single [`reqwest::Client`] configured with the warmer's request
/// timeout and transparent decompression. Redirects follow the transport
/// default, which probes rely on to report the effective URL.
pub struct FetchEngine {
    client: Client,
}

impl FetchEngine {
    /// Builds the engine and its HTTP client
    pub fn new() -> Result<Self, reqwest::Error> {
        let user_agent = format!("stoker/{}", env!("CARGO_PKG_VERSION"));

        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self { client })
    }

    /// Probes a batch of URLs with concurrent header-only requests
    ///
    /// URLs already probed this run map to `None` (skip, already checked)
    /// without any network activity. Every other URL is requested with
    /// HEAD; its response headers are recorded under the final effective
    /// URL after redirects, with header names lowercased. A request that
    /// fails at the transport level (timeout, refused connection) produces
    /// no entry at all.
    ///
    /// After the call, every URL of the batch plus every effective URL a
    /// probe resolved to is marked as probed.
    ///
    /// # Arguments
    ///
    /// * `memory` - The run's request history, updated in place
    /// * `urls` - The batch of absolute URLs to probe
    pub async fn probe_batch(
        &self,
        memory: &mut RunMemory,
        urls: &[String],
    ) -> HashMap<String, Option<HashMap<String, String>>> {
        let mut results = HashMap::new();
        let mut issued = HashSet::new();
        let mut tasks = JoinSet::new();

        for url in urls {
            if memory.probed.contains(url) {
                results.insert(url.clone(), None);
                continue;
            }

            // A URL repeated within one batch is requested once
            if !issued.insert(url.clone()) {
                continue;
            }

            let client = self.client.clone();
            let url = url.clone();
            tasks.spawn(async move {
                let outcome = client.head(&url).send().await;
                (url, outcome)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let (url, outcome) = match joined {
                Ok(result) => result,
                Err(_) => continue,
            };

            match outcome {
                Ok(response) => {
                    let final_url = response.url().to_string();
                    let headers = lowercase_headers(response.headers());
                    memory.probed.insert(final_url.clone());
                    results.insert(final_url, Some(headers));
                }
                Err(error) => {
                    tracing::debug!("Probe failed for {}: {}", url, error);
                }
            }
        }

        for url in urls {
            memory.probed.insert(url.clone());
        }

        results
    }

    /// Fetches a batch of URLs with concurrent full-body requests
    ///
    /// URLs already fetched this run map to `None` without a network call.
    /// Every other URL is requested with GET and its body is recorded under
    /// the original request URL, so callers can correlate results no matter
    /// where redirects led. A transport failure yields an empty body, which
    /// downstream treats as "nothing more to discover".
    ///
    /// # Arguments
    ///
    /// * `memory` - The run's request history, updated in place
    /// * `urls` - The batch of absolute URLs to fetch
    pub async fn fetch_batch(
        &self,
        memory: &mut RunMemory,
        urls: &[String],
    ) -> HashMap<String, Option<String>> {
        let mut results = HashMap::new();
        let mut issued = HashSet::new();
        let mut tasks = JoinSet::new();

        for url in urls {
            if memory.fetched.contains(url) {
                results.insert(url.clone(), None);
                continue;
            }

            if !issued.insert(url.clone()) {
                continue;
            }

            let client = self.client.clone();
            let url = url.clone();
            tasks.spawn(async move {
                let body = match client.get(&url).send().await {
                    Ok(response) => response.text().await.unwrap_or_default(),
                    Err(error) => {
                        tracing::debug!("Fetch failed for {}: {}", url, error);
                        String::new()
                    }
                };

                (url, body)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Ok((url, body)) = joined {
                results.insert(url, Some(body));
            }
        }

        for url in issued {
            memory.fetched.insert(url);
        }

        results
    }
}

/// Converts response headers into a plain lowercase-keyed map
///
/// Values that are not valid UTF-8 are dropped; repeated headers keep the
/// last value seen.
fn lowercase_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut map = HashMap::new();

    for (name, value) in headers {
        if let Ok(value) = value.to_str() {
            map.insert(name.as_str().to_ascii_lowercase(), value.trim().to_string());
        }
    }

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_builds() {
        assert!(FetchEngine::new().is_ok());
    }

    #[test]
    fn test_run_memory_starts_empty() {
        let memory = RunMemory::new();
        assert!(!memory.was_probed("https://example.com/"));
        assert!(!memory.was_fetched("https://example.com/"));
    }

    #[test]
    fn test_lowercase_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("X-Cache", "HIT from edge".parse().unwrap());
        headers.insert("Content-Type", " text/html ".parse().unwrap());

        let map = lowercase_headers(&headers);
        assert_eq!(map.get("x-cache").map(String::as_str), Some("HIT from edge"));
        assert_eq!(map.get("content-type").map(String::as_str), Some("text/html"));
    }

    // Batch behavior against live responses (dedup sentinels, redirect
    // keying, failure handling) is covered with wiremock in the
    // integration tests.
}
