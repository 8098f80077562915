//! Page-level analysis: cache-hit classification and resource extraction
//!
//! This module answers two questions about a response:
//! - Do its headers say the URL is already served from cache?
//! - Which resource URLs does its HTML statically reference?
//!
//! Header classification is rule-driven because CDNs expose hit/miss
//! through response headers rather than any uniform protocol. HTML is
//! treated as unreliable input: extraction is best-effort and never fails,
//! a broken page simply contributes no elements.

use scraper::{Html, Selector};
use std::collections::{HashMap, HashSet};

/// Tag/attribute pairs that reference cacheable resources
///
/// Only these references are expanded; anchors and other link-graph edges
/// are intentionally not followed.
const RESOURCE_TAGS: &[(&str, &[&str])] = &[
    ("script", &["src"]),
    ("link", &["href"]),
    ("img", &["src", "data-original", "data-hoversrc"]),
    ("source", &["src", "srcset"]),
];

/// Header rules that decide whether a response came from cache
///
/// Each rule maps a lowercase header name to the value substrings that
/// count as a hit. A response is considered cached as soon as any rule
/// matches.
#[derive(Debug, Clone)]
pub struct CacheRules {
    rules: HashMap<String, Vec<String>>,
}

impl Default for CacheRules {
    fn default() -> Self {
        let mut rules = HashMap::new();
        rules.insert("x-cache".to_string(), vec!["HIT".to_string()]);
        rules.insert("cf-cache-status".to_string(), vec!["HIT".to_string()]);
        Self { rules }
    }
}

impl CacheRules {
    /// Builds rules from the defaults plus user-supplied overrides
    ///
    /// An override for a header that already has a default replaces that
    /// header's substring list; new header names are added.
    pub fn with_overrides(overrides: HashMap<String, Vec<String>>) -> Self {
        let mut merged = Self::default();
        for (name, values) in overrides {
            merged.rules.insert(name.to_ascii_lowercase(), values);
        }
        merged
    }

    /// Returns true if the response headers indicate a cache hit
    ///
    /// The header map is expected to carry lowercase names, which is how
    /// the fetch engine hands headers over. Missing headers never match,
    /// so an empty map is simply "not cached".
    pub fn is_cached(&self, headers: &HashMap<String, String>) -> bool {
        for (name, values) in &self.rules {
            if let Some(actual) = headers.get(name) {
                for value in values {
                    if actual.contains(value.as_str()) {
                        return true;
                    }
                }
            }
        }

        false
    }
}

/// Extracts the resource URLs a page statically references
///
/// Scans `<script src>`, `<link href>`, `<img>` (including the lazy-load
/// attributes `data-original` and `data-hoversrc`) and `<source>` tags.
/// `srcset` values are split into their URL tokens. Results are trimmed,
/// deduplicated, and unordered; empty values are dropped.
///
/// Malformed markup does not abort extraction. The parser recovers where
/// it can and the function returns whatever was found, possibly nothing.
///
/// # Example
///
/// ```
/// use stoker::warmer::extract_elements;
///
/// let html = r#"<img src="/logo.png"><script src="/app.js"></script>"#;
/// let elements = extract_elements(html);
/// assert!(elements.contains("/logo.png"));
/// assert!(elements.contains("/app.js"));
/// ```
pub fn extract_elements(html: &str) -> HashSet<String> {
    let document = Html::parse_document(html);
    let mut elements = HashSet::new();

    for &(tag, attributes) in RESOURCE_TAGS {
        let selector = match Selector::parse(tag) {
            Ok(s) => s,
            Err(_) => continue,
        };

        for element in document.select(&selector) {
            for &attribute in attributes {
                if let Some(value) = element.value().attr(attribute) {
                    if attribute == "srcset" {
                        elements.extend(split_srcset(value));
                    } else {
                        let value = value.trim();
                        if !value.is_empty() {
                            elements.insert(value.to_string());
                        }
                    }
                }
            }
        }
    }

    elements
}

/// Splits a srcset attribute into its URL tokens
///
/// Entries are comma-separated `url descriptor` pairs ("/img.jpg 2x"); only
/// the URL before the first whitespace is kept.
fn split_srcset(srcset: &str) -> Vec<String> {
    srcset
        .split(',')
        .filter_map(|entry| entry.split_whitespace().next())
        .map(|url| url.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_default_rules_x_cache_hit() {
        let rules = CacheRules::default();
        assert!(rules.is_cached(&headers(&[("x-cache", "HIT from cloudfront")])));
    }

    #[test]
    fn test_default_rules_cf_cache_status_hit() {
        let rules = CacheRules::default();
        assert!(rules.is_cached(&headers(&[("cf-cache-status", "HIT")])));
    }

    #[test]
    fn test_miss_is_not_cached() {
        let rules = CacheRules::default();
        assert!(!rules.is_cached(&headers(&[("x-cache", "MISS")])));
        assert!(!rules.is_cached(&headers(&[("cf-cache-status", "EXPIRED")])));
    }

    #[test]
    fn test_missing_headers_not_cached() {
        let rules = CacheRules::default();
        assert!(!rules.is_cached(&headers(&[("content-type", "text/html")])));
        assert!(!rules.is_cached(&HashMap::new()));
    }

    #[test]
    fn test_substring_match_is_case_sensitive() {
        // "HIT" must appear literally in the value
        let rules = CacheRules::default();
        assert!(!rules.is_cached(&headers(&[("x-cache", "hit")])));
    }

    #[test]
    fn test_overrides_replace_default_list() {
        let mut overrides = HashMap::new();
        overrides.insert("x-cache".to_string(), vec!["FRESH".to_string()]);
        let rules = CacheRules::with_overrides(overrides);

        assert!(rules.is_cached(&headers(&[("x-cache", "FRESH")])));
        assert!(!rules.is_cached(&headers(&[("x-cache", "HIT")])));
        // Untouched defaults still apply
        assert!(rules.is_cached(&headers(&[("cf-cache-status", "HIT")])));
    }

    #[test]
    fn test_overrides_add_new_header() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "X-Varnish-Cache".to_string(),
            vec!["cached".to_string()],
        );
        let rules = CacheRules::with_overrides(overrides);

        // Rule names are lowercased at construction
        assert!(rules.is_cached(&headers(&[("x-varnish-cache", "cached")])));
    }

    #[test]
    fn test_extract_script_src() {
        let html = r#"<html><body><script src="/app.js"></script></body></html>"#;
        let elements = extract_elements(html);
        assert_eq!(elements.len(), 1);
        assert!(elements.contains("/app.js"));
    }

    #[test]
    fn test_extract_link_href() {
        let html = r#"<html><head><link rel="stylesheet" href="/style.css"></head></html>"#;
        let elements = extract_elements(html);
        assert!(elements.contains("/style.css"));
    }

    #[test]
    fn test_extract_img_attributes() {
        let html = r#"<img src="/a.jpg" data-original="/b.jpg" data-hoversrc="/c.jpg">"#;
        let elements = extract_elements(html);
        assert!(elements.contains("/a.jpg"));
        assert!(elements.contains("/b.jpg"));
        assert!(elements.contains("/c.jpg"));
    }

    #[test]
    fn test_extract_source_srcset() {
        let html = r#"<picture><source srcset="/img1.jpg 1x, /img2.jpg 2x"></picture>"#;
        let elements = extract_elements(html);
        assert_eq!(elements.len(), 2);
        assert!(elements.contains("/img1.jpg"));
        assert!(elements.contains("/img2.jpg"));
    }

    #[test]
    fn test_extract_source_src_and_srcset() {
        let html = r#"<video><source src="/clip.mp4" srcset="/poster.jpg 1x"></video>"#;
        let elements = extract_elements(html);
        assert!(elements.contains("/clip.mp4"));
        assert!(elements.contains("/poster.jpg"));
    }

    #[test]
    fn test_srcset_without_descriptors() {
        let html = r#"<source srcset="/only.jpg">"#;
        let elements = extract_elements(html);
        assert_eq!(elements.len(), 1);
        assert!(elements.contains("/only.jpg"));
    }

    #[test]
    fn test_empty_and_whitespace_values_dropped() {
        let html = r#"<img src="  "><script src=""></script><source srcset=" , ">"#;
        let elements = extract_elements(html);
        assert!(elements.is_empty());
    }

    #[test]
    fn test_values_are_trimmed() {
        let html = r#"<script src="  /app.js  "></script>"#;
        let elements = extract_elements(html);
        assert!(elements.contains("/app.js"));
    }

    #[test]
    fn test_duplicates_collapse() {
        let html = r#"<img src="/a.jpg"><img src="/a.jpg"><source srcset="/a.jpg 1x">"#;
        let elements = extract_elements(html);
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn test_anchor_tags_ignored() {
        let html = r#"<a href="/page">link</a><script src="/app.js"></script>"#;
        let elements = extract_elements(html);
        assert_eq!(elements.len(), 1);
        assert!(elements.contains("/app.js"));
    }

    #[test]
    fn test_malformed_markup_still_extracts() {
        let html = r#"<html><body><img src="/a.jpg"<script src="/b.js"><div>"#;
        let elements = extract_elements(html);
        // Best effort: whatever the recovering parser produced, no panic
        assert!(elements.contains("/a.jpg") || elements.contains("/b.js") || elements.is_empty());
    }

    #[test]
    fn test_not_html_at_all() {
        let elements = extract_elements("\u{0}\u{1}binary garbage\u{2}");
        assert!(elements.is_empty());
    }
}
