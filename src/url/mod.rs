//! URL handling helpers for the warmer
//!
//! This module provides base/path joining, host detection for discovered
//! resources, and base-prefix stripping for log output.

use url::Url;

/// Joins a base URL and a path into one absolute URL
///
/// Trailing slashes on the base and leading slashes on the path collapse
/// into a single separator. An input that is already an absolute http(s)
/// URL passes through unchanged.
///
/// # Examples
///
/// ```
/// use stoker::url::join_url;
///
/// assert_eq!(
///     join_url("https://shop.example.com/", "/sale"),
///     "https://shop.example.com/sale"
/// );
/// assert_eq!(
///     join_url("https://shop.example.com", "https://cdn.example.com/app.js"),
///     "https://cdn.example.com/app.js"
/// );
/// ```
pub fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }

    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Returns true if the given URL text names a host
///
/// Relative references ("/app.js", "img/logo.png") have no host and are
/// resolved against the base URL by the caller. Protocol-relative
/// references ("//cdn.example.com/app.js") count as having a host.
pub fn has_host(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }

    match Url::parse(url) {
        Ok(parsed) => parsed.has_host(),
        Err(_) => false,
    }
}

/// Strips the base URL prefix from a URL for display
///
/// Log lines show site-relative paths where possible to keep the output
/// readable. URLs outside the base are shown in full.
pub fn strip_base(base_url: &str, url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    match url.strip_prefix(base) {
        Some(rest) if !rest.is_empty() => rest.to_string(),
        Some(_) => "/".to_string(),
        None => url.to_string(),
    }
}
