//! URL handling for discovered script references
//!
//! This module provides the [`Candidate`] type produced by the markup scanner
//! and the completion stage that turns relative references into absolute ones.

mod candidate;
mod complete;

pub use candidate::Candidate;
pub use complete::complete;

use crate::UrlError;
use url::Url;

/// Parses a page URL, accepting only HTTP and HTTPS
///
/// # Examples
///
/// ```
/// use getjs::url::parse_page_url;
///
/// let url = parse_page_url("  https://example.com/index.html ").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
/// assert!(parse_page_url("ftp://example.com/").is_err());
/// ```
pub fn parse_page_url(raw: &str) -> Result<Url, UrlError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|source| UrlError::Parse {
        value: raw.to_string(),
        source,
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(UrlError::InvalidScheme(other.to_string())),
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost(raw.to_string()));
    }

    Ok(url)
}
