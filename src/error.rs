// src/error.rs
// =============================================================================
// Error types for the crawler.
//
// There are two very different kinds of failure:
// - CrawlError: something is wrong before the crawl can even start (bad
//   start URL, HTTP client could not be built). These stop everything.
// - FetchError: one page could not be fetched. These are recorded on that
//   page's result and counted in the stats, the crawl keeps going.
//
// Rust concepts:
// - thiserror: derive macro that writes the Display/Error impls for us
// - Enums with data: each variant carries just the details it needs
// =============================================================================

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Fatal errors returned by `run_crawl` before any page is fetched.
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid start URL '{url}': {reason}")]
    InvalidStartUrl { url: String, reason: String },

    #[error("unsupported URL scheme '{0}' (only http and https can be crawled)")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Why a single page failed.
///
/// Cheap to clone so it can sit on a `CrawlResult`, and serialized as its
/// message so JSON/CSV output stays flat.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Server answered with a status outside 200-399
    #[error("HTTP {0}")]
    Status(u16),

    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("too many redirects")]
    TooManyRedirects,

    /// robots.txt forbids this URL for our user agent
    #[error("disallowed by robots.txt")]
    Disallowed,

    #[error("failed to read response body: {0}")]
    Body(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl Serialize for FetchError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_messages() {
        assert_eq!(FetchError::Status(404).to_string(), "HTTP 404");
        assert_eq!(FetchError::Disallowed.to_string(), "disallowed by robots.txt");
    }

    #[test]
    fn test_fetch_error_serializes_as_string() {
        let json = serde_json::to_string(&FetchError::Status(503)).unwrap();
        assert_eq!(json, "\"HTTP 503\"");
    }

    #[test]
    fn test_crawl_error_mentions_url() {
        let err = CrawlError::InvalidStartUrl {
            url: "nope".to_string(),
            reason: "relative URL without a base".to_string(),
        };
        assert!(err.to_string().contains("'nope'"));
    }
}
