// src/fetch/mod.rs
// =============================================================================
// This module fetches pages for the crawler.
//
// Submodules:
// - http: the real fetcher, built on reqwest
// - robots: robots.txt parsing and a per-site cache of the rules
//
// The crawl engine never talks to reqwest directly. It only sees the
// Fetcher trait below, which makes it easy to swap in an in-memory site
// for tests.
// =============================================================================

mod http;
mod robots;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;

pub use http::HttpFetcher;

/// What came back from the server.
///
/// `url` is where the response actually came from once redirects were
/// followed. Relative links on the page resolve against it, not against the
/// URL that was requested (`/docs` redirecting to `/docs/` changes what
/// `href="intro"` means).
///
/// `body` is empty when the page wasn't worth reading (error status or
/// non-HTML content).
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub url: String,
    pub body: String,
}

/// Fetches one page.
///
/// Implementations return Ok for any HTTP response (the caller decides what
/// counts as success) and Err only when no usable response was received.
/// When `cancel` fires they must give up promptly with
/// `FetchError::Cancelled`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchedPage, FetchError>;
}
