// src/fetch/http.rs
// =============================================================================
// The real page fetcher, built on reqwest.
//
// Key functionality:
// - One shared Client (connection pooling) with timeout, user agent and a
//   limited redirect policy
// - Optional robots.txt check before every request
// - Request is raced against the cancellation token so Ctrl-C aborts
//   in-flight downloads instead of waiting for the timeout
// - Transport failures are sorted into FetchError categories
//
// Only HTML bodies are downloaded. Images, PDFs and friends still get a
// status code (so they show up in the site map) but no body.
// =============================================================================

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client, Response};
use tokio_util::sync::CancellationToken;

use super::robots::RobotsCache;
use super::{FetchedPage, Fetcher};
use crate::config::HttpConfig;
use crate::error::{CrawlError, FetchError};

pub struct HttpFetcher {
    client: Client,
    robots: Option<RobotsCache>,
}

impl HttpFetcher {
    pub fn new(config: &HttpConfig) -> Result<Self, CrawlError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        let robots = config
            .respect_robots
            .then(|| RobotsCache::new(&config.user_agent));

        Ok(Self { client, robots })
    }

    async fn fetch_page(&self, url: &str) -> Result<FetchedPage, FetchError> {
        if let Some(robots) = &self.robots {
            if !robots.is_allowed(&self.client, url).await {
                return Err(FetchError::Disallowed);
            }
        }

        let response = self.client.get(url).send().await.map_err(categorize_error)?;
        let status = response.status();
        let final_url = response.url().to_string();

        // Error pages and non-HTML content: the status is all we need
        if !(status.is_success() || status.is_redirection()) || !is_html(&response) {
            return Ok(FetchedPage {
                status: status.as_u16(),
                url: final_url,
                body: String::new(),
            });
        }

        let body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout
            } else {
                FetchError::Body(e.to_string())
            }
        })?;

        Ok(FetchedPage {
            status: status.as_u16(),
            url: final_url,
            body,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchedPage, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.fetch_page(url) => result,
        }
    }
}

// A missing Content-Type is treated as HTML, plenty of small servers omit it
fn is_html(response: &Response) -> bool {
    match response.headers().get(CONTENT_TYPE) {
        Some(value) => value
            .to_str()
            .map(|ct| ct.to_ascii_lowercase().contains("html"))
            .unwrap_or(false),
        None => true,
    }
}

// Categorizes different error types from reqwest
//
// reqwest errors can happen for many reasons:
// - Network timeout
// - DNS resolution failure or refused connection
// - Too many redirects
// - etc.
fn categorize_error(error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout
    } else if error.is_redirect() {
        FetchError::TooManyRedirects
    } else if error.is_connect() {
        FetchError::Connect(error.to_string())
    } else {
        FetchError::Other(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_fetcher_from_default_config() {
        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        assert!(fetcher.robots.is_none());
    }

    #[test]
    fn test_robots_cache_enabled_by_config() {
        let config = HttpConfig {
            respect_robots: true,
            ..Default::default()
        };
        let fetcher = HttpFetcher::new(&config).unwrap();
        assert!(fetcher.robots.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_before_request() {
        let fetcher = HttpFetcher::new(&HttpConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Unroutable address, the cancel branch must win without touching the network
        let result = fetcher.fetch("http://10.255.255.1/", &cancel).await;
        assert_eq!(result.unwrap_err(), FetchError::Cancelled);
    }
}
