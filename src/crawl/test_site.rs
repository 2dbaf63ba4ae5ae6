// src/crawl/test_site.rs
// =============================================================================
// An in-memory website for engine tests.
//
// Pages are keyed by normalized URL. Anything not in the map answers 404,
// unless the site is "endless", in which case /N links to /N+1 and /N+2
// forever. A page can also redirect (served from another URL) or panic
// inside the fetcher. Every request is logged with its time so tests can check what
// was fetched and how fast.
// =============================================================================

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::fetch::{FetchedPage, Fetcher};
use crate::links::normalize;

enum Reply {
    Page(u16, String),
    /// Redirect to `location`, which answers 200 with `body`
    Moved { location: String, body: String },
    Unreachable,
    Panic,
}

pub struct TestSite {
    pages: HashMap<String, Reply>,
    endless_root: Option<String>,
    delay: Duration,
    requests: Mutex<Vec<(String, Instant)>>,
}

impl TestSite {
    pub fn new() -> Self {
        Self {
            pages: HashMap::new(),
            endless_root: None,
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A 200 page linking to `links` (relative or absolute).
    pub fn page(mut self, url: &str, links: &[&str]) -> Self {
        self.pages.insert(key(url), Reply::Page(200, html(links)));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.pages.insert(key(url), Reply::Page(status, String::new()));
        self
    }

    pub fn unreachable(mut self, url: &str) -> Self {
        self.pages.insert(key(url), Reply::Unreachable);
        self
    }

    /// `url` redirects to `location` (kept exactly as written, trailing
    /// slash included), which serves a page linking to `links`.
    pub fn moved(mut self, url: &str, location: &str, links: &[&str]) -> Self {
        let reply = Reply::Moved {
            location: location.to_string(),
            body: html(links),
        };
        self.pages.insert(key(url), reply);
        self
    }

    /// Fetching `url` panics.
    pub fn panics(mut self, url: &str) -> Self {
        self.pages.insert(key(url), Reply::Panic);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// root -> /1 -> /2 -> ... -> /len
    pub fn chain(root: &str, len: usize) -> Self {
        let mut site = Self::new().page(root, &["/1"]);
        for i in 1..=len {
            let targets = if i < len { vec![format!("/{}", i + 1)] } else { vec![] };
            let refs: Vec<&str> = targets.iter().map(String::as_str).collect();
            site = site.page(&join(root, i), &refs);
        }
        site
    }

    /// root links to /1 ... /n, which link nowhere.
    pub fn star(root: &str, n: usize) -> Self {
        let children: Vec<String> = (1..=n).map(|i| format!("/{}", i)).collect();
        let refs: Vec<&str> = children.iter().map(String::as_str).collect();
        let mut site = Self::new().page(root, &refs);
        for i in 1..=n {
            site = site.page(&join(root, i), &[]);
        }
        site
    }

    /// root links to /1 ... /n, and every page links back to the root and
    /// to a handful of its neighbours (plenty of duplicates and cycles).
    pub fn mesh(root: &str, n: usize) -> Self {
        let children: Vec<String> = (1..=n).map(|i| format!("/{}", i)).collect();
        let refs: Vec<&str> = children.iter().map(String::as_str).collect();
        let mut site = Self::new().page(root, &refs);
        for i in 1..=n {
            let links: Vec<String> = [i, i % n + 1, (i + 6) % n + 1, (i * 7) % n + 1]
                .iter()
                .map(|j| format!("/{}", j))
                .chain(std::iter::once("/".to_string()))
                .collect();
            let refs: Vec<&str> = links.iter().map(String::as_str).collect();
            site = site.page(&join(root, i), &refs);
        }
        site
    }

    /// Infinite site: every /N links to /N+1 and /N+2.
    pub fn endless(root: &str) -> Self {
        let mut site = Self::new().page(root, &["/1", "/2"]);
        site.endless_root = Some(root.trim_end_matches('/').to_string());
        site
    }

    pub fn requested(&self, url: &str) -> bool {
        let url = key(url);
        self.requests.lock().iter().any(|(u, _)| *u == url)
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests made within `window` of the first one.
    pub fn requests_within(&self, window: Duration) -> usize {
        let requests = self.requests.lock();
        let Some((_, first)) = requests.first() else {
            return 0;
        };
        requests
            .iter()
            .filter(|(_, at)| at.duration_since(*first) < window)
            .count()
    }

    fn reply(&self, url: &str) -> Result<FetchedPage, FetchError> {
        match self.pages.get(url) {
            Some(Reply::Page(status, body)) => Ok(FetchedPage {
                status: *status,
                url: url.to_string(),
                body: body.clone(),
            }),
            Some(Reply::Moved { location, body }) => Ok(FetchedPage {
                status: 200,
                url: location.clone(),
                body: body.clone(),
            }),
            Some(Reply::Unreachable) => Err(FetchError::Connect("connection refused".to_string())),
            Some(Reply::Panic) => panic!("test site: fetching {} panicked", url),
            None => Ok(self.generated(url).unwrap_or(FetchedPage {
                status: 404,
                url: url.to_string(),
                body: String::new(),
            })),
        }
    }

    fn generated(&self, url: &str) -> Option<FetchedPage> {
        let root = self.endless_root.as_deref()?;
        let n: usize = url.strip_prefix(root)?.trim_start_matches('/').parse().ok()?;
        let links = [format!("/{}", n + 1), format!("/{}", n + 2)];
        let refs: Vec<&str> = links.iter().map(String::as_str).collect();
        Some(FetchedPage {
            status: 200,
            url: url.to_string(),
            body: html(&refs),
        })
    }
}

#[async_trait]
impl Fetcher for TestSite {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<FetchedPage, FetchError> {
        self.requests.lock().push((url.to_string(), Instant::now()));

        if !self.delay.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(self.delay) => {}
            }
        }

        self.reply(url)
    }
}

fn key(url: &str) -> String {
    normalize(url).unwrap_or_else(|| url.to_string())
}

fn join(root: &str, i: usize) -> String {
    format!("{}/{}", root.trim_end_matches('/'), i)
}

fn html(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|link| format!("<a href=\"{}\">{}</a>\n", link, link))
        .collect();
    format!("<html><body>\n{}</body></html>", anchors)
}
