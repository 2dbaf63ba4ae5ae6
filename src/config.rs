// src/config.rs
// =============================================================================
// Crawl configuration.
//
// CrawlConfig controls the engine (depth, scope, workers, rate, progress).
// HttpConfig controls how pages are fetched (timeout, user agent, robots).
//
// Both are plain structs with Default impls, and both can be built from the
// parsed command line. Raw values are kept as the user typed them (a negative
// depth is legal and means "unlimited"), the helper methods below turn them
// into the values the engine actually uses.
// =============================================================================

use std::time::Duration;

use crate::cli::Cli;

/// Workers used when the configured count is zero or negative.
pub const DEFAULT_WORKERS: usize = 10;

/// How often the progress line is refreshed when no interval is configured.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Maximum link depth from the start page. 0 or negative = unlimited
    pub max_depth: i64,
    /// Only follow links whose host matches the start URL's host
    pub same_domain: bool,
    /// Number of concurrent workers. 0 or negative = DEFAULT_WORKERS
    pub workers: i64,
    /// Requests per second across all workers. 0 or negative = unlimited
    pub rate_limit: f64,
    pub show_progress: bool,
    pub progress_interval: Duration,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            same_domain: true,
            workers: DEFAULT_WORKERS as i64,
            rate_limit: 0.0,
            show_progress: false,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

impl CrawlConfig {
    /// The depth limit, or None when crawling is unlimited.
    pub fn depth_limit(&self) -> Option<usize> {
        if self.max_depth > 0 {
            Some(self.max_depth as usize)
        } else {
            None
        }
    }

    /// True if a job at `depth` must not be fetched.
    pub fn exceeds_depth(&self, depth: usize) -> bool {
        matches!(self.depth_limit(), Some(limit) if depth > limit)
    }

    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers as usize
        } else {
            DEFAULT_WORKERS
        }
    }

    pub fn rate_limit(&self) -> Option<f64> {
        if self.rate_limit > 0.0 && self.rate_limit.is_finite() {
            Some(self.rate_limit)
        } else {
            None
        }
    }

    pub fn effective_progress_interval(&self) -> Duration {
        if self.progress_interval.is_zero() {
            DEFAULT_PROGRESS_INTERVAL
        } else {
            self.progress_interval
        }
    }
}

impl From<&Cli> for CrawlConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            max_depth: cli.max_depth,
            same_domain: cli.same_domain,
            workers: cli.workers,
            rate_limit: cli.rate_limit,
            show_progress: cli.progress,
            progress_interval: Duration::from_millis(cli.progress_interval_ms),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
    pub user_agent: String,
    pub max_redirects: usize,
    /// Consult robots.txt before fetching each page
    pub respect_robots: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: default_user_agent(),
            max_redirects: 5,
            respect_robots: false,
        }
    }
}

impl From<&Cli> for HttpConfig {
    fn from(cli: &Cli) -> Self {
        Self {
            timeout: Duration::from_secs(cli.timeout),
            user_agent: cli.user_agent.clone().unwrap_or_else(default_user_agent),
            max_redirects: HttpConfig::default().max_redirects,
            respect_robots: cli.respect_robots,
        }
    }
}

pub fn default_user_agent() -> String {
    format!("link-mapper/{}", env!("CARGO_PKG_VERSION"))
}
