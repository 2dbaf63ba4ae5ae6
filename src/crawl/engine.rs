// src/crawl/engine.rs
// =============================================================================
// The crawl engine: turns one start URL into a map of the site.
//
// Lifecycle (see EnginePhase):
//   Idle -> Seeding -> Running -> Draining -> Done
//
// - Seeding: validate and normalize the start URL, queue it at depth 0
// - Running: N workers pull jobs until the frontier closes itself (all work
//   done) or the cancel handle fires
// - Draining: wait for every worker to exit and the aggregator to apply the
//   last event
// - Done: results and stats are final and handed back
//
// Cancelling is a graceful stop. Whatever was finished before the signal
// is returned, with `cancelled = true` on the outcome.
// =============================================================================

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use url::Url;

use super::aggregator::Aggregator;
use super::frontier::Frontier;
use super::progress::ProgressReporter;
use super::rate_limit::RateLimiter;
use super::types::{CrawlEvent, CrawlOutcome};
use super::worker::{run_worker, WorkerContext};
use crate::config::{CrawlConfig, HttpConfig};
use crate::error::CrawlError;
use crate::fetch::{Fetcher, HttpFetcher};
use crate::links::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Idle,
    Seeding,
    Running,
    Draining,
    Done,
}

impl EnginePhase {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => EnginePhase::Seeding,
            2 => EnginePhase::Running,
            3 => EnginePhase::Draining,
            4 => EnginePhase::Done,
            _ => EnginePhase::Idle,
        }
    }
}

/// Stops a running crawl. Clone it freely; cancelling twice is harmless.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            info!("cancellation requested, stopping crawl");
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<dyn Fetcher>,
    cancel: CancelHandle,
    phase: AtomicU8,
}

impl Crawler {
    pub fn new(config: CrawlConfig, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config,
            fetcher,
            cancel: CancelHandle::new(),
            phase: AtomicU8::new(EnginePhase::Idle as u8),
        }
    }

    /// Uses an existing handle, so the caller can wire it up (e.g. to
    /// Ctrl-C) before the crawler exists.
    pub fn with_cancel_handle(mut self, cancel: CancelHandle) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn phase(&self) -> EnginePhase {
        EnginePhase::from_u8(self.phase.load(Ordering::Acquire))
    }

    fn set_phase(&self, phase: EnginePhase) {
        tracing::debug!(?phase, "engine phase");
        self.phase.store(phase as u8, Ordering::Release);
    }

    /// Crawls from `start_url` until the site is exhausted or the crawl is
    /// cancelled. Only an unusable start URL is an error.
    pub async fn run(&self, start_url: &str) -> Result<CrawlOutcome, CrawlError> {
        self.set_phase(EnginePhase::Seeding);
        let start = match validate_start_url(start_url) {
            Ok(start) => start,
            Err(e) => {
                self.set_phase(EnginePhase::Done);
                return Err(e);
            }
        };

        let workers = self.config.effective_workers();
        let frontier = Arc::new(Frontier::with_seed(start.clone()));

        let (events_tx, events_rx) = mpsc::channel((workers * 4).max(16));
        let (aggregator, stats) = Aggregator::new();
        let aggregator_task = aggregator.spawn(events_rx);

        // The seed counts as discovered; the channel is empty so this can't block
        let _ = events_tx.send(CrawlEvent::Discovered(1)).await;

        let limiter = Arc::new(RateLimiter::new(self.config.rate_limit()));
        let progress = ProgressReporter::start(
            stats.clone(),
            self.config.effective_progress_interval(),
            limiter.rate(),
            self.config.show_progress,
        );

        info!(
            url = %start,
            workers,
            max_depth = ?self.config.depth_limit(),
            same_domain = self.config.same_domain,
            rate_limit = ?limiter.rate(),
            "starting crawl"
        );
        self.set_phase(EnginePhase::Running);

        let ctx = WorkerContext {
            frontier: frontier.clone(),
            fetcher: self.fetcher.clone(),
            limiter: limiter.clone(),
            config: Arc::new(self.config.clone()),
            start_url: Arc::from(start.as_str()),
            events: events_tx,
            cancel: self.cancel.token.clone(),
        };

        let handles: Vec<_> = (0..workers)
            .map(|id| tokio::spawn(run_worker(id, ctx.clone())))
            .collect();

        // Workers hold the only remaining senders, the aggregator stops
        // once they have all exited
        drop(ctx);

        for (id, joined) in join_all(handles).await.into_iter().enumerate() {
            if let Err(e) = joined {
                error!(worker = id, error = %e, "worker task failed");
            }
        }

        self.set_phase(EnginePhase::Draining);

        // After a cancel the queue may still hold jobs nobody will run
        frontier.close();

        if let Err(e) = aggregator_task.await {
            error!(error = %e, "aggregator task failed");
        }

        let (results, stats) = stats.take();
        progress.finish(&stats).await;

        let cancelled = self.cancel.is_cancelled();
        info!(
            pages = results.len(),
            ok = stats.crawled_ok,
            failed = stats.failed,
            skipped = stats.skipped,
            elapsed_ms = stats.total_elapsed.as_millis() as u64,
            cancelled,
            "crawl finished"
        );

        self.set_phase(EnginePhase::Done);
        Ok(CrawlOutcome {
            stats,
            results,
            cancelled,
        })
    }
}

/// Crawls a live site over HTTP. `cancel` may be triggered from any task.
pub async fn run_crawl(
    start_url: &str,
    config: CrawlConfig,
    http: &HttpConfig,
    cancel: CancelHandle,
) -> Result<CrawlOutcome, CrawlError> {
    let fetcher = HttpFetcher::new(http)?;
    Crawler::new(config, Arc::new(fetcher))
        .with_cancel_handle(cancel)
        .run(start_url)
        .await
}

// Returns the normalized start URL
fn validate_start_url(start_url: &str) -> Result<String, CrawlError> {
    let parsed = Url::parse(start_url.trim()).map_err(|e| CrawlError::InvalidStartUrl {
        url: start_url.to_string(),
        reason: e.to_string(),
    })?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(CrawlError::UnsupportedScheme(parsed.scheme().to_string()));
    }

    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(CrawlError::MissingHost(start_url.to_string()));
    }

    normalize(parsed.as_str()).ok_or_else(|| CrawlError::InvalidStartUrl {
        url: start_url.to_string(),
        reason: "could not be normalized".to_string(),
    })
}
