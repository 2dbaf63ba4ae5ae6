// src/crawl/worker.rs
// =============================================================================
// One crawl worker.
//
// Each worker loops:
// 1. Take a job from the frontier (or stop: queue closed / cancelled)
// 2. Wait for a rate-limit token
// 3. Fetch the page
// 4. On success, extract links and offer each one to the frontier
//    (links past the depth limit are counted as skipped instead)
// 5. Send the result to the aggregator
// 6. Drop the job guard, which tells the frontier this job is done
//
// A page that fails is still a result: it's recorded with its error and
// the worker moves on. Only cancellation makes a worker stop early.
// =============================================================================

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::frontier::Frontier;
use super::rate_limit::RateLimiter;
use super::types::{CrawlEvent, CrawlJob, CrawlResult};
use crate::config::CrawlConfig;
use crate::error::FetchError;
use crate::fetch::{FetchedPage, Fetcher};
use crate::links::{extract_links, is_same_domain};

/// Everything a worker shares with the rest of the pool.
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub frontier: Arc<Frontier>,
    pub fetcher: Arc<dyn Fetcher>,
    pub limiter: Arc<RateLimiter>,
    pub config: Arc<CrawlConfig>,
    /// Normalized start URL, the reference for same-domain filtering
    pub start_url: Arc<str>,
    pub events: mpsc::Sender<CrawlEvent>,
    pub cancel: CancellationToken,
}

pub(crate) async fn run_worker(id: usize, ctx: WorkerContext) {
    trace!(worker = id, "worker started");
    let mut processed = 0usize;

    while let Some(guard) = ctx.frontier.next_job(&ctx.cancel).await {
        let job = guard.job().clone();

        // The limit is checked against the depth the job was queued with
        if ctx.config.exceeds_depth(job.depth) {
            if ctx.events.send(CrawlEvent::Skipped(1)).await.is_err() {
                break;
            }
            continue;
        }

        if !ctx.limiter.wait(&ctx.cancel).await {
            break;
        }

        let Some(events) = process_job(&ctx, &job).await else {
            // Cancelled mid-fetch: nothing finished, nothing to report
            break;
        };

        let mut sink_closed = false;
        for event in events {
            if ctx.events.send(event).await.is_err() {
                sink_closed = true;
                break;
            }
        }
        if sink_closed {
            warn!(worker = id, "result sink closed, stopping worker");
            break;
        }

        processed += 1;
        // `guard` drops here and marks the job complete
    }

    trace!(worker = id, processed, "worker stopped");
}

// Fetches one page and works out what to tell the aggregator.
// Returns None if the fetch was cancelled.
async fn process_job(ctx: &WorkerContext, job: &CrawlJob) -> Option<Vec<CrawlEvent>> {
    let fetched_at = Utc::now();
    let started = Instant::now();
    let outcome = ctx.fetcher.fetch(&job.url, &ctx.cancel).await;
    let response_time = started.elapsed();

    let (status_code, error, links) = match outcome {
        Err(FetchError::Cancelled) => return None,
        Err(e) => (0, Some(e), Vec::new()),
        Ok(FetchedPage { status, url, body }) if (200..400).contains(&status) => {
            (status, None, page_links(ctx, &url, &body))
        }
        Ok(FetchedPage { status, .. }) => (status, Some(FetchError::Status(status)), Vec::new()),
    };

    let mut discovered = 0;
    let mut skipped = 0;
    let child_depth = job.depth + 1;

    for link in &links {
        if ctx.config.exceeds_depth(child_depth) {
            skipped += 1;
        } else if ctx.frontier.try_enqueue(link.clone(), child_depth) {
            discovered += 1;
        }
    }

    match &error {
        Some(e) => warn!(url = %job.url, depth = job.depth, status = status_code, error = %e, "page failed"),
        None => debug!(
            url = %job.url,
            depth = job.depth,
            status = status_code,
            links = links.len(),
            discovered,
            ms = response_time.as_millis() as u64,
            "page crawled"
        ),
    }

    let mut events = Vec::with_capacity(3);
    if discovered > 0 {
        events.push(CrawlEvent::Discovered(discovered));
    }
    if skipped > 0 {
        events.push(CrawlEvent::Skipped(skipped));
    }
    events.push(CrawlEvent::Page(CrawlResult {
        url: job.url.clone(),
        depth: job.depth,
        links,
        error,
        fetched_at,
        response_time,
        status_code,
    }));

    Some(events)
}

// Links on the page, limited to the start URL's host when configured.
// `page_url` is where the page was served from after redirects.
fn page_links(ctx: &WorkerContext, page_url: &str, body: &str) -> Vec<String> {
    if body.is_empty() {
        return Vec::new();
    }

    // A redirect off the start host ends the trail there. Past this check the
    // page shares the start URL's host, so scoping to the page is scoping to
    // the start URL.
    if ctx.config.same_domain && !is_same_domain(&ctx.start_url, page_url) {
        trace!(url = %page_url, "redirected off the start host, links not followed");
        return Vec::new();
    }

    extract_links(page_url, body, ctx.config.same_domain)
}
