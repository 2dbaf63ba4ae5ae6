// src/crawl/mod.rs
// =============================================================================
// This module handles website crawling.
//
// Features:
// - Many workers crawling in parallel from one shared frontier
// - Every URL visited at most once, no matter how many workers find it
// - Same-domain restriction (doesn't wander off to external sites)
// - Configurable depth limit
// - Optional requests-per-second ceiling shared by all workers
// - Live progress line and a final summary
// - Ctrl-C stops the crawl but keeps everything finished so far
//
// Submodules:
// - engine: Crawler, the lifecycle and the public entry points
// - frontier: visited set, job queue, outstanding-work counter
// - worker: the per-worker fetch/parse/enqueue loop
// - rate_limit: token bucket
// - aggregator: the single writer of results and stats
// - progress: status line and summary
// - types: jobs, results, stats
// =============================================================================

mod aggregator;
mod engine;
mod frontier;
mod progress;
mod rate_limit;
mod types;
mod worker;

#[cfg(test)]
mod test_site;

pub use engine::{run_crawl, CancelHandle, Crawler, EnginePhase};
pub use types::{CrawlOutcome, CrawlResult, CrawlStats};
