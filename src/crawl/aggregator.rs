// src/crawl/aggregator.rs
// =============================================================================
// The aggregator: the only place where crawl stats and results change.
//
// Workers never touch the stats. They send CrawlEvents down a channel and
// this single task applies them one at a time, so:
// - every update to the stats happens under one lock, in one place
// - results are stored in the order they arrived
//
// Anyone else (the progress reporter, the engine at the end) only gets
// copies via StatsHandle::snapshot().
// =============================================================================

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::types::{CrawlEvent, CrawlResult, CrawlStats};

#[derive(Default)]
struct AggregateState {
    stats: CrawlStats,
    results: Vec<CrawlResult>,
}

pub struct Aggregator {
    state: Arc<Mutex<AggregateState>>,
}

/// Read-only view of the aggregator's state.
#[derive(Clone)]
pub struct StatsHandle {
    state: Arc<Mutex<AggregateState>>,
}

impl Aggregator {
    pub fn new() -> (Self, StatsHandle) {
        let state = Arc::new(Mutex::new(AggregateState::default()));
        (
            Self { state: state.clone() },
            StatsHandle { state },
        )
    }

    /// Consumes events until every sender has been dropped.
    pub fn spawn(self, mut events: mpsc::Receiver<CrawlEvent>) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                self.apply(event);
            }

            let mut state = self.state.lock();
            state.stats.total_elapsed = state.stats.elapsed();
            tracing::debug!(results = state.results.len(), "aggregator finished");
        })
    }

    fn apply(&self, event: CrawlEvent) {
        let mut state = self.state.lock();
        match event {
            CrawlEvent::Discovered(count) => state.stats.total_discovered += count,
            CrawlEvent::Skipped(count) => state.stats.skipped += count,
            CrawlEvent::Page(result) => {
                if result.is_ok() {
                    state.stats.crawled_ok += 1;
                } else {
                    state.stats.failed += 1;
                }
                state.stats.max_depth_reached = state.stats.max_depth_reached.max(result.depth);
                state.results.push(result);
            }
        }
    }
}

impl StatsHandle {
    pub fn snapshot(&self) -> CrawlStats {
        self.state.lock().stats.clone()
    }

    /// Takes the final results and stats. Call only after the aggregator
    /// task has finished.
    pub fn take(&self) -> (Vec<CrawlResult>, CrawlStats) {
        let mut state = self.state.lock();
        if state.stats.total_elapsed.is_zero() {
            state.stats.total_elapsed = state.stats.elapsed();
        }
        (std::mem::take(&mut state.results), state.stats.clone())
    }
}
