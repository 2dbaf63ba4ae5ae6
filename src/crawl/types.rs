// src/crawl/types.rs
// =============================================================================
// The data that flows through a crawl.
//
// - CrawlJob: one (url, depth) unit of work sitting in the queue
// - CrawlResult: what happened when a worker processed a job
// - CrawlEvent: what workers send to the aggregator
// - CrawlStats: running totals, owned by the aggregator
// - CrawlOutcome: everything handed back to the caller at the end
// =============================================================================

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::error::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    pub url: String,
    /// Link hops from the start page (the start page is depth 0)
    pub depth: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlResult {
    pub url: String,
    pub depth: usize,
    /// Links found on the page that were handed to the frontier
    pub links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FetchError>,
    pub fetched_at: DateTime<Utc>,
    #[serde(rename = "response_time_ms", serialize_with = "as_millis")]
    pub response_time: Duration,
    /// 0 when no response was received
    pub status_code: u16,
}

impl CrawlResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Message from a worker to the aggregator.
#[derive(Debug)]
pub enum CrawlEvent {
    /// This many new URLs entered the frontier
    Discovered(usize),
    /// This many links were dropped by the depth limit
    Skipped(usize),
    Page(CrawlResult),
}

#[derive(Debug, Clone, Serialize)]
pub struct CrawlStats {
    pub total_discovered: usize,
    pub crawled_ok: usize,
    pub failed: usize,
    pub skipped: usize,
    pub max_depth_reached: usize,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "total_elapsed_secs", serialize_with = "as_secs")]
    pub total_elapsed: Duration,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            total_discovered: 0,
            crawled_ok: 0,
            failed: 0,
            skipped: 0,
            max_depth_reached: 0,
            started_at: Utc::now(),
            total_elapsed: Duration::ZERO,
        }
    }

    /// Pages that were fetched, successfully or not.
    pub fn processed(&self) -> usize {
        self.crawled_ok + self.failed
    }

    /// Time since the crawl started, or the final duration once it finished.
    pub fn elapsed(&self) -> Duration {
        if !self.total_elapsed.is_zero() {
            return self.total_elapsed;
        }
        Utc::now()
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Processed pages per second.
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.processed() as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Results and stats of a finished (or cancelled) crawl.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub stats: CrawlStats,
    pub results: Vec<CrawlResult>,
    /// True if the crawl was stopped before the frontier drained
    pub cancelled: bool,
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}

fn as_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(duration.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_flat() {
        let result = CrawlResult {
            url: "https://example.com/".to_string(),
            depth: 0,
            links: vec![],
            error: Some(FetchError::Status(404)),
            fetched_at: Utc::now(),
            response_time: Duration::from_millis(42),
            status_code: 404,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["error"], "HTTP 404");
        assert_eq!(json["response_time_ms"], 42);
        assert!(!result.is_ok());
    }

    #[test]
    fn test_stats_rate_uses_final_elapsed() {
        let stats = CrawlStats {
            crawled_ok: 8,
            failed: 2,
            total_elapsed: Duration::from_secs(5),
            ..CrawlStats::new()
        };
        assert_eq!(stats.processed(), 10);
        assert!((stats.pages_per_second() - 2.0).abs() < f64::EPSILON);
    }
}
