// src/crawl/progress.rs
// =============================================================================
// Live progress output.
//
// While the crawl runs, a background task redraws one status line on stderr
// (or any other writer) every interval ("\r" moves the cursor back so the line overwrites
// itself). When the crawl ends the line is replaced by a multi-line summary.
//
// The reporter only reads snapshots from the aggregator, it never changes
// the stats. When progress is disabled nothing is spawned and nothing is
// printed.
// =============================================================================

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::aggregator::StatsHandle;
use super::types::CrawlStats;

pub struct ProgressReporter {
    running: Option<Running>,
    rate_limit: Option<f64>,
}

struct Running {
    task: JoinHandle<()>,
    stop: CancellationToken,
    out: Output,
}

// Shared by the redraw task and finish()
type Output = Arc<Mutex<Box<dyn Write + Send>>>;

impl ProgressReporter {
    /// Starts redrawing the progress line on stderr every `every`, or does
    /// nothing when `enabled` is false.
    pub fn start(stats: StatsHandle, every: Duration, rate_limit: Option<f64>, enabled: bool) -> Self {
        Self::start_with_output(stats, every, rate_limit, enabled, std::io::stderr())
    }

    pub fn start_with_output<W>(
        stats: StatsHandle,
        every: Duration,
        rate_limit: Option<f64>,
        enabled: bool,
        out: W,
    ) -> Self
    where
        W: Write + Send + 'static,
    {
        if !enabled {
            return Self { running: None, rate_limit };
        }

        let out: Output = Arc::new(Mutex::new(Box::new(out)));
        let stop = CancellationToken::new();
        let task = tokio::spawn(report_loop(stats, every, out.clone(), stop.clone()));

        Self {
            running: Some(Running { task, stop, out }),
            rate_limit,
        }
    }

    /// Stops the status line and prints the final summary.
    pub async fn finish(self, stats: &CrawlStats) {
        let Some(running) = self.running else {
            return;
        };

        running.stop.cancel();
        if let Err(e) = running.task.await {
            tracing::warn!(error = %e, "progress reporter stopped abnormally");
        }

        let mut out = running.out.lock();
        // Progress output is best effort, a closed stderr shouldn't fail the crawl
        let _ = write!(out, "\r{}\r", " ".repeat(LINE_WIDTH));
        let _ = write!(out, "{}", final_summary(stats, self.rate_limit));
        let _ = out.flush();
    }
}

const LINE_WIDTH: usize = 100;

async fn report_loop(stats: StatsHandle, every: Duration, out: Output, stop: CancellationToken) {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                let line = progress_line(&stats.snapshot());
                let mut out = out.lock();
                let _ = write!(out, "\r{:<width$}", line, width = LINE_WIDTH);
                let _ = out.flush();
            }
        }
    }
}

/// One-line status, e.g.
/// `🕷️  42 discovered | 30 processed (2 failed) | 5 skipped | depth 3 | 12.5 pages/s`
pub fn progress_line(stats: &CrawlStats) -> String {
    format!(
        "🕷️  {} discovered | {} processed ({} failed) | {} skipped | depth {} | {:.1} pages/s",
        stats.total_discovered,
        stats.processed(),
        stats.failed,
        stats.skipped,
        stats.max_depth_reached,
        stats.pages_per_second(),
    )
}

pub fn final_summary(stats: &CrawlStats, rate_limit: Option<f64>) -> String {
    let mut summary = String::new();
    summary.push_str("📊 Crawl summary:\n");
    summary.push_str(&format!("   🔎 Discovered: {}\n", stats.total_discovered));
    summary.push_str(&format!("   📄 Processed: {}\n", stats.processed()));
    summary.push_str(&format!("   ✅ OK: {}\n", stats.crawled_ok));
    summary.push_str(&format!("   ❌ Failed: {}\n", stats.failed));
    summary.push_str(&format!("   ⏭️  Skipped (depth limit): {}\n", stats.skipped));
    summary.push_str(&format!("   📏 Max depth reached: {}\n", stats.max_depth_reached));
    summary.push_str(&format!(
        "   ⏱️  Elapsed: {:.2}s ({:.1} pages/s)\n",
        stats.elapsed().as_secs_f64(),
        stats.pages_per_second()
    ));
    if let Some(rate) = rate_limit {
        summary.push_str(&format!("   🚦 Rate limit: {} req/s\n", rate));
    }
    summary
}
