// src/crawl/frontier.rs
// =============================================================================
// The frontier: which URLs we've seen and which jobs are waiting.
//
// How it works:
// 1. try_enqueue() marks a URL as visited and queues it, atomically per URL,
//    so two workers finding the same link can't both schedule it
// 2. Every queued job bumps the outstanding-work counter BEFORE it becomes
//    visible to workers
// 3. next_job() hands a job to a worker wrapped in a JobGuard
// 4. When the guard is dropped (job finished, failed, or the worker
//    panicked) the counter goes down by one
// 5. The decrement that takes the counter to zero closes the queue, which
//    tells every idle worker there is nothing left to do
//
// Why does this terminate correctly?
// - A worker only enqueues children while it still holds its own guard, so
//   the counter can't touch zero while new work might still appear
// - fetch_sub returns the previous value, so exactly one decrement sees 1
//   and that one does the close
// =============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashSet;
use parking_lot::Mutex;
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_util::sync::CancellationToken;

use super::types::CrawlJob;

pub struct Frontier {
    visited: DashSet<String>,
    outstanding: AtomicUsize,
    // None once the queue has been closed
    sender: Mutex<Option<mpsc::UnboundedSender<CrawlJob>>>,
    receiver: AsyncMutex<mpsc::UnboundedReceiver<CrawlJob>>,
}

impl Frontier {
    /// Creates a frontier holding one job: the seed, with the counter at 1.
    pub fn with_seed(url: String) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let frontier = Self {
            visited: DashSet::new(),
            outstanding: AtomicUsize::new(0),
            sender: Mutex::new(Some(tx)),
            receiver: AsyncMutex::new(rx),
        };
        frontier.try_enqueue(url, 0);
        frontier
    }

    /// Queues `url` at `depth` unless it has been seen before.
    ///
    /// Returns true if the job was queued.
    pub fn try_enqueue(&self, url: String, depth: usize) -> bool {
        // DashSet::insert is the check-and-mark: only one caller gets true
        if !self.visited.insert(url.clone()) {
            return false;
        }

        self.outstanding.fetch_add(1, Ordering::AcqRel);

        let sender = self.sender.lock();
        match sender.as_ref() {
            Some(tx) if tx.send(CrawlJob { url, depth }).is_ok() => true,
            _ => {
                // Queue already closed by cancellation, nobody will run this
                tracing::trace!("frontier closed, dropping newly discovered URL");
                false
            }
        }
    }

    /// Waits for the next job.
    ///
    /// Returns None when the queue has been closed and drained, or when
    /// `cancel` fires first.
    pub async fn next_job(&self, cancel: &CancellationToken) -> Option<JobGuard<'_>> {
        let job = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            job = async { self.receiver.lock().await.recv().await } => job,
        }?;

        Some(JobGuard { frontier: self, job })
    }

    /// Closes the queue. Safe to call more than once, only the first call
    /// has any effect.
    pub fn close(&self) -> bool {
        let closed = self.sender.lock().take().is_some();
        if closed {
            tracing::debug!(visited = self.visited.len(), "frontier closed");
        }
        closed
    }

    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Jobs queued or being processed right now.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::Acquire)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    fn complete_job(&self) {
        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.close();
        }
    }
}

/// A job checked out of the frontier.
///
/// Dropping the guard marks the job as finished. Because it runs in Drop,
/// the count goes down on every path out of the worker, including early
/// returns and panics.
pub struct JobGuard<'a> {
    frontier: &'a Frontier,
    job: CrawlJob,
}

impl JobGuard<'_> {
    pub fn job(&self) -> &CrawlJob {
        &self.job
    }
}

impl Drop for JobGuard<'_> {
    fn drop(&mut self) {
        self.frontier.complete_job();
    }
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why DashSet instead of Mutex<HashSet>?
//    - DashSet shards its keys over several locks
//    - Two workers inserting different URLs usually don't wait for each other
//    - insert() still returns false for the second caller with the same URL
//
// 2. Why is the receiver behind an async Mutex?
//    - tokio's mpsc has one receiver, but we have many workers
//    - The worker holding the lock waits in recv(), the rest wait for the lock
//    - Either way, cancellation is checked by the select! around both
//
// 3. Why an unbounded channel?
//    - Workers push jobs while they're holding a guard; a full bounded
//      queue would make them wait on themselves
//    - Dedup keeps the queue no larger than the number of distinct URLs
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seed_job() {
        let frontier = Frontier::with_seed("https://example.com/".to_string());
        assert_eq!(frontier.outstanding(), 1);
        assert_eq!(frontier.visited_count(), 1);

        let cancel = CancellationToken::new();
        let guard = frontier.next_job(&cancel).await.unwrap();
        assert_eq!(guard.job().url, "https://example.com/");
        assert_eq!(guard.job().depth, 0);
    }

    #[test]
    fn test_duplicate_is_rejected() {
        let frontier = Frontier::with_seed("https://example.com/".to_string());
        assert!(frontier.try_enqueue("https://example.com/a".to_string(), 1));
        assert!(!frontier.try_enqueue("https://example.com/a".to_string(), 1));
        assert!(!frontier.try_enqueue("https://example.com/".to_string(), 2));
        assert_eq!(frontier.outstanding(), 2);
    }

    #[tokio::test]
    async fn test_last_completion_closes_queue() {
        let frontier = Frontier::with_seed("https://example.com/".to_string());
        let cancel = CancellationToken::new();

        let seed = frontier.next_job(&cancel).await.unwrap();
        assert!(frontier.try_enqueue("https://example.com/a".to_string(), 1));
        drop(seed);
        assert!(!frontier.is_closed());

        let child = frontier.next_job(&cancel).await.unwrap();
        assert_eq!(child.job().depth, 1);
        drop(child);

        assert!(frontier.is_closed());
        assert_eq!(frontier.outstanding(), 0);
        assert!(frontier.next_job(&cancel).await.is_none());
    }

    #[tokio::test]
    async fn test_guard_dropped_by_panic_completes_job() {
        use std::panic::{catch_unwind, AssertUnwindSafe};

        let frontier = Frontier::with_seed("https://example.com/".to_string());
        let cancel = CancellationToken::new();
        let seed = frontier.next_job(&cancel).await.unwrap();

        let result = catch_unwind(AssertUnwindSafe(move || {
            let _guard = seed;
            panic!("worker failed mid-job");
        }));

        assert!(result.is_err());
        assert_eq!(frontier.outstanding(), 0);
        assert!(frontier.is_closed());
        assert!(frontier.next_job(&cancel).await.is_none());
    }

    #[test]
    fn test_close_is_idempotent() {
        let frontier = Frontier::with_seed("https://example.com/".to_string());
        assert!(frontier.close());
        assert!(!frontier.close());
        assert!(!frontier.try_enqueue("https://example.com/late".to_string(), 1));
    }

    #[tokio::test]
    async fn test_cancel_wakes_waiting_worker() {
        let frontier = Frontier::with_seed("https://example.com/".to_string());
        let cancel = CancellationToken::new();

        // Take the only job and keep it, so the queue stays open and empty
        let _seed = frontier.next_job(&cancel).await.unwrap();

        cancel.cancel();
        assert!(frontier.next_job(&cancel).await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_enqueue_dedups() {
        let frontier = std::sync::Arc::new(Frontier::with_seed("https://example.com/".to_string()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let frontier = frontier.clone();
            handles.push(tokio::spawn(async move {
                (0..100)
                    .filter(|i| frontier.try_enqueue(format!("https://example.com/{}", i), 1))
                    .count()
            }));
        }

        let accepted: usize = futures::future::join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .sum();

        assert_eq!(accepted, 100);
        assert_eq!(frontier.outstanding(), 101);
    }
}
