// src/crawl/rate_limit.rs
// =============================================================================
// Token-bucket rate limiting shared by all workers.
//
// How it works:
// - The bucket is a Semaphore whose permits are the tokens
// - It starts full (capacity = the rate, rounded up, capped at what a
//   Semaphore can hold), so the first second can burst
// - A background task adds one token every 1s / rate; when the bucket is
//   already full the token is simply dropped
// - wait() takes one token and never gives it back
//
// With no rate configured wait() returns immediately and no background task
// is started.
// =============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

// tokio timers don't go much below a millisecond, faster rates add several
// tokens per tick instead
const MIN_TICK: Duration = Duration::from_millis(1);

// Absurdly slow rates get one token a year
const MAX_TICK: Duration = Duration::from_secs(365 * 24 * 60 * 60);

pub struct RateLimiter {
    bucket: Option<Bucket>,
}

struct Bucket {
    tokens: Arc<Semaphore>,
    rate: f64,
    // Stops the refill task when the limiter is dropped
    stop: CancellationToken,
}

impl RateLimiter {
    /// Builds a limiter for `rate` requests per second, or a no-op limiter
    /// for None. Must be called inside a tokio runtime.
    pub fn new(rate: Option<f64>) -> Self {
        match rate {
            Some(rate) if rate > 0.0 && rate.is_finite() => Self::token_bucket(rate),
            _ => Self::disabled(),
        }
    }

    pub fn disabled() -> Self {
        Self { bucket: None }
    }

    fn token_bucket(rate: f64) -> Self {
        let capacity = bucket_capacity(rate);
        let (tick, per_tick) = refill_schedule(rate);

        let tokens = Arc::new(Semaphore::new(capacity));
        let stop = CancellationToken::new();

        tokio::spawn(refill(tokens.clone(), capacity, tick, per_tick, stop.clone()));

        tracing::debug!(rate, capacity, ?tick, per_tick, "rate limiter started");

        Self {
            bucket: Some(Bucket { tokens, rate, stop }),
        }
    }

    /// Configured requests per second, None when unlimited.
    pub fn rate(&self) -> Option<f64> {
        self.bucket.as_ref().map(|bucket| bucket.rate)
    }

    /// Waits for a token.
    ///
    /// Returns false if `cancel` fired first, true once the caller may go.
    pub async fn wait(&self, cancel: &CancellationToken) -> bool {
        let Some(bucket) = &self.bucket else {
            return !cancel.is_cancelled();
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => false,
            permit = bucket.tokens.acquire() => match permit {
                Ok(permit) => {
                    permit.forget();
                    true
                }
                Err(_) => false,
            },
        }
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        if let Some(bucket) = &self.bucket {
            bucket.stop.cancel();
        }
    }
}

async fn refill(
    tokens: Arc<Semaphore>,
    capacity: usize,
    tick: Duration,
    per_tick: usize,
    stop: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = stop.cancelled() => break,
            _ = ticker.tick() => {
                let room = capacity.saturating_sub(tokens.available_permits());
                let added = room.min(per_tick);
                if added > 0 {
                    tokens.add_permits(added);
                }
            }
        }
    }
}

// Semaphore::new panics above MAX_PERMITS, huge rates are capped there
fn token_count(value: f64) -> usize {
    (value.ceil() as usize).clamp(1, Semaphore::MAX_PERMITS)
}

fn bucket_capacity(rate: f64) -> usize {
    token_count(rate)
}

// (tick interval, tokens added per tick)
fn refill_schedule(rate: f64) -> (Duration, usize) {
    let interval = Duration::try_from_secs_f64(1.0 / rate).unwrap_or(MAX_TICK).min(MAX_TICK);
    if interval >= MIN_TICK {
        (interval, 1)
    } else {
        (MIN_TICK, token_count(rate * MIN_TICK.as_secs_f64()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_rounds_up() {
        assert_eq!(bucket_capacity(0.5), 1);
        assert_eq!(bucket_capacity(2.0), 2);
        assert_eq!(bucket_capacity(2.1), 3);
    }

    #[test]
    fn test_refill_schedule() {
        assert_eq!(refill_schedule(4.0), (Duration::from_millis(250), 1));
        assert_eq!(refill_schedule(0.5), (Duration::from_secs(2), 1));
        assert_eq!(refill_schedule(10_000.0), (MIN_TICK, 10));
    }

    #[test]
    fn test_extreme_rates_are_clamped() {
        assert_eq!(bucket_capacity(1e20), Semaphore::MAX_PERMITS);
        assert_eq!(refill_schedule(1e30), (MIN_TICK, Semaphore::MAX_PERMITS));
        assert_eq!(refill_schedule(1e-30), (MAX_TICK, 1));
    }

    #[tokio::test]
    async fn test_huge_rate_behaves_like_unthrottled() {
        let limiter = RateLimiter::new(Some(1e20));
        let cancel = CancellationToken::new();
        assert_eq!(limiter.rate(), Some(1e20));
        for _ in 0..1_000 {
            assert!(limiter.wait(&cancel).await);
        }
    }

    #[tokio::test]
    async fn test_tiny_rate_starts_with_one_token() {
        let limiter = RateLimiter::new(Some(1e-30));
        let cancel = CancellationToken::new();
        assert!(limiter.wait(&cancel).await);
    }

    #[tokio::test]
    async fn test_disabled_never_waits() {
        let limiter = RateLimiter::new(None);
        let cancel = CancellationToken::new();
        assert_eq!(limiter.rate(), None);
        for _ in 0..1_000 {
            assert!(limiter.wait(&cancel).await);
        }
    }

    #[tokio::test]
    async fn test_non_positive_rate_is_disabled() {
        assert_eq!(RateLimiter::new(Some(0.0)).rate(), None);
        assert_eq!(RateLimiter::new(Some(-1.0)).rate(), None);
    }

    #[tokio::test]
    async fn test_burst_then_steady_rate() {
        let limiter = RateLimiter::new(Some(20.0));
        let cancel = CancellationToken::new();
        let started = std::time::Instant::now();

        // 20 burst tokens, then 10 more at one per 50ms
        for _ in 0..30 {
            assert!(limiter.wait(&cancel).await);
        }

        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(450), "finished too fast: {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_cancel_unblocks_waiter() {
        let limiter = RateLimiter::new(Some(0.1));
        let cancel = CancellationToken::new();

        // Use up the single burst token, the next one is 10 seconds away
        assert!(limiter.wait(&cancel).await);

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        assert!(!limiter.wait(&cancel).await);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
