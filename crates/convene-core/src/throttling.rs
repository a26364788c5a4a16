use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};
use tracing::debug;

use crate::provider_policy::{BackoffPolicy, ProviderPolicy};

/// Shared rate budget for outbound provider calls.
///
/// Callers that find the budget exhausted wait with exponential backoff until
/// a cell frees up. Clones share the same limiter.
#[derive(Clone)]
pub struct ThrottlingQueue {
    limiter: Arc<DirectRateLimiter>,
    waiting: Arc<AtomicUsize>,
    retry_backoff: BackoffPolicy,
}

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

impl ThrottlingQueue {
    pub fn new(quota_window: Duration, quota_limit: u32, retry_backoff: BackoffPolicy) -> Self {
        let quota = quota_from_window(quota_window, quota_limit);
        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
            waiting: Arc::new(AtomicUsize::new(0)),
            retry_backoff,
        }
    }

    pub fn from_policy(policy: &ProviderPolicy) -> Self {
        Self::new(
            policy.quota_window,
            policy.quota_limit,
            policy.retry_backoff.clone(),
        )
    }

    /// Tries to take one cell of budget without waiting. On failure returns the
    /// delay recommended before the first retry.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        if self.limiter.check().is_ok() {
            return Ok(());
        }

        Err(self.retry_delay(0).unwrap_or(self.retry_backoff.max_delay))
    }

    /// Waits until one cell of budget is available.
    ///
    /// Past `max_retries` the delay stays at `max_delay`; the call never gives up.
    pub async fn acquire(&self) {
        let mut attempt = 0_u32;
        while self.limiter.check().is_err() {
            let delay = self
                .retry_delay(attempt)
                .unwrap_or(self.retry_backoff.max_delay);
            self.waiting.fetch_add(1, Ordering::SeqCst);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "rate budget exhausted, waiting");
            tokio::time::sleep(delay).await;
            self.waiting.fetch_sub(1, Ordering::SeqCst);
            attempt = attempt.saturating_add(1);
        }
    }

    /// Number of callers currently sleeping in [`acquire`](Self::acquire).
    pub fn waiting_len(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }

    pub fn retry_delay(&self, retry_count: u32) -> Option<Duration> {
        if retry_count > self.retry_backoff.max_retries {
            return None;
        }

        let scale = self.retry_backoff.multiplier.powf(f64::from(retry_count));
        let seconds = self.retry_backoff.initial_delay.as_secs_f64() * scale;
        let capped_seconds = seconds.min(self.retry_backoff.max_delay.as_secs_f64());
        Some(Duration::from_secs_f64(capped_seconds))
    }
}

fn quota_from_window(quota_window: Duration, quota_limit: u32) -> Quota {
    let burst = NonZeroU32::new(quota_limit).unwrap_or(NonZeroU32::MIN);

    let seconds_per_cell = (quota_window.as_secs_f64() / f64::from(burst.get())).max(0.001);
    let period = Duration::from_secs_f64(seconds_per_cell);

    Quota::with_period(period)
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst)
}
