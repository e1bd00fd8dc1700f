//! Bounded retry.
//!
//! Every polling wait in a run (readiness, URL discovery) goes through the
//! same plan: a fixed attempt count and a fixed interval. Total wall time is
//! bounded by `attempts * interval` plus probe time; nothing here waits
//! indefinitely.

use std::future::Future;
use std::time::Duration;

/// A fixed-count, fixed-interval polling budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPlan {
    pub attempts: u32,
    pub interval: Duration,
}

impl RetryPlan {
    pub const fn new(attempts: u32, interval: Duration) -> Self {
        Self { attempts, interval }
    }

    /// Upper bound on sleeping time for this plan.
    pub fn budget(&self) -> Duration {
        self.interval * self.attempts
    }
}

/// Run `probe` up to `plan.attempts` times, sleeping `plan.interval` between
/// attempts, and return the first `Some`. The attempt number (1-based) is
/// passed in for logging. No sleep after the last attempt.
pub async fn poll_until<T, F, Fut>(plan: RetryPlan, mut probe: F) -> Option<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Option<T>>,
{
    for attempt in 1..=plan.attempts {
        if let Some(value) = probe(attempt).await {
            return Some(value);
        }
        if attempt < plan.attempts {
            tokio::time::sleep(plan.interval).await;
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn first_success_short_circuits() {
        let start = Instant::now();
        let result = poll_until(RetryPlan::new(15, Duration::from_secs(1)), |attempt| async move {
            (attempt == 3).then_some(attempt)
        })
        .await;

        assert_eq!(result, Some(3));
        // Two sleeps before the third attempt, none after success.
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_returns_none_within_budget() {
        let plan = RetryPlan::new(15, Duration::from_secs(1));
        let start = Instant::now();
        let result: Option<()> = poll_until(plan, |_| async { None }).await;

        assert_eq!(result, None);
        assert!(start.elapsed() <= plan.budget());
        // 14 sleeps between 15 attempts.
        assert_eq!(start.elapsed(), Duration::from_secs(14));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_attempts_never_probes() {
        let mut calls = 0u32;
        let result: Option<()> = poll_until(RetryPlan::new(0, Duration::from_secs(1)), |_| {
            calls += 1;
            async { None }
        })
        .await;

        assert_eq!(result, None);
        assert_eq!(calls, 0);
    }
}
