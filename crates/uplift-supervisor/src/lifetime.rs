//! Bounded lifetime hold.
//!
//! A run stays alive for a fixed hold duration and then ends unconditionally.
//! The hold is chosen strictly below the enclosing execution ceiling, leaving
//! a margin for the final status lines before an outer timeout would kill the
//! process outright. Teardown of the service and tunnel processes is implicit
//! via process exit; there is no graceful-shutdown handshake.

use std::time::Duration;

use tracing::info;

use crate::error::SupervisorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    hold: Duration,
    ceiling: Duration,
    margin: Duration,
}

impl Lifetime {
    /// Validates the ceiling invariant: `hold + margin < ceiling`.
    pub fn new(hold: Duration, ceiling: Duration, margin: Duration) -> Result<Self, SupervisorError> {
        // checked_add: both values come straight from CLI flags.
        let total = hold.checked_add(margin).ok_or_else(|| SupervisorError::Config {
            reason: "hold plus margin overflows".to_string(),
        })?;
        if total >= ceiling {
            return Err(SupervisorError::Config {
                reason: format!(
                    "hold ({}s) plus margin ({}s) must stay below the execution ceiling ({}s)",
                    hold.as_secs(),
                    margin.as_secs(),
                    ceiling.as_secs()
                ),
            });
        }
        Ok(Self {
            hold,
            ceiling,
            margin,
        })
    }

    pub fn hold_duration(&self) -> Duration {
        self.hold
    }

    pub fn ceiling(&self) -> Duration {
        self.ceiling
    }

    /// The single long block of a run.
    pub async fn hold(&self) {
        info!(hold_seconds = self.hold.as_secs(), "holding run open");
        tokio::time::sleep(self.hold).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    const HOUR: Duration = Duration::from_secs(3600);

    #[test]
    fn default_shape_is_valid() {
        // 5h55m hold under a 6h ceiling with a minute of margin.
        let lifetime = Lifetime::new(
            Duration::from_secs(21_300),
            Duration::from_secs(21_600),
            Duration::from_secs(60),
        )
        .unwrap();
        assert_eq!(lifetime.hold_duration(), Duration::from_secs(21_300));
    }

    #[test]
    fn hold_at_or_over_ceiling_is_rejected() {
        assert!(Lifetime::new(6 * HOUR, 6 * HOUR, Duration::ZERO).is_err());
        assert!(Lifetime::new(7 * HOUR, 6 * HOUR, Duration::from_secs(60)).is_err());
        // Margin eats the gap exactly: still rejected, the bound is strict.
        assert!(Lifetime::new(
            Duration::from_secs(21_540),
            Duration::from_secs(21_600),
            Duration::from_secs(60)
        )
        .is_err());
    }

    #[test]
    fn overflowing_hold_is_rejected_not_a_panic() {
        assert!(Lifetime::new(Duration::MAX, 6 * HOUR, Duration::from_secs(60)).is_err());
        assert!(Lifetime::new(Duration::from_secs(60), 6 * HOUR, Duration::MAX).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn hold_blocks_for_exactly_the_hold_duration() {
        let lifetime = Lifetime::new(
            Duration::from_secs(21_300),
            Duration::from_secs(21_600),
            Duration::from_secs(60),
        )
        .unwrap();

        let start = Instant::now();
        lifetime.hold().await;
        assert_eq!(start.elapsed(), Duration::from_secs(21_300));
    }
}
