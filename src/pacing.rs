//! Pacing policies for batch generation.
//!
//! The queue calls [`Pacing::pause`] between consecutive pipeline runs, never
//! after the last one. Implementations decide how long to wait given the
//! outcome history so far.

use crate::config::{PacingConfig, PacingStrategy};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Outcome history the pacing policy can react to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaceState {
    /// Failures in a row ending with the item that just finished.
    pub consecutive_failures: u32,
}

#[async_trait]
pub trait Pacing: Send + Sync {
    /// How long to wait before the next item.
    fn delay(&self, state: PaceState) -> Duration;

    /// Suspend for [`delay`](Self::delay). Never busy-waits.
    async fn pause(&self, state: PaceState) {
        let delay = self.delay(state);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Same wait after every item.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Pacing for FixedDelay {
    fn delay(&self, _state: PaceState) -> Duration {
        self.0
    }
}

/// `base × 2^consecutive_failures`, capped at `max`. Resets to `base` after
/// a success.
#[derive(Debug, Clone, Copy)]
pub struct ExponentialBackoff {
    pub base: Duration,
    pub max: Duration,
}

impl Pacing for ExponentialBackoff {
    fn delay(&self, state: PaceState) -> Duration {
        let factor = 2u32.saturating_pow(state.consecutive_failures.min(31));
        self.base.saturating_mul(factor).min(self.max)
    }
}

/// No waiting at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacing for NoDelay {
    fn delay(&self, _state: PaceState) -> Duration {
        Duration::ZERO
    }
}

/// Build the configured policy.
pub fn from_config(config: &PacingConfig) -> Arc<dyn Pacing> {
    let delay = Duration::from_millis(config.delay_ms);
    match config.strategy {
        PacingStrategy::Fixed => Arc::new(FixedDelay(delay)),
        PacingStrategy::Backoff => Arc::new(ExponentialBackoff {
            base: delay,
            max: Duration::from_millis(config.max_delay_ms),
        }),
        PacingStrategy::None => Arc::new(NoDelay),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failures(n: u32) -> PaceState {
        PaceState {
            consecutive_failures: n,
        }
    }

    #[test]
    fn fixed_delay_ignores_failures() {
        let pacing = FixedDelay(Duration::from_secs(2));
        assert_eq!(pacing.delay(failures(0)), Duration::from_secs(2));
        assert_eq!(pacing.delay(failures(5)), Duration::from_secs(2));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let pacing = ExponentialBackoff {
            base: Duration::from_secs(2),
            max: Duration::from_secs(30),
        };
        assert_eq!(pacing.delay(failures(0)), Duration::from_secs(2));
        assert_eq!(pacing.delay(failures(1)), Duration::from_secs(4));
        assert_eq!(pacing.delay(failures(3)), Duration::from_secs(16));
        assert_eq!(pacing.delay(failures(4)), Duration::from_secs(30));
        assert_eq!(pacing.delay(failures(u32::MAX)), Duration::from_secs(30));
    }

    #[test]
    fn config_selects_strategy() {
        let mut config = PacingConfig::default();
        assert_eq!(from_config(&config).delay(failures(3)), Duration::from_secs(2));

        config.strategy = PacingStrategy::Backoff;
        assert_eq!(from_config(&config).delay(failures(3)), Duration::from_secs(16));

        config.strategy = PacingStrategy::None;
        assert_eq!(from_config(&config).delay(failures(3)), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_sleeps_for_the_delay() {
        let start = tokio::time::Instant::now();
        FixedDelay(Duration::from_secs(2)).pause(failures(0)).await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn no_delay_does_not_advance_time() {
        let start = tokio::time::Instant::now();
        NoDelay.pause(failures(0)).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
