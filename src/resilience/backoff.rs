//! Exponential backoff policy.

use std::time::Duration;

use thiserror::Error;

use crate::config::schema::BreakerConfig;

/// Rejected retry policy parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("base delay must be greater than zero")]
    ZeroBaseDelay,
    #[error("max delay ({max:?}) must be at least the base delay ({base:?})")]
    MaxBelowBase { base: Duration, max: Duration },
}

/// Immutable retry schedule: `min(base * 2^n, max)` for retry `n`, no jitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    max_retries: u32,
}

impl RetryPolicy {
    pub fn new(base_delay: Duration, max_delay: Duration, max_retries: u32) -> Result<Self, PolicyError> {
        if base_delay.is_zero() {
            return Err(PolicyError::ZeroBaseDelay);
        }
        if max_delay < base_delay {
            return Err(PolicyError::MaxBelowBase { base: base_delay, max: max_delay });
        }
        Ok(Self { base_delay, max_delay, max_retries })
    }

    /// Build from a validated breaker section.
    pub fn from_config(config: &BreakerConfig) -> Result<Self, PolicyError> {
        Self::new(
            Duration::from_millis(config.base_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.max_retries,
        )
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Delay to wait after `retries` prior retries have already happened.
    ///
    /// Once the doubled delay exceeds `max_delay` it stays clamped.
    pub fn delay_for(&self, retries: u32) -> Duration {
        2u32.checked_pow(retries)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    /// Full schedule of waits for an operation that never succeeds.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retries).map(move |n| self.delay_for(n))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_millis(20_000),
            max_retries: 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::new(ms(100), ms(1000), 6).unwrap();
        let delays: Vec<_> = policy.delays().collect();
        assert_eq!(delays, vec![ms(100), ms(200), ms(400), ms(800), ms(1000), ms(1000)]);
    }

    #[test]
    fn test_default_schedule_sums_to_reference() {
        let total: Duration = RetryPolicy::default().delays().sum();
        assert_eq!(total, ms(15_500));
    }

    #[test]
    fn test_zero_retries_has_empty_schedule() {
        let policy = RetryPolicy::new(ms(100), ms(100), 0).unwrap();
        assert_eq!(policy.delays().count(), 0);
    }

    #[test]
    fn test_huge_exponent_clamps_instead_of_overflowing() {
        let policy = RetryPolicy::new(ms(300), ms(3000), 64).unwrap();
        assert_eq!(policy.delay_for(40), ms(3000));
        assert_eq!(policy.delay_for(63), ms(3000));
    }

    #[test]
    fn test_invalid_policies_rejected() {
        assert_eq!(RetryPolicy::new(ms(0), ms(10), 1), Err(PolicyError::ZeroBaseDelay));
        assert!(matches!(
            RetryPolicy::new(ms(100), ms(50), 1),
            Err(PolicyError::MaxBelowBase { .. })
        ));
    }
}
