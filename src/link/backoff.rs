//! Exponential reconnect backoff.
//!
//! The delay before attempt `n` (counting from zero) is
//! `min(initial × 2^n, max)`. The attempt counter goes up each time a
//! scheduled reconnect fires and resets when a connection opens.

use std::time::Duration;

use super::config::LinkConfig;

/// Largest shift applied to the initial delay; beyond this the cap wins anyway.
const MAX_SHIFT: u32 = 31;

/// Reconnect attempt counter and delay policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
    max_attempts: u32,
    attempts: u32,
    delay: Duration,
}

impl Backoff {
    /// Creates a backoff with explicit bounds.
    #[must_use]
    pub fn new(initial: Duration, max: Duration, max_attempts: u32) -> Self {
        Self {
            initial,
            max,
            max_attempts,
            attempts: 0,
            delay: initial,
        }
    }

    /// Creates a backoff from link configuration.
    #[must_use]
    pub fn from_config(config: &LinkConfig) -> Self {
        Self::new(
            config.initial_reconnect_delay,
            config.max_reconnect_delay,
            config.max_reconnect_attempts,
        )
    }

    /// Delay for the given attempt number.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 1_u32 << attempt.min(MAX_SHIFT);
        self.initial
            .checked_mul(multiplier)
            .map_or(self.max, |delay| delay.min(self.max))
    }

    /// Delay for the next attempt; remembers it as the current delay.
    pub fn next_delay(&mut self) -> Duration {
        self.delay = self.delay_for(self.attempts);
        self.delay
    }

    /// Counts a reconnect attempt and returns the new total.
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    /// Resets the counter to zero and the delay to its floor.
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.delay = self.initial;
    }

    /// Attempts made since the last reset.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Most recently scheduled delay, or the floor after a reset.
    #[inline]
    #[must_use]
    pub fn current_delay(&self) -> Duration {
        self.delay
    }

    /// Returns `true` once the attempt budget is used up.
    #[inline]
    #[must_use]
    pub fn exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn default_backoff() -> Backoff {
        Backoff::from_config(&LinkConfig::default())
    }

    #[test]
    fn test_starts_at_floor() {
        let backoff = default_backoff();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.current_delay(), Duration::from_millis(1000));
        assert!(!backoff.exhausted());
    }

    #[test]
    fn test_doubles_then_caps() {
        let backoff = default_backoff();
        let delays: Vec<u64> = (0..8)
            .map(|n| backoff.delay_for(n).as_millis() as u64)
            .collect();
        assert_eq!(
            delays,
            [1000, 2000, 4000, 8000, 16000, 30000, 30000, 30000]
        );
    }

    #[test]
    fn test_next_delay_follows_attempts() {
        let mut backoff = default_backoff();
        let mut observed = Vec::new();
        for _ in 0..3 {
            observed.push(backoff.next_delay());
            backoff.record_attempt();
        }
        assert_eq!(
            observed,
            [
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
        assert_eq!(backoff.current_delay(), Duration::from_millis(4000));
    }

    #[test]
    fn test_reset_returns_to_floor() {
        let mut backoff = default_backoff();
        backoff.record_attempt();
        backoff.record_attempt();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        assert_eq!(backoff.current_delay(), Duration::from_millis(1000));
    }

    #[test]
    fn test_exhausted_at_budget() {
        let mut backoff = Backoff::new(Duration::from_millis(10), Duration::from_millis(100), 2);
        backoff.record_attempt();
        assert!(!backoff.exhausted());
        backoff.record_attempt();
        assert!(backoff.exhausted());
    }

    #[test]
    fn test_huge_attempt_numbers_saturate_at_cap() {
        let backoff = default_backoff();
        assert_eq!(backoff.delay_for(u32::MAX), Duration::from_millis(30_000));
    }

    proptest! {
        #[test]
        fn test_delay_matches_closed_form(n in 0u32..64) {
            let backoff = default_backoff();
            let expected = 1000u128
                .saturating_mul(1u128 << n.min(MAX_SHIFT))
                .min(30_000);
            prop_assert_eq!(backoff.delay_for(n).as_millis(), expected);
        }

        #[test]
        fn test_delay_is_monotonic(n in 0u32..63) {
            let backoff = default_backoff();
            prop_assert!(backoff.delay_for(n) <= backoff.delay_for(n + 1));
        }
    }
}
