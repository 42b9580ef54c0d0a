//! Link timing and reconnect configuration.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use robot_camera_link::LinkConfig;
//!
//! let config = LinkConfig::new()
//!     .with_heartbeat_interval(Duration::from_secs(10))
//!     .with_max_reconnect_attempts(5)
//!     .with_reconnect_on_peer_close(true);
//!
//! config.validate()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default liveness check period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Default first reconnect delay (backoff floor).
pub const DEFAULT_INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Default reconnect delay cap.
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_secs(30);

/// Default reconnect budget.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

// ============================================================================
// LinkConfig
// ============================================================================

/// Heartbeat and reconnect settings for one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Period of the local liveness check.
    pub heartbeat_interval: Duration,

    /// Delay before the first reconnect attempt.
    pub initial_reconnect_delay: Duration,

    /// Upper bound for the reconnect delay.
    pub max_reconnect_delay: Duration,

    /// Reconnect attempts before the link is declared failed.
    pub max_reconnect_attempts: u32,

    /// Reconnect after the peer closes the connection.
    ///
    /// Off by default: a peer close leaves the link disconnected.
    pub reconnect_on_peer_close: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl LinkConfig {
    /// Creates a configuration with default settings.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            initial_reconnect_delay: DEFAULT_INITIAL_RECONNECT_DELAY,
            max_reconnect_delay: DEFAULT_MAX_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect_on_peer_close: false,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl LinkConfig {
    /// Sets the heartbeat interval.
    #[inline]
    #[must_use]
    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Sets the first reconnect delay.
    #[inline]
    #[must_use]
    pub fn with_initial_reconnect_delay(mut self, delay: Duration) -> Self {
        self.initial_reconnect_delay = delay;
        self
    }

    /// Sets the reconnect delay cap.
    #[inline]
    #[must_use]
    pub fn with_max_reconnect_delay(mut self, delay: Duration) -> Self {
        self.max_reconnect_delay = delay;
        self
    }

    /// Sets the reconnect budget.
    #[inline]
    #[must_use]
    pub fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Enables or disables reconnect after a peer close.
    #[inline]
    #[must_use]
    pub fn with_reconnect_on_peer_close(mut self, enabled: bool) -> Self {
        self.reconnect_on_peer_close = enabled;
        self
    }
}

// ============================================================================
// Validation
// ============================================================================

impl LinkConfig {
    /// Checks the configuration for unusable values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if an interval is zero or the initial delay
    /// exceeds the cap.
    pub fn validate(&self) -> Result<()> {
        if self.heartbeat_interval.is_zero() {
            return Err(Error::config("Heartbeat interval must be non-zero"));
        }

        if self.initial_reconnect_delay.is_zero() {
            return Err(Error::config("Initial reconnect delay must be non-zero"));
        }

        if self.initial_reconnect_delay > self.max_reconnect_delay {
            return Err(Error::config(format!(
                "Initial reconnect delay ({}ms) exceeds max delay ({}ms)",
                self.initial_reconnect_delay.as_millis(),
                self.max_reconnect_delay.as_millis()
            )));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(config.initial_reconnect_delay, Duration::from_millis(1000));
        assert_eq!(config.max_reconnect_delay, Duration::from_millis(30_000));
        assert_eq!(config.max_reconnect_attempts, 10);
        assert!(!config.reconnect_on_peer_close);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let config = LinkConfig::new()
            .with_heartbeat_interval(Duration::from_secs(5))
            .with_initial_reconnect_delay(Duration::from_millis(200))
            .with_max_reconnect_delay(Duration::from_secs(3))
            .with_max_reconnect_attempts(4)
            .with_reconnect_on_peer_close(true);

        assert_eq!(config.heartbeat_interval, Duration::from_secs(5));
        assert_eq!(config.initial_reconnect_delay, Duration::from_millis(200));
        assert_eq!(config.max_reconnect_delay, Duration::from_secs(3));
        assert_eq!(config.max_reconnect_attempts, 4);
        assert!(config.reconnect_on_peer_close);
    }

    #[test]
    fn test_zero_heartbeat_rejected() {
        let result = LinkConfig::new()
            .with_heartbeat_interval(Duration::ZERO)
            .validate();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Heartbeat"));
    }

    #[test]
    fn test_initial_above_max_rejected() {
        let result = LinkConfig::new()
            .with_initial_reconnect_delay(Duration::from_secs(60))
            .validate();
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_zero_attempts_allowed() {
        // Zero attempts means the first failure is terminal
        let config = LinkConfig::new().with_max_reconnect_attempts(0);
        assert!(config.validate().is_ok());
    }
}
