//! Error types for the camera link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use robot_camera_link::{Command, LinkHandle, Result};
//!
//! async fn enable(link: &LinkHandle) -> Result<()> {
//!     link.send_command(Command::toggle_face_detection(true)).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidTarget`] |
//! | Connection | [`Error::TransportOpenFailure`], [`Error::Transport`], [`Error::TransportClosed`], [`Error::HeartbeatTimeout`], [`Error::MaxReconnectAttemptsExceeded`], [`Error::NotConnected`] |
//! | Lifecycle | [`Error::SingletonAlreadyInitialized`], [`Error::LinkStopped`] |
//! | External | [`Error::Json`], [`Error::Url`], [`Error::Image`] |
//!
//! Connection errors never escape the manager's event loop. They reach the
//! owner through [`LinkHandler::on_error`](crate::LinkHandler::on_error).

// ============================================================================
// Imports
// ============================================================================

use std::result::Result as StdResult;

use thiserror::Error;

use crate::identifiers::TargetId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when link configuration or the page origin is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Target identifier is not usable.
    #[error("Invalid target identifier: {value:?}")]
    InvalidTarget {
        /// The rejected value.
        value: String,
    },

    // ========================================================================
    // Connection Errors
    // ========================================================================
    /// The transport could not establish a connection.
    #[error("Failed to open transport: {reason}")]
    TransportOpenFailure {
        /// Description of the failure.
        reason: String,
    },

    /// Transport-level error on an established connection.
    #[error("Transport error: {reason}")]
    Transport {
        /// Description of the failure.
        reason: String,
    },

    /// The peer closed the connection.
    #[error("Transport closed ({code}): {reason}")]
    TransportClosed {
        /// WebSocket close code.
        code: u16,
        /// Close reason sent by the peer.
        reason: String,
    },

    /// The local liveness check found the transport disconnected.
    #[error("Heartbeat timeout after {interval_ms}ms")]
    HeartbeatTimeout {
        /// Heartbeat interval in milliseconds.
        interval_ms: u64,
    },

    /// Reconnect budget exhausted. Terminal until a manual reconnect.
    #[error("Max reconnect attempts reached ({attempts})")]
    MaxReconnectAttemptsExceeded {
        /// Attempts made before giving up.
        attempts: u32,
    },

    /// A command was sent while the transport is not connected.
    #[error("Link is not connected")]
    NotConnected,

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// The registry already holds an active link.
    #[error("A link is already active for target {active}")]
    SingletonAlreadyInitialized {
        /// Target of the link that is already active.
        active: TargetId,
    },

    /// The manager task has stopped; the handle is dead.
    #[error("Link manager stopped")]
    LinkStopped,

    // ========================================================================
    // External Errors
    // ========================================================================
    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Image decoding error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid target error.
    #[inline]
    pub fn invalid_target(value: impl Into<String>) -> Self {
        Self::InvalidTarget {
            value: value.into(),
        }
    }

    /// Creates a transport open failure.
    #[inline]
    pub fn transport_open_failure(reason: impl Into<String>) -> Self {
        Self::TransportOpenFailure {
            reason: reason.into(),
        }
    }

    /// Creates a mid-session transport error.
    #[inline]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport {
            reason: reason.into(),
        }
    }

    /// Creates a transport closed error.
    #[inline]
    pub fn transport_closed(code: u16, reason: impl Into<String>) -> Self {
        Self::TransportClosed {
            code,
            reason: reason.into(),
        }
    }

    /// Creates a heartbeat timeout error.
    #[inline]
    pub fn heartbeat_timeout(interval_ms: u64) -> Self {
        Self::HeartbeatTimeout { interval_ms }
    }

    /// Creates a max reconnect attempts error.
    #[inline]
    pub fn max_reconnect_attempts(attempts: u32) -> Self {
        Self::MaxReconnectAttemptsExceeded { attempts }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::TransportOpenFailure { .. }
                | Self::Transport { .. }
                | Self::TransportClosed { .. }
                | Self::HeartbeatTimeout { .. }
                | Self::MaxReconnectAttemptsExceeded { .. }
                | Self::NotConnected
        )
    }

    /// Returns `true` if the link will not recover on its own.
    ///
    /// The UI should show a persistent "connection lost" indicator.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::MaxReconnectAttemptsExceeded { .. } | Self::LinkStopped
        )
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors are followed by an automatic reconnect attempt.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransportOpenFailure { .. }
                | Self::Transport { .. }
                | Self::HeartbeatTimeout { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
