//! Inbound message decoding.
//!
//! The robot sends two payload shapes:
//!
//! | Payload | Meaning |
//! |---------|---------|
//! | Text JSON with a `status` string | Detection state report |
//! | Binary | One encoded camera frame |
//!
//! Status strings are substring-matched: anything containing `enabled`
//! reports detection on, anything containing `disabled` reports it off.
//! Every other text payload is ignored.

// ============================================================================
// Imports
// ============================================================================

use bytes::Bytes;
use serde_json::{Value, from_str};

use crate::error::Result;
use crate::transport::Payload;

// ============================================================================
// Constants
// ============================================================================

/// Substring marking detection as on.
const STATUS_ENABLED: &str = "enabled";

/// Substring marking detection as off.
const STATUS_DISABLED: &str = "disabled";

// ============================================================================
// InboundEvent
// ============================================================================

/// Decoded inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Detection state reported by the robot.
    Status {
        /// Whether detection is running.
        enabled: bool,
    },

    /// Raw frame bytes, usually JPEG.
    Frame(Bytes),
}

impl InboundEvent {
    /// Decodes a transport payload.
    ///
    /// Returns `Ok(None)` for text that carries no recognizable status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if a text payload is not JSON.
    pub fn decode(payload: Payload) -> Result<Option<Self>> {
        match payload {
            Payload::Text(text) => Self::decode_status(&text),
            Payload::Binary(data) => Ok(Some(Self::Frame(data))),
        }
    }

    /// Decodes a text status payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if the text is not JSON.
    pub fn decode_status(text: &str) -> Result<Option<Self>> {
        let value: Value = from_str(text)?;

        let Some(status) = value.get("status").and_then(Value::as_str) else {
            return Ok(None);
        };

        if status.contains(STATUS_ENABLED) {
            Ok(Some(Self::Status { enabled: true }))
        } else if status.contains(STATUS_DISABLED) {
            Ok(Some(Self::Status { enabled: false }))
        } else {
            Ok(None)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
