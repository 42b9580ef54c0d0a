//! Outbound control commands.
//!
//! Commands are serialized as a flat JSON object tagged by `command`:
//!
//! ```json
//! { "command": "toggle_face_detection", "enabled": true }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::to_string;

use crate::error::Result;

// ============================================================================
// Command
// ============================================================================

/// Control command sent to the remote robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Turn face detection on the camera stream on or off.
    ToggleFaceDetection {
        /// Requested detection state.
        enabled: bool,
    },
}

impl Command {
    /// Creates a face-detection toggle command.
    #[inline]
    #[must_use]
    pub const fn toggle_face_detection(enabled: bool) -> Self {
        Self::ToggleFaceDetection { enabled }
    }

    /// Returns the wire name of the command.
    #[inline]
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ToggleFaceDetection { .. } => "toggle_face_detection",
        }
    }

    /// Serializes the command to its wire text form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`](crate::Error::Json) if serialization fails.
    pub fn to_wire(&self) -> Result<String> {
        Ok(to_string(self)?)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{Value, json};

    #[test]
    fn test_toggle_wire_format() {
        let wire = Command::toggle_face_detection(true)
            .to_wire()
            .expect("serialize");
        let value: Value = serde_json::from_str(&wire).expect("valid json");

        assert_eq!(
            value,
            json!({ "command": "toggle_face_detection", "enabled": true })
        );
    }

    #[test]
    fn test_toggle_disabled() {
        let wire = Command::toggle_face_detection(false)
            .to_wire()
            .expect("serialize");
        assert!(wire.contains("\"enabled\":false"));
    }

    #[test]
    fn test_command_name_matches_tag() {
        let command = Command::toggle_face_detection(true);
        let wire = command.to_wire().expect("serialize");
        assert!(wire.contains(command.name()));
    }

    #[test]
    fn test_parse_command() {
        let command: Command =
            serde_json::from_str(r#"{"command":"toggle_face_detection","enabled":false}"#)
                .expect("parse");
        assert_eq!(command, Command::toggle_face_detection(false));
    }
}
