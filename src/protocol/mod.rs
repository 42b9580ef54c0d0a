//! WebSocket protocol message types.
//!
//! This module defines the application messages exchanged with the robot.
//!
//! # Protocol Overview
//!
//! | Message | Direction | Wire form |
//! |---------|-----------|-----------|
//! | [`Command`] | Local → Robot | JSON text tagged by `command` |
//! | [`InboundEvent::Status`] | Robot → Local | JSON text with a `status` string |
//! | [`InboundEvent::Frame`] | Robot → Local | Binary image bytes |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Outbound control commands |
//! | `event` | Inbound payload decoding |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound control commands.
pub mod command;

/// Inbound payload decoding.
pub mod event;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::Command;
pub use event::InboundEvent;
