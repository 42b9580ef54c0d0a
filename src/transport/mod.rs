//! Duplex transport layer.
//!
//! This module handles the physical connection between the local end (Rust)
//! and the robot's camera endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐                         ┌──────────────────┐
//! │  ConnectionManager   │                         │  Robot backend   │
//! │                      │        WebSocket        │                  │
//! │  WsTransport         │◄───────────────────────►│  /api/ws/camera/ │
//! │  → socket task       │   text status / frames  │     {target}     │
//! └──────────────────────┘                         └──────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. [`camera_url`] - Derive the endpoint from the page origin
//! 2. [`Transport::connect`] - Spawn a socket task for one generation
//! 3. [`TransportEvent`]s - `Open`, `Message`, `Error`, `Close` via [`EventSink`]
//! 4. [`Transport::close`] - Send a close frame and stop the task
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | WebSocket transport and socket event loop |
//! | `endpoint` | Camera URL derivation |
//! | `traits` | Transport and connector traits |

// ============================================================================
// Submodules
// ============================================================================

/// WebSocket transport and socket event loop.
pub mod connection;

/// Camera endpoint URL derivation.
pub mod endpoint;

/// Transport and connector traits.
pub mod traits;

#[cfg(test)]
pub(crate) mod mock;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::{ABNORMAL_CLOSURE, WsConnector, WsTransport};
pub use endpoint::camera_url;
pub use traits::{Connector, EventSink, Payload, TaggedEvents, Transport, TransportEvent};
