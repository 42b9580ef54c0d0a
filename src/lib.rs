//! Robot Camera Link - Live camera and event connection to a remote robot.
//!
//! This library keeps a WebSocket connection to a robot's camera endpoint
//! alive, decodes the frames and detection status it streams, and sends
//! control commands back.
//!
//! # Architecture
//!
//! The link is split in two layers:
//!
//! - **Transport**: One physical duplex socket. Raises `Open`, `Message`,
//!   `Error` and `Close` events
//! - **Connection manager**: One tokio task per link. Adds a heartbeat,
//!   exponential-backoff reconnect, inbound decoding and outbound commands
//!
//! Key design principles:
//!
//! - Lifecycle rules live in a pure state machine ([`LinkMachine`])
//! - Every timer and socket is tagged with a generation; stale firings are dropped
//! - Owners hold a [`LinkRegistry`] instead of a process-wide singleton
//! - Errors reach the owner through [`LinkHandler`], never as panics
//!
//! # Quick Start
//!
//! ```no_run
//! use robot_camera_link::{LinkCallbacks, LinkConfig, LinkRegistry, Result, TargetId};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let origin = Url::parse("http://robot.local:8080")?;
//!     let registry = LinkRegistry::new(origin, LinkConfig::default())?;
//!
//!     let callbacks = LinkCallbacks::new()
//!         .with_open(|| println!("camera online"))
//!         .with_error(|err| eprintln!("camera error: {err}"));
//!
//!     let link = registry.create(TargetId::new("RB-0042")?, callbacks)?;
//!     let mut frames = link.store().subscribe_frames();
//!
//!     while frames.changed().await.is_ok() {
//!         if let Some(frame) = frames.borrow_and_update().clone() {
//!             println!("frame #{} ({} bytes)", frame.seq(), frame.len());
//!         }
//!     }
//!
//!     registry.clear_all().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`link`] | State machine, manager task and handle |
//! | [`protocol`] | Wire messages |
//! | [`registry`] | Link ownership per UI session |
//! | [`store`] | Observable detection flag and latest frame |
//! | [`transport`] | WebSocket transport layer |
//!
//! # Features
//!
//! - `native-tls` / `rustls-tls`: enable `wss://` endpoints

// ============================================================================
// Modules
// ============================================================================

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing targets, link ids and generations.
pub mod identifiers;

/// Connection lifecycle management.
///
/// - [`LinkMachine`] - Pure state machine
/// - [`ConnectionManager`] - Actor task driving one link
/// - [`LinkHandle`] - Owner-side handle
pub mod link;

/// WebSocket protocol message types.
pub mod protocol;

/// Link ownership per UI session.
pub mod registry;

/// Observable state fed by a link.
pub mod store;

/// WebSocket transport layer.
///
/// Transport trait, WebSocket implementation and endpoint derivation.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{Generation, LinkId, TargetId};

// Link types
pub use link::{
    ConnectionManager, LinkCallbacks, LinkConfig, LinkEvent, LinkHandle, LinkHandler,
    LinkMachine, LinkState, LinkStatus,
};

// Protocol types
pub use protocol::{Command, InboundEvent};

// Registry types
pub use registry::{ExistingPolicy, LinkRegistry, RegistryMode};

// Store types
pub use store::{Frame, LinkStore};

// Transport types
pub use transport::{Connector, Payload, Transport, TransportEvent, WsConnector, WsTransport};
