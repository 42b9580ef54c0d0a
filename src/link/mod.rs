//! Connection lifecycle management.
//!
//! A link keeps one camera connection alive: it watches liveness with a
//! heartbeat, reconnects with exponential backoff, decodes inbound
//! payloads into the [`LinkStore`](crate::LinkStore) and sends control
//! commands.
//!
//! # Lifecycle
//!
//! ```text
//!            Start            Open
//!   Idle ──────────► Connecting ──────► Connected
//!                        ▲                  │ error / timeout / peer close
//!                        │ timer fires      ▼
//!                   Reconnecting ◄──── Disconnected ────► Failed
//!                                 budget left      budget spent
//!
//!   any ── close ──► Closed          any ── reconnect() ──► Reconnecting
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `backoff` | Reconnect delay policy |
//! | `config` | Heartbeat and reconnect settings |
//! | `handler` | Owner callbacks and events |
//! | `machine` | Pure state machine |
//! | `manager` | Actor task and handle |
//! | `timer` | Generation-guarded alarms |

// ============================================================================
// Submodules
// ============================================================================

/// Reconnect delay policy.
pub mod backoff;

/// Heartbeat and reconnect settings.
pub mod config;

/// Owner callbacks and events.
pub mod handler;

/// Pure lifecycle state machine.
pub mod machine;

/// Actor task and handle.
pub mod manager;

/// Generation-guarded alarms.
pub mod timer;

// ============================================================================
// Re-exports
// ============================================================================

pub use backoff::Backoff;
pub use config::LinkConfig;
pub use handler::{LinkCallbacks, LinkEvent, LinkHandler, NORMAL_CLOSURE};
pub use machine::{Effect, Input, LinkMachine, LinkState, LinkStatus};
pub use manager::{ConnectionManager, LinkHandle, NORMAL_CLOSURE_REASON};
pub use timer::{Alarm, TimerFired, TimerKind};
