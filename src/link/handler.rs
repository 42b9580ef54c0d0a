//! Owner-facing callbacks and events.
//!
//! A link reports to its owner through a [`LinkHandler`]. Implement the trait
//! directly, pass a [`LinkCallbacks`] built from closures, or pass an
//! `mpsc::UnboundedSender<LinkEvent>` to receive events on a channel.
//!
//! | Slot | Fired when |
//! |------|------------|
//! | `on_open` | Transport opened |
//! | `on_close` | Transport closed (peer close or explicit close of a live socket) |
//! | `on_send` | Command handed to the transport |
//! | `on_timeout` | Heartbeat found the transport disconnected |
//! | `on_error` | Transport error, open failure, or reconnect budget exhausted |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::error::Error;
use crate::protocol::Command;

// ============================================================================
// Constants
// ============================================================================

/// WebSocket close code for a normal closure.
pub const NORMAL_CLOSURE: u16 = 1000;

// ============================================================================
// LinkHandler
// ============================================================================

/// Receives link lifecycle notifications.
///
/// Called from the manager task. Implementations should return quickly.
pub trait LinkHandler: Send + Sync + 'static {
    /// The transport opened.
    fn on_open(&self) {}

    /// The transport closed.
    fn on_close(&self, _code: u16, _reason: &str) {}

    /// A command was handed to the transport.
    fn on_send(&self, _command: &Command) {}

    /// The heartbeat found the transport disconnected.
    fn on_timeout(&self) {}

    /// A connection error occurred.
    fn on_error(&self, _error: Arc<Error>) {}
}

/// Handler that ignores everything.
impl LinkHandler for () {}

impl<H: LinkHandler + ?Sized> LinkHandler for Arc<H> {
    fn on_open(&self) {
        (**self).on_open();
    }

    fn on_close(&self, code: u16, reason: &str) {
        (**self).on_close(code, reason);
    }

    fn on_send(&self, command: &Command) {
        (**self).on_send(command);
    }

    fn on_timeout(&self) {
        (**self).on_timeout();
    }

    fn on_error(&self, error: Arc<Error>) {
        (**self).on_error(error);
    }
}

// ============================================================================
// LinkEvent
// ============================================================================

/// Link notification as a value.
#[derive(Debug, Clone)]
pub enum LinkEvent {
    /// The transport opened.
    Opened,
    /// The transport closed.
    Closed {
        /// WebSocket close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// A command was handed to the transport.
    CommandSent(Command),
    /// The heartbeat found the transport disconnected.
    TimedOut,
    /// A connection error occurred.
    Error(Arc<Error>),
}

impl LinkEvent {
    /// Returns the event name for logging.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed { .. } => "closed",
            Self::CommandSent(_) => "command_sent",
            Self::TimedOut => "timed_out",
            Self::Error(_) => "error",
        }
    }

    /// Converts failure events into an error.
    ///
    /// `TimedOut` becomes [`Error::HeartbeatTimeout`] with the given interval.
    /// `Closed` with a code other than 1000 becomes [`Error::TransportClosed`].
    /// Other events return `None`.
    #[must_use]
    pub fn to_error(&self, heartbeat_interval_ms: u64) -> Option<Error> {
        match self {
            Self::TimedOut => Some(Error::heartbeat_timeout(heartbeat_interval_ms)),
            Self::Closed { code, reason } if *code != NORMAL_CLOSURE => {
                Some(Error::transport_closed(*code, reason.clone()))
            }
            _ => None,
        }
    }

    /// Delivers this event to a handler.
    pub fn dispatch(self, handler: &dyn LinkHandler) {
        match self {
            Self::Opened => handler.on_open(),
            Self::Closed { code, reason } => handler.on_close(code, &reason),
            Self::CommandSent(command) => handler.on_send(&command),
            Self::TimedOut => handler.on_timeout(),
            Self::Error(error) => handler.on_error(error),
        }
    }
}

/// Forwards every notification into a channel.
///
/// Events are dropped once the receiver is gone.
impl LinkHandler for mpsc::UnboundedSender<LinkEvent> {
    fn on_open(&self) {
        let _ = self.send(LinkEvent::Opened);
    }

    fn on_close(&self, code: u16, reason: &str) {
        let _ = self.send(LinkEvent::Closed {
            code,
            reason: reason.to_owned(),
        });
    }

    fn on_send(&self, command: &Command) {
        let _ = self.send(LinkEvent::CommandSent(*command));
    }

    fn on_timeout(&self) {
        let _ = self.send(LinkEvent::TimedOut);
    }

    fn on_error(&self, error: Arc<Error>) {
        let _ = self.send(LinkEvent::Error(error));
    }
}

// ============================================================================
// LinkCallbacks
// ============================================================================

type Callback<A> = Box<dyn Fn(A) + Send + Sync>;

/// Closure-based handler. Unset slots do nothing.
///
/// ```ignore
/// let callbacks = LinkCallbacks::new()
///     .with_open(|| tracing::info!("camera online"))
///     .with_error(|err| tracing::warn!(%err, "camera link error"));
/// ```
#[derive(Default)]
pub struct LinkCallbacks {
    open: Option<Callback<()>>,
    close: Option<Box<dyn Fn(u16, &str) + Send + Sync>>,
    send: Option<Box<dyn Fn(&Command) + Send + Sync>>,
    timeout: Option<Callback<()>>,
    error: Option<Callback<Arc<Error>>>,
}

impl LinkCallbacks {
    /// Creates callbacks with every slot empty.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the open callback.
    #[must_use]
    pub fn with_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.open = Some(Box::new(move |()| f()));
        self
    }

    /// Sets the close callback.
    #[must_use]
    pub fn with_close(mut self, f: impl Fn(u16, &str) + Send + Sync + 'static) -> Self {
        self.close = Some(Box::new(f));
        self
    }

    /// Sets the send-ack callback.
    #[must_use]
    pub fn with_send(mut self, f: impl Fn(&Command) + Send + Sync + 'static) -> Self {
        self.send = Some(Box::new(f));
        self
    }

    /// Sets the heartbeat timeout callback.
    #[must_use]
    pub fn with_timeout(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.timeout = Some(Box::new(move |()| f()));
        self
    }

    /// Sets the error callback.
    #[must_use]
    pub fn with_error(mut self, f: impl Fn(Arc<Error>) + Send + Sync + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl LinkHandler for LinkCallbacks {
    fn on_open(&self) {
        if let Some(f) = &self.open {
            f(());
        }
    }

    fn on_close(&self, code: u16, reason: &str) {
        if let Some(f) = &self.close {
            f(code, reason);
        }
    }

    fn on_send(&self, command: &Command) {
        if let Some(f) = &self.send {
            f(command);
        }
    }

    fn on_timeout(&self) {
        if let Some(f) = &self.timeout {
            f(());
        }
    }

    fn on_error(&self, error: Arc<Error>) {
        if let Some(f) = &self.error {
            f(error);
        }
    }
}

impl fmt::Debug for LinkCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkCallbacks")
            .field("open", &self.open.is_some())
            .field("close", &self.close.is_some())
            .field("send", &self.send.is_some())
            .field("timeout", &self.timeout.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
