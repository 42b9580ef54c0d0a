//! Transport trait abstraction for pluggable duplex connections.

// ============================================================================
// Imports
// ============================================================================

use bytes::Bytes;
use tokio::sync::mpsc;
use url::Url;

use crate::identifiers::Generation;

// ============================================================================
// Payload
// ============================================================================

/// One message carried by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// UTF-8 text message.
    Text(String),
    /// Binary message.
    Binary(Bytes),
}

// ============================================================================
// TransportEvent
// ============================================================================

/// Low-level events raised by a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is open.
    Open,
    /// A message arrived.
    Message(Payload),
    /// The connection failed or broke.
    Error {
        /// Description of the failure.
        reason: String,
    },
    /// The connection is closed.
    Close {
        /// WebSocket close code (1006 for abnormal closure).
        code: u16,
        /// Close reason.
        reason: String,
    },
}

// ============================================================================
// EventSink
// ============================================================================

/// Generation-tagged event stream from one transport.
pub type TaggedEvents = mpsc::UnboundedReceiver<(Generation, TransportEvent)>;

/// Delivery end for transport events.
///
/// Each `connect` call receives its own sink, stamped with the generation it
/// was opened under, so the receiver can discard events from older sockets.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: Generation,
    tx: mpsc::UnboundedSender<(Generation, TransportEvent)>,
}

impl EventSink {
    /// Creates a sink for the given generation.
    #[inline]
    #[must_use]
    pub fn new(
        generation: Generation,
        tx: mpsc::UnboundedSender<(Generation, TransportEvent)>,
    ) -> Self {
        Self { generation, tx }
    }

    /// Returns the generation this sink is stamped with.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Delivers an event. Returns `false` once the receiver is gone.
    pub fn emit(&self, event: TransportEvent) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }
}

// ============================================================================
// Transport
// ============================================================================

/// One physical duplex connection to a single URL.
///
/// Implementations hold at most one live connection. Calling
/// [`connect`](Transport::connect) again replaces the previous one.
pub trait Transport: Send + Sync + 'static {
    /// Starts opening the connection. Events are reported through `sink`.
    fn connect(&self, sink: EventSink);

    /// Sends a payload. Does nothing if the connection is not open.
    fn send(&self, payload: Payload);

    /// Closes the connection with a close code and reason.
    fn close(&self, code: u16, reason: &str);

    /// Returns `true` while the connection is open.
    fn is_connected(&self) -> bool;
}

// ============================================================================
// Connector
// ============================================================================

/// Factory for creating transports.
pub trait Connector: Send + Sync + 'static {
    /// The transport type this connector produces.
    type Transport: Transport;

    /// Creates a transport bound to `url`. Does not connect.
    fn transport(&self, url: &Url) -> Self::Transport;

    /// Human-readable name for this connector.
    fn name(&self) -> &'static str;
}

// ============================================================================
// Tests
// ============================================================================
