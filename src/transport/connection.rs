//! WebSocket transport and socket event loop.
//!
//! Each call to [`WsTransport::connect`] spawns one tokio task that owns the
//! physical socket. The task handles:
//!
//! - The client handshake
//! - Incoming text/binary messages, forwarded as [`TransportEvent`]s
//! - Outgoing payloads and the close request from the owning transport
//!
//! Events follow the browser WebSocket contract: a failed handshake or an
//! abnormal drop raises `Error` followed by `Close` with code 1006.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tracing::{debug, trace, warn};
use url::Url;

use super::traits::{Connector, EventSink, Payload, Transport, TransportEvent};

// ============================================================================
// Constants
// ============================================================================

/// Close code reported when the socket ends without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// Close code used when the peer sends a close frame without a code.
const NO_STATUS_RECEIVED: u16 = 1005;

// ============================================================================
// SocketCommand
// ============================================================================

/// Internal commands for the socket task.
enum SocketCommand {
    /// Send a payload.
    Send(Payload),
    /// Send a close frame and stop.
    Close { code: u16, reason: String },
}

// ============================================================================
// Socket
// ============================================================================

/// Control side of one physical socket task.
struct Socket {
    /// Channel for sending commands to the socket task.
    command_tx: mpsc::UnboundedSender<SocketCommand>,
    /// Set while the handshake is done and no close has been seen.
    open: Arc<AtomicBool>,
}

impl Socket {
    /// Asks the socket task to close and marks the socket as not open.
    fn shutdown(&self, code: u16, reason: &str) {
        self.open.store(false, Ordering::SeqCst);
        let _ = self.command_tx.send(SocketCommand::Close {
            code,
            reason: reason.to_owned(),
        });
    }
}

// ============================================================================
// WsTransport
// ============================================================================

/// WebSocket [`Transport`] built on `tokio-tungstenite`.
///
/// Holds at most one physical socket. Reconnecting replaces it.
///
/// # Thread Safety
///
/// `WsTransport` is `Send + Sync`. All operations are non-blocking; socket
/// I/O happens on the spawned task.
pub struct WsTransport {
    /// Endpoint URL.
    url: Url,
    /// Current socket, if any.
    socket: Mutex<Option<Socket>>,
}

impl WsTransport {
    /// Creates a transport for `url`. Does not connect.
    #[inline]
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self {
            url,
            socket: Mutex::new(None),
        }
    }

    /// Returns the endpoint URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Socket task: handshake, then pump messages until closed.
    async fn run_socket(
        url: Url,
        mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
        open: Arc<AtomicBool>,
        sink: EventSink,
    ) {
        let generation = sink.generation();

        let ws_stream = match connect_async(url.as_str()).await {
            Ok((ws_stream, _response)) => ws_stream,
            Err(e) => {
                debug!(%url, %generation, error = %e, "WebSocket handshake failed");
                sink.emit(TransportEvent::Error {
                    reason: e.to_string(),
                });
                sink.emit(TransportEvent::Close {
                    code: ABNORMAL_CLOSURE,
                    reason: String::new(),
                });
                return;
            }
        };

        // A close may have been requested while the handshake was in flight
        if let Ok(SocketCommand::Close { .. }) = command_rx.try_recv() {
            debug!(%generation, "Socket closed before open");
            return;
        }

        open.store(true, Ordering::SeqCst);
        sink.emit(TransportEvent::Open);
        debug!(%url, %generation, "WebSocket open");

        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming messages from the robot
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            sink.emit(TransportEvent::Message(Payload::Text(text.as_str().to_owned())));
                        }

                        Some(Ok(Message::Binary(data))) => {
                            sink.emit(TransportEvent::Message(Payload::Binary(data)));
                        }

                        Some(Ok(Message::Close(frame))) => {
                            open.store(false, Ordering::SeqCst);
                            let (code, reason) = match frame {
                                Some(frame) => (u16::from(frame.code), frame.reason.as_str().to_owned()),
                                None => (NO_STATUS_RECEIVED, String::new()),
                            };
                            debug!(%generation, code, "WebSocket closed by remote");
                            // Flush the queued close reply to finish the handshake
                            if let Err(e) = ws_write.close().await {
                                debug!(%generation, error = %e, "Close reply not sent");
                            }
                            sink.emit(TransportEvent::Close { code, reason });
                            break;
                        }

                        Some(Err(e)) => {
                            open.store(false, Ordering::SeqCst);
                            warn!(%generation, error = %e, "WebSocket error");
                            sink.emit(TransportEvent::Error { reason: e.to_string() });
                            sink.emit(TransportEvent::Close {
                                code: ABNORMAL_CLOSURE,
                                reason: String::new(),
                            });
                            break;
                        }

                        None => {
                            open.store(false, Ordering::SeqCst);
                            debug!(%generation, "WebSocket stream ended");
                            sink.emit(TransportEvent::Close {
                                code: ABNORMAL_CLOSURE,
                                reason: String::new(),
                            });
                            break;
                        }

                        // Ping/Pong handled by tungstenite
                        _ => {}
                    }
                }

                // Commands from the transport handle
                command = command_rx.recv() => {
                    match command {
                        Some(SocketCommand::Send(payload)) => {
                            let message = match payload {
                                Payload::Text(text) => Message::Text(text.into()),
                                Payload::Binary(data) => Message::Binary(data),
                            };
                            if let Err(e) = ws_write.send(message).await {
                                warn!(%generation, error = %e, "Failed to send message");
                            }
                        }

                        Some(SocketCommand::Close { code, reason }) => {
                            open.store(false, Ordering::SeqCst);
                            let frame = CloseFrame {
                                code: CloseCode::from(code),
                                reason: reason.clone().into(),
                            };
                            if let Err(e) = ws_write.send(Message::Close(Some(frame))).await {
                                debug!(%generation, error = %e, "Close frame not sent");
                            }
                            sink.emit(TransportEvent::Close { code, reason });
                            break;
                        }

                        None => {
                            open.store(false, Ordering::SeqCst);
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        trace!(%generation, "Socket task terminated");
    }
}

impl Transport for WsTransport {
    fn connect(&self, sink: EventSink) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(false));

        let previous = self.socket.lock().replace(Socket {
            command_tx,
            open: Arc::clone(&open),
        });

        if let Some(previous) = previous {
            debug!("Replacing previous socket");
            previous.shutdown(1000, "Reconnecting");
        }

        tokio::spawn(Self::run_socket(self.url.clone(), command_rx, open, sink));
    }

    fn send(&self, payload: Payload) {
        let socket = self.socket.lock();
        if let Some(socket) = socket.as_ref()
            && socket.open.load(Ordering::SeqCst)
        {
            let _ = socket.command_tx.send(SocketCommand::Send(payload));
        }
    }

    fn close(&self, code: u16, reason: &str) {
        if let Some(socket) = self.socket.lock().take() {
            socket.shutdown(code, reason);
        }
    }

    fn is_connected(&self) -> bool {
        self.socket
            .lock()
            .as_ref()
            .is_some_and(|socket| socket.open.load(Ordering::SeqCst))
    }
}

impl Drop for WsTransport {
    fn drop(&mut self) {
        if let Some(socket) = self.socket.get_mut().take() {
            socket.shutdown(1001, "Going away");
        }
    }
}

// ============================================================================
// WsConnector
// ============================================================================

/// [`Connector`] producing [`WsTransport`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Transport = WsTransport;

    fn transport(&self, url: &Url) -> WsTransport {
        WsTransport::new(url.clone())
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

// ============================================================================
// Tests
// ============================================================================
