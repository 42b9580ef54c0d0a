//! Scripted in-memory transport for manager tests.

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use url::Url;

use super::traits::{Connector, EventSink, Payload, Transport, TransportEvent};

#[derive(Default)]
struct MockState {
    sink: Option<EventSink>,
    connected: bool,
    connects: usize,
    sent: Vec<Payload>,
    closes: Vec<(u16, String)>,
}

/// Transport whose events are driven by the test.
///
/// Clones share state: hand one to the manager, keep one to script events.
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn emit(&self, event: TransportEvent) {
        let sink = self.state.lock().sink.clone();
        if let Some(sink) = sink {
            sink.emit(event);
        }
    }

    /// Completes the pending connect.
    pub(crate) fn open(&self) {
        self.state.lock().connected = true;
        self.emit(TransportEvent::Open);
    }

    /// Fails the current socket with an error.
    pub(crate) fn fail(&self, reason: &str) {
        self.state.lock().connected = false;
        self.emit(TransportEvent::Error {
            reason: reason.to_owned(),
        });
    }

    /// Peer closes the current socket.
    pub(crate) fn peer_close(&self, code: u16, reason: &str) {
        self.state.lock().connected = false;
        self.emit(TransportEvent::Close {
            code,
            reason: reason.to_owned(),
        });
    }

    /// Connection dies without any event.
    pub(crate) fn drop_silently(&self) {
        self.state.lock().connected = false;
    }

    pub(crate) fn push_text(&self, text: &str) {
        self.emit(TransportEvent::Message(Payload::Text(text.to_owned())));
    }

    pub(crate) fn push_binary(&self, data: &'static [u8]) {
        self.emit(TransportEvent::Message(Payload::Binary(Bytes::from_static(
            data,
        ))));
    }

    pub(crate) fn connects(&self) -> usize {
        self.state.lock().connects
    }

    pub(crate) fn sent(&self) -> Vec<Payload> {
        self.state.lock().sent.clone()
    }

    pub(crate) fn closes(&self) -> Vec<(u16, String)> {
        self.state.lock().closes.clone()
    }
}

impl Transport for MockTransport {
    fn connect(&self, sink: EventSink) {
        let mut state = self.state.lock();
        state.connects += 1;
        state.connected = false;
        state.sink = Some(sink);
    }

    fn send(&self, payload: Payload) {
        let mut state = self.state.lock();
        if state.connected {
            state.sent.push(payload);
        }
    }

    fn close(&self, code: u16, reason: &str) {
        let mut state = self.state.lock();
        state.connected = false;
        state.closes.push((code, reason.to_owned()));
    }

    fn is_connected(&self) -> bool {
        self.state.lock().connected
    }
}

/// Connector handing out clones of one shared mock.
#[derive(Clone, Default)]
pub(crate) struct MockConnector {
    pub(crate) transport: MockTransport,
    pub(crate) urls: Arc<Mutex<Vec<Url>>>,
}

impl Connector for MockConnector {
    type Transport = MockTransport;

    fn transport(&self, url: &Url) -> MockTransport {
        self.urls.lock().push(url.clone());
        self.transport.clone()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
