//! Connection manager actor and its handle.
//!
//! Each link runs in one tokio task that owns the [`LinkMachine`], the
//! transport and both alarms. The task selects over three inputs:
//!
//! | Channel | Source |
//! |---------|--------|
//! | control | [`LinkHandle`] calls |
//! | transport | generation-tagged [`TransportEvent`]s |
//! | timers | generation-tagged [`TimerFired`] messages |
//!
//! Everything that touches link state happens inside that task, so the
//! state needs no lock.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, trace, warn};
use url::Url;

use super::config::LinkConfig;
use super::handler::{LinkEvent, LinkHandler, NORMAL_CLOSURE};
use super::machine::{Effect, Input, LinkMachine, LinkState, LinkStatus};
use super::timer::{Alarm, TimerFired, TimerKind};
use crate::error::{Error, Result};
use crate::identifiers::{Generation, LinkId, TargetId};
use crate::protocol::{Command, InboundEvent};
use crate::store::LinkStore;
use crate::transport::{EventSink, Payload, TaggedEvents, Transport, TransportEvent};

// ============================================================================
// Constants
// ============================================================================

/// Close reason used by [`LinkHandle::close_normal`] and dispose.
pub const NORMAL_CLOSURE_REASON: &str = "Normal closure";

// ============================================================================
// Control
// ============================================================================

/// Requests from handles to the manager task.
enum Control {
    Send {
        command: Command,
        reply: oneshot::Sender<Result<()>>,
    },
    Reconnect,
    Close {
        code: u16,
        reason: String,
        reply: oneshot::Sender<()>,
    },
    Dispose {
        reply: oneshot::Sender<()>,
    },
}

// ============================================================================
// LinkHandle
// ============================================================================

struct HandleInner {
    link_id: LinkId,
    target: TargetId,
    url: Url,
    store: LinkStore,
    status_rx: watch::Receiver<LinkStatus>,
    control_tx: mpsc::UnboundedSender<Control>,
}

/// Owner-side handle to a running link.
///
/// Cheap to clone. Once the manager task has stopped, every operation
/// returns [`Error::LinkStopped`].
#[derive(Clone)]
pub struct LinkHandle {
    inner: Arc<HandleInner>,
}

impl LinkHandle {
    /// Target this link serves.
    #[inline]
    #[must_use]
    pub fn target(&self) -> &TargetId {
        &self.inner.target
    }

    /// Endpoint URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    /// Unique link identifier, used in logs.
    #[inline]
    #[must_use]
    pub fn link_id(&self) -> LinkId {
        self.inner.link_id
    }

    /// Shared store fed by this link.
    #[inline]
    #[must_use]
    pub fn store(&self) -> &LinkStore {
        &self.inner.store
    }

    /// Latest status snapshot.
    #[must_use]
    pub fn status(&self) -> LinkStatus {
        self.inner.status_rx.borrow().clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.inner.status_rx.borrow().state
    }

    /// Subscribes to status changes.
    #[must_use]
    pub fn subscribe_status(&self) -> watch::Receiver<LinkStatus> {
        self.inner.status_rx.clone()
    }

    /// Returns `true` once the manager task has stopped.
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.inner.control_tx.is_closed()
    }

    /// Sends a control command.
    ///
    /// # Errors
    ///
    /// - [`Error::NotConnected`] if the transport is not open; nothing is sent
    /// - [`Error::LinkStopped`] if the manager has stopped
    pub async fn send_command(&self, command: Command) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(Control::Send { command, reply })?;
        rx.await.map_err(|_| Error::LinkStopped)?
    }

    /// Asks the robot to turn face detection on or off.
    ///
    /// # Errors
    ///
    /// Same as [`send_command`](Self::send_command).
    pub async fn toggle_face_detection(&self, enabled: bool) -> Result<()> {
        self.send_command(Command::toggle_face_detection(enabled))
            .await
    }

    /// Drops the current connection and reconnects with a fresh budget.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LinkStopped`] if the manager has stopped.
    pub fn reconnect(&self) -> Result<()> {
        self.request(Control::Reconnect)
    }

    /// Closes the link. No automatic reconnect follows.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LinkStopped`] if the manager has stopped.
    pub async fn close(&self, code: u16, reason: impl Into<String>) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(Control::Close {
            code,
            reason: reason.into(),
            reply,
        })?;
        rx.await.map_err(|_| Error::LinkStopped)
    }

    /// Closes the link with code 1000, "Normal closure".
    ///
    /// # Errors
    ///
    /// Returns [`Error::LinkStopped`] if the manager has stopped.
    pub async fn close_normal(&self) -> Result<()> {
        self.close(NORMAL_CLOSURE, NORMAL_CLOSURE_REASON).await
    }

    /// Closes the link and stops the manager task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LinkStopped`] if the manager had already stopped.
    pub async fn dispose(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(Control::Dispose { reply })?;
        rx.await.map_err(|_| Error::LinkStopped)
    }

    fn request(&self, control: Control) -> Result<()> {
        self.inner
            .control_tx
            .send(control)
            .map_err(|_| Error::LinkStopped)
    }
}

impl fmt::Debug for LinkHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkHandle")
            .field("link_id", &self.inner.link_id)
            .field("target", &self.inner.target)
            .field("url", &self.inner.url.as_str())
            .field("state", &self.state())
            .finish()
    }
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// The per-link actor. Created through [`ConnectionManager::spawn`].
pub struct ConnectionManager<T: Transport> {
    link_id: LinkId,
    target: TargetId,
    config: LinkConfig,
    machine: LinkMachine,
    transport: T,
    handler: Box<dyn LinkHandler>,
    store: LinkStore,
    status_tx: watch::Sender<LinkStatus>,
    control_rx: mpsc::UnboundedReceiver<Control>,
    events_tx: mpsc::UnboundedSender<(Generation, TransportEvent)>,
    events_rx: TaggedEvents,
    timer_tx: mpsc::UnboundedSender<TimerFired>,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,
    heartbeat: Option<Alarm>,
    reconnect: Option<Alarm>,
}

impl<T: Transport> ConnectionManager<T> {
    /// Spawns a manager task and starts connecting.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `config` does not validate.
    pub fn spawn(
        target: TargetId,
        url: Url,
        transport: T,
        config: &LinkConfig,
        handler: impl LinkHandler,
    ) -> Result<LinkHandle> {
        let (manager, handle) = Self::new(target, url, transport, config, handler)?;

        info!(
            link_id = %handle.link_id(),
            target_id = %handle.target(),
            url = %handle.url(),
            "Spawning link manager"
        );
        tokio::spawn(manager.run());

        Ok(handle)
    }

    /// Builds the actor and its handle without starting the task.
    fn new(
        target: TargetId,
        url: Url,
        transport: T,
        config: &LinkConfig,
        handler: impl LinkHandler,
    ) -> Result<(Self, LinkHandle)> {
        config.validate()?;

        let link_id = LinkId::generate();
        let machine = LinkMachine::new(config);
        let store = LinkStore::new();
        let (status_tx, status_rx) = watch::channel(machine.status());
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();

        let manager = Self {
            link_id,
            target: target.clone(),
            config: config.clone(),
            machine,
            transport,
            handler: Box::new(handler),
            store: store.clone(),
            status_tx,
            control_rx,
            events_tx,
            events_rx,
            timer_tx,
            timer_rx,
            heartbeat: None,
            reconnect: None,
        };

        let handle = LinkHandle {
            inner: Arc::new(HandleInner {
                link_id,
                target,
                url,
                store,
                status_rx,
                control_tx,
            }),
        };

        Ok((manager, handle))
    }

    /// Event loop. Runs until disposed or every handle is dropped.
    async fn run(mut self) {
        self.apply(Input::Start);

        loop {
            tokio::select! {
                control = self.control_rx.recv() => {
                    match control {
                        Some(Control::Dispose { reply }) => {
                            debug!(link_id = %self.link_id, "Dispose requested");
                            self.apply(Input::Close {
                                code: NORMAL_CLOSURE,
                                reason: NORMAL_CLOSURE_REASON.to_owned(),
                            });
                            let _ = reply.send(());
                            break;
                        }

                        Some(control) => self.handle_control(control),

                        None => {
                            debug!(link_id = %self.link_id, "All handles dropped");
                            self.apply(Input::Close {
                                code: NORMAL_CLOSURE,
                                reason: NORMAL_CLOSURE_REASON.to_owned(),
                            });
                            break;
                        }
                    }
                }

                Some((generation, event)) = self.events_rx.recv() => {
                    self.handle_transport_event(generation, event);
                }

                Some(fired) = self.timer_rx.recv() => {
                    self.handle_timer(fired);
                }
            }
        }

        self.heartbeat = None;
        self.reconnect = None;
        info!(link_id = %self.link_id, target_id = %self.target, "Link manager stopped");
    }

    // ========================================================================
    // Inputs
    // ========================================================================

    fn handle_control(&mut self, control: Control) {
        match control {
            Control::Send { command, reply } => {
                let _ = reply.send(self.send_command(command));
            }

            Control::Reconnect => {
                info!(link_id = %self.link_id, "Manual reconnect");
                self.apply(Input::ManualReconnect);
            }

            Control::Close {
                code,
                reason,
                reply,
            } => {
                self.apply(Input::Close { code, reason });
                let _ = reply.send(());
            }

            // Handled by the event loop
            Control::Dispose { reply } => {
                let _ = reply.send(());
            }
        }
    }

    fn handle_transport_event(&mut self, generation: Generation, event: TransportEvent) {
        if generation != self.machine.generation() {
            trace!(
                link_id = %self.link_id,
                %generation,
                current = %self.machine.generation(),
                "Dropping stale transport event"
            );
            return;
        }

        match event {
            TransportEvent::Open => self.apply(Input::TransportOpened),
            TransportEvent::Message(payload) => self.handle_payload(payload),
            TransportEvent::Error { reason } => self.apply(Input::TransportError { reason }),
            TransportEvent::Close { code, reason } => {
                self.apply(Input::TransportClosed { code, reason });
            }
        }
    }

    fn handle_payload(&mut self, payload: Payload) {
        match InboundEvent::decode(payload) {
            Ok(Some(InboundEvent::Status { enabled })) => {
                debug!(link_id = %self.link_id, enabled, "Detection status");
                self.store.set_detection_enabled(enabled);
            }

            Ok(Some(InboundEvent::Frame(data))) => {
                let seq = self.store.publish_frame(data);
                trace!(link_id = %self.link_id, seq, "Frame received");
            }

            Ok(None) => {
                trace!(link_id = %self.link_id, "Ignoring unrecognized status");
            }

            Err(e) => {
                warn!(link_id = %self.link_id, error = %e, "Malformed inbound message");
            }
        }
    }

    fn handle_timer(&mut self, fired: TimerFired) {
        match fired.kind {
            TimerKind::Heartbeat => {
                if !self.heartbeat.as_ref().is_some_and(|alarm| alarm.matches(&fired)) {
                    trace!(link_id = %self.link_id, generation = %fired.generation, "Dropping stale heartbeat");
                    return;
                }

                let transport_connected = self.transport.is_connected();
                trace!(link_id = %self.link_id, transport_connected, "Heartbeat");
                self.apply(Input::HeartbeatTick {
                    transport_connected,
                });
            }

            TimerKind::Reconnect => {
                if !self.reconnect.as_ref().is_some_and(|alarm| alarm.matches(&fired)) {
                    trace!(link_id = %self.link_id, generation = %fired.generation, "Dropping stale reconnect");
                    return;
                }

                self.reconnect = None;
                self.apply(Input::ReconnectDue);
            }
        }
    }

    // ========================================================================
    // Outbound
    // ========================================================================

    fn send_command(&self, command: Command) -> Result<()> {
        if !self.transport.is_connected() {
            warn!(
                link_id = %self.link_id,
                command = command.name(),
                "Cannot send command, link is not connected"
            );
            return Err(Error::NotConnected);
        }

        let text = command.to_wire()?;
        self.transport.send(Payload::Text(text));
        debug!(link_id = %self.link_id, command = command.name(), "Command sent");

        self.notify(LinkEvent::CommandSent(command));
        Ok(())
    }

    // ========================================================================
    // Effects
    // ========================================================================

    fn apply(&mut self, input: Input) {
        let before = self.machine.state();
        let effects = self.machine.handle(input);

        let mut notifications = Vec::new();
        for effect in effects {
            match effect {
                Effect::Notify(event) => notifications.push(event),
                effect => self.run_effect(effect),
            }
        }

        let after = self.machine.state();
        if before != after {
            debug!(link_id = %self.link_id, from = %before, to = %after, "Link state changed");
        }

        // Callbacks must observe the state they are reporting
        self.status_tx.send_replace(self.machine.status());

        for event in notifications {
            self.notify(event);
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::OpenTransport { generation } => {
                debug!(link_id = %self.link_id, %generation, "Opening transport");
                self.transport
                    .connect(EventSink::new(generation, self.events_tx.clone()));
            }

            Effect::CloseTransport { code, reason } => {
                debug!(link_id = %self.link_id, code, reason = %reason, "Closing transport");
                self.transport.close(code, &reason);
            }

            Effect::StartHeartbeat { generation } => {
                self.heartbeat = Some(Alarm::repeating(
                    TimerKind::Heartbeat,
                    generation,
                    self.config.heartbeat_interval,
                    self.timer_tx.clone(),
                ));
            }

            Effect::StopHeartbeat => {
                self.heartbeat = None;
            }

            Effect::ScheduleReconnect { delay, generation } => {
                info!(
                    link_id = %self.link_id,
                    attempt = self.machine.attempts() + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Reconnect scheduled"
                );
                self.reconnect = Some(Alarm::once(
                    TimerKind::Reconnect,
                    generation,
                    delay,
                    self.timer_tx.clone(),
                ));
            }

            Effect::CancelReconnect => {
                self.reconnect = None;
            }

            Effect::Notify(event) => self.notify(event),
        }
    }

    fn notify(&self, event: LinkEvent) {
        match &event {
            LinkEvent::Opened => {
                info!(link_id = %self.link_id, target_id = %self.target, "Link open");
            }
            LinkEvent::Closed { code, reason } => {
                info!(link_id = %self.link_id, code, reason = %reason, "Link closed");
            }
            LinkEvent::CommandSent(_) => {}
            LinkEvent::TimedOut => {
                warn!(
                    link_id = %self.link_id,
                    interval_ms = self.config.heartbeat_interval.as_millis() as u64,
                    "Heartbeat timeout"
                );
            }
            LinkEvent::Error(err) if err.is_terminal() => {
                error!(link_id = %self.link_id, target_id = %self.target, error = %err, "Link failed");
            }
            LinkEvent::Error(err) => {
                warn!(link_id = %self.link_id, error = %err, "Link error");
            }
        }

        event.dispatch(self.handler.as_ref());
    }
}

// ============================================================================
// Tests
// ============================================================================
