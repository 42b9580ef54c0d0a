//! Connection lifecycle state machine.
//!
//! [`LinkMachine`] is synchronous and side-effect free. Each [`Input`] is
//! folded into the current state and answered with a list of [`Effect`]s
//! for the manager task to carry out against the transport, the timers and
//! the handler.
//!
//! # Transitions
//!
//! | From | Input | To |
//! |------|-------|----|
//! | `Idle` | `Start` | `Connecting` |
//! | `Connecting` | `TransportOpened` | `Connected` |
//! | `Connecting` / `Connected` | `TransportError` | `Reconnecting` or `Failed` |
//! | `Connecting` / `Connected` | `TransportClosed` | `Disconnected` (or `Reconnecting` when enabled) |
//! | `Connected` | `HeartbeatTick` (not connected) | `Reconnecting` or `Failed` |
//! | `Reconnecting` | `ReconnectDue` | `Connecting` |
//! | any | `Close` | `Closed` |
//! | any | `ManualReconnect` | `Reconnecting` |
//!
//! `Disconnected` is passed through on the way to `Reconnecting` or `Failed`
//! and only stays put after a peer close with reconnect disabled. `Closing`
//! is likewise transient inside an explicit close.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use super::backoff::Backoff;
use super::config::LinkConfig;
use super::handler::{LinkEvent, NORMAL_CLOSURE};
use crate::error::Error;
use crate::identifiers::Generation;

// ============================================================================
// LinkState
// ============================================================================

/// Lifecycle state of one link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// Created, not yet started.
    Idle,
    /// Waiting for the transport to open.
    Connecting,
    /// Transport open, heartbeat running.
    Connected,
    /// Transport lost, no reconnect pending.
    Disconnected,
    /// Reconnect timer pending.
    Reconnecting,
    /// Explicit close in progress.
    Closing,
    /// Closed by the owner. Only a manual reconnect leaves this state.
    Closed,
    /// Reconnect budget exhausted. Only a manual reconnect leaves this state.
    Failed,
}

impl LinkState {
    /// Returns the state name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Disconnected => "disconnected",
            Self::Reconnecting => "reconnecting",
            Self::Closing => "closing",
            Self::Closed => "closed",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` if a physical socket is open or opening.
    #[inline]
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }

    /// Returns `true` if the link stays put until the owner acts.
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Input / Effect
// ============================================================================

/// Something that happened to the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Begin the first connection.
    Start,
    /// The current transport opened.
    TransportOpened,
    /// The current transport reported an error.
    TransportError {
        /// Description of the failure.
        reason: String,
    },
    /// The current transport closed.
    TransportClosed {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// The heartbeat timer fired.
    HeartbeatTick {
        /// Result of the transport's connected check.
        transport_connected: bool,
    },
    /// The reconnect timer fired.
    ReconnectDue,
    /// The owner closed the link.
    Close {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// The owner asked for a fresh connection.
    ManualReconnect,
}

/// Work the manager must carry out, in order.
#[derive(Debug, Clone)]
pub enum Effect {
    /// Open the transport under a new generation.
    OpenTransport {
        /// Generation for the new socket.
        generation: Generation,
    },
    /// Close the transport.
    CloseTransport {
        /// Close code.
        code: u16,
        /// Close reason.
        reason: String,
    },
    /// Start the repeating heartbeat alarm.
    StartHeartbeat {
        /// Generation the alarm belongs to.
        generation: Generation,
    },
    /// Drop the heartbeat alarm.
    StopHeartbeat,
    /// Arm the one-shot reconnect alarm.
    ScheduleReconnect {
        /// Delay until the reconnect.
        delay: Duration,
        /// Generation the alarm belongs to.
        generation: Generation,
    },
    /// Drop the reconnect alarm.
    CancelReconnect,
    /// Tell the owner.
    Notify(LinkEvent),
}

// ============================================================================
// LinkStatus
// ============================================================================

/// Snapshot of a link, published after every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStatus {
    /// Lifecycle state.
    pub state: LinkState,
    /// Reconnect attempts since the last successful open.
    pub attempts: u32,
    /// Current backoff delay.
    pub delay: Duration,
    /// Current transport generation.
    pub generation: Generation,
    /// Heartbeat alarm running.
    pub heartbeat_active: bool,
    /// Reconnect alarm pending.
    pub reconnect_pending: bool,
}

// ============================================================================
// LinkMachine
// ============================================================================

/// Pure lifecycle state machine for one link.
#[derive(Debug, Clone)]
pub struct LinkMachine {
    state: LinkState,
    backoff: Backoff,
    generation: Generation,
    heartbeat_active: bool,
    reconnect_pending: bool,
    exhausted_reported: bool,
    reconnect_on_peer_close: bool,
}

impl LinkMachine {
    /// Creates an idle machine.
    #[must_use]
    pub fn new(config: &LinkConfig) -> Self {
        Self {
            state: LinkState::Idle,
            backoff: Backoff::from_config(config),
            generation: Generation::default(),
            heartbeat_active: false,
            reconnect_pending: false,
            exhausted_reported: false,
            reconnect_on_peer_close: config.reconnect_on_peer_close,
        }
    }

    /// Current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Current transport generation.
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Reconnect attempts since the last successful open.
    #[inline]
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.backoff.attempts()
    }

    /// Returns `true` while the heartbeat alarm should be running.
    #[inline]
    #[must_use]
    pub fn heartbeat_active(&self) -> bool {
        self.heartbeat_active
    }

    /// Returns `true` while a reconnect alarm is pending.
    #[inline]
    #[must_use]
    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    /// Takes a status snapshot.
    #[must_use]
    pub fn status(&self) -> LinkStatus {
        LinkStatus {
            state: self.state,
            attempts: self.backoff.attempts(),
            delay: self.backoff.current_delay(),
            generation: self.generation,
            heartbeat_active: self.heartbeat_active,
            reconnect_pending: self.reconnect_pending,
        }
    }

    /// Applies an input and returns the effects to carry out.
    pub fn handle(&mut self, input: Input) -> Vec<Effect> {
        let mut effects = Vec::new();

        match input {
            Input::Start => {
                if self.state == LinkState::Idle {
                    self.open(&mut effects);
                }
            }
            Input::TransportOpened => self.on_opened(&mut effects),
            Input::TransportError { reason } => self.on_error(reason, &mut effects),
            Input::TransportClosed { code, reason } => self.on_closed(code, reason, &mut effects),
            Input::HeartbeatTick {
                transport_connected,
            } => self.on_heartbeat(transport_connected, &mut effects),
            Input::ReconnectDue => self.on_reconnect_due(&mut effects),
            Input::Close { code, reason } => self.close(code, reason, &mut effects),
            Input::ManualReconnect => {
                self.close(NORMAL_CLOSURE, "Normal closure".to_owned(), &mut effects);
                self.backoff.reset();
                self.exhausted_reported = false;
                self.attempt_reconnect(&mut effects);
            }
        }

        effects
    }

    // ========================================================================
    // Transitions
    // ========================================================================

    fn open(&mut self, effects: &mut Vec<Effect>) {
        self.generation = self.generation.next();
        self.state = LinkState::Connecting;
        effects.push(Effect::OpenTransport {
            generation: self.generation,
        });
    }

    fn on_opened(&mut self, effects: &mut Vec<Effect>) {
        if self.state != LinkState::Connecting {
            return;
        }

        self.state = LinkState::Connected;
        effects.push(Effect::Notify(LinkEvent::Opened));

        self.heartbeat_active = true;
        effects.push(Effect::StartHeartbeat {
            generation: self.generation,
        });

        self.backoff.reset();
        self.exhausted_reported = false;
        if self.reconnect_pending {
            self.reconnect_pending = false;
            effects.push(Effect::CancelReconnect);
        }
    }

    fn on_error(&mut self, reason: String, effects: &mut Vec<Effect>) {
        let error = match self.state {
            LinkState::Connecting => Error::transport_open_failure(reason),
            LinkState::Connected => Error::transport(reason),
            _ => return,
        };

        self.stop_heartbeat(effects);
        effects.push(Effect::Notify(LinkEvent::Error(Arc::new(error))));
        self.state = LinkState::Disconnected;
        self.attempt_reconnect(effects);
    }

    fn on_closed(&mut self, code: u16, reason: String, effects: &mut Vec<Effect>) {
        if matches!(
            self.state,
            LinkState::Idle | LinkState::Closing | LinkState::Closed
        ) {
            return;
        }

        let was_live = self.state.is_live();
        effects.push(Effect::Notify(LinkEvent::Closed { code, reason }));
        self.stop_heartbeat(effects);

        if was_live {
            self.state = LinkState::Disconnected;
            if self.reconnect_on_peer_close {
                self.attempt_reconnect(effects);
            }
        }
    }

    fn on_heartbeat(&mut self, transport_connected: bool, effects: &mut Vec<Effect>) {
        if self.state != LinkState::Connected || transport_connected {
            return;
        }

        self.stop_heartbeat(effects);
        effects.push(Effect::Notify(LinkEvent::TimedOut));
        self.state = LinkState::Disconnected;
        self.attempt_reconnect(effects);
    }

    fn on_reconnect_due(&mut self, effects: &mut Vec<Effect>) {
        if !self.reconnect_pending {
            return;
        }

        self.reconnect_pending = false;
        self.backoff.record_attempt();
        self.open(effects);
    }

    fn close(&mut self, code: u16, reason: String, effects: &mut Vec<Effect>) {
        let was_live = self.state.is_live();
        self.state = LinkState::Closing;

        self.heartbeat_active = false;
        effects.push(Effect::StopHeartbeat);
        self.reconnect_pending = false;
        effects.push(Effect::CancelReconnect);

        self.generation = self.generation.next();
        effects.push(Effect::CloseTransport {
            code,
            reason: reason.clone(),
        });
        self.state = LinkState::Closed;

        if was_live {
            effects.push(Effect::Notify(LinkEvent::Closed { code, reason }));
        }
    }

    fn attempt_reconnect(&mut self, effects: &mut Vec<Effect>) {
        if self.backoff.exhausted() {
            self.state = LinkState::Failed;
            if !self.exhausted_reported {
                self.exhausted_reported = true;
                let error = Error::max_reconnect_attempts(self.backoff.attempts());
                effects.push(Effect::Notify(LinkEvent::Error(Arc::new(error))));
            }
            return;
        }

        if self.reconnect_pending {
            return;
        }

        let delay = self.backoff.next_delay();
        self.reconnect_pending = true;
        self.state = LinkState::Reconnecting;
        effects.push(Effect::ScheduleReconnect {
            delay,
            generation: self.generation,
        });
    }

    fn stop_heartbeat(&mut self, effects: &mut Vec<Effect>) {
        if self.heartbeat_active {
            self.heartbeat_active = false;
            effects.push(Effect::StopHeartbeat);
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::prelude::*;

    fn machine() -> LinkMachine {
        LinkMachine::new(&LinkConfig::default())
    }

    fn connected() -> LinkMachine {
        let mut m = machine();
        m.handle(Input::Start);
        m.handle(Input::TransportOpened);
        m
    }

    fn scheduled_delays(effects: &[Effect]) -> Vec<u64> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::ScheduleReconnect { delay, .. } => Some(delay.as_millis() as u64),
                _ => None,
            })
            .collect()
    }

    fn count_exhausted(effects: &[Effect]) -> usize {
        effects
            .iter()
            .filter(|effect| {
                matches!(
                    effect,
                    Effect::Notify(LinkEvent::Error(err))
                        if matches!(**err, Error::MaxReconnectAttemptsExceeded { .. })
                )
            })
            .count()
    }

    fn fail(reason: &str) -> Input {
        Input::TransportError {
            reason: reason.to_owned(),
        }
    }

    #[test]
    fn test_start_opens_transport() {
        let mut m = machine();
        let effects = m.handle(Input::Start);

        assert_eq!(m.state(), LinkState::Connecting);
        assert!(matches!(
            effects.as_slice(),
            [Effect::OpenTransport { generation }] if generation.as_u64() == 1
        ));

        // Start is only honoured once
        assert!(m.handle(Input::Start).is_empty());
    }

    #[test]
    fn test_open_reaches_connected_with_heartbeat() {
        let mut m = machine();
        m.handle(Input::Start);
        let effects = m.handle(Input::TransportOpened);

        assert_eq!(m.state(), LinkState::Connected);
        assert!(m.heartbeat_active());
        assert!(matches!(
            effects.as_slice(),
            [
                Effect::Notify(LinkEvent::Opened),
                Effect::StartHeartbeat { .. }
            ]
        ));

        // A duplicate open does not fire the callback again
        assert!(m.handle(Input::TransportOpened).is_empty());
    }

    #[test]
    fn test_heartbeat_timeout_schedules_first_reconnect() {
        let mut m = connected();

        assert!(
            m.handle(Input::HeartbeatTick {
                transport_connected: true
            })
            .is_empty()
        );

        let effects = m.handle(Input::HeartbeatTick {
            transport_connected: false,
        });

        assert!(matches!(effects[0], Effect::StopHeartbeat));
        assert!(matches!(effects[1], Effect::Notify(LinkEvent::TimedOut)));
        assert_eq!(scheduled_delays(&effects), [1000]);
        assert_eq!(m.state(), LinkState::Reconnecting);
        assert!(!m.heartbeat_active());
    }

    #[test]
    fn test_consecutive_failures_back_off() {
        let mut m = machine();
        m.handle(Input::Start);

        let mut delays = Vec::new();
        for _ in 0..3 {
            delays.extend(scheduled_delays(&m.handle(fail("refused"))));
            m.handle(Input::ReconnectDue);
        }

        assert_eq!(delays, [1000, 2000, 4000]);
        assert_eq!(m.attempts(), 3);
    }

    #[test]
    fn test_open_failure_reported_as_open_failure() {
        let mut m = machine();
        m.handle(Input::Start);
        let effects = m.handle(fail("refused"));

        assert!(effects.iter().any(|effect| matches!(
            effect,
            Effect::Notify(LinkEvent::Error(err))
                if matches!(**err, Error::TransportOpenFailure { .. })
        )));
    }

    #[test]
    fn test_mid_session_error_reported_as_transport() {
        let mut m = connected();
        let effects = m.handle(fail("reset"));

        assert!(matches!(effects[0], Effect::StopHeartbeat));
        assert!(matches!(
            &effects[1],
            Effect::Notify(LinkEvent::Error(err)) if matches!(**err, Error::Transport { .. })
        ));
        assert_eq!(m.state(), LinkState::Reconnecting);
    }

    #[test]
    fn test_attempts_reset_on_connected() {
        let mut m = machine();
        m.handle(Input::Start);
        for _ in 0..4 {
            m.handle(fail("refused"));
            m.handle(Input::ReconnectDue);
        }
        assert_eq!(m.attempts(), 4);

        m.handle(Input::TransportOpened);
        assert_eq!(m.attempts(), 0);
        assert_eq!(m.status().delay, Duration::from_millis(1000));

        let effects = m.handle(fail("reset"));
        assert_eq!(scheduled_delays(&effects), [1000]);
    }

    #[test]
    fn test_exhaustion_reported_once() {
        let mut m = machine();
        m.handle(Input::Start);

        let mut all = Vec::new();
        for _ in 0..10 {
            all.extend(m.handle(fail("refused")));
            all.extend(m.handle(Input::ReconnectDue));
        }
        assert_eq!(m.attempts(), 10);

        // Tenth reconnect attempt fails
        let effects = m.handle(fail("refused"));
        assert!(scheduled_delays(&effects).is_empty());
        assert_eq!(count_exhausted(&effects), 1);
        assert_eq!(m.state(), LinkState::Failed);

        // Nothing further is scheduled or reported
        all.extend(effects);
        all.extend(m.handle(Input::TransportClosed {
            code: 1006,
            reason: String::new(),
        }));
        all.extend(m.handle(Input::ReconnectDue));
        all.extend(m.handle(fail("late")));
        assert_eq!(count_exhausted(&all), 1);
        assert_eq!(scheduled_delays(&all).len(), 10);
        assert_eq!(m.state(), LinkState::Failed);
    }

    #[test]
    fn test_explicit_close_cancels_timers_before_closing() {
        let mut m = connected();
        m.handle(Input::HeartbeatTick {
            transport_connected: false,
        });
        assert!(m.reconnect_pending());

        let before = m.generation();
        let effects = m.handle(Input::Close {
            code: 1000,
            reason: "Normal closure".into(),
        });

        assert!(matches!(effects[0], Effect::StopHeartbeat));
        assert!(matches!(effects[1], Effect::CancelReconnect));
        assert!(matches!(effects[2], Effect::CloseTransport { code: 1000, .. }));
        // Not live when closed, so no close notification
        assert_eq!(effects.len(), 3);

        assert_eq!(m.state(), LinkState::Closed);
        assert!(m.generation() > before);
        assert!(!m.reconnect_pending());

        // A reconnect firing after close is ignored
        assert!(m.handle(Input::ReconnectDue).is_empty());
        assert!(
            m.handle(Input::TransportClosed {
                code: 1000,
                reason: String::new()
            })
            .is_empty()
        );
    }

    #[test]
    fn test_explicit_close_of_live_socket_notifies_once() {
        let mut m = connected();
        let effects = m.handle(Input::Close {
            code: 1000,
            reason: "Normal closure".into(),
        });

        let closes = effects
            .iter()
            .filter(|effect| matches!(effect, Effect::Notify(LinkEvent::Closed { .. })))
            .count();
        assert_eq!(closes, 1);
    }

    #[test]
    fn test_peer_close_does_not_reconnect_by_default() {
        let mut m = connected();
        let effects = m.handle(Input::TransportClosed {
            code: 1001,
            reason: "going away".into(),
        });

        assert!(matches!(
            &effects[0],
            Effect::Notify(LinkEvent::Closed { code: 1001, .. })
        ));
        assert!(scheduled_delays(&effects).is_empty());
        assert_eq!(m.state(), LinkState::Disconnected);
        assert!(!m.heartbeat_active());
    }

    #[test]
    fn test_peer_close_reconnects_when_enabled() {
        let config = LinkConfig::new().with_reconnect_on_peer_close(true);
        let mut m = LinkMachine::new(&config);
        m.handle(Input::Start);
        m.handle(Input::TransportOpened);

        let effects = m.handle(Input::TransportClosed {
            code: 1006,
            reason: String::new(),
        });
        assert_eq!(scheduled_delays(&effects), [1000]);
    }

    #[test]
    fn test_error_then_close_reports_both_without_second_timer() {
        let mut m = connected();
        let first = m.handle(fail("reset"));
        let second = m.handle(Input::TransportClosed {
            code: 1006,
            reason: String::new(),
        });

        assert_eq!(scheduled_delays(&first), [1000]);
        assert!(matches!(
            second.as_slice(),
            [Effect::Notify(LinkEvent::Closed { code: 1006, .. })]
        ));
        assert_eq!(m.state(), LinkState::Reconnecting);
    }

    #[test]
    fn test_manual_reconnect_resets_budget() {
        let mut m = machine();
        m.handle(Input::Start);
        for _ in 0..10 {
            m.handle(fail("refused"));
            m.handle(Input::ReconnectDue);
        }
        m.handle(fail("refused"));
        assert_eq!(m.state(), LinkState::Failed);

        let effects = m.handle(Input::ManualReconnect);
        assert!(matches!(effects[2], Effect::CloseTransport { code: 1000, .. }));
        assert_eq!(scheduled_delays(&effects), [1000]);
        assert_eq!(m.state(), LinkState::Reconnecting);
        assert_eq!(m.attempts(), 0);
    }

    #[test]
    fn test_manual_reconnect_while_pending_keeps_single_timer() {
        let mut m = connected();
        m.handle(fail("reset"));
        assert!(m.reconnect_pending());

        let effects = m.handle(Input::ManualReconnect);
        let cancels = effects
            .iter()
            .filter(|effect| matches!(effect, Effect::CancelReconnect))
            .count();
        assert_eq!(cancels, 1);
        assert_eq!(scheduled_delays(&effects).len(), 1);
        assert!(m.reconnect_pending());
    }

    #[test]
    fn test_zero_budget_fails_immediately() {
        let config = LinkConfig::new().with_max_reconnect_attempts(0);
        let mut m = LinkMachine::new(&config);
        m.handle(Input::Start);

        let effects = m.handle(fail("refused"));
        assert_eq!(count_exhausted(&effects), 1);
        assert_eq!(m.state(), LinkState::Failed);
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&LinkState::Reconnecting).expect("serialize");
        assert_eq!(json, "\"reconnecting\"");
        assert_eq!(LinkState::Failed.to_string(), "failed");
    }

    // ========================================================================
    // Property tests
    // ========================================================================

    fn any_input() -> impl Strategy<Value = Input> {
        prop_oneof![
            Just(Input::Start),
            Just(Input::TransportOpened),
            Just(Input::TransportError {
                reason: "error".into()
            }),
            (prop_oneof![Just(1000u16), Just(1001), Just(1006)]).prop_map(|code| {
                Input::TransportClosed {
                    code,
                    reason: String::new(),
                }
            }),
            any::<bool>().prop_map(|transport_connected| Input::HeartbeatTick {
                transport_connected
            }),
            Just(Input::ReconnectDue),
            Just(Input::Close {
                code: 1000,
                reason: "Normal closure".into()
            }),
            Just(Input::ManualReconnect),
        ]
    }

    proptest! {
        #[test]
        fn test_invariants_hold(
            reconnect_on_peer_close in any::<bool>(),
            inputs in prop::collection::vec(any_input(), 0..200),
        ) {
            let config = LinkConfig::new().with_reconnect_on_peer_close(reconnect_on_peer_close);
            let mut m = LinkMachine::new(&config);
            let mut timer_pending = false;
            let mut heartbeat_running = false;
            let mut exhausted_in_budget = 0usize;

            for input in inputs {
                let manual = input == Input::ManualReconnect;
                let fired = input == Input::ReconnectDue && m.reconnect_pending();
                if fired {
                    timer_pending = false;
                }
                if manual {
                    exhausted_in_budget = 0;
                }

                let effects = m.handle(input);

                for effect in &effects {
                    match effect {
                        Effect::ScheduleReconnect { delay, .. } => {
                            prop_assert!(!timer_pending, "second reconnect timer scheduled");
                            timer_pending = true;
                            let expected = Backoff::from_config(&config).delay_for(m.attempts());
                            prop_assert_eq!(*delay, expected);
                        }
                        Effect::CancelReconnect => timer_pending = false,
                        Effect::StartHeartbeat { .. } => heartbeat_running = true,
                        Effect::StopHeartbeat => heartbeat_running = false,
                        Effect::Notify(LinkEvent::Opened) => exhausted_in_budget = 0,
                        Effect::Notify(LinkEvent::Error(err))
                            if matches!(**err, Error::MaxReconnectAttemptsExceeded { .. }) =>
                        {
                            exhausted_in_budget += 1;
                        }
                        _ => {}
                    }
                }

                prop_assert_eq!(m.heartbeat_active(), m.state() == LinkState::Connected);
                prop_assert_eq!(heartbeat_running, m.heartbeat_active());
                prop_assert_eq!(timer_pending, m.reconnect_pending());
                prop_assert!(exhausted_in_budget <= 1);
                prop_assert!(m.attempts() <= config.max_reconnect_attempts);
                if m.state() == LinkState::Connected {
                    prop_assert_eq!(m.attempts(), 0);
                }
                if m.reconnect_pending() {
                    prop_assert_eq!(m.state(), LinkState::Reconnecting);
                }
            }
        }
    }
}
