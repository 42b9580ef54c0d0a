//! Generation-guarded timers for the manager actor.
//!
//! An [`Alarm`] is a spawned tokio task that posts [`TimerFired`] messages
//! back to the actor. Dropping the alarm aborts the task. A firing that was
//! already queued before the abort still carries the old generation, so the
//! actor can tell it apart from a live one.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};

use crate::identifiers::Generation;

// ============================================================================
// Types
// ============================================================================

/// Which timer fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Repeating liveness check.
    Heartbeat,
    /// One-shot reconnect.
    Reconnect,
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Heartbeat => f.write_str("heartbeat"),
            Self::Reconnect => f.write_str("reconnect"),
        }
    }
}

/// Message posted when an alarm goes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerFired {
    /// Which timer fired.
    pub kind: TimerKind,
    /// Generation the alarm was scheduled under.
    pub generation: Generation,
}

// ============================================================================
// Alarm
// ============================================================================

/// A scheduled timer task. Aborted on drop.
pub struct Alarm {
    kind: TimerKind,
    generation: Generation,
    task: JoinHandle<()>,
}

impl Alarm {
    /// Fires once after `delay`.
    pub fn once(
        kind: TimerKind,
        generation: Generation,
        delay: Duration,
        tx: mpsc::UnboundedSender<TimerFired>,
    ) -> Self {
        let task = tokio::spawn(async move {
            sleep(delay).await;
            let _ = tx.send(TimerFired { kind, generation });
        });

        Self {
            kind,
            generation,
            task,
        }
    }

    /// Fires every `period`, first after one full period.
    pub fn repeating(
        kind: TimerKind,
        generation: Generation,
        period: Duration,
        tx: mpsc::UnboundedSender<TimerFired>,
    ) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if tx.send(TimerFired { kind, generation }).is_err() {
                    break;
                }
            }
        });

        Self {
            kind,
            generation,
            task,
        }
    }

    /// Returns `true` if `fired` came from this alarm.
    #[inline]
    #[must_use]
    pub fn matches(&self, fired: &TimerFired) -> bool {
        self.kind == fired.kind && self.generation == fired.generation
    }
}

impl Drop for Alarm {
    fn drop(&mut self) {
        self.task.abort();
    }
}

impl fmt::Debug for Alarm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alarm")
            .field("kind", &self.kind)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Tests
// ============================================================================
