//! Inactivity state machine and its timer task
//!
//! `IdleTimer` is the pure state machine: it is told about activity and
//! about the passage of time, and reports at most one transition per call.
//! `IdleHandle` runs it on a task that owns the only timer. Activity and
//! deadlines are handled by the same loop with activity first, so a
//! cancelled countdown has no timer left that could still fire.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use crate::config::{IdleConfig, MAX_COUNTDOWN_SECS};

/// Where the session stands with respect to inactivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum IdleState {
    Active,
    Warning { remaining: u32 },
    Expired,
}

/// Transitions reported by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum IdleEvent {
    /// Active → Warning; the countdown starts at `remaining`
    Warning { remaining: u32 },
    /// One countdown step while in Warning
    Tick { remaining: u32 },
    /// Warning → Active after an interaction
    Resumed,
    /// Countdown reached zero; the session must end
    Expired,
}

#[derive(Debug, Clone)]
pub struct IdleTimer {
    threshold: Duration,
    countdown: u32,
    tick: Duration,
    state: IdleState,
    last_activity: Instant,
    /// Only set while in Warning
    next_tick: Option<Instant>,
}

impl IdleTimer {
    pub fn new(config: &IdleConfig, now: Instant) -> Self {
        Self {
            threshold: config.threshold(),
            countdown: config.countdown_secs.clamp(1, MAX_COUNTDOWN_SECS),
            tick: config.tick_interval(),
            state: IdleState::Active,
            last_activity: now,
            next_tick: None,
        }
    }

    pub fn state(&self) -> IdleState {
        self.state
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    /// The next instant at which `advance` will produce a transition
    pub fn deadline(&self) -> Option<Instant> {
        match self.state {
            IdleState::Active => self.last_activity.checked_add(self.threshold),
            IdleState::Warning { .. } => self.next_tick,
            IdleState::Expired => None,
        }
    }

    /// Record an interaction that happened at `at`
    pub fn record_activity(&mut self, at: Instant) -> Option<IdleEvent> {
        match self.state {
            IdleState::Expired => None,
            IdleState::Active => {
                self.last_activity = self.last_activity.max(at);
                None
            }
            IdleState::Warning { .. } => {
                self.next_tick = None;
                self.last_activity = self.last_activity.max(at);
                self.state = IdleState::Active;
                Some(IdleEvent::Resumed)
            }
        }
    }

    /// Apply the transition due at `now`, if any. Call repeatedly to catch
    /// up; each countdown step is reported exactly once.
    pub fn advance(&mut self, now: Instant) -> Option<IdleEvent> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }

        match self.state {
            IdleState::Active => {
                // Anchor the countdown at the moment the threshold was crossed
                self.next_tick = deadline.checked_add(self.tick);
                self.state = IdleState::Warning {
                    remaining: self.countdown,
                };
                Some(IdleEvent::Warning {
                    remaining: self.countdown,
                })
            }
            IdleState::Warning { remaining } if remaining > 1 => {
                let remaining = remaining - 1;
                self.next_tick = deadline.checked_add(self.tick);
                self.state = IdleState::Warning { remaining };
                Some(IdleEvent::Tick { remaining })
            }
            IdleState::Warning { .. } => {
                self.next_tick = None;
                self.state = IdleState::Expired;
                Some(IdleEvent::Expired)
            }
            IdleState::Expired => None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.state == IdleState::Expired
    }
}

/// A running idle timer. Dropping the handle stops the task.
pub struct IdleHandle {
    events: mpsc::UnboundedReceiver<IdleEvent>,
    state: watch::Receiver<IdleState>,
    task: JoinHandle<()>,
}

impl IdleHandle {
    /// Start a timer fed by activity signals. Must be called from within a
    /// Tokio runtime.
    pub fn spawn(config: &IdleConfig, activity: mpsc::UnboundedReceiver<Instant>) -> Self {
        let timer = IdleTimer::new(config, Instant::now());
        let (events_tx, events) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(timer.state());
        let task = tokio::spawn(run_timer(timer, activity, events_tx, state_tx));

        Self {
            events,
            state,
            task,
        }
    }

    /// Wait for the next transition. `None` once the timer has stopped and
    /// every transition has been delivered. Cancel safe.
    pub async fn next_event(&mut self) -> Option<IdleEvent> {
        self.events.recv().await
    }

    pub fn state(&self) -> IdleState {
        *self.state.borrow()
    }

    /// Stop the timer. No transition is delivered afterwards.
    pub fn stop(&mut self) {
        self.task.abort();
        self.events.close();
        while self.events.try_recv().is_ok() {}
    }
}

impl Drop for IdleHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_timer(
    mut timer: IdleTimer,
    mut activity: mpsc::UnboundedReceiver<Instant>,
    events: mpsc::UnboundedSender<IdleEvent>,
    state: watch::Sender<IdleState>,
) {
    loop {
        let deadline = timer.deadline();

        tokio::select! {
            biased;

            signal = activity.recv() => {
                let Some(at) = signal else {
                    debug!("Activity source closed, idle timer stopping");
                    break;
                };
                if let Some(event) = timer.record_activity(at) {
                    debug!("Idle transition: {:?}", event);
                    state.send_replace(timer.state());
                    if events.send(event).is_err() {
                        break;
                    }
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let now = Instant::now();
                while let Some(event) = timer.advance(now) {
                    debug!("Idle transition: {:?}", event);
                    state.send_replace(timer.state());
                    if events.send(event).is_err() {
                        return;
                    }
                }
                if timer.is_expired() {
                    break;
                }
            }
        }
    }
}
