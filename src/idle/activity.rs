//! User interaction observation with a bounded signal rate

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Interaction event classes that count as activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivityKind {
    PointerMove,
    PointerDown,
    KeyPress,
    Scroll,
    TouchStart,
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 5] = [
        ActivityKind::PointerMove,
        ActivityKind::PointerDown,
        ActivityKind::KeyPress,
        ActivityKind::Scroll,
        ActivityKind::TouchStart,
    ];

    /// Browser event name the page listens for
    pub fn dom_event(&self) -> &'static str {
        match self {
            ActivityKind::PointerMove => "mousemove",
            ActivityKind::PointerDown => "mousedown",
            ActivityKind::KeyPress => "keypress",
            ActivityKind::Scroll => "scroll",
            ActivityKind::TouchStart => "touchstart",
        }
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dom_event())
    }
}

/// Observes interaction events and forwards activity signals.
///
/// The first event of a window is forwarded at once; events inside the
/// window are folded into a single trailing signal sent when the window
/// closes, stamped with the time of the last folded event. Signals are
/// therefore at most one per `debounce`.
pub struct ActivityMonitor {
    debounce: Duration,
    events: Option<mpsc::UnboundedSender<ActivityKind>>,
    task: Option<JoinHandle<()>>,
}

impl ActivityMonitor {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            events: None,
            task: None,
        }
    }

    /// Begin observing. Each signal carries the instant of the interaction
    /// it stands for. Restarting replaces the previous observer.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self, on_activity: mpsc::UnboundedSender<Instant>) {
        self.stop();

        let (tx, rx) = mpsc::unbounded_channel();
        self.events = Some(tx);
        self.task = Some(tokio::spawn(debounce_signals(self.debounce, rx, on_activity)));
    }

    /// Feed one interaction event. Returns false when not observing.
    pub fn observe(&self, kind: ActivityKind) -> bool {
        match &self.events {
            Some(tx) => tx.send(kind).is_ok(),
            None => false,
        }
    }

    /// Detach observation. Events observed afterwards are ignored.
    pub fn stop(&mut self) {
        self.events = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.events.is_some()
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

impl Drop for ActivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn debounce_signals(
    debounce: Duration,
    mut events: mpsc::UnboundedReceiver<ActivityKind>,
    on_activity: mpsc::UnboundedSender<Instant>,
) {
    let mut window_end: Option<Instant> = None;
    let mut folded: Option<Instant> = None;

    loop {
        let flush_at = window_end.unwrap_or_else(Instant::now);

        tokio::select! {
            event = events.recv() => {
                let Some(kind) = event else { break };
                let now = Instant::now();

                match window_end {
                    Some(end) if now < end => {
                        trace!("Folding {} into current window", kind);
                        folded = Some(now);
                    }
                    _ => {
                        if on_activity.send(now).is_err() {
                            break;
                        }
                        window_end = Some(now + debounce);
                    }
                }
            }
            _ = sleep_until(flush_at), if folded.is_some() => {
                if let Some(at) = folded.take() {
                    if on_activity.send(at).is_err() {
                        break;
                    }
                    window_end = Some(Instant::now() + debounce);
                }
            }
        }
    }
}
