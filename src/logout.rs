//! Session termination: confirm-then-commit, or immediate after idle expiry

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::idle::ActivityMonitor;
use crate::session::{SessionStore, StorageScope};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogoutMode {
    /// Explicit request followed by an explicit confirmation
    Confirmed,
    /// Idle expiry; no confirmation step
    Automatic,
}

/// Outcome of a completed logout. The caller must follow it with a full
/// reload so no authenticated state survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Termination {
    pub mode: LogoutMode,
    pub username: Option<String>,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct LogoutFlow {
    awaiting_confirmation: bool,
}

impl LogoutFlow {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flow whose confirmation control has already been shown, e.g. a
    /// confirmation dialog rendered into a page that posts back later
    pub fn awaiting_confirmation() -> Self {
        Self {
            awaiting_confirmation: true,
        }
    }

    /// First step of an explicit logout: show the confirmation control
    pub fn request(&mut self) {
        self.awaiting_confirmation = true;
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation
    }

    /// Dismiss the confirmation. The session is left untouched.
    pub fn cancel(&mut self) -> bool {
        std::mem::take(&mut self.awaiting_confirmation)
    }

    /// Second step of an explicit logout
    pub fn confirm<D: StorageScope, E: StorageScope>(
        &mut self,
        store: &mut SessionStore<D, E>,
        monitor: Option<&mut ActivityMonitor>,
    ) -> Result<Termination> {
        if !self.awaiting_confirmation {
            return Err(Error::NoPendingLogout);
        }
        self.awaiting_confirmation = false;
        terminate(LogoutMode::Confirmed, store, monitor)
    }

    /// Logout after idle expiry, skipping confirmation
    pub fn automatic<D: StorageScope, E: StorageScope>(
        &mut self,
        store: &mut SessionStore<D, E>,
        monitor: Option<&mut ActivityMonitor>,
    ) -> Result<Termination> {
        self.awaiting_confirmation = false;
        terminate(LogoutMode::Automatic, store, monitor)
    }
}

/// Clear the marker, then detach activity observation
fn terminate<D: StorageScope, E: StorageScope>(
    mode: LogoutMode,
    store: &mut SessionStore<D, E>,
    monitor: Option<&mut ActivityMonitor>,
) -> Result<Termination> {
    let username = store.current().ok().flatten().map(|m| m.username);

    let cleared = store.clear();
    if let Some(monitor) = monitor {
        monitor.stop();
    }
    if let Err(e) = cleared {
        warn!("Logout could not clear the session marker: {}", e);
        return Err(e);
    }

    match (&username, mode) {
        (Some(name), LogoutMode::Confirmed) => info!("'{}' signed out", name),
        (Some(name), LogoutMode::Automatic) => info!("'{}' signed out after inactivity", name),
        (None, _) => info!("Logout with no active session"),
    }

    Ok(Termination {
        mode,
        username,
        at: Utc::now(),
    })
}
