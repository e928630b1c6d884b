//! Session marker and persistence mode

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::models::{Permission, User, UserRole};

/// Storage scope chosen once per login from the "remember me" input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceMode {
    /// Survives reloads and restarts of the browsing context
    Durable,
    /// Survives reloads, cleared when the browsing context ends
    Ephemeral,
}

impl PersistenceMode {
    pub fn from_remember_me(remember_me: bool) -> Self {
        if remember_me {
            PersistenceMode::Durable
        } else {
            PersistenceMode::Ephemeral
        }
    }
}

impl fmt::Display for PersistenceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceMode::Durable => write!(f, "durable"),
            PersistenceMode::Ephemeral => write!(f, "ephemeral"),
        }
    }
}

impl FromStr for PersistenceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "durable" => Ok(PersistenceMode::Durable),
            "ephemeral" => Ok(PersistenceMode::Ephemeral),
            other => Err(format!("unknown persistence mode '{}'", other)),
        }
    }
}

/// Proof of authentication held in client-resident storage.
///
/// Exists if and only if the user is signed in. The mode is fixed at
/// issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMarker {
    pub id: String,
    pub username: String,
    pub role: UserRole,
    pub mode: PersistenceMode,
    pub issued_at: DateTime<Utc>,
}

impl SessionMarker {
    /// Issue a fresh marker for an authenticated user
    pub fn issue(user: &User, mode: PersistenceMode) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: user.username.clone(),
            role: user.role,
            mode,
            // Whole seconds so the marker survives a round trip through the token
            issued_at: Utc::now().trunc_subsecs(0),
        }
    }

    /// Whether the signed-in role allows `permission`
    pub fn permits(&self, permission: Permission) -> bool {
        self.role.permits(permission)
    }

    pub fn age(&self) -> chrono::Duration {
        Utc::now().signed_duration_since(self.issued_at)
    }
}
