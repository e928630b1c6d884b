//! Authentication models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dashboard roles, carried on the session marker for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Full access, including user management
    Administrator,
    /// Can edit royalty records and contracts
    Editor,
    /// Read-only access
    #[default]
    Viewer,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Administrator => write!(f, "administrator"),
            UserRole::Editor => write!(f, "editor"),
            UserRole::Viewer => write!(f, "viewer"),
        }
    }
}

impl UserRole {
    /// Human-readable label for the header bar
    pub fn label(&self) -> &'static str {
        match self {
            UserRole::Administrator => "Administrator",
            UserRole::Editor => "Editor",
            UserRole::Viewer => "Viewer",
        }
    }
}

/// Actions a role may take on dashboard records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Read,
    Write,
    Delete,
    Admin,
}

impl UserRole {
    /// Everything this role is allowed to do
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            UserRole::Administrator => &[
                Permission::Read,
                Permission::Write,
                Permission::Delete,
                Permission::Admin,
            ],
            UserRole::Editor => &[Permission::Read, Permission::Write],
            UserRole::Viewer => &[Permission::Read],
        }
    }

    pub fn permits(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

/// An authenticated account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub role: UserRole,
}

impl User {
    pub fn new(username: impl Into<String>, role: UserRole) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

/// Submitted login credentials. Used once, never persisted.
#[derive(Clone, Deserialize)]
pub struct Credential {
    pub username: String,
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}
