//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use crate::auth::models::UserRole;
use crate::error::{Error, Result};

/// Longest accepted inactivity threshold (one day)
pub const MAX_THRESHOLD_SECS: u64 = 24 * 60 * 60;
/// Longest accepted countdown tick (one minute)
pub const MAX_TICK_INTERVAL_MS: u64 = 60 * 1000;
/// Highest accepted countdown start value
pub const MAX_COUNTDOWN_SECS: u32 = 60 * 60;
/// Longest accepted "remember me" lifetime (ten years)
pub const MAX_DURABLE_TTL_DAYS: i64 = 3650;
/// Longest accepted session-only lifetime (one year)
pub const MAX_EPHEMERAL_TTL_HOURS: i64 = 24 * 365;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub idle: IdleConfig,

    /// Accounts accepted by the login screen
    #[serde(default = "default_users")]
    pub users: Vec<UserConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            session: SessionConfig::default(),
            idle: IdleConfig::default(),
            users: default_users(),
        }
    }
}

/// Server configuration for the HTTP dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Where the in-process console keeps its durable session file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./.royalty-desk")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Session marker signing and lifetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HMAC secret used to sign session markers
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Prefix for the two session cookies
    #[serde(default = "default_cookie_prefix")]
    pub cookie_prefix: String,

    /// Lifetime of a "remember me" marker
    #[serde(default = "default_durable_ttl_days")]
    pub durable_ttl_days: i64,

    /// Upper bound on a session-only marker
    #[serde(default = "default_ephemeral_ttl_hours")]
    pub ephemeral_ttl_hours: i64,

    /// Mark cookies `Secure` (requires HTTPS in front of the server)
    #[serde(default)]
    pub secure_cookies: bool,
}

fn default_secret() -> String {
    "royalty-desk-secret-change-in-production".to_string()
}

fn default_cookie_prefix() -> String {
    "royalty_desk".to_string()
}

fn default_durable_ttl_days() -> i64 {
    30
}

fn default_ephemeral_ttl_hours() -> i64 {
    12
}

impl SessionConfig {
    /// Lifetime of a durable marker, kept within the accepted range
    pub fn durable_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.durable_ttl_days.clamp(1, MAX_DURABLE_TTL_DAYS))
    }

    /// Lifetime of an ephemeral marker, kept within the accepted range
    pub fn ephemeral_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.ephemeral_ttl_hours.clamp(1, MAX_EPHEMERAL_TTL_HOURS))
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: default_secret(),
            cookie_prefix: default_cookie_prefix(),
            durable_ttl_days: default_durable_ttl_days(),
            ephemeral_ttl_hours: default_ephemeral_ttl_hours(),
            secure_cookies: false,
        }
    }
}

/// Inactivity detection settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdleConfig {
    /// Seconds without activity before the warning is shown
    #[serde(default = "default_threshold_secs")]
    pub threshold_secs: u64,

    /// Value the countdown starts from once the warning is shown
    #[serde(default = "default_countdown_secs")]
    pub countdown_secs: u32,

    /// Interval between countdown ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Minimum spacing between activity signals
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_threshold_secs() -> u64 {
    30
}

fn default_countdown_secs() -> u32 {
    10
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_debounce_ms() -> u64 {
    250
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            threshold_secs: default_threshold_secs(),
            countdown_secs: default_countdown_secs(),
            tick_interval_ms: default_tick_interval_ms(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl IdleConfig {
    pub fn threshold(&self) -> Duration {
        Duration::from_secs(self.threshold_secs.min(MAX_THRESHOLD_SECS))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.min(MAX_TICK_INTERVAL_MS))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// A login account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: UserRole,
}

fn default_users() -> Vec<UserConfig> {
    vec![
        UserConfig {
            username: "admin".to_string(),
            password: "admin123".to_string(),
            role: UserRole::Administrator,
        },
        UserConfig {
            username: "editor".to_string(),
            password: "editor123".to_string(),
            role: UserRole::Editor,
        },
        UserConfig {
            username: "viewer".to_string(),
            password: "viewer123".to_string(),
            role: UserRole::Viewer,
        },
    ]
}

impl Config {
    /// Reject settings the session lifecycle cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.idle.threshold_secs == 0 || self.idle.threshold_secs > MAX_THRESHOLD_SECS {
            return Err(Error::Config(format!(
                "idle.threshold_secs must be between 1 and {}",
                MAX_THRESHOLD_SECS
            )));
        }
        if self.idle.countdown_secs == 0 || self.idle.countdown_secs > MAX_COUNTDOWN_SECS {
            return Err(Error::Config(format!(
                "idle.countdown_secs must be between 1 and {}",
                MAX_COUNTDOWN_SECS
            )));
        }
        if self.idle.tick_interval_ms == 0 || self.idle.tick_interval_ms > MAX_TICK_INTERVAL_MS {
            return Err(Error::Config(format!(
                "idle.tick_interval_ms must be between 1 and {}",
                MAX_TICK_INTERVAL_MS
            )));
        }
        // A folded event reaches the timer up to two windows late
        if self.idle.debounce() * 2 >= self.idle.threshold() {
            return Err(Error::Config(
                "idle.debounce_ms must be less than half of idle.threshold_secs".to_string(),
            ));
        }
        if self.session.secret.trim().is_empty() {
            return Err(Error::Config("session.secret must not be empty".to_string()));
        }
        if !(1..=MAX_DURABLE_TTL_DAYS).contains(&self.session.durable_ttl_days) {
            return Err(Error::Config(format!(
                "session.durable_ttl_days must be between 1 and {}",
                MAX_DURABLE_TTL_DAYS
            )));
        }
        if !(1..=MAX_EPHEMERAL_TTL_HOURS).contains(&self.session.ephemeral_ttl_hours) {
            return Err(Error::Config(format!(
                "session.ephemeral_ttl_hours must be between 1 and {}",
                MAX_EPHEMERAL_TTL_HOURS
            )));
        }
        if self.session.cookie_prefix.is_empty()
            || !self
                .session
                .cookie_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(Error::Config(format!(
                "invalid session.cookie_prefix '{}'",
                self.session.cookie_prefix
            )));
        }

        let mut seen = HashSet::new();
        for user in &self.users {
            if user.username.is_empty() || user.password.is_empty() {
                return Err(Error::Config("users need a username and a password".to_string()));
            }
            if !seen.insert(user.username.as_str()) {
                return Err(Error::Config(format!("duplicate user '{}'", user.username)));
            }
        }

        Ok(())
    }

    /// Look up a configured account by username
    pub fn get_user(&self, username: &str) -> Option<&UserConfig> {
        self.users.iter().find(|u| u.username == username)
    }
}
