//! Royalty Desk - royalty administration dashboard shell
//!
//! This is the library interface for Royalty Desk. The core is the session
//! lifecycle: sign-in with a chosen persistence mode, inactivity detection
//! with a warning countdown, and confirmed or automatic sign-out.

pub mod api;
pub mod auth;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod idle;
pub mod logout;
pub mod nav;
pub mod session;
pub mod ui;

pub use config::Config;
pub use context::{Console, Page};
pub use error::Error;
pub use session::{PersistenceMode, SessionMarker, SessionStore};
