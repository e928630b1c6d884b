//! Web UI: login view, app shell, embedded assets

mod handlers;
pub mod views;

pub use handlers::*;
pub use views::{Assets, Views};
