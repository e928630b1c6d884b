//! Inactivity detection: activity observation and the warning countdown

pub mod activity;
pub mod timer;

pub use activity::{ActivityKind, ActivityMonitor};
pub use timer::{IdleEvent, IdleHandle, IdleState, IdleTimer};
