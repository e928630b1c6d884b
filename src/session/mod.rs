//! Session marker persistence
//!
//! A marker lives in exactly one of two scopes: durable (survives restarts
//! of the browsing context) or ephemeral (dies with it).

pub mod marker;
pub mod scope;
pub mod store;

pub use marker::{PersistenceMode, SessionMarker};
pub use scope::{FileScope, MemoryScope, StorageScope};
pub use store::{SessionStore, MARKER_KEY};
