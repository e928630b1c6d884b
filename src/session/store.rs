//! Session marker persistence across the two storage scopes

use tracing::{debug, info, warn};

use crate::auth::jwt::MarkerCodec;
use crate::auth::models::User;
use crate::error::Result;

use super::marker::{PersistenceMode, SessionMarker};
use super::scope::StorageScope;

/// Key under which the marker is stored in either scope
pub const MARKER_KEY: &str = "session";

/// Owns the session marker.
///
/// At most one scope holds a marker; when both do, the durable one wins.
pub struct SessionStore<D, E> {
    durable: D,
    ephemeral: E,
    codec: MarkerCodec,
}

impl<D: StorageScope, E: StorageScope> SessionStore<D, E> {
    pub fn new(durable: D, ephemeral: E, codec: MarkerCodec) -> Self {
        Self {
            durable,
            ephemeral,
            codec,
        }
    }

    /// Issue a marker for `user` and persist it to the scope implied by `mode`.
    ///
    /// A marker left in the other scope is removed first. If the write
    /// fails no session exists afterwards.
    pub fn establish(&mut self, user: &User, mode: PersistenceMode) -> Result<SessionMarker> {
        let marker = SessionMarker::issue(user, mode);
        let token = self.codec.encode(&marker)?;

        match mode {
            PersistenceMode::Durable => {
                self.ephemeral.remove(MARKER_KEY)?;
                self.durable.write(MARKER_KEY, &token)?;
            }
            PersistenceMode::Ephemeral => {
                self.durable.remove(MARKER_KEY)?;
                self.ephemeral.write(MARKER_KEY, &token)?;
            }
        }

        info!("Session established for '{}' ({})", marker.username, mode);
        Ok(marker)
    }

    /// The current marker, durable scope first
    pub fn current(&self) -> Result<Option<SessionMarker>> {
        if let Some(marker) = self.read_scope(&self.durable, PersistenceMode::Durable)? {
            return Ok(Some(marker));
        }
        self.read_scope(&self.ephemeral, PersistenceMode::Ephemeral)
    }

    pub fn is_authenticated(&self) -> Result<bool> {
        Ok(self.current()?.is_some())
    }

    /// Remove the marker from whichever scope holds it. Idempotent.
    pub fn clear(&mut self) -> Result<()> {
        let durable = self.durable.remove(MARKER_KEY);
        let ephemeral = self.ephemeral.remove(MARKER_KEY);
        durable?;
        ephemeral?;
        debug!("Session markers cleared");
        Ok(())
    }

    fn read_scope<S: StorageScope>(
        &self,
        scope: &S,
        expected: PersistenceMode,
    ) -> Result<Option<SessionMarker>> {
        let Some(token) = scope.read(MARKER_KEY)? else {
            return Ok(None);
        };

        match self.codec.decode(&token) {
            Ok(marker) if marker.mode == expected => Ok(Some(marker)),
            Ok(marker) => {
                warn!(
                    "Ignoring {} marker found in {} storage for '{}'",
                    marker.mode, expected, marker.username
                );
                Ok(None)
            }
            Err(e) => {
                debug!("Ignoring unusable {} marker: {}", expected, e);
                Ok(None)
            }
        }
    }

    pub fn codec(&self) -> &MarkerCodec {
        &self.codec
    }

    pub fn durable(&self) -> &D {
        &self.durable
    }

    pub fn ephemeral(&self) -> &E {
        &self.ephemeral
    }

    /// Hand the scopes back, e.g. to flush pending cookie headers
    pub fn into_scopes(self) -> (D, E) {
        (self.durable, self.ephemeral)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserRole;
    use crate::config::SessionConfig;
    use crate::error::Error;
    use crate::session::scope::{FileScope, MemoryScope};

    fn codec() -> MarkerCodec {
        MarkerCodec::new(&SessionConfig::default())
    }

    fn memory_store() -> SessionStore<MemoryScope, MemoryScope> {
        SessionStore::new(MemoryScope::new(), MemoryScope::new(), codec())
    }

    fn admin() -> User {
        User::new("admin", UserRole::Administrator)
    }

    /// A scope whose writes always fail
    struct BrokenScope;

    impl StorageScope for BrokenScope {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }
        fn write(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(Error::StorageUnavailable("quota exceeded".to_string()))
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_establish_durable_writes_only_durable() {
        let mut store = memory_store();
        let marker = store.establish(&admin(), PersistenceMode::Durable).unwrap();

        assert!(store.durable().read(MARKER_KEY).unwrap().is_some());
        assert!(store.ephemeral().read(MARKER_KEY).unwrap().is_none());
        assert_eq!(store.current().unwrap(), Some(marker));
    }

    #[test]
    fn test_establish_ephemeral_writes_only_ephemeral() {
        let mut store = memory_store();
        let marker = store.establish(&admin(), PersistenceMode::Ephemeral).unwrap();

        assert!(store.durable().read(MARKER_KEY).unwrap().is_none());
        assert!(store.ephemeral().read(MARKER_KEY).unwrap().is_some());
        assert_eq!(store.current().unwrap(), Some(marker));
    }

    #[test]
    fn test_relogin_switches_scope() {
        let mut store = memory_store();
        store.establish(&admin(), PersistenceMode::Durable).unwrap();
        let marker = store.establish(&admin(), PersistenceMode::Ephemeral).unwrap();

        assert!(store.durable().read(MARKER_KEY).unwrap().is_none());
        assert_eq!(store.current().unwrap().map(|m| m.mode), Some(PersistenceMode::Ephemeral));
        assert_eq!(store.current().unwrap(), Some(marker));
    }

    #[test]
    fn test_durable_takes_precedence() {
        let codec = codec();
        let durable_marker = SessionMarker::issue(&admin(), PersistenceMode::Durable);
        let ephemeral_marker =
            SessionMarker::issue(&User::new("viewer", UserRole::Viewer), PersistenceMode::Ephemeral);

        let mut durable = MemoryScope::new();
        durable.write(MARKER_KEY, &codec.encode(&durable_marker).unwrap()).unwrap();
        let mut ephemeral = MemoryScope::new();
        ephemeral.write(MARKER_KEY, &codec.encode(&ephemeral_marker).unwrap()).unwrap();

        let store = SessionStore::new(durable, ephemeral, codec);
        assert_eq!(store.current().unwrap(), Some(durable_marker));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut store = memory_store();
        store.establish(&admin(), PersistenceMode::Durable).unwrap();

        store.clear().unwrap();
        assert_eq!(store.current().unwrap(), None);
        store.clear().unwrap();
        assert_eq!(store.current().unwrap(), None);

        let mut empty = memory_store();
        empty.clear().unwrap();
        assert_eq!(empty.current().unwrap(), None);
    }

    #[test]
    fn test_marker_in_wrong_scope_ignored() {
        let codec = codec();
        let marker = SessionMarker::issue(&admin(), PersistenceMode::Ephemeral);
        let mut durable = MemoryScope::new();
        durable.write(MARKER_KEY, &codec.encode(&marker).unwrap()).unwrap();

        let store = SessionStore::new(durable, MemoryScope::new(), codec);
        assert_eq!(store.current().unwrap(), None);
    }

    #[test]
    fn test_tampered_marker_ignored() {
        let mut durable = MemoryScope::new();
        durable.write(MARKER_KEY, "forged.token.value").unwrap();
        let store = SessionStore::new(durable, MemoryScope::new(), codec());
        assert!(!store.is_authenticated().unwrap());
    }

    #[test]
    fn test_write_failure_leaves_no_session() {
        let mut store = SessionStore::new(BrokenScope, MemoryScope::new(), codec());
        let result = store.establish(&admin(), PersistenceMode::Durable);
        assert!(matches!(result, Err(Error::StorageUnavailable(_))));
        assert_eq!(store.current().unwrap(), None);
    }

    #[test]
    fn test_durable_survives_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let marker = {
            let mut store = SessionStore::new(FileScope::new(dir.path()), MemoryScope::new(), codec());
            store.establish(&admin(), PersistenceMode::Durable).unwrap()
        };

        let store = SessionStore::new(FileScope::new(dir.path()), MemoryScope::new(), codec());
        assert_eq!(store.current().unwrap(), Some(marker));
    }

    #[test]
    fn test_ephemeral_lost_with_its_scope() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut store = SessionStore::new(FileScope::new(dir.path()), MemoryScope::new(), codec());
            store.establish(&admin(), PersistenceMode::Ephemeral).unwrap();
        }

        let store = SessionStore::new(FileScope::new(dir.path()), MemoryScope::new(), codec());
        assert_eq!(store.current().unwrap(), None);
    }
}
