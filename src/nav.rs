//! Section gating on session presence

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::session::{SessionMarker, SessionStore, StorageScope};

/// Top-level dashboard sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Dashboard,
    Users,
    Royalties,
    Contracts,
    Reports,
    Audit,
    Settings,
}

impl Section {
    pub const ALL: [Section; 7] = [
        Section::Dashboard,
        Section::Users,
        Section::Royalties,
        Section::Contracts,
        Section::Reports,
        Section::Audit,
        Section::Settings,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Section::Dashboard => "dashboard",
            Section::Users => "users",
            Section::Royalties => "royalties",
            Section::Contracts => "contracts",
            Section::Reports => "reports",
            Section::Audit => "audit",
            Section::Settings => "settings",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Dashboard => "Dashboard",
            Section::Users => "User Management",
            Section::Royalties => "Royalty Records",
            Section::Contracts => "Contract Management",
            Section::Reports => "Reports & Analytics",
            Section::Audit => "Audit Log",
            Section::Settings => "Settings",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug())
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .iter()
            .copied()
            .find(|section| section.slug() == s)
            .ok_or_else(|| format!("unknown section '{}'", s))
    }
}

/// Which top-level view is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Login,
    App,
}

impl View {
    pub fn for_marker(marker: Option<&SessionMarker>) -> Self {
        match marker {
            Some(_) => View::App,
            None => View::Login,
        }
    }
}

/// Result of one guard evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision {
    /// Only the login view may be shown; `requested` is remembered for display
    Login { requested: Option<Section> },
    App { marker: SessionMarker, section: Section },
}

impl RenderDecision {
    pub fn view(&self) -> View {
        View::for_marker(self.marker())
    }

    pub fn marker(&self) -> Option<&SessionMarker> {
        match self {
            RenderDecision::App { marker, .. } => Some(marker),
            RenderDecision::Login { .. } => None,
        }
    }

    /// The section being shown, or the one that was requested
    pub fn section(&self) -> Option<Section> {
        match self {
            RenderDecision::App { section, .. } => Some(*section),
            RenderDecision::Login { requested } => *requested,
        }
    }
}

pub struct NavigationGuard;

impl NavigationGuard {
    /// Decide what to render for `requested`. A storage read failure
    /// counts as no session.
    pub fn evaluate<D: StorageScope, E: StorageScope>(
        store: &SessionStore<D, E>,
        requested: Option<Section>,
    ) -> RenderDecision {
        match store.current() {
            Ok(Some(marker)) => RenderDecision::App {
                marker,
                section: requested.unwrap_or_default(),
            },
            Ok(None) => RenderDecision::Login { requested },
            Err(e) => {
                warn!("Session storage unreadable, showing login: {}", e);
                RenderDecision::Login { requested }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::MarkerCodec;
    use crate::auth::models::{User, UserRole};
    use crate::config::SessionConfig;
    use crate::error::{Error, Result};
    use crate::session::{MemoryScope, PersistenceMode};

    fn store() -> SessionStore<MemoryScope, MemoryScope> {
        SessionStore::new(
            MemoryScope::new(),
            MemoryScope::new(),
            MarkerCodec::new(&SessionConfig::default()),
        )
    }

    struct UnreadableScope;

    impl StorageScope for UnreadableScope {
        fn read(&self, _key: &str) -> Result<Option<String>> {
            Err(Error::StorageUnavailable("denied".to_string()))
        }
        fn write(&mut self, _key: &str, _value: &str) -> Result<()> {
            Ok(())
        }
        fn remove(&mut self, _key: &str) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_section_slugs_round_trip() {
        for section in Section::ALL {
            assert_eq!(section.slug().parse::<Section>(), Ok(section));
        }
        assert!("billing".parse::<Section>().is_err());
    }

    #[test]
    fn test_unauthenticated_only_login() {
        let store = store();
        for section in Section::ALL {
            let decision = NavigationGuard::evaluate(&store, Some(section));
            assert_eq!(decision.view(), View::Login);
            assert_eq!(decision.section(), Some(section));
        }
    }

    #[test]
    fn test_authenticated_routes_sections() {
        let mut store = store();
        store
            .establish(&User::new("editor", UserRole::Editor), PersistenceMode::Ephemeral)
            .unwrap();

        let decision = NavigationGuard::evaluate(&store, Some(Section::Contracts));
        assert_eq!(decision.view(), View::App);
        assert_eq!(decision.section(), Some(Section::Contracts));
        assert_eq!(decision.marker().map(|m| m.username.as_str()), Some("editor"));

        let default = NavigationGuard::evaluate(&store, None);
        assert_eq!(default.section(), Some(Section::Dashboard));
    }

    #[test]
    fn test_guard_relocks_after_clear() {
        let mut store = store();
        store
            .establish(&User::new("admin", UserRole::Administrator), PersistenceMode::Durable)
            .unwrap();
        assert_eq!(NavigationGuard::evaluate(&store, None).view(), View::App);

        store.clear().unwrap();
        assert_eq!(NavigationGuard::evaluate(&store, None).view(), View::Login);
    }

    #[test]
    fn test_unreadable_storage_fails_closed() {
        let store = SessionStore::new(
            UnreadableScope,
            MemoryScope::new(),
            MarkerCodec::new(&SessionConfig::default()),
        );
        assert_eq!(NavigationGuard::evaluate(&store, None).view(), View::Login);
    }
}
