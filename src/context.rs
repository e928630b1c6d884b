//! In-process browsing context
//!
//! A `Console` plays the part of one browser tab: it owns both storage
//! scopes, renders a `Page` from the navigation guard, and while the app
//! view is shown it runs an activity monitor feeding an idle timer. A
//! reload throws away everything but the storage scopes, exactly like a
//! page reload; dropping the console ends the ephemeral scope with it.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::auth::credentials::CredentialValidator;
use crate::auth::jwt::MarkerCodec;
use crate::auth::models::Credential;
use crate::config::{Config, IdleConfig};
use crate::error::{Error, Result};
use crate::idle::{ActivityKind, ActivityMonitor, IdleEvent, IdleHandle, IdleState};
use crate::logout::{LogoutFlow, Termination};
use crate::nav::{NavigationGuard, RenderDecision, Section, View};
use crate::session::{FileScope, MemoryScope, PersistenceMode, SessionMarker, SessionStore, StorageScope};

/// What is currently on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub decision: RenderDecision,
    /// Countdown value while the idle warning is visible
    pub warning: Option<u32>,
    /// Logout confirmation control is showing
    pub logout_prompt: bool,
    /// Error shown on the login view
    pub login_error: Option<String>,
    /// A failed sign-out, shown as a banner on whichever view is up
    pub error: Option<String>,
}

impl Page {
    fn render(decision: RenderDecision) -> Self {
        Self {
            decision,
            warning: None,
            logout_prompt: false,
            login_error: None,
            error: None,
        }
    }

    pub fn view(&self) -> View {
        self.decision.view()
    }
}

pub struct Console<D: StorageScope, E: StorageScope> {
    idle_config: IdleConfig,
    validator: CredentialValidator,
    store: SessionStore<D, E>,
    monitor: ActivityMonitor,
    idle: Option<IdleHandle>,
    logout: LogoutFlow,
    page: Page,
    loads: u32,
    last_termination: Option<Termination>,
}

impl Console<FileScope, MemoryScope> {
    /// Open a fresh context whose durable scope lives in the configured
    /// data directory. Must be called from within a Tokio runtime.
    pub fn open(config: &Config) -> Self {
        let store = SessionStore::new(
            FileScope::new(&config.storage.data_dir),
            MemoryScope::new(),
            MarkerCodec::new(&config.session),
        );
        Self::with_store(config, store)
    }
}

impl<D: StorageScope, E: StorageScope> Console<D, E> {
    /// Build a context over existing scopes and perform the first load
    pub fn with_store(config: &Config, store: SessionStore<D, E>) -> Self {
        let mut console = Self {
            idle_config: config.idle.clone(),
            validator: CredentialValidator::from_config(config),
            store,
            monitor: ActivityMonitor::new(config.idle.debounce()),
            idle: None,
            logout: LogoutFlow::new(),
            page: Page::render(RenderDecision::Login { requested: None }),
            loads: 0,
            last_termination: None,
        };
        console.reload();
        console
    }

    /// Full reload: all in-memory state is discarded and the page is
    /// rendered again from storage. The requested section is kept.
    pub fn reload(&mut self) {
        self.teardown();
        self.logout = LogoutFlow::new();

        let requested = self.page.decision.section();
        let decision = NavigationGuard::evaluate(&self.store, requested);
        let authenticated = decision.view() == View::App;
        self.page = Page::render(decision);
        self.loads += 1;

        if authenticated {
            self.start_monitoring();
        }
    }

    /// Submit the login form
    pub fn login(&mut self, credential: &Credential, remember_me: bool) -> Result<SessionMarker> {
        let established = self
            .validator
            .validate(credential)
            .and_then(|user| self.store.establish(&user, PersistenceMode::from_remember_me(remember_me)));

        match established {
            Ok(marker) => {
                self.reload();
                Ok(marker)
            }
            Err(e) => {
                warn!("Login failed for '{}': {}", credential.username, e);
                self.page.login_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Move to another section without reloading
    pub fn navigate(&mut self, section: Section) -> &Page {
        let decision = NavigationGuard::evaluate(&self.store, Some(section));
        if decision.view() == View::Login && self.is_monitoring() {
            self.teardown();
        }
        self.page.decision = decision;
        &self.page
    }

    /// Feed an interaction into the activity monitor. Returns false when
    /// nothing is observing, i.e. on the login view.
    pub fn interact(&self, kind: ActivityKind) -> bool {
        self.monitor.observe(kind)
    }

    pub fn request_logout(&mut self) -> Result<()> {
        if self.page.view() != View::App {
            return Err(Error::NotAuthenticated);
        }
        self.logout.request();
        self.page.logout_prompt = true;
        Ok(())
    }

    pub fn cancel_logout(&mut self) -> bool {
        self.page.logout_prompt = false;
        self.logout.cancel()
    }

    pub fn confirm_logout(&mut self) -> Result<Termination> {
        let result = self.logout.confirm(&mut self.store, Some(&mut self.monitor));
        if matches!(result, Err(Error::NoPendingLogout)) {
            return result;
        }
        self.finish(result)
    }

    /// Wait for the next idle transition and apply it to the page. On
    /// expiry the session is terminated and the context reloaded before
    /// this returns. If the session cannot be cleared, monitoring stays
    /// off and the failure is put on the page instead; only a new login
    /// starts a fresh idle timer. Returns `None` when nothing is being
    /// monitored.
    ///
    /// Cancel safe: nothing is awaited after a transition is received.
    pub async fn next_idle_event(&mut self) -> Option<IdleEvent> {
        let handle = self.idle.as_mut()?;
        let event = handle.next_event().await;

        match event {
            Some(IdleEvent::Warning { remaining }) | Some(IdleEvent::Tick { remaining }) => {
                self.page.warning = Some(remaining);
            }
            Some(IdleEvent::Resumed) => {
                self.page.warning = None;
            }
            Some(IdleEvent::Expired) => {
                self.page.warning = Some(0);
                self.idle = None;
                info!("Idle countdown elapsed, signing out");
                match self.logout.automatic(&mut self.store, Some(&mut self.monitor)) {
                    Ok(termination) => {
                        self.last_termination = Some(termination);
                        self.reload();
                    }
                    Err(e) => {
                        error!("Automatic sign-out failed, session left in place: {}", e);
                        self.page.warning = None;
                        self.page.error = Some(e.to_string());
                    }
                }
            }
            None => {
                self.idle = None;
            }
        }

        event
    }

    pub fn idle_state(&self) -> Option<IdleState> {
        self.idle.as_ref().map(|handle| handle.state())
    }

    pub fn current(&self) -> Result<Option<SessionMarker>> {
        self.store.current()
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn is_monitoring(&self) -> bool {
        self.idle.is_some() && self.monitor.is_running()
    }

    /// Number of page loads, including the first
    pub fn load_count(&self) -> u32 {
        self.loads
    }

    pub fn last_termination(&self) -> Option<&Termination> {
        self.last_termination.as_ref()
    }

    pub fn idle_config(&self) -> &IdleConfig {
        &self.idle_config
    }

    pub fn store(&self) -> &SessionStore<D, E> {
        &self.store
    }

    /// Reload after a confirmed logout, whatever its outcome
    fn finish(&mut self, result: Result<Termination>) -> Result<Termination> {
        self.reload();
        match &result {
            Ok(termination) => self.last_termination = Some(termination.clone()),
            Err(e) => self.page.error = Some(e.to_string()),
        }
        result
    }

    fn start_monitoring(&mut self) {
        let (tx, rx) = mpsc::unbounded_channel();
        self.monitor.start(tx);
        self.idle = Some(IdleHandle::spawn(&self.idle_config, rx));
    }

    fn teardown(&mut self) {
        self.monitor.stop();
        if let Some(mut handle) = self.idle.take() {
            handle.stop();
        }
    }
}
