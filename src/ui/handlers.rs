//! Web UI handlers

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;
use tracing::info;

use crate::api::server::SharedState;
use crate::auth::middleware::{with_session_cookies, CookieSessionStore, RequestSession};
use crate::auth::models::Credential;
use crate::error::{Error, Result};
use crate::logout::LogoutFlow;
use crate::nav::{NavigationGuard, RenderDecision, Section};
use crate::session::PersistenceMode;

use super::views::{content_type, Assets};

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    /// Present when the checkbox is ticked
    #[serde(default)]
    pub remember_me: Option<String>,
}

impl LoginForm {
    pub fn remember_me(&self) -> bool {
        matches!(
            self.remember_me.as_deref(),
            Some("on") | Some("true") | Some("1") | Some("yes")
        )
    }
}

/// Login view or app shell, depending on the session cookies
pub async fn index(State(state): State<SharedState>, RequestSession(store): RequestSession) -> Result<Response> {
    let decision = NavigationGuard::evaluate(&store, None);
    render(&state, decision, false)
}

/// A section inside the app shell; the login view without a session
pub async fn section(
    State(state): State<SharedState>,
    RequestSession(store): RequestSession,
    Path(slug): Path<String>,
) -> Result<Response> {
    let Ok(section) = slug.parse::<Section>() else {
        return Ok((StatusCode::NOT_FOUND, Html(format!("Unknown section '{}'", slug))).into_response());
    };
    let decision = NavigationGuard::evaluate(&store, Some(section));
    render(&state, decision, false)
}

pub async fn login(
    State(state): State<SharedState>,
    RequestSession(mut store): RequestSession,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let remember_me = form.remember_me();
    let credential = Credential::new(form.username, form.password);

    let user = match state.validator.validate(&credential) {
        Ok(user) => user,
        Err(Error::InvalidCredentials) => {
            info!("Rejected login for '{}'", credential.username);
            let html = state.views.login(
                None,
                Some(&Error::InvalidCredentials.to_string()),
                Some(&credential.username),
            )?;
            return Ok((StatusCode::UNAUTHORIZED, Html(html)).into_response());
        }
        Err(e) => return Err(e),
    };

    store.establish(&user, PersistenceMode::from_remember_me(remember_me))?;
    Ok(with_session_cookies(store, Redirect::to("/")))
}

/// First step of an explicit logout: the app shell with the
/// confirmation dialog open
pub async fn logout_prompt(
    State(state): State<SharedState>,
    RequestSession(store): RequestSession,
) -> Result<Response> {
    match NavigationGuard::evaluate(&store, None) {
        decision @ RenderDecision::App { .. } => render(&state, decision, true),
        RenderDecision::Login { .. } => Ok(Redirect::to("/").into_response()),
    }
}

/// Second step of an explicit logout
pub async fn logout_confirm(RequestSession(mut store): RequestSession) -> Result<Response> {
    // The dialog that posts here is the pending request
    let mut flow = LogoutFlow::awaiting_confirmation();
    flow.confirm(&mut store, None)?;
    Ok(reload(store))
}

/// Logout posted by the page once the idle countdown has run out
pub async fn logout_auto(RequestSession(mut store): RequestSession) -> Result<Response> {
    LogoutFlow::new().automatic(&mut store, None)?;
    Ok(reload(store))
}

/// Embedded static files
pub async fn asset(Path(path): Path<String>) -> Response {
    match Assets::get(&format!("static/{}", path)) {
        Some(file) => (
            [(header::CONTENT_TYPE, content_type(&path))],
            file.data.into_owned(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn render(state: &SharedState, decision: RenderDecision, logout_prompt: bool) -> Result<Response> {
    let html = match &decision {
        RenderDecision::Login { requested } => state.views.login(*requested, None, None)?,
        RenderDecision::App { marker, section } => {
            state
                .views
                .app(marker, *section, &state.config.idle, logout_prompt)?
        }
    };
    Ok(Html(html).into_response())
}

/// Full reload into whatever the guard now decides
fn reload(store: CookieSessionStore) -> Response {
    with_session_cookies(store, Redirect::to("/"))
}
