//! Cookie-backed session scopes and request extractors
//!
//! A browser keeps the session marker in one of two cookies. The durable
//! cookie carries `Max-Age` and survives a browser restart; the ephemeral
//! one is a session cookie and goes away with the browsing context.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::convert::Infallible;
use tracing::warn;

use crate::api::server::SharedState;
use crate::auth::jwt::MarkerCodec;
use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::{SessionStore, StorageScope};

/// Parse a `Cookie` header into name/value pairs
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.trim().to_string(), value.trim().to_string()))
        })
        .collect()
}

/// One cookie lifetime class, seen from a single request.
///
/// Reads come from the request's cookies; writes and removals are
/// recorded as `Set-Cookie` values to attach to the response.
#[derive(Debug, Clone)]
pub struct CookieScope {
    namespace: String,
    max_age: Option<i64>,
    secure: bool,
    jar: HashMap<String, String>,
    pending: Vec<String>,
}

impl CookieScope {
    /// Persistent cookie: `<prefix>_remember_<key>`
    pub fn durable(config: &SessionConfig, headers: &HeaderMap) -> Self {
        Self::from_headers(
            format!("{}_remember", config.cookie_prefix),
            Some(config.durable_ttl().num_seconds()),
            config.secure_cookies,
            headers,
        )
    }

    /// Session cookie: `<prefix>_<key>`
    pub fn ephemeral(config: &SessionConfig, headers: &HeaderMap) -> Self {
        Self::from_headers(config.cookie_prefix.clone(), None, config.secure_cookies, headers)
    }

    fn from_headers(namespace: String, max_age: Option<i64>, secure: bool, headers: &HeaderMap) -> Self {
        let prefix = format!("{}_", namespace);
        let jar = parse_cookies(headers)
            .into_iter()
            .filter(|(name, _)| name.starts_with(&prefix))
            .collect();

        Self {
            namespace,
            max_age,
            secure,
            jar,
            pending: Vec::new(),
        }
    }

    pub fn cookie_name(&self, key: &str) -> String {
        format!("{}_{}", self.namespace, key)
    }

    /// `Set-Cookie` values produced so far
    pub fn set_cookies(&self) -> &[String] {
        &self.pending
    }

    fn attributes(&self) -> String {
        let mut attrs = String::from("Path=/; HttpOnly; SameSite=Lax");
        if self.secure {
            attrs.push_str("; Secure");
        }
        attrs
    }
}

impl StorageScope for CookieScope {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.jar.get(&self.cookie_name(key)).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        let name = self.cookie_name(key);
        let mut cookie = format!("{}={}; {}", name, value, self.attributes());
        if let Some(max_age) = self.max_age {
            cookie.push_str(&format!("; Max-Age={}", max_age));
        }
        self.pending.push(cookie);
        self.jar.insert(name, value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let name = self.cookie_name(key);
        // Only expire cookies the browser actually sent
        if self.jar.remove(&name).is_some() {
            self.pending.push(format!("{}=; {}; Max-Age=0", name, self.attributes()));
        }
        Ok(())
    }
}

pub type CookieSessionStore = SessionStore<CookieScope, CookieScope>;

/// Session store over the cookies of one request
pub fn request_store(
    config: &SessionConfig,
    headers: &HeaderMap,
    codec: MarkerCodec,
) -> CookieSessionStore {
    SessionStore::new(
        CookieScope::durable(config, headers),
        CookieScope::ephemeral(config, headers),
        codec,
    )
}

/// Attach every cookie change made through `store` to `response`
pub fn with_session_cookies(store: CookieSessionStore, response: impl IntoResponse) -> Response {
    let mut response = response.into_response();
    let (durable, ephemeral) = store.into_scopes();

    for cookie in durable.set_cookies().iter().chain(ephemeral.set_cookies()) {
        match HeaderValue::from_str(cookie) {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(e) => warn!("Dropping unrepresentable cookie: {}", e),
        }
    }

    response
}

/// Extractor giving a handler the session store for its request
pub struct RequestSession(pub CookieSessionStore);

impl FromRequestParts<SharedState> for RequestSession {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> std::result::Result<Self, Self::Rejection> {
        Ok(RequestSession(request_store(
            &state.config.session,
            &parts.headers,
            state.codec.clone(),
        )))
    }
}

/// Middleware for requiring a session marker. The marker is made
/// available to the handler as a request extension.
pub async fn require_session(
    State(state): State<SharedState>,
    mut req: Request,
    next: Next,
) -> std::result::Result<Response, Error> {
    let store = request_store(&state.config.session, req.headers(), state.codec.clone());
    let marker = store.current()?.ok_or(Error::NotAuthenticated)?;

    req.extensions_mut().insert(marker);
    Ok(next.run(req).await)
}
