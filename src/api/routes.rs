//! JSON route handlers

use axum::{response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::middleware::RequestSession;
use crate::auth::models::{Permission, UserRole};
use crate::nav::{NavigationGuard, View};
use crate::session::PersistenceMode;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// What the page would render for the caller's cookies
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub view: View,
    pub username: Option<String>,
    pub role: Option<UserRole>,
    pub mode: Option<PersistenceMode>,
    pub issued_at: Option<DateTime<Utc>>,
    /// Empty when signed out
    pub permissions: Vec<Permission>,
}

// Health check

pub async fn health() -> impl IntoResponse {
    Json(ApiResponse::ok("healthy"))
}

// Session state

pub async fn session_info(RequestSession(store): RequestSession) -> impl IntoResponse {
    let decision = NavigationGuard::evaluate(&store, None);
    let marker = decision.marker();

    Json(ApiResponse::ok(SessionView {
        view: decision.view(),
        username: marker.map(|m| m.username.clone()),
        role: marker.map(|m| m.role),
        mode: marker.map(|m| m.mode),
        issued_at: marker.map(|m| m.issued_at),
        permissions: marker
            .map(|m| m.role.permissions().to_vec())
            .unwrap_or_default(),
    }))
}
