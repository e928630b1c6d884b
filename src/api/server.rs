//! HTTP server

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::auth::credentials::CredentialValidator;
use crate::auth::jwt::MarkerCodec;
use crate::auth::middleware::require_session;
use crate::config::Config;
use crate::error::Result;
use crate::ui::{self, Views};

use super::{routes, websocket};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub validator: CredentialValidator,
    pub codec: MarkerCodec,
    pub views: Views,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            validator: CredentialValidator::from_config(&config),
            codec: MarkerCodec::new(&config.session),
            views: Views::new(),
            config,
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Run the HTTP server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    serve_on(listener, config).await
}

/// Serve on an already bound listener
pub async fn serve_on(listener: TcpListener, config: Config) -> Result<()> {
    let state = Arc::new(AppState::new(config));
    let app = create_router(state);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Router {
    // Only reachable with a valid session marker
    let protected = Router::new()
        .route("/ws", get(websocket::ws_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        // API routes
        .route("/api/health", get(routes::health))
        .route("/api/session", get(routes::session_info))
        // UI routes
        .route("/", get(ui::index))
        .route("/login", post(ui::login))
        .route("/sections/{slug}", get(ui::section))
        .route("/logout", get(ui::logout_prompt))
        .route("/logout/confirm", post(ui::logout_confirm))
        .route("/logout/auto", post(ui::logout_auto))
        .route("/assets/{*path}", get(ui::asset))
        .merge(protected)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
