//! WebSocket idle channel
//!
//! Each page instance opens one socket. The page forwards interaction
//! events; the server runs the activity monitor and idle timer for that
//! page and pushes warning, countdown and expiry messages back.

use axum::{
    extract::{ws::*, Extension, State},
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::server::SharedState;
use crate::config::IdleConfig;
use crate::idle::{ActivityKind, ActivityMonitor, IdleEvent, IdleHandle};
use crate::session::SessionMarker;

/// Where the page posts once the countdown has run out
pub const AUTO_LOGOUT_PATH: &str = "/logout/auto";

// ============================================================================
// Message Types
// ============================================================================

/// Messages from client to server
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum ClientMessage {
    /// An interaction event on the page
    Activity { kind: ActivityKind },
    /// Keep-alive ping
    Ping,
}

/// Messages from server to client
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "PascalCase")]
pub enum ServerMessage {
    /// Sent once after the upgrade
    Connected {
        username: String,
        threshold_secs: u64,
        countdown_secs: u32,
    },
    /// Show the warning modal with the countdown at `remaining`
    IdleWarning { remaining: u32 },
    /// New countdown value for the modal
    Countdown { remaining: u32 },
    /// Dismiss the modal
    Resumed,
    /// Session is over; the page must post to `reload`
    Expired { reload: String },
    /// Response to Ping
    Pong,
    /// Error message
    Error { message: String },
}

impl From<IdleEvent> for ServerMessage {
    fn from(event: IdleEvent) -> Self {
        match event {
            IdleEvent::Warning { remaining } => ServerMessage::IdleWarning { remaining },
            IdleEvent::Tick { remaining } => ServerMessage::Countdown { remaining },
            IdleEvent::Resumed => ServerMessage::Resumed,
            IdleEvent::Expired => ServerMessage::Expired {
                reload: AUTO_LOGOUT_PATH.to_string(),
            },
        }
    }
}

// ============================================================================
// WebSocket Handler
// ============================================================================

/// Handle WebSocket upgrade requests
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<SharedState>,
    Extension(marker): Extension<SessionMarker>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, marker))
}

/// Run the idle lifecycle for one page instance
async fn handle_socket(socket: WebSocket, state: SharedState, marker: SessionMarker) {
    let (mut sender, mut receiver) = socket.split();
    run_idle_channel(&mut sender, &mut receiver, &state.config.idle, &marker.username).await;
}

/// Drive one idle channel until the countdown expires or the page goes
/// away.
///
/// Timer transitions are polled before incoming frames, so a chatty
/// client cannot hold back a warning or the expiry. Whether activity
/// cancels a countdown is decided inside the timer task.
pub async fn run_idle_channel<S, R, E>(
    sender: &mut S,
    receiver: &mut R,
    idle_config: &IdleConfig,
    username: &str,
) where
    S: Sink<Message> + Unpin,
    R: Stream<Item = std::result::Result<Message, E>> + Unpin,
{
    let (activity_tx, activity_rx) = mpsc::unbounded_channel();
    let mut monitor = ActivityMonitor::new(idle_config.debounce());
    monitor.start(activity_tx);
    let mut timer = IdleHandle::spawn(idle_config, activity_rx);

    debug!("Idle channel opened for '{}'", username);

    let connected = ServerMessage::Connected {
        username: username.to_string(),
        threshold_secs: idle_config.threshold_secs,
        countdown_secs: idle_config.countdown_secs,
    };

    if send(sender, &connected).await {
        loop {
            tokio::select! {
                biased;

                event = timer.next_event() => {
                    let Some(event) = event else { break };

                    if event == IdleEvent::Expired {
                        // Nothing may reach the page after the expiry notice
                        monitor.stop();
                        timer.stop();
                        info!("'{}' idle countdown elapsed", username);
                        send(sender, &ServerMessage::from(event)).await;
                        break;
                    }

                    if !send(sender, &ServerMessage::from(event)).await {
                        break;
                    }
                }
                incoming = receiver.next() => {
                    let text = match incoming {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => continue,
                    };

                    let reply = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                        Ok(ClientMessage::Activity { kind }) => {
                            monitor.observe(kind);
                            None
                        }
                        Ok(ClientMessage::Ping) => Some(ServerMessage::Pong),
                        Err(e) => Some(ServerMessage::Error {
                            message: format!("Invalid message: {}", e),
                        }),
                    };

                    if let Some(reply) = reply {
                        if !send(sender, &reply).await {
                            break;
                        }
                    }
                }
            }
        }
    }

    monitor.stop();
    timer.stop();
    debug!("Idle channel closed for '{}'", username);
}

/// Serialize and send one message. Returns false once the socket is gone.
async fn send<S>(sender: &mut S, msg: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(_) => true,
    }
}
