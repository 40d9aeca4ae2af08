//! SyncDraw WebSocket Relay Server
//!
//! Relays document deltas between clients drawing in the same room.
//!
//! ## Protocol
//!
//! Clients connect to `ws://<host>/<room>`. Every WebSocket message is one
//! binary [`SyncMessage`](syncdraw_core::SyncMessage) frame:
//! - the server greets each connection with `SyncStep1` (its version vector)
//! - a client `SyncStep1` is answered with `SyncStep2` (what the client lacks)
//! - client `SyncStep2`/`Update` deltas are merged into the room replica and
//!   relayed to every other peer as `Update`

pub mod config;
pub mod room;

use axum::{
    Json, Router,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use room::{RoomRegistry, RoomStats};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shared application state
#[derive(Default)]
pub struct AppState {
    /// Active rooms
    pub rooms: RoomRegistry,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Build the HTTP/WebSocket router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/rooms", get(list_rooms))
        .route("/{room}", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve the relay on an already bound listener.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> std::io::Result<()> {
    axum::serve(listener, router(state)).await
}

/// Index page
async fn index() -> &'static str {
    "SyncDraw Relay Server - Connect via WebSocket at /<room>"
}

/// Health check
async fn health() -> &'static str {
    "ok"
}

async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomStats>> {
    Json(state.rooms.stats())
}

/// WebSocket upgrade handler
async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, room))
}

/// Handle a WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, room: String) {
    let peer_id = Uuid::new_v4();
    let (mut room_rx, hello) = match state.rooms.join(&room, peer_id) {
        Ok(joined) => joined,
        Err(e) => {
            warn!("Failed to join room {}: {}", room, e);
            return;
        }
    };
    info!("Peer {} joined room {}", peer_id, room);

    let (mut sender, mut receiver) = socket.split();

    if sender.send(Message::Binary(hello)).await.is_ok() {
        loop {
            tokio::select! {
                // Handle incoming frames from client
                msg = receiver.next() => {
                    match msg {
                        Some(Ok(Message::Binary(data))) => {
                            match state.rooms.apply(&room, peer_id, &data) {
                                Ok(Some(reply)) => {
                                    if sender.send(Message::Binary(reply)).await.is_err() {
                                        break;
                                    }
                                }
                                Ok(None) => {}
                                Err(e) => {
                                    warn!("Dropping frame from {} in room {}: {}", peer_id, room, e);
                                }
                            }
                        }
                        Some(Ok(Message::Close(_))) | None => {
                            break;
                        }
                        Some(Ok(_)) => {} // Ignore text, ping/pong
                        Some(Err(e)) => {
                            warn!("WebSocket error for {}: {}", peer_id, e);
                            break;
                        }
                    }
                }

                // Handle frames relayed from other peers in the room
                msg = room_rx.recv() => {
                    match msg {
                        Ok((from, frame)) => {
                            // Don't echo back to sender
                            if from != peer_id && sender.send(Message::Binary(frame)).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Lagged(skipped)) => {
                            warn!("Peer {} lagged by {} frames, sending full state", peer_id, skipped);
                            match state.rooms.full_state(&room) {
                                Ok(Some(frame)) => {
                                    if sender.send(Message::Binary(frame)).await.is_err() {
                                        break;
                                    }
                                }
                                Ok(None) => {}
                                Err(e) => warn!("Failed to export room {}: {}", room, e),
                            }
                        }
                        Err(RecvError::Closed) => {
                            debug!("Room {} channel closed", room);
                            break;
                        }
                    }
                }
            }
        }
    }

    // Cleanup on disconnect
    state.rooms.leave(&room, peer_id);
    info!("Peer {} left room {}", peer_id, room);
}
