//! WebSocket upgrade handler and per-connection loop.
//!
//! Connection lifecycle:
//! 1. Authenticate the `?token=` query parameter before upgrading
//! 2. Upgrade and register the session with the hub actor
//! 3. Forward hub deliveries to the socket from a spawned send task
//! 4. Parse and forward inbound frames to the hub until disconnect
//! 5. Deregister on teardown, however the connection ended

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use common::secret::SecretString;
use common::types::Identity;

use crate::actors::{HubActorHandle, SessionId};
use crate::auth::authenticate;
use crate::errors::HubError;
use crate::protocol::ClientFrame;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WsState {
    pub hub: HubActorHandle,
    pub jwt_secret: SecretString,
    /// Capacity of each session's outbound channel.
    pub session_channel_buffer: usize,
}

/// Query parameters accepted on the upgrade request.
#[derive(Debug, Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// Build the router for the WebSocket endpoint.
pub fn ws_router(state: WsState) -> Router {
    Router::new().route("/ws", get(ws_handler)).with_state(state)
}

/// Handle a WebSocket upgrade request.
///
/// Authentication happens here, before the upgrade completes. Every failure
/// mode collapses into the same 401 with no distinguishing detail.
async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<WsState>,
) -> Response {
    let identity = match authenticate(query.token.as_deref(), &state.jwt_secret) {
        Ok(identity) => identity,
        Err(e) => {
            debug!(target: "hub.ws", error = %e, "Upgrade rejected");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Run one established connection to completion.
async fn handle_socket(socket: WebSocket, identity: Identity, state: WsState) {
    let (mut sink, mut stream) = socket.split();
    let session_id = SessionId::new();
    let (tx, mut rx) = mpsc::channel(state.session_channel_buffer);

    if let Err(e) = state.hub.register(identity, session_id, tx).await {
        warn!(
            target: "hub.ws",
            user_id = %identity.id,
            error = %e,
            "Registration failed, closing connection"
        );
        return;
    }

    info!(
        target: "hub.ws",
        user_id = %identity.id,
        session_id = %session_id,
        role = %identity.role,
        "Connection established"
    );

    // Serialize hub deliveries onto the socket. Failure to serialize a frame
    // or write to the socket ends the task; the recv loop then observes the
    // closed socket.
    let send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            let text = match serde_json::to_string(&frame) {
                Ok(text) => text,
                Err(e) => {
                    warn!(target: "hub.ws", error = %e, "Failed to serialize outbound frame");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop. Per-frame errors drop the frame and keep reading; only
    // socket closure or a fatal hub error ends the loop.
    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                let frame = match ClientFrame::parse(&text) {
                    Ok(frame) => frame,
                    Err(e) => {
                        let err = HubError::MalformedFrame(e.to_string());
                        debug!(
                            target: "hub.ws",
                            user_id = %identity.id,
                            error = %err,
                            "Dropped malformed frame"
                        );
                        continue;
                    }
                };
                if let Err(e) = state.hub.inbound(identity, frame).await {
                    warn!(
                        target: "hub.ws",
                        user_id = %identity.id,
                        error = %e,
                        "Hub unavailable, closing connection"
                    );
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                // Text-only protocol.
                warn!(
                    target: "hub.ws",
                    user_id = %identity.id,
                    "Dropped binary frame"
                );
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // axum answers pings at the protocol layer.
            }
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!(
                    target: "hub.ws",
                    user_id = %identity.id,
                    error = %e,
                    "Socket error"
                );
                break;
            }
        }
    }

    send_task.abort();

    if let Err(e) = state.hub.deregister(identity.id, session_id).await {
        debug!(
            target: "hub.ws",
            user_id = %identity.id,
            error = %e,
            "Deregister during shutdown skipped"
        );
    }

    info!(
        target: "hub.ws",
        user_id = %identity.id,
        session_id = %session_id,
        "Connection closed"
    );
}
