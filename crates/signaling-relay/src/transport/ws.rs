//! WebSocket transport for the signaling protocol.
//!
//! One socket is one [`ConnectionId`]. Each socket gets a bounded outbound
//! channel registered with the relay actor and a writer task that drains it.
//! The reader loop parses text frames into [`ClientEvent`](crate::protocol::ClientEvent)s
//! and forwards them to the actor. Closing the socket, or a read error,
//! produces exactly one `disconnect`.

use crate::actors::RelayActorHandle;
use crate::observability::metrics::record_protocol_error;
use crate::protocol::{parse_client_event, ServerEvent};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::types::ConnectionId;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use token_service::TokenService;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Buffer size for per-connection outbound channel.
pub const CONNECTION_CHANNEL_BUFFER: usize = 64;

/// Shared state for the `/ws` route.
#[derive(Clone)]
pub struct WsState {
    pub relay: RelayActorHandle,
    pub tokens: Arc<TokenService>,
    /// Reject upgrades without a valid `token` query parameter.
    pub require_token: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub token: Option<String>,
}

/// `GET /ws` upgrade handler.
#[instrument(name = "relay.transport.ws.upgrade", skip_all)]
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<WsState>,
    Query(params): Query<WsParams>,
) -> Response {
    if state.require_token {
        let authorized = params
            .token
            .as_deref()
            .is_some_and(|token| state.tokens.check(token));

        if !authorized {
            debug!(
                target: "relay.transport.ws",
                token_present = params.token.is_some(),
                "WebSocket upgrade rejected"
            );
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    ws.on_upgrade(move |socket| handle_socket(socket, state.relay))
}

async fn handle_socket(socket: WebSocket, relay: RelayActorHandle) {
    let connection_id = ConnectionId::new();
    let (tx, mut rx) = mpsc::channel::<ServerEvent>(CONNECTION_CHANNEL_BUFFER);

    if let Err(e) = relay.connect(connection_id, tx.clone()).await {
        warn!(
            target: "relay.transport.ws",
            connection_id = %connection_id,
            error = %e,
            "Relay unavailable, dropping socket"
        );
        return;
    }

    info!(
        target: "relay.transport.ws",
        connection_id = %connection_id,
        "WebSocket connection established"
    );

    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Ends once the hub and this task both drop their senders
    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(target: "relay.transport.ws", error = %e, "Failed to encode event");
                }
            }
        }
        let _ = ws_sender.close().await;
    });

    while let Some(result) = ws_receiver.next().await {
        match result {
            Ok(Message::Text(text)) => match parse_client_event(text.as_str()) {
                Ok(event) => {
                    if let Err(e) = relay.dispatch(connection_id, event).await {
                        warn!(
                            target: "relay.transport.ws",
                            connection_id = %connection_id,
                            error = %e,
                            "Relay unavailable, closing socket"
                        );
                        break;
                    }
                }
                Err(e) => {
                    debug!(
                        target: "relay.transport.ws",
                        connection_id = %connection_id,
                        code = e.code(),
                        "Rejected client frame"
                    );
                    record_protocol_error(e.code());
                    let _ = tx.try_send(ServerEvent::from(&e));
                }
            },
            Ok(Message::Close(_)) => {
                debug!(
                    target: "relay.transport.ws",
                    connection_id = %connection_id,
                    "WebSocket closed by client"
                );
                break;
            }
            Err(e) => {
                debug!(
                    target: "relay.transport.ws",
                    connection_id = %connection_id,
                    error = %e,
                    "WebSocket read error"
                );
                break;
            }
            // Binary frames are not part of the protocol; ping/pong is handled by axum
            Ok(_) => {}
        }
    }

    if let Err(e) = relay.disconnect(connection_id).await {
        warn!(
            target: "relay.transport.ws",
            connection_id = %connection_id,
            error = %e,
            "Failed to detach connection"
        );
    }

    drop(tx);
    if send_task.await.is_err() {
        debug!(target: "relay.transport.ws", "Writer task aborted");
    }

    info!(
        target: "relay.transport.ws",
        connection_id = %connection_id,
        "WebSocket connection terminated"
    );
}
