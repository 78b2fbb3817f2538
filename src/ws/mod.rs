pub mod handlers;
pub mod host;
pub mod team;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::protocol::{ClientMessage, PackInfo, ServerMessage};
use crate::state::AppState;
use crate::types::Role;

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub role: Option<String>,
}

impl WsQuery {
    pub fn role(&self) -> Role {
        match self.role.as_deref() {
            Some("host") => Role::Host,
            Some("spectator") => Role::Spectator,
            _ => Role::Team,
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let role = params.role();
    tracing::info!("WebSocket connection request: role={:?}", role);

    ws.on_upgrade(move |socket| handle_socket(socket, role, state))
}

/// Serialize and send one message; false when the socket is gone
async fn send_json<S, T>(sender: &mut S, msg: &T) -> bool
where
    S: SinkExt<Message> + Unpin,
    T: Serialize,
{
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, role: Role, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    tracing::info!("WebSocket connected with role: {:?}", role);

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        role,
        pack: PackInfo::from(state.catalog.as_ref()),
        server_now: chrono::Utc::now().to_rfc3339(),
    };
    if !send_json(&mut sender, &welcome).await {
        tracing::error!("Failed to send welcome message");
        return;
    }

    // Current standings right away, the broadcaster only sends changes
    let leaderboard = ServerMessage::Leaderboard {
        entries: state.leaderboard().await,
    };
    if !send_json(&mut sender, &leaderboard).await {
        return;
    }

    // Subscribe to general broadcast (all clients)
    let mut broadcast_rx = state.broadcast.subscribe();

    // Subscribe to Host-specific broadcast if Host
    let mut host_broadcast_rx = if role == Role::Host {
        Some(state.host_broadcast.subscribe())
    } else {
        None
    };

    loop {
        tokio::select! {
            broadcast_msg = broadcast_rx.recv() => {
                if let Ok(msg) = broadcast_msg {
                    if !send_json(&mut sender, &msg).await {
                        break;
                    }
                }
            }

            host_msg = async {
                match &mut host_broadcast_rx {
                    Some(rx) => rx.recv().await.ok(),
                    None => {
                        // Non-Host: wait forever
                        std::future::pending::<Option<ServerMessage>>().await
                    }
                }
            } => {
                if let Some(msg) = host_msg {
                    if !send_json(&mut sender, &msg).await {
                        break;
                    }
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text.as_str());

                        let response = match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => handlers::handle_message(client_msg, &role, &state).await,
                            Err(e) => {
                                tracing::warn!("Failed to parse client message: {}", e);
                                Some(ServerMessage::error(
                                    "PARSE_ERROR",
                                    format!("Invalid message format: {}", e),
                                ))
                            }
                        };

                        if let Some(response) = response {
                            if !send_json(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for role: {:?}", role);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_from_query() {
        let query = |role: Option<&str>| WsQuery {
            role: role.map(str::to_string),
        };
        assert_eq!(query(Some("host")).role(), Role::Host);
        assert_eq!(query(Some("spectator")).role(), Role::Spectator);
        assert_eq!(query(Some("team")).role(), Role::Team);
        assert_eq!(query(None).role(), Role::Team);
    }
}
