//! WebSocket handler for live launchpad updates

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, error, info, warn};

use super::AppState;
use crate::models::TokenRecord;

/// WebSocket message types broadcast to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WsMessage {
    /// The connected wallet changed (None once disconnected)
    WalletChanged {
        address: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A token was launched
    TokenLaunched {
        slug: String,
        symbol: String,
        name: String,
        creator_address: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// Heartbeat/ping message
    Ping {
        timestamp: DateTime<Utc>,
    },
}

impl WsMessage {
    pub fn wallet_changed(address: Option<String>) -> Self {
        Self::WalletChanged {
            address,
            timestamp: Utc::now(),
        }
    }

    pub fn token_launched(token: &TokenRecord) -> Self {
        Self::TokenLaunched {
            slug: token.slug.clone(),
            symbol: token.symbol.clone(),
            name: token.name.clone(),
            creator_address: token.creator_address.clone(),
            timestamp: Utc::now(),
        }
    }
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = state.subscribe_ws();

    info!("New WebSocket client connected");

    let ping = WsMessage::Ping {
        timestamp: Utc::now(),
    };
    if let Ok(json) = serde_json::to_string(&ping) {
        let _ = sender.send(Message::Text(json)).await;
    }

    // Forward broadcast messages to this client
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = match rx.recv().await {
                Ok(msg) => msg,
                Err(RecvError::Lagged(skipped)) => {
                    warn!("WebSocket client lagged, skipped {} messages", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match serde_json::to_string(&msg) {
                Ok(json) => {
                    if sender.send(Message::Text(json)).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    error!("Failed to serialize WebSocket message: {}", e);
                }
            }
        }
    });

    // Clients only listen; drain until they go away
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    debug!("Ignoring WebSocket message: {}", text);
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket client disconnected");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    error!("WebSocket error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    info!("WebSocket connection closed");
}
