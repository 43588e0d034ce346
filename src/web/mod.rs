//! Web API module for the launchpad
//!
//! JSON endpoints for browsing and launching tokens, the mock wallet flow and
//! stored token images, plus a WebSocket feed of wallet and launch events.

pub mod server;
pub mod routes;
pub mod handlers;
pub mod websocket;
pub mod models;

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::config::Config;
use crate::services::{ImageStore, TokenRegistry, WalletSession};
use crate::storage::KeyValueStore;

use self::websocket::WsMessage;

/// Shared application state for all API handlers
#[derive(Clone)]
pub struct AppState {
    /// Launched tokens
    pub registry: Arc<TokenRegistry>,
    /// Mock wallet connection
    pub wallet: Arc<WalletSession>,
    /// Uploaded token logos
    pub images: Arc<ImageStore>,
    /// Application configuration
    pub config: Arc<Config>,
    /// Broadcast channel for WebSocket messages
    pub ws_tx: broadcast::Sender<WsMessage>,
}

impl AppState {
    /// Build every service on top of one shared store
    pub fn new(store: Arc<dyn KeyValueStore>, config: Arc<Config>) -> Self {
        // Capacity of 100 messages
        let (ws_tx, _) = broadcast::channel(100);

        Self {
            registry: Arc::new(TokenRegistry::with_policy(store.clone(), config.slug_policy)),
            wallet: Arc::new(WalletSession::new(store.clone())),
            images: Arc::new(ImageStore::new(store)),
            config,
            ws_tx,
        }
    }

    /// Get a new receiver for WebSocket messages
    pub fn subscribe_ws(&self) -> broadcast::Receiver<WsMessage> {
        self.ws_tx.subscribe()
    }

    /// Broadcast a message to all WebSocket clients
    pub fn broadcast(&self, msg: WsMessage) {
        // Ignore errors (no subscribers)
        let _ = self.ws_tx.send(msg);
    }
}
