//! Mock wallet session
//!
//! Holds at most one connected address. The address is not derived from any
//! key material: it only looks like one.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::error::Result;
use crate::storage::{KeyValueStore, WALLET_KEY};
use crate::web::websocket::WsMessage;

/// Addresses are drawn uniformly from `[0, ADDRESS_SPACE)` and printed as
/// 16 zero-padded hex digits.
const ADDRESS_SPACE: u64 = 10_000_000_000_000_000;

pub struct WalletSession {
    store: Arc<dyn KeyValueStore>,
    /// Lazily filled from the store on first read
    cached: RwLock<Option<String>>,
}

impl WalletSession {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            cached: RwLock::new(None),
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.address().await.is_some()
    }

    /// Connected address: memory first, then the store. Store errors read as
    /// "not connected".
    pub async fn address(&self) -> Option<String> {
        if let Some(address) = self.cached.read().await.clone() {
            return Some(address);
        }

        match self.store.get(WALLET_KEY) {
            Ok(Some(address)) if !address.is_empty() => {
                *self.cached.write().await = Some(address.clone());
                Some(address)
            }
            Ok(_) => None,
            Err(e) => {
                error!("Failed to get wallet address: {}", e);
                None
            }
        }
    }

    /// Generate and persist a fresh pseudo-random address.
    pub async fn connect(&self) -> Result<String> {
        let address = random_address();

        self.store.set(WALLET_KEY, &address).map_err(|e| {
            error!("Failed to connect wallet: {}", e);
            e
        })?;
        *self.cached.write().await = Some(address.clone());

        info!("🔌 Wallet connected: {}", short_address(&address));
        Ok(address)
    }

    /// Forget the address in both the store and memory. Calling it while
    /// disconnected is a no-op. If the store refuses the removal the session
    /// stays connected.
    pub async fn disconnect(&self) -> Result<()> {
        self.store.remove(WALLET_KEY).map_err(|e| {
            error!("Failed to disconnect wallet: {}", e);
            e
        })?;
        if self.cached.write().await.take().is_some() {
            info!("Wallet disconnected");
        }
        Ok(())
    }

    /// Re-read the store, bypassing the cache, and adopt whatever it holds.
    pub async fn sync_from_store(&self) -> Option<String> {
        let stored = match self.store.get(WALLET_KEY) {
            Ok(value) => value.filter(|a| !a.is_empty()),
            Err(e) => {
                error!("Failed to check wallet connection: {}", e);
                return self.cached.read().await.clone();
            }
        };
        *self.cached.write().await = stored.clone();
        stored
    }
}

/// `0x` followed by 16 lowercase hex digits.
pub fn random_address() -> String {
    let value = rand::thread_rng().gen_range(0..ADDRESS_SPACE);
    format!("0x{:016x}", value)
}

/// Header display form: first 6 and last 4 characters.
pub fn short_address(address: &str) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= 10 {
        return address.to_string();
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Poll the session on a fixed interval and broadcast `WalletChanged` when
/// the stored address differs from the last one seen. Runs until the
/// returned handle is aborted.
pub fn spawn_wallet_watcher(
    session: Arc<WalletSession>,
    interval: Duration,
    tx: broadcast::Sender<WsMessage>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // Starts empty so an already-connected wallet is announced on the first tick
        let mut last_seen: Option<String> = None;
        debug!("Wallet watcher started ({:?} interval)", interval);

        loop {
            ticker.tick().await;
            let current = session.sync_from_store().await;
            if current != last_seen {
                debug!("Wallet changed: {:?} -> {:?}", last_seen, current);
                // No subscribers is fine
                let _ = tx.send(WsMessage::wallet_changed(current.clone()));
                last_seen = current;
            }
        }
    })
}
