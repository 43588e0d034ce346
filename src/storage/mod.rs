//! Persistence port
//!
//! Every service talks to durable state through [`KeyValueStore`]: a single
//! string-keyed, string-valued namespace with no transactions and no expiry.
//! Two backends are provided:
//! - [`MemoryStore`] for tests and throwaway demo runs
//! - [`SledStore`] on the sled embedded database

mod memory;
mod sled_store;

pub use memory::MemoryStore;
pub use sled_store::SledStore;

use std::path::Path;
use std::sync::Arc;

use crate::config::StoreBackend;
use crate::error::StorageError;

/// Key holding the JSON-encoded token list
pub const TOKENS_KEY: &str = "pump-steamm-tokens";
/// Key holding the connected wallet address
pub const WALLET_KEY: &str = "pump-steamm-wallet";
/// Prefix for uploaded image blobs, followed by the image id
pub const IMAGE_KEY_PREFIX: &str = "token-image-";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Open the configured backend.
pub fn open_store(backend: StoreBackend, data_dir: &Path) -> Result<Arc<dyn KeyValueStore>, StorageError> {
    match backend {
        StoreBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StoreBackend::Sled => Ok(Arc::new(SledStore::open(data_dir.join("launchpad.sled"))?)),
    }
}
