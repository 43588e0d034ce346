//! Launchpad services: the token registry, the mock wallet session and the
//! image blob store. Each one owns an `Arc<dyn KeyValueStore>` and nothing else.

pub mod images;
pub mod token_registry;
pub mod wallet;

pub use images::ImageStore;
pub use token_registry::{SlugPolicy, TokenRegistry};
pub use wallet::WalletSession;
