use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Stored value is not valid UTF-8: {0}")]
    Encoding(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sled::Error> for StorageError {
    fn from(e: sled::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum LaunchpadError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Corrupt stored data: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Slug already taken: {0}")]
    SlugTaken(String),

    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("Token not found: {0}")]
    TokenNotFound(String),
}

pub type Result<T> = std::result::Result<T, LaunchpadError>;
