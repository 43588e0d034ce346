//! Request and Response DTOs for the Web API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LaunchpadError;
use crate::models::token::slugify;
use crate::models::{NewToken, TokenRecord};

/// Launch form defaults
pub const DEFAULT_INITIAL_SUPPLY: u64 = 1_000_000;
pub const DEFAULT_INITIAL_PRICE: f64 = 0.1;
pub const MIN_INITIAL_PRICE: f64 = 0.000001;

// ============================================================================
// Health & Errors
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

// ============================================================================
// Tokens
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    #[serde(flatten)]
    pub token: TokenRecord,
    /// Resolved `image_url`: a data URI for uploaded logos
    pub display_image_url: String,
    pub created_ago: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokensListResponse {
    pub tokens: Vec<TokenResponse>,
    pub total: usize,
}

#[derive(Debug, Deserialize)]
pub struct TokensQuery {
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchTokenRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub description: String,
    pub initial_supply: Option<u64>,
    pub initial_price: Option<f64>,
    /// Logo as a `data:image/...;base64,` URI
    pub logo: Option<String>,
    /// Logo as bare base64, typed by `logo_mime`
    pub logo_base64: Option<String>,
    pub logo_mime: Option<String>,
}

impl LaunchTokenRequest {
    pub fn supply(&self) -> u64 {
        self.initial_supply.unwrap_or(DEFAULT_INITIAL_SUPPLY)
    }

    pub fn price(&self) -> f64 {
        self.initial_price.unwrap_or(DEFAULT_INITIAL_PRICE)
    }

    /// Checks the launch form enforces before anything is stored.
    pub fn validate(&self) -> Result<(), LaunchpadError> {
        if self.name.trim().is_empty() || self.symbol.trim().is_empty() || self.description.trim().is_empty() {
            return Err(LaunchpadError::MissingInput(
                "Please fill in all required fields".to_string(),
            ));
        }
        if slugify(&self.symbol).is_empty() {
            return Err(LaunchpadError::InvalidInput(
                "Token symbol must contain letters or digits".to_string(),
            ));
        }
        if self.supply() < 1 {
            return Err(LaunchpadError::InvalidInput(
                "Initial supply must be at least 1".to_string(),
            ));
        }
        let price = self.price();
        if !price.is_finite() || price < MIN_INITIAL_PRICE {
            return Err(LaunchpadError::InvalidInput(format!(
                "Initial price must be at least {}",
                MIN_INITIAL_PRICE
            )));
        }
        Ok(())
    }

    pub fn into_new_token(self, image_url: String, creator_address: String) -> NewToken {
        let initial_supply = self.supply();
        let price = self.price();
        NewToken {
            name: self.name.trim().to_string(),
            symbol: self.symbol.trim().to_string(),
            description: self.description.trim().to_string(),
            price,
            initial_supply,
            image_url,
            creator_address: Some(creator_address),
            contract_address: None,
        }
    }
}

// ============================================================================
// Wallet
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct WalletResponse {
    pub connected: bool,
    pub address: Option<String>,
    /// "0x1234...abcd"
    pub short: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectWalletResponse {
    pub address: String,
}
