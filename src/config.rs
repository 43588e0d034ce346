use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::services::SlugPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Sled,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "sled" => Ok(Self::Sled),
            other => Err(anyhow!("Unknown store backend '{}'", other)),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,

    pub store_backend: StoreBackend,
    pub data_dir: PathBuf,
    pub public_dir: PathBuf,

    pub seed_sample_tokens: bool,
    pub slug_policy: SlugPolicy,
    pub wallet_poll_interval_ms: u64,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            api_host: env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            api_port: env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .context("Failed to parse API_PORT")?,

            store_backend: env::var("STORE_BACKEND")
                .unwrap_or_else(|_| "sled".to_string())
                .parse()
                .context("Failed to parse STORE_BACKEND")?,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            public_dir: env::var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("public")),

            seed_sample_tokens: env::var("SEED_SAMPLE_TOKENS")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(true),
            slug_policy: env::var("SLUG_POLICY")
                .unwrap_or_else(|_| "allow".to_string())
                .parse()
                .context("Failed to parse SLUG_POLICY")?,
            wallet_poll_interval_ms: env::var("WALLET_POLL_INTERVAL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .context("Failed to parse WALLET_POLL_INTERVAL_MS")?,
        })
    }
}

impl Default for Config {
    /// Ephemeral settings used by tests: memory store, samples seeded.
    fn default() -> Self {
        Self {
            api_host: "127.0.0.1".to_string(),
            api_port: 3000,
            store_backend: StoreBackend::Memory,
            data_dir: PathBuf::from("data"),
            public_dir: PathBuf::from("public"),
            seed_sample_tokens: true,
            slug_policy: SlugPolicy::Allow,
            wallet_poll_interval_ms: 1000,
        }
    }
}
