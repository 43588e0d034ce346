//! Token Registry
//!
//! Owns the list of launched tokens. The whole list lives under a single key
//! as a JSON array in insertion order and is rewritten on every create.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::anyhow;
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{LaunchpadError, Result};
use crate::models::token::{
    format_mcap, initial_holders, slugify, BONDING_CURVE_ADDRESS, PLACEHOLDER_IMAGE,
};
use crate::models::{Holder, NewToken, TokenRecord};
use crate::storage::{KeyValueStore, TOKENS_KEY};

/// What to do when a new symbol normalizes to a slug that is already in use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlugPolicy {
    /// Keep the colliding slug; lookups return the earliest token.
    #[default]
    Allow,
    /// Refuse the launch with `LaunchpadError::SlugTaken`.
    Reject,
    /// Append the first free number starting at 2 ("mat" -> "mat2").
    Suffix,
}

impl FromStr for SlugPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "reject" => Ok(Self::Reject),
            "suffix" => Ok(Self::Suffix),
            other => Err(anyhow!("Unknown slug policy '{}'", other)),
        }
    }
}

pub struct TokenRegistry {
    store: Arc<dyn KeyValueStore>,
    slug_policy: SlugPolicy,
}

impl TokenRegistry {
    #[cfg(test)]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_policy(store, SlugPolicy::default())
    }

    pub fn with_policy(store: Arc<dyn KeyValueStore>, slug_policy: SlugPolicy) -> Self {
        Self { store, slug_policy }
    }

    /// All tokens in insertion order. Missing, unreadable or corrupt storage
    /// is logged and reads as an empty registry.
    pub fn list_all(&self) -> Vec<TokenRecord> {
        match self.try_list_all() {
            Ok(tokens) => tokens,
            Err(e) => {
                error!("Failed to read tokens from storage: {}", e);
                Vec::new()
            }
        }
    }

    /// Like [`list_all`](Self::list_all) but reports storage and decode failures.
    pub fn try_list_all(&self) -> Result<Vec<TokenRecord>> {
        let Some(data) = self.store.get(TOKENS_KEY)? else {
            return Ok(Vec::new());
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    /// First token whose slug matches exactly.
    pub fn find_by_slug(&self, slug: &str) -> Option<TokenRecord> {
        self.list_all().into_iter().find(|t| t.slug == slug)
    }

    /// Case-insensitive substring match on name or symbol. An empty query
    /// returns everything.
    pub fn search(&self, query: &str) -> Vec<TokenRecord> {
        let needle = query.trim().to_lowercase();
        let tokens = self.list_all();
        if needle.is_empty() {
            return tokens;
        }
        tokens
            .into_iter()
            .filter(|t| {
                t.name.to_lowercase().contains(&needle) || t.symbol.to_lowercase().contains(&needle)
            })
            .collect()
    }

    /// Launch a token. Input fields are taken as already validated.
    ///
    /// A failed write is logged and the new record is still returned; use
    /// [`try_create`](Self::try_create) to observe it. The only error here is
    /// a slug collision under [`SlugPolicy::Reject`].
    #[allow(dead_code)]
    pub fn create(&self, input: NewToken) -> Result<TokenRecord> {
        let mut tokens = self.list_all();
        let token = self.build_record(&tokens, input)?;
        tokens.push(token.clone());

        if let Err(e) = self.save(&tokens) {
            error!("Failed to save tokens to storage: {}", e);
        }
        Ok(token)
    }

    /// Launch a token, failing if the existing list can't be read or the
    /// updated list can't be written.
    pub fn try_create(&self, input: NewToken) -> Result<TokenRecord> {
        let mut tokens = self.try_list_all()?;
        let token = self.build_record(&tokens, input)?;
        tokens.push(token.clone());
        self.save(&tokens)?;
        Ok(token)
    }

    /// Slug a launch of `symbol` would get right now, or `SlugTaken` when the
    /// policy refuses it. Lets callers bail out before storing anything else.
    pub fn check_slug(&self, symbol: &str) -> Result<String> {
        let tokens = self.try_list_all()?;
        self.resolve_slug(&tokens, symbol)
    }

    /// Write the two sample tokens when the registry is empty. Safe to call
    /// on every request; returns true only when something was written.
    pub fn seed_if_empty(&self) -> bool {
        if !self.list_all().is_empty() {
            return false;
        }

        match self.save(&sample_tokens()) {
            Ok(()) => {
                info!("🌱 Seeded registry with sample tokens");
                true
            }
            Err(e) => {
                error!("Failed to initialize tokens: {}", e);
                false
            }
        }
    }

    fn build_record(&self, existing: &[TokenRecord], input: NewToken) -> Result<TokenRecord> {
        let slug = self.resolve_slug(existing, &input.symbol)?;
        let mcap = format_mcap(input.price, input.initial_supply);
        let holders = initial_holders(input.creator_address.as_deref(), input.initial_supply);

        // Stand-ins until progress is computed from real curve state
        let mut rng = rand::thread_rng();
        let bonding_curve_progress = rng.gen_range(0.0..100.0);
        let spotlight_progress = rng.gen_range(0.0..100.0);

        info!(
            "🚀 Launching {} ({}) as '{}' - mcap {}",
            input.name, input.symbol, slug, mcap
        );

        Ok(TokenRecord {
            slug,
            name: input.name,
            symbol: input.symbol,
            description: input.description,
            mcap,
            price: input.price,
            image_url: input.image_url,
            contract_address: input.contract_address,
            created_at: Utc::now().timestamp_millis(),
            creator_address: input.creator_address,
            initial_supply: input.initial_supply,
            replies: 0,
            holders,
            bonding_curve_progress,
            spotlight_progress,
        })
    }

    fn resolve_slug(&self, existing: &[TokenRecord], symbol: &str) -> Result<String> {
        let base = slugify(symbol);
        let taken = |candidate: &str| existing.iter().any(|t| t.slug == candidate);

        if !taken(&base) {
            return Ok(base);
        }

        match self.slug_policy {
            SlugPolicy::Allow => {
                warn!("Slug '{}' already in use, new token will be shadowed on lookup", base);
                Ok(base)
            }
            SlugPolicy::Reject => Err(LaunchpadError::SlugTaken(base)),
            SlugPolicy::Suffix => {
                let mut n = 2u32;
                loop {
                    let candidate = format!("{}{}", base, n);
                    if !taken(&candidate) {
                        debug!("Slug '{}' taken, using '{}'", base, candidate);
                        return Ok(candidate);
                    }
                    n += 1;
                }
            }
        }
    }

    fn save(&self, tokens: &[TokenRecord]) -> Result<()> {
        let data = serde_json::to_string(tokens)?;
        self.store.set(TOKENS_KEY, &data)?;
        debug!("💾 Saved {} tokens", tokens.len());
        Ok(())
    }
}

/// Fixed demo data written by [`TokenRegistry::seed_if_empty`].
pub fn sample_tokens() -> Vec<TokenRecord> {
    let now = Utc::now();
    let minutes_ago = |m: i64| (now - Duration::minutes(m)).timestamp_millis();
    let holders = |creator: &str| {
        vec![
            Holder {
                address: BONDING_CURVE_ADDRESS.to_string(),
                amount: 200_000,
                is_bonding_curve: true,
            },
            Holder {
                address: creator.to_string(),
                amount: 800_000,
                is_bonding_curve: false,
            },
        ]
    };

    vec![
        TokenRecord {
            slug: "fries".to_string(),
            name: "FRIES TOKEN".to_string(),
            symbol: "FRIES".to_string(),
            description: "A decentralized token for french fries generation and distribution across the Sui network.".to_string(),
            mcap: "$69.42K".to_string(),
            price: 0.069,
            image_url: PLACEHOLDER_IMAGE.to_string(),
            contract_address: Some("0x123...456".to_string()),
            created_at: minutes_ago(13),
            creator_address: Some("0x123456".to_string()),
            initial_supply: 1_000_000,
            replies: 123,
            holders: holders("0x123456"),
            bonding_curve_progress: 69.0,
            spotlight_progress: 42.0,
        },
        TokenRecord {
            slug: "kawaiiii".to_string(),
            name: "KAWAIIII".to_string(),
            symbol: "KAWAII".to_string(),
            description: "The cutest token on the Sui network with powerful utility.".to_string(),
            mcap: "$42.69K".to_string(),
            price: 0.042,
            image_url: PLACEHOLDER_IMAGE.to_string(),
            contract_address: Some("0x789...012".to_string()),
            created_at: minutes_ago(25),
            creator_address: Some("0x789012".to_string()),
            initial_supply: 1_000_000,
            replies: 89,
            holders: holders("0x789012"),
            bonding_curve_progress: 55.0,
            spotlight_progress: 38.0,
        },
    ]
}
