use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Image reference used when a token has no uploaded logo
pub const PLACEHOLDER_IMAGE: &str = "/placeholder.png";

/// Address credited with the creator's share when the launcher gave none
pub const DEFAULT_CREATOR_ADDRESS: &str = "0x123456";

/// Synthetic holder standing in for the bonding-curve liquidity pool
pub const BONDING_CURVE_ADDRESS: &str = "0xBONDINGCURVE";

/// One launched token, stored as camelCase JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub slug: String,                        // Derived from symbol, lookup key
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub mcap: String,                        // Display string, e.g. "$100.00K"
    pub price: f64,
    pub image_url: String,                   // Direct URL or /api/images/tokens/<id>
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    pub created_at: i64,                     // Unix epoch milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_address: Option<String>,
    pub initial_supply: u64,
    pub replies: u64,
    #[serde(default)]
    pub holders: Vec<Holder>,
    pub bonding_curve_progress: f64,         // Placeholder, 0-100
    pub spotlight_progress: f64,             // Placeholder, 0-100
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holder {
    pub address: String,
    pub amount: u64,
    #[serde(default)]
    pub is_bonding_curve: bool,
}

/// Caller-supplied fields for a new token; everything else is derived.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewToken {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub price: f64,
    pub initial_supply: u64,
    pub image_url: String,
    #[serde(default)]
    pub creator_address: Option<String>,
    #[serde(default)]
    pub contract_address: Option<String>,
}

/// Lowercase and drop everything outside `[a-z0-9]`.
pub fn slugify(symbol: &str) -> String {
    symbol
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// `price * supply / 1000` as "$<two decimals>K".
pub fn format_mcap(price: f64, initial_supply: u64) -> String {
    format!("${}K", fixed_two_decimals(price * initial_supply as f64 / 1000.0))
}

/// Two decimals with exact halves rounded away from zero ("0.125" -> "0.13").
/// Plain `{:.2}` sends an exact tie to the even neighbour instead.
fn fixed_two_decimals(value: f64) -> String {
    // A double sits exactly on a hundredths tie only when it is an odd number of eighths
    let eighths = value * 8.0;
    if eighths.is_finite() && eighths.fract() == 0.0 && eighths % 2.0 != 0.0 {
        let hundredths = (value.abs() * 100.0 + 0.5).copysign(value);
        return format!("{:.2}", hundredths / 100.0);
    }
    format!("{:.2}", value)
}

/// Creator keeps 80%, the bonding curve gets the remainder so the amounts
/// always add up to `initial_supply`.
pub fn initial_holders(creator: Option<&str>, initial_supply: u64) -> Vec<Holder> {
    let creator_amount = (initial_supply as u128 * 8 / 10) as u64;
    vec![
        Holder {
            address: creator.unwrap_or(DEFAULT_CREATOR_ADDRESS).to_string(),
            amount: creator_amount,
            is_bonding_curve: false,
        },
        Holder {
            address: BONDING_CURVE_ADDRESS.to_string(),
            amount: initial_supply - creator_amount,
            is_bonding_curve: true,
        },
    ]
}

impl TokenRecord {
    /// Total of all holder balances
    #[cfg(test)]
    pub fn held_supply(&self) -> u64 {
        self.holders.iter().map(|h| h.amount).sum()
    }

    /// Age of the token in whole seconds, never negative
    pub fn age_seconds(&self) -> i64 {
        (Utc::now().timestamp_millis().saturating_sub(self.created_at) / 1000).max(0)
    }

    /// Upper-case relative age: "42 SEC AGO", "13 MIN AGO", "2 HOURS AGO".
    pub fn created_ago(&self) -> String {
        if self.created_at == 0 {
            return "UNKNOWN".to_string();
        }
        format_age(self.age_seconds())
    }
}

pub fn format_age(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{} SEC AGO", seconds);
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{} MIN AGO", minutes);
    }
    let hours = minutes / 60;
    if hours < 24 {
        return format!("{} HOUR{} AGO", hours, if hours != 1 { "S" } else { "" });
    }
    let days = hours / 24;
    format!("{} DAY{} AGO", days, if days != 1 { "S" } else { "" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("MAT"), "mat");
        assert_eq!(slugify("$Pepe-2.0!"), "pepe20");
        assert_eq!(slugify("ÉTÉ"), "t");
        assert_eq!(slugify("---"), "");
    }

    #[test]
    fn test_format_mcap() {
        assert_eq!(format_mcap(0.1, 1_000_000), "$100.00K");
        assert_eq!(format_mcap(0.069, 1_000_000), "$69.00K");
        assert_eq!(format_mcap(0.000001, 1), "$0.00K");

        // Exact halves round up, not to the even neighbour
        assert_eq!(format_mcap(1.0, 125), "$0.13K");
        assert_eq!(format_mcap(1.0, 375), "$0.38K");
        assert_eq!(format_mcap(1.0, 625), "$0.63K");
        // Not exact halves in binary, so they stay put
        assert_eq!(format_mcap(1.0, 1005), "$1.00K");
        assert_eq!(format_mcap(1.0, 1234), "$1.23K");
    }

    #[test]
    fn test_initial_holders_sum_to_supply() {
        for supply in [1u64, 7, 10, 999, 1_000_000, 123_456_789] {
            let holders = initial_holders(Some("0xabc"), supply);
            assert_eq!(holders.iter().map(|h| h.amount).sum::<u64>(), supply);
            assert!(!holders[0].is_bonding_curve);
            assert!(holders[1].is_bonding_curve);
        }

        let holders = initial_holders(None, 1_000_000);
        assert_eq!(holders[0].address, DEFAULT_CREATOR_ADDRESS);
        assert_eq!(holders[0].amount, 800_000);
        assert_eq!(holders[1].address, BONDING_CURVE_ADDRESS);
        assert_eq!(holders[1].amount, 200_000);
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(5), "5 SEC AGO");
        assert_eq!(format_age(13 * 60), "13 MIN AGO");
        assert_eq!(format_age(3600), "1 HOUR AGO");
        assert_eq!(format_age(5 * 3600), "5 HOURS AGO");
        assert_eq!(format_age(86_400), "1 DAY AGO");
        assert_eq!(format_age(3 * 86_400), "3 DAYS AGO");
    }

    #[test]
    fn test_age_of_out_of_range_timestamps() {
        let json = r#"{
            "slug": "old", "name": "OLD", "symbol": "OLD", "description": "d",
            "mcap": "$0.00K", "price": 0.1, "imageUrl": "/placeholder.png",
            "createdAt": 0, "initialSupply": 1, "replies": 0,
            "bondingCurveProgress": 0, "spotlightProgress": 0
        }"#;
        let mut token: TokenRecord = serde_json::from_str(json).unwrap();

        token.created_at = i64::MIN;
        assert_eq!(token.age_seconds(), i64::MAX / 1000);
        assert!(token.created_ago().ends_with("DAYS AGO"));

        token.created_at = i64::MAX;
        assert_eq!(token.age_seconds(), 0);
        assert_eq!(token.created_ago(), "0 SEC AGO");
    }

    #[test]
    fn test_reads_stored_shape_without_optional_fields() {
        let json = r#"{
            "slug": "fries", "name": "FRIES TOKEN", "symbol": "FRIES",
            "description": "d", "mcap": "$69.42K", "price": 0.069,
            "imageUrl": "/placeholder.png", "createdAt": 1700000000000,
            "initialSupply": 1000000, "replies": 123,
            "bondingCurveProgress": 69, "spotlightProgress": 42
        }"#;
        let token: TokenRecord = serde_json::from_str(json).unwrap();
        assert!(token.holders.is_empty());
        assert_eq!(token.creator_address, None);
        assert_eq!(token.bonding_curve_progress, 69.0);
    }
}
