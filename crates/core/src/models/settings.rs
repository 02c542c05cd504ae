//! Game-wide settings, persisted as JSON

use serde::{Deserialize, Serialize};

/// Tunables for a game session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameSettings {
    /// Spendable coins for a fresh player
    pub starting_balance: f64,
    /// Seconds between market price ticks
    pub tick_interval_secs: u64,
    /// Max fractional price move per tick for crypto assets
    pub crypto_volatility: f64,
    /// Max fractional price move per tick for shares
    pub share_volatility: f64,
    /// Prices never fall below this
    pub min_price: f64,
    /// Fixed seed for reproducible price walks
    pub rng_seed: Option<u64>,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            starting_balance: 10_000.0,
            tick_interval_secs: 5,
            crypto_volatility: 0.05,
            share_volatility: 0.02,
            min_price: 0.01,
            rng_seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: GameSettings =
            serde_json::from_str(r#"{"startingBalance": 500.0}"#).unwrap();
        assert_eq!(settings.starting_balance, 500.0);
        assert_eq!(settings.tick_interval_secs, 5);
        assert_eq!(settings.rng_seed, None);
    }
}
