//! Trade-related models

use serde::{Deserialize, Serialize};

/// Maximum number of trades kept in history
pub const TRADE_HISTORY_LIMIT: usize = 100;

/// Trade side (buy or sell)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeType {
    Buy,
    Sell,
}

/// Executed trade
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeRecord {
    pub symbol: String,
    #[serde(rename = "type")]
    pub trade_type: TradeType,
    /// Units of the asset traded
    pub quantity: f64,
    /// Price at execution
    pub price: f64,
    /// Coins spent (buy) or received (sell)
    pub total: f64,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Truncate a float to 8 decimal places
///
/// Quantities are stored at this precision so a full-position sell
/// never asks for more than was bought.
pub fn truncate_to_8_decimals(value: f64) -> f64 {
    (value * 1e8).floor() / 1e8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_precision() {
        let bought = 0.0000225818858502235264;
        let truncated = truncate_to_8_decimals(bought);
        assert_eq!(truncated, 0.00002258);
    }

    #[test]
    fn test_trade_type_wire_format() {
        assert_eq!(serde_json::to_string(&TradeType::Buy).unwrap(), "\"BUY\"");
    }
}
