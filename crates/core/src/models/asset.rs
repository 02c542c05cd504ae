//! Tradable asset models (fictional coins and company shares)

use crate::types::Percent;
use serde::{Deserialize, Serialize};

/// What kind of instrument an asset is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Crypto,
    Share,
}

/// A tradable asset and its current simulated price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub symbol: String,
    pub name: String,
    pub kind: AssetKind,
    pub price: f64,
    /// Price at the start of the session, reference for `change_pct`
    pub open_price: f64,
    #[serde(default)]
    pub change_pct: f64,
}

impl Asset {
    pub fn new(symbol: &str, name: &str, kind: AssetKind, price: f64) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            kind,
            price,
            open_price: price,
            change_pct: 0.0,
        }
    }

    /// Set a new price and refresh the change against the open
    pub fn reprice(&mut self, price: f64) {
        self.price = price;
        self.change_pct = Percent::change(self.open_price, price).as_f64();
    }

    pub fn is_up(&self) -> bool {
        self.change_pct > 0.0
    }
}

/// Starting catalog of fictional assets
pub fn default_catalog() -> Vec<Asset> {
    vec![
        Asset::new("WLC", "Wallnance Coin", AssetKind::Crypto, 12.50),
        Asset::new("BTX", "Bitex", AssetKind::Crypto, 42_000.0),
        Asset::new("ETHR", "Etherium Classic Plus", AssetKind::Crypto, 2_800.0),
        Asset::new("DOGI", "Dogi Coin", AssetKind::Crypto, 0.12),
        Asset::new("SOLR", "Solaris", AssetKind::Crypto, 95.0),
        Asset::new("APLE", "Aple Inc.", AssetKind::Share, 185.0),
        Asset::new("TSLR", "Teslar Motors", AssetKind::Share, 240.0),
        Asset::new("AMZN", "Amazonia Retail", AssetKind::Share, 150.0),
        Asset::new("GOOG", "Googol Search", AssetKind::Share, 135.0),
        Asset::new("MSFX", "Microsoftex", AssetKind::Share, 410.0),
    ]
}
