//! Random-walk price simulation over the asset catalog

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error};
use wallnance_core::{default_catalog, Asset, AssetKind, Error, GameSettings, Result};
use wallnance_persistence::{keys, KeyValueStore};

/// Bounds of the per-tick price jitter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceWalk {
    pub crypto_volatility: f64,
    pub share_volatility: f64,
    pub min_price: f64,
}

impl PriceWalk {
    fn volatility(&self, kind: AssetKind) -> f64 {
        match kind {
            AssetKind::Crypto => self.crypto_volatility,
            AssetKind::Share => self.share_volatility,
        }
    }
}

impl From<&GameSettings> for PriceWalk {
    fn from(settings: &GameSettings) -> Self {
        Self {
            crypto_volatility: settings.crypto_volatility.abs(),
            share_volatility: settings.share_volatility.abs(),
            min_price: settings.min_price.max(0.0),
        }
    }
}

/// Current prices of every tradable asset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Market {
    assets: Vec<Asset>,
    #[serde(default)]
    tick_count: u64,
}

impl Default for Market {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

impl Market {
    pub fn new(assets: Vec<Asset>) -> Self {
        Self {
            assets,
            tick_count: 0,
        }
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    pub fn asset(&self, symbol: &str) -> Option<&Asset> {
        self.assets
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn price_of(&self, symbol: &str) -> Option<f64> {
        self.asset(symbol).map(|a| a.price)
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Move every price by a uniform random percentage within its volatility
    pub fn tick<R: Rng>(&mut self, rng: &mut R, walk: &PriceWalk) {
        for asset in &mut self.assets {
            let vol = walk.volatility(asset.kind);
            let jitter = if vol > 0.0 { rng.gen_range(-vol..=vol) } else { 0.0 };
            let next = (asset.price * (1.0 + jitter)).max(walk.min_price);
            asset.reprice(next);
        }
        self.tick_count += 1;
    }
}

/// Market shared between the trade desk and the ticker task
pub struct MarketService<S> {
    store: Arc<S>,
    walk: PriceWalk,
    market: RwLock<Market>,
    rng: Mutex<StdRng>,
}

impl<S: KeyValueStore> MarketService<S> {
    /// Restore saved prices or start from the default catalog
    pub async fn load(store: Arc<S>, settings: &GameSettings) -> Result<Self> {
        let market = keys::MARKET
            .load::<Market, _>(store.as_ref())
            .await?
            .unwrap_or_default();

        let rng = match settings.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Self {
            store,
            walk: PriceWalk::from(settings),
            market: RwLock::new(market),
            rng: Mutex::new(rng),
        })
    }

    /// Advance prices one step and save them; returns the tick count
    pub async fn tick(&self) -> Result<u64> {
        let mut market = self.market.write().await;
        {
            let mut rng = self.rng.lock().await;
            market.tick(&mut *rng, &self.walk);
        }

        keys::MARKET
            .save(self.store.as_ref(), &*market)
            .await
            .map_err(|e| {
                error!("Failed to persist market: {}", e);
                e
            })?;

        debug!("Market tick {}", market.tick_count());
        Ok(market.tick_count())
    }

    pub async fn price_of(&self, symbol: &str) -> Result<f64> {
        self.market
            .read()
            .await
            .price_of(symbol)
            .ok_or_else(|| Error::UnknownAsset(symbol.to_string()))
    }

    /// Canonical symbol casing for a user-supplied symbol
    pub async fn resolve(&self, symbol: &str) -> Result<Asset> {
        self.market
            .read()
            .await
            .asset(symbol)
            .cloned()
            .ok_or_else(|| Error::UnknownAsset(symbol.to_string()))
    }

    pub async fn snapshot(&self) -> Market {
        self.market.read().await.clone()
    }
}
