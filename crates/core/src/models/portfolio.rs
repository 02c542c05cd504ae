//! Portfolio-related models

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Quantities below this are treated as a closed position
pub const DUST_QUANTITY: f64 = 1e-9;

/// Player's position in a single asset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holding {
    pub quantity: f64,
    pub avg_price: f64,
}

impl Holding {
    /// Total paid for the current position
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.avg_price
    }

    /// Calculate current value at given price
    pub fn value_at(&self, current_price: f64) -> f64 {
        self.quantity * current_price
    }

    /// Calculate profit/loss percentage
    pub fn pnl_percent(&self, current_price: f64) -> f64 {
        if self.avg_price == 0.0 {
            return 0.0;
        }
        ((current_price - self.avg_price) / self.avg_price) * 100.0
    }
}

/// All holdings keyed by asset symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Portfolio {
    holdings: BTreeMap<String, Holding>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, symbol: &str) -> Option<&Holding> {
        self.holdings.get(symbol)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Holding)> {
        self.holdings.iter()
    }

    pub fn len(&self) -> usize {
        self.holdings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }

    /// Add `quantity` bought for `spent` coins, recomputing the weighted
    /// average cost so the cost basis grows by exactly `spent`
    pub fn apply_buy(&mut self, symbol: &str, quantity: f64, spent: f64) -> Holding {
        let holding = self
            .holdings
            .entry(symbol.to_string())
            .or_insert(Holding {
                quantity: 0.0,
                avg_price: 0.0,
            });

        let new_quantity = holding.quantity + quantity;
        holding.avg_price = if new_quantity > 0.0 {
            (holding.cost_basis() + spent) / new_quantity
        } else {
            0.0
        };
        holding.quantity = new_quantity;
        *holding
    }

    /// Remove `quantity` from a position; the average cost is unchanged.
    ///
    /// Returns the remaining holding, or `None` if the position was closed.
    pub fn apply_sell(&mut self, symbol: &str, quantity: f64) -> Result<Option<Holding>> {
        let available = self.holdings.get(symbol).map(|h| h.quantity).unwrap_or(0.0);
        if quantity > available + DUST_QUANTITY {
            return Err(Error::InsufficientQuantity {
                symbol: symbol.to_string(),
                required: quantity,
                available,
            });
        }

        let remaining = available - quantity;
        if remaining <= DUST_QUANTITY {
            self.holdings.remove(symbol);
            return Ok(None);
        }

        let holding = self
            .holdings
            .get_mut(symbol)
            .ok_or_else(|| Error::UnknownAsset(symbol.to_string()))?;
        holding.quantity = remaining;
        Ok(Some(*holding))
    }

    /// Total cost basis across all positions
    pub fn cost_basis(&self) -> f64 {
        self.holdings.values().map(Holding::cost_basis).sum()
    }
}

/// Valuation of the balance plus every open position
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub balance: f64,
    pub holdings_value: f64,
    pub total_value: f64,
    pub cost_basis: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_pct: f64,
    pub holdings_count: usize,
}

impl PortfolioSummary {
    /// Value `portfolio` using `price_of`; positions without a price count as zero
    pub fn compute<F>(balance: f64, portfolio: &Portfolio, price_of: F) -> Self
    where
        F: Fn(&str) -> Option<f64>,
    {
        let holdings_value: f64 = portfolio
            .iter()
            .map(|(symbol, h)| h.value_at(price_of(symbol).unwrap_or(0.0)))
            .sum();
        let cost_basis = portfolio.cost_basis();
        let total_profit_loss = holdings_value - cost_basis;
        let total_profit_loss_pct = if cost_basis > 0.0 {
            (total_profit_loss / cost_basis) * 100.0
        } else {
            0.0
        };

        Self {
            balance,
            holdings_value,
            total_value: balance + holdings_value,
            cost_basis,
            total_profit_loss,
            total_profit_loss_pct,
            holdings_count: portfolio.len(),
        }
    }
}
