//! Shared type definitions and newtypes

use serde::{Deserialize, Serialize};

/// Coins minted per point before the payout share is applied
pub const COINS_PER_POINT: u64 = 10;

/// Share of minted coins paid out, in percent
pub const COIN_PAYOUT_PERCENT: u64 = 10;

/// Points needed for one WLC token
pub const POINTS_PER_WLC: u64 = 100;

/// Point amount (for clarity in function signatures)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Points(pub u64);

impl Points {
    pub fn new(points: u64) -> Self {
        Points(points)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Apply a reward multiplier, flooring the result
    pub fn scaled(&self, multiplier: f64) -> Self {
        Points((self.0 as f64 * multiplier).floor() as u64)
    }

    /// Coins these points convert into (one coin per point), `None` if
    /// the result does not fit a `u64`
    pub fn to_coins(&self) -> Option<u64> {
        let rate = u128::from(COINS_PER_POINT * COIN_PAYOUT_PERCENT);
        u64::try_from(u128::from(self.0) * rate / 100).ok()
    }

    /// WLC tokens these points convert into
    pub fn to_wlc(&self) -> u64 {
        self.0 / POINTS_PER_WLC
    }
}

/// Percentage value (e.g., for price change, ROI)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percent(pub f64);

impl Percent {
    pub fn new(value: f64) -> Self {
        Percent(value)
    }

    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// Percent change from `from` to `to`; zero when `from` is not positive
    pub fn change(from: f64, to: f64) -> Self {
        if from > 0.0 {
            Percent(((to - from) / from) * 100.0)
        } else {
            Percent(0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_conversions() {
        let p = Points::new(100);
        assert_eq!(p.to_coins(), Some(100));
        assert_eq!(p.to_wlc(), 1);

        let p = Points::new(99);
        assert_eq!(p.to_coins(), Some(99));
        assert_eq!(p.to_wlc(), 0);
    }

    #[test]
    fn test_coins_at_u64_scale() {
        assert_eq!(Points::new(1 << 60).to_coins(), Some(1 << 60));
        assert_eq!(Points::new(u64::MAX).to_coins(), Some(u64::MAX));
    }

    #[test]
    fn test_points_scaled_floors() {
        assert_eq!(Points::new(15).scaled(1.5), Points::new(22));
        assert_eq!(Points::new(100).scaled(2.0), Points::new(200));
        assert_eq!(Points::new(7).scaled(1.0), Points::new(7));
    }

    #[test]
    fn test_percent_change() {
        assert!((Percent::change(100.0, 110.0).as_f64() - 10.0).abs() < 1e-9);
        assert_eq!(Percent::change(0.0, 5.0).as_f64(), 0.0);
    }
}
