//! Storage keys shared by every game service

use crate::migrations::rewards_v0_to_v1;
use crate::snapshot::{unchanged, Schema};

/// Spendable balance, stored as a plain stringified number
pub const PLAYER_BALANCE: &str = "player_balance";

pub static PLAYER_REWARDS: Schema = Schema::new("player_rewards", &[rewards_v0_to_v1]);
pub static PORTFOLIO: Schema = Schema::new("portfolio", &[unchanged]);
pub static TRADE_HISTORY: Schema = Schema::new("trade_history", &[unchanged]);
pub static PROGRESS: Schema = Schema::new("progress", &[unchanged]);
pub static SETTINGS: Schema = Schema::new("settings", &[unchanged]);
pub static MARKET: Schema = Schema::new("market", &[unchanged]);
