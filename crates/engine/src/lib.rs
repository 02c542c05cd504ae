//! Wallnance Engine - Reward ledger, wallet, market simulation and trading

pub mod game;
pub mod ledger;
pub mod market;
pub mod progress;
pub mod trading;
pub mod wallet;

pub use game::{DailyLogin, Game, GameStatus, TradeOutcome};
pub use ledger::{BalanceSink, RewardLedger};
pub use market::{spawn_price_ticker, Market, MarketService, MarketTickerHandle, PriceWalk, TickerStatus};
pub use progress::ProgressTracker;
pub use trading::TradeDesk;
pub use wallet::Wallet;
