//! Simulated market: price walk and the background ticker

mod price_walk;
mod ticker;

pub use price_walk::{Market, MarketService, PriceWalk};
pub use ticker::{spawn_price_ticker, MarketTickerHandle, TickerStatus};
