//! Trade desk: buys and sells against the simulated market
//!
//! Coins move through the wallet first; the portfolio only changes once
//! the wallet has accepted the debit or credit. If saving the portfolio
//! fails the wallet change is reversed.

use crate::market::MarketService;
use crate::wallet::Wallet;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use wallnance_core::{
    truncate_to_8_decimals, Clock, Error, Portfolio, PortfolioSummary, Result, TradeRecord, TradeType,
    TRADE_HISTORY_LIMIT,
};
use wallnance_persistence::{keys, KeyValueStore};

#[derive(Debug, Clone, Default)]
struct Book {
    portfolio: Portfolio,
    /// Newest first
    history: Vec<TradeRecord>,
}

/// Executes trades and owns the portfolio
pub struct TradeDesk<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    wallet: Arc<Wallet<S>>,
    market: Arc<MarketService<S>>,
    book: Mutex<Book>,
}

impl<S: KeyValueStore> TradeDesk<S> {
    pub async fn load(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        wallet: Arc<Wallet<S>>,
        market: Arc<MarketService<S>>,
    ) -> Result<Self> {
        let portfolio = keys::PORTFOLIO
            .load::<Portfolio, _>(store.as_ref())
            .await?
            .unwrap_or_default();
        let history = keys::TRADE_HISTORY
            .load::<Vec<TradeRecord>, _>(store.as_ref())
            .await?
            .unwrap_or_default();

        Ok(Self {
            store,
            clock,
            wallet,
            market,
            book: Mutex::new(Book { portfolio, history }),
        })
    }

    /// Spend `coins` on `symbol` at the current price
    pub async fn buy(&self, symbol: &str, coins: f64) -> Result<TradeRecord> {
        if !coins.is_finite() || coins <= 0.0 {
            return Err(Error::InvalidAmount(format!("cannot spend {} coins", coins)));
        }
        let asset = self.market.resolve(symbol).await?;
        let quantity = truncate_to_8_decimals(coins / asset.price);
        if quantity <= 0.0 {
            return Err(Error::InvalidAmount(format!(
                "{} coins buys no {} at {}",
                coins, asset.symbol, asset.price
            )));
        }

        let mut book = self.book.lock().await;
        self.wallet.debit(coins).await?;

        let before = book.clone();
        book.portfolio.apply_buy(&asset.symbol, quantity, coins);
        let record = self.push_record(&mut book, &asset.symbol, TradeType::Buy, quantity, asset.price, coins);

        if let Err(e) = self.persist(&book).await {
            *book = before;
            self.restore(&book).await;
            self.refund(coins).await;
            return Err(e);
        }

        info!("Bought {} {} @ {} for {} coins", quantity, asset.symbol, asset.price, coins);
        Ok(record)
    }

    /// Sell `quantity` units of `symbol` at the current price
    pub async fn sell(&self, symbol: &str, quantity: f64) -> Result<TradeRecord> {
        if !quantity.is_finite() || quantity <= 0.0 {
            return Err(Error::InvalidAmount(format!("cannot sell {} units", quantity)));
        }
        let asset = self.market.resolve(symbol).await?;

        let mut book = self.book.lock().await;
        let before = book.clone();
        book.portfolio.apply_sell(&asset.symbol, quantity)?;

        let proceeds = quantity * asset.price;
        if let Err(e) = self.wallet.credit(proceeds).await {
            *book = before;
            return Err(e);
        }

        let record = self.push_record(&mut book, &asset.symbol, TradeType::Sell, quantity, asset.price, proceeds);

        if let Err(e) = self.persist(&book).await {
            *book = before;
            self.restore(&book).await;
            if let Err(undo) = self.wallet.debit(proceeds).await {
                warn!("Could not reverse sale proceeds of {}: {}", proceeds, undo);
            }
            return Err(e);
        }

        info!("Sold {} {} @ {} for {} coins", quantity, asset.symbol, asset.price, proceeds);
        Ok(record)
    }

    pub async fn portfolio(&self) -> Portfolio {
        self.book.lock().await.portfolio.clone()
    }

    /// Executed trades, newest first
    pub async fn history(&self) -> Vec<TradeRecord> {
        self.book.lock().await.history.clone()
    }

    /// Value balance plus holdings at current market prices
    pub async fn valuation(&self) -> PortfolioSummary {
        let portfolio = self.portfolio().await;
        let market = self.market.snapshot().await;
        let balance = self.wallet.balance().await;
        PortfolioSummary::compute(balance, &portfolio, |symbol| market.price_of(symbol))
    }

    async fn persist(&self, book: &Book) -> Result<()> {
        let result = async {
            keys::PORTFOLIO.save(self.store.as_ref(), &book.portfolio).await?;
            keys::TRADE_HISTORY.save(self.store.as_ref(), &book.history).await
        }
        .await;

        if let Err(e) = &result {
            error!("Failed to persist portfolio: {}", e);
        }
        result
    }

    /// Best-effort rewrite of the pre-trade book after a partial save
    async fn restore(&self, book: &Book) {
        if self.persist(book).await.is_err() {
            warn!("Stored portfolio may be ahead of memory until the next trade");
        }
    }

    fn push_record(
        &self,
        book: &mut Book,
        symbol: &str,
        trade_type: TradeType,
        quantity: f64,
        price: f64,
        total: f64,
    ) -> TradeRecord {
        let record = TradeRecord {
            symbol: symbol.to_string(),
            trade_type,
            quantity,
            price,
            total,
            timestamp: self.clock.now(),
        };
        book.history.insert(0, record.clone());
        book.history.truncate(TRADE_HISTORY_LIMIT);
        record
    }

    async fn refund(&self, coins: f64) {
        if let Err(e) = self.wallet.credit(coins).await {
            warn!("Could not refund {} coins: {}", coins, e);
        }
    }
}
