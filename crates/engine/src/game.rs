//! Game session: wires the services together and exposes player actions

use crate::ledger::RewardLedger;
use crate::market::{spawn_price_ticker, MarketService, MarketTickerHandle};
use crate::progress::ProgressTracker;
use crate::trading::TradeDesk;
use crate::wallet::Wallet;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use wallnance_core::{
    Clock, DailyBonus, DailyChallenge, GameSettings, PlayerLevel, PortfolioSummary, Result,
    RewardTransaction, TradeRecord, UnclaimedRewards,
};
use wallnance_persistence::{keys, KeyValueStore};

/// Result of a daily login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogin {
    pub bonus: DailyBonus,
    /// Challenge, streak and achievement rewards the login triggered
    pub extra_rewards: Vec<RewardTransaction>,
}

/// Result of a buy or sell
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOutcome {
    pub record: TradeRecord,
    pub rewards: Vec<RewardTransaction>,
}

/// Everything a status view shows
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStatus {
    pub level: PlayerLevel,
    pub total_points: u64,
    #[serde(rename = "totalWLC")]
    pub total_wlc: u64,
    pub current_streak: u32,
    pub max_streak: u32,
    pub reward_multiplier: f64,
    pub unclaimed: UnclaimedRewards,
    pub portfolio: PortfolioSummary,
    pub challenges: Vec<DailyChallenge>,
    pub achievements_unlocked: usize,
}

/// One player's game, owning every service
pub struct Game<S> {
    settings: GameSettings,
    ledger: Arc<RewardLedger<S>>,
    wallet: Arc<Wallet<S>>,
    market: Arc<MarketService<S>>,
    desk: TradeDesk<S>,
    progress: ProgressTracker<S>,
}

impl<S: KeyValueStore> Game<S> {
    /// Load settings and every service from `store`
    pub async fn open(store: Arc<S>, clock: Arc<dyn Clock>) -> Result<Self> {
        let settings = match keys::SETTINGS.load::<GameSettings, _>(store.as_ref()).await? {
            Some(settings) => settings,
            None => {
                let settings = GameSettings::default();
                keys::SETTINGS.save(store.as_ref(), &settings).await?;
                settings
            }
        };

        let ledger = Arc::new(RewardLedger::load(store.clone(), clock.clone()).await?);
        let wallet = Arc::new(Wallet::load(store.clone(), settings.starting_balance).await?);
        let market = Arc::new(MarketService::load(store.clone(), &settings).await?);
        let desk = TradeDesk::load(store.clone(), clock.clone(), wallet.clone(), market.clone()).await?;
        let progress = ProgressTracker::load(store, clock, ledger.clone()).await?;

        info!("Game opened, balance {} coins", wallet.balance().await);
        Ok(Self {
            settings,
            ledger,
            wallet,
            market,
            desk,
            progress,
        })
    }

    pub async fn daily_login(&self) -> Result<DailyLogin> {
        let bonus = self.ledger.check_daily_bonus().await?;
        let extra_rewards = self.progress.record_daily_login(&bonus).await?;
        Ok(DailyLogin {
            bonus,
            extra_rewards,
        })
    }

    pub async fn complete_lesson(&self, lesson_id: &str) -> Result<Vec<RewardTransaction>> {
        self.progress.complete_lesson(lesson_id).await
    }

    pub async fn pass_quiz(&self, lesson_id: &str) -> Result<Vec<RewardTransaction>> {
        self.progress.pass_quiz(lesson_id).await
    }

    pub async fn buy(&self, symbol: &str, coins: f64) -> Result<TradeOutcome> {
        let record = self.desk.buy(symbol, coins).await?;
        let rewards = self.after_trade().await;
        Ok(TradeOutcome { record, rewards })
    }

    pub async fn sell(&self, symbol: &str, quantity: f64) -> Result<TradeOutcome> {
        let record = self.desk.sell(symbol, quantity).await?;
        let rewards = self.after_trade().await;
        Ok(TradeOutcome { record, rewards })
    }

    /// Move unclaimed rewards into the wallet
    pub async fn claim(&self) -> Result<UnclaimedRewards> {
        self.ledger.claim_rewards(self.wallet.as_ref()).await
    }

    pub async fn status(&self) -> GameStatus {
        let rewards = self.ledger.snapshot().await;
        let progress = self.progress.snapshot().await;

        GameStatus {
            level: rewards.level(),
            total_points: rewards.total_points,
            total_wlc: rewards.total_wlc,
            current_streak: rewards.current_streak,
            max_streak: rewards.max_streak,
            reward_multiplier: rewards.reward_multiplier(),
            unclaimed: rewards.unclaimed_rewards,
            portfolio: self.desk.valuation().await,
            challenges: self.progress.challenges().await,
            achievements_unlocked: progress.unlocked_achievements.len(),
        }
    }

    /// Runs after the trade has committed; progress errors are only logged
    async fn after_trade(&self) -> Vec<RewardTransaction> {
        match self.progress.record_trade().await {
            Ok(rewards) => rewards,
            Err(e) => {
                warn!("Trade progress not recorded: {}", e);
                Vec::new()
            }
        }
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn ledger(&self) -> &Arc<RewardLedger<S>> {
        &self.ledger
    }

    pub fn wallet(&self) -> &Arc<Wallet<S>> {
        &self.wallet
    }

    pub fn market(&self) -> &Arc<MarketService<S>> {
        &self.market
    }

    pub fn desk(&self) -> &TradeDesk<S> {
        &self.desk
    }

    pub fn progress(&self) -> &ProgressTracker<S> {
        &self.progress
    }
}

impl<S: KeyValueStore + 'static> Game<S> {
    /// Start moving prices in the background at the configured interval
    pub fn spawn_ticker(&self) -> MarketTickerHandle {
        let interval = Duration::from_secs(self.settings.tick_interval_secs.max(1));
        spawn_price_ticker(self.market.clone(), interval)
    }
}
