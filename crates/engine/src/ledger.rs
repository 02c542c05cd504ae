//! Reward ledger
//!
//! Accumulates point rewards, stages the coins and WLC they convert into,
//! and commits them to the player's balance on claim. Every mutation holds
//! the ledger lock across its persistence write so concurrent callers
//! cannot interleave read-modify-write sequences.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use wallnance_core::{
    daily_bonus_points, Clock, DailyBonus, Error, PlayerLevel, PlayerRewards, Points, Result,
    RewardGrant, RewardTransaction, RewardType, UnclaimedRewards,
};
use wallnance_persistence::{keys, KeyValueStore};

/// Receiver of claimed coins (the player's spendable balance)
pub trait BalanceSink: Send + Sync {
    /// Add `coins` to the balance, returning the new balance
    fn credit(&self, coins: f64) -> impl Future<Output = Result<f64>> + Send;
}

/// Owns the player's `PlayerRewards` aggregate
pub struct RewardLedger<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    state: Mutex<PlayerRewards>,
}

impl<S: KeyValueStore> RewardLedger<S> {
    /// Restore the ledger from `store`, or start empty
    pub async fn load(store: Arc<S>, clock: Arc<dyn Clock>) -> Result<Self> {
        let state = match keys::PLAYER_REWARDS.load::<PlayerRewards, _>(store.as_ref()).await? {
            Some(rewards) => {
                debug!(
                    "Loaded rewards: {} points, {} transactions",
                    rewards.total_points,
                    rewards.transactions.len()
                );
                rewards
            }
            None => PlayerRewards::default(),
        };

        Ok(Self {
            store,
            clock,
            state: Mutex::new(state),
        })
    }

    /// Credit `points` scaled by `bonus_multiplier`.
    ///
    /// On a failed write the in-memory state is rolled back and the
    /// storage error returned.
    pub async fn add_reward(
        &self,
        reward_type: RewardType,
        points: u64,
        description: &str,
        source: &str,
        bonus_multiplier: f64,
    ) -> Result<RewardTransaction> {
        let grant = RewardGrant::new(reward_type, points, description, source)
            .with_multiplier(bonus_multiplier);
        self.add_rewards(std::slice::from_ref(&grant))
            .await?
            .pop()
            .ok_or_else(|| Error::Unknown("reward was not recorded".to_string()))
    }

    /// Record several rewards with a single write; all or none are kept
    pub async fn add_rewards(&self, grants: &[RewardGrant]) -> Result<Vec<RewardTransaction>> {
        for grant in grants {
            validate_multiplier(grant.multiplier)?;
        }
        if grants.is_empty() {
            return Ok(Vec::new());
        }

        let mut state = self.state.lock().await;
        let before = state.clone();
        let now = self.clock.now();

        let mut granted = Vec::with_capacity(grants.len());
        for grant in grants {
            match state.record_grant(grant, now) {
                Ok(transaction) => granted.push(transaction),
                Err(e) => {
                    *state = before;
                    return Err(e);
                }
            }
        }

        if let Err(e) = self.persist(&state).await {
            *state = before;
            return Err(e);
        }

        for transaction in &granted {
            debug!(
                "Reward {}: +{} points ({})",
                transaction.reward_type, transaction.amount, transaction.description
            );
        }
        Ok(granted)
    }

    /// Move unclaimed coins to `balance` and WLC to the lifetime total.
    ///
    /// The balance is credited before the ledger changes; if that fails the
    /// ledger is untouched. If the ledger write fails afterwards the claim
    /// stays committed in memory (the coins are already paid) and `flush`
    /// can retry the write.
    pub async fn claim_rewards<B: BalanceSink>(&self, balance: &B) -> Result<UnclaimedRewards> {
        let mut state = self.state.lock().await;
        let claimed = state.unclaimed_rewards;

        if claimed.is_empty() {
            return Ok(claimed);
        }

        if claimed.coins > 0 {
            balance.credit(claimed.coins as f64).await?;
        }

        state.commit_claim(&claimed);
        self.persist(&state).await?;

        info!(
            "Claimed {} points: {} coins, {} WLC",
            claimed.points, claimed.coins, claimed.wlc
        );
        Ok(claimed)
    }

    /// Grant the once-per-UTC-day login bonus and advance the streak
    pub async fn check_daily_bonus(&self) -> Result<DailyBonus> {
        let today = self.clock.today();
        let mut state = self.state.lock().await;
        let before = state.clone();

        let Some(streak) = state.advance_streak(today) else {
            return Ok(DailyBonus {
                claimed: false,
                points: 0,
                streak: state.current_streak,
            });
        };

        let points = daily_bonus_points(streak);
        let recorded = state.record(
            RewardType::DailyBonus,
            Points::new(points),
            1.0,
            &format!("Day {} login bonus", streak),
            "daily_login",
            self.clock.now(),
        );

        let result = match recorded {
            Ok(_) => self.persist(&state).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            *state = before;
            return Err(e);
        }

        info!("Daily bonus: {} points, streak {}", points, streak);
        Ok(DailyBonus {
            claimed: true,
            points,
            streak,
        })
    }

    /// Multiplier to apply to newly earned lesson and quiz rewards
    pub async fn reward_multiplier(&self) -> f64 {
        self.state.lock().await.reward_multiplier()
    }

    pub async fn player_level(&self) -> PlayerLevel {
        self.state.lock().await.level()
    }

    pub async fn unclaimed(&self) -> UnclaimedRewards {
        self.state.lock().await.unclaimed_rewards
    }

    /// Copy of the whole aggregate
    pub async fn snapshot(&self) -> PlayerRewards {
        self.state.lock().await.clone()
    }

    /// Write the current state again (after a failed claim write)
    pub async fn flush(&self) -> Result<()> {
        let state = self.state.lock().await;
        self.persist(&state).await
    }

    async fn persist(&self, state: &PlayerRewards) -> Result<()> {
        keys::PLAYER_REWARDS
            .save(self.store.as_ref(), state)
            .await
            .map_err(|e| {
                error!("Failed to persist rewards: {}", e);
                e
            })
    }
}

fn validate_multiplier(multiplier: f64) -> Result<()> {
    if !multiplier.is_finite() || multiplier < 1.0 {
        return Err(Error::InvalidAmount(format!(
            "reward multiplier must be a finite number >= 1, got {}",
            multiplier
        )));
    }
    Ok(())
}
