//! Reward ledger models: point transactions, unclaimed staging and streaks

use crate::errors::{Error, Result};
use crate::types::Points;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of transactions kept in the reward log
pub const TRANSACTION_LOG_LIMIT: usize = 50;

/// Daily bonus before streak scaling
pub const DAILY_BONUS_BASE: u64 = 50;

/// Extra daily bonus per streak day
pub const DAILY_BONUS_PER_STREAK_DAY: u64 = 10;

/// Daily bonus ceiling
pub const DAILY_BONUS_MAX: u64 = 200;

/// Points per player level (leveling is linear)
pub const POINTS_PER_LEVEL: u64 = 1000;

/// Category of action that granted a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardType {
    LessonComplete,
    QuizPass,
    AchievementUnlock,
    DailyBonus,
    StreakBonus,
    ChallengeComplete,
}

impl RewardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LessonComplete => "lesson_complete",
            Self::QuizPass => "quiz_pass",
            Self::AchievementUnlock => "achievement_unlock",
            Self::DailyBonus => "daily_bonus",
            Self::StreakBonus => "streak_bonus",
            Self::ChallengeComplete => "challenge_complete",
        }
    }
}

impl std::fmt::Display for RewardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Denomination of a transaction amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    #[default]
    Points,
    Coins,
    Wlc,
}

/// One entry in the reward log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardTransaction {
    pub id: String,
    #[serde(rename = "type")]
    pub reward_type: RewardType,
    /// Points credited, multiplier already applied
    pub amount: u64,
    #[serde(default)]
    pub currency: Currency,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub source: String,
    pub timestamp: DateTime<Utc>,
}

/// A reward to be recorded, before the multiplier is applied
#[derive(Debug, Clone, PartialEq)]
pub struct RewardGrant {
    pub reward_type: RewardType,
    pub points: u64,
    pub multiplier: f64,
    pub description: String,
    pub source: String,
}

impl RewardGrant {
    pub fn new(
        reward_type: RewardType,
        points: u64,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            reward_type,
            points,
            multiplier: 1.0,
            description: description.into(),
            source: source.into(),
        }
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }
}

/// Rewards earned but not yet moved into the spendable balance
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnclaimedRewards {
    pub points: u64,
    pub coins: u64,
    pub wlc: u64,
}

impl UnclaimedRewards {
    pub fn is_empty(&self) -> bool {
        self.points == 0 && self.coins == 0 && self.wlc == 0
    }
}

/// Outcome of a daily bonus check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyBonus {
    pub claimed: bool,
    pub points: u64,
    pub streak: u32,
}

/// Level derived from total points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLevel {
    pub level: u64,
    pub current_level_points: u64,
    pub next_level_points: u64,
}

/// Per-player reward aggregate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRewards {
    #[serde(default)]
    pub total_points: u64,
    #[serde(default, rename = "totalWLC")]
    pub total_wlc: u64,
    #[serde(default)]
    pub lifetime_earnings: u64,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub max_streak: u32,
    /// UTC day of the last daily bonus
    #[serde(default)]
    pub last_claim_date: Option<NaiveDate>,
    /// Newest first
    #[serde(default)]
    pub transactions: Vec<RewardTransaction>,
    #[serde(default)]
    pub unclaimed_rewards: UnclaimedRewards,
}

impl Default for PlayerRewards {
    fn default() -> Self {
        Self {
            total_points: 0,
            total_wlc: 0,
            lifetime_earnings: 0,
            current_streak: 0,
            max_streak: 0,
            last_claim_date: None,
            transactions: Vec::new(),
            unclaimed_rewards: UnclaimedRewards::default(),
        }
    }
}

impl PlayerRewards {
    /// Credit points and stage the derived coins and WLC.
    ///
    /// `multiplier` is applied to `points` and floored before anything
    /// else is derived from it. Fails with `InvalidAmount`, leaving the
    /// rewards untouched, if any running total would overflow.
    pub fn record(
        &mut self,
        reward_type: RewardType,
        points: Points,
        multiplier: f64,
        description: &str,
        source: &str,
        now: DateTime<Utc>,
    ) -> Result<RewardTransaction> {
        let final_points = points.scaled(multiplier);
        let amount = final_points.as_u64();

        let overflow = || Error::InvalidAmount(format!("{} points overflow the reward totals", amount));
        let total_points = self.total_points.checked_add(amount).ok_or_else(overflow)?;
        let lifetime_earnings = self.lifetime_earnings.checked_add(amount).ok_or_else(overflow)?;
        let unclaimed = UnclaimedRewards {
            points: self.unclaimed_rewards.points.checked_add(amount).ok_or_else(overflow)?,
            coins: final_points
                .to_coins()
                .and_then(|coins| self.unclaimed_rewards.coins.checked_add(coins))
                .ok_or_else(overflow)?,
            wlc: self
                .unclaimed_rewards
                .wlc
                .checked_add(final_points.to_wlc())
                .ok_or_else(overflow)?,
        };

        let transaction = RewardTransaction {
            id: uuid::Uuid::new_v4().to_string(),
            reward_type,
            amount,
            currency: Currency::Points,
            description: description.to_string(),
            source: source.to_string(),
            timestamp: now,
        };

        self.transactions.insert(0, transaction.clone());
        self.transactions.truncate(TRANSACTION_LOG_LIMIT);

        self.total_points = total_points;
        self.lifetime_earnings = lifetime_earnings;
        self.unclaimed_rewards = unclaimed;

        Ok(transaction)
    }

    pub fn record_grant(&mut self, grant: &RewardGrant, now: DateTime<Utc>) -> Result<RewardTransaction> {
        self.record(
            grant.reward_type,
            Points::new(grant.points),
            grant.multiplier,
            &grant.description,
            &grant.source,
            now,
        )
    }

    /// Move staged WLC into the lifetime total and clear the staging area
    pub fn commit_claim(&mut self, claimed: &UnclaimedRewards) {
        self.total_wlc = self.total_wlc.saturating_add(claimed.wlc);
        self.unclaimed_rewards = UnclaimedRewards::default();
    }

    /// Advance the login streak for `today`.
    ///
    /// Returns `None` when the bonus was already taken today, otherwise the
    /// new streak length.
    pub fn advance_streak(&mut self, today: NaiveDate) -> Option<u32> {
        match self.last_claim_date {
            Some(last) if last == today => return None,
            Some(last) if last.succ_opt() == Some(today) => self.current_streak += 1,
            _ => self.current_streak = 1,
        }
        self.max_streak = self.max_streak.max(self.current_streak);
        self.last_claim_date = Some(today);
        Some(self.current_streak)
    }

    /// Streak-based multiplier for newly earned rewards
    pub fn reward_multiplier(&self) -> f64 {
        if self.current_streak >= 7 {
            2.0
        } else if self.current_streak >= 3 {
            1.5
        } else {
            1.0
        }
    }

    pub fn level(&self) -> PlayerLevel {
        PlayerLevel {
            level: self.total_points / POINTS_PER_LEVEL + 1,
            current_level_points: self.total_points % POINTS_PER_LEVEL,
            next_level_points: POINTS_PER_LEVEL,
        }
    }
}

/// Daily bonus points for a given streak length
pub fn daily_bonus_points(streak: u32) -> u64 {
    (DAILY_BONUS_BASE + streak as u64 * DAILY_BONUS_PER_STREAK_DAY).min(DAILY_BONUS_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_record_lesson_example() {
        let mut rewards = PlayerRewards::default();
        let tx = rewards.record(
            RewardType::LessonComplete,
            Points::new(100),
            1.0,
            "x",
            "y",
            Utc::now(),
        )
        .unwrap();

        assert_eq!(tx.amount, 100);
        assert_eq!(tx.currency, Currency::Points);
        assert_eq!(rewards.total_points, 100);
        assert_eq!(rewards.lifetime_earnings, 100);
        assert_eq!(
            rewards.unclaimed_rewards,
            UnclaimedRewards { points: 100, coins: 100, wlc: 1 }
        );
    }

    #[test]
    fn test_record_applies_multiplier_before_conversion() {
        let mut rewards = PlayerRewards::default();
        rewards
            .record(RewardType::QuizPass, Points::new(133), 1.5, "", "", Utc::now())
            .unwrap();

        // floor(133 * 1.5) = 199
        assert_eq!(rewards.total_points, 199);
        assert_eq!(rewards.unclaimed_rewards.coins, 199);
        assert_eq!(rewards.unclaimed_rewards.wlc, 1);
    }

    #[test]
    fn test_transaction_log_is_capped_newest_first() {
        let mut rewards = PlayerRewards::default();
        for i in 0..60u64 {
            rewards.record(
                RewardType::LessonComplete,
                Points::new(i),
                1.0,
                &format!("lesson {}", i),
                "test",
                Utc::now(),
            )
            .unwrap();
        }

        assert_eq!(rewards.transactions.len(), TRANSACTION_LOG_LIMIT);
        assert_eq!(rewards.transactions[0].amount, 59);
        assert_eq!(rewards.transactions[TRANSACTION_LOG_LIMIT - 1].amount, 10);
    }

    #[test]
    fn test_record_overflow_leaves_rewards_untouched() {
        let mut rewards = PlayerRewards::default();
        rewards
            .record(RewardType::LessonComplete, Points::new(1 << 60), 1.0, "", "", Utc::now())
            .unwrap();
        assert_eq!(rewards.unclaimed_rewards.coins, 1 << 60);

        let before = rewards.clone();
        let err = rewards
            .record(RewardType::LessonComplete, Points::new(u64::MAX), 1.0, "", "", Utc::now())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
        assert_eq!(rewards, before);
    }

    #[test]
    fn test_streak_same_day_is_noop() {
        let mut rewards = PlayerRewards::default();
        assert_eq!(rewards.advance_streak(day(2026, 10, 18)), Some(1));
        assert_eq!(rewards.advance_streak(day(2026, 10, 18)), None);
        assert_eq!(rewards.current_streak, 1);
    }

    #[test]
    fn test_streak_consecutive_and_missed_days() {
        let mut rewards = PlayerRewards::default();
        rewards.advance_streak(day(2026, 10, 30));
        rewards.advance_streak(day(2026, 10, 31));
        assert_eq!(rewards.advance_streak(day(2026, 11, 1)), Some(3));

        // Skip the 2nd
        assert_eq!(rewards.advance_streak(day(2026, 11, 3)), Some(1));
        assert_eq!(rewards.max_streak, 3);
    }

    #[test]
    fn test_reward_multiplier_thresholds() {
        let mut rewards = PlayerRewards::default();
        assert_eq!(rewards.reward_multiplier(), 1.0);
        rewards.current_streak = 3;
        assert_eq!(rewards.reward_multiplier(), 1.5);
        rewards.current_streak = 6;
        assert_eq!(rewards.reward_multiplier(), 1.5);
        rewards.current_streak = 7;
        assert_eq!(rewards.reward_multiplier(), 2.0);
    }

    #[test]
    fn test_level_is_linear() {
        let mut rewards = PlayerRewards::default();
        assert_eq!(rewards.level().level, 1);

        rewards.total_points = 2_345;
        let level = rewards.level();
        assert_eq!(level.level, 3);
        assert_eq!(level.current_level_points, 345);
        assert_eq!(level.next_level_points, 1000);
    }

    #[test]
    fn test_daily_bonus_points_capped() {
        assert_eq!(daily_bonus_points(1), 60);
        assert_eq!(daily_bonus_points(7), 120);
        assert_eq!(daily_bonus_points(15), 200);
        assert_eq!(daily_bonus_points(100), 200);
    }

    #[test]
    fn test_serialized_field_names() {
        let rewards = PlayerRewards::default();
        let json = serde_json::to_value(&rewards).unwrap();
        assert!(json.get("totalWLC").is_some());
        assert!(json.get("unclaimedRewards").is_some());
        assert!(json.get("lastClaimDate").is_some());
    }
}
