//! Lessons, achievements, streak milestones and daily challenges
//!
//! Every player action is reported here; the tracker decides which
//! one-off rewards it earns and routes them through the reward ledger.
//!
//! An action is planned against copies of the progress and ledger state,
//! then committed in two writes: progress first, then every reward in one
//! ledger write. If the ledger write fails the previous progress is saved
//! back and nothing changes in memory.

use crate::ledger::RewardLedger;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use wallnance_core::{
    find_lesson, ChallengeKind, Clock, DailyBonus, DailyChallenge, Error, PlayerRewards,
    ProgressState, ProgressStats, Result, RewardGrant, RewardTransaction, RewardType,
};
use wallnance_persistence::{keys, KeyValueStore};

/// Progress and rewards an action will commit
struct Plan {
    progress: ProgressState,
    rewards: PlayerRewards,
    now: DateTime<Utc>,
    grants: Vec<RewardGrant>,
}

impl Plan {
    /// Queue a reward, applying it to the ledger copy so later checks
    /// (levels, multipliers) see it
    fn grant(&mut self, grant: RewardGrant) -> Result<()> {
        self.rewards.record_grant(&grant, self.now)?;
        self.grants.push(grant);
        Ok(())
    }

    fn grant_challenges(&mut self, completed: Vec<DailyChallenge>) -> Result<()> {
        for challenge in completed {
            info!("Daily challenge complete: {}", challenge.description);
            self.grant(RewardGrant::new(
                RewardType::ChallengeComplete,
                challenge.points,
                challenge.description,
                "daily_challenge",
            ))?;
        }
        Ok(())
    }

    /// Unlock achievements until none are left.
    ///
    /// Achievement points can raise the level, which can unlock more.
    fn settle(&mut self) -> Result<()> {
        loop {
            let stats = ProgressStats {
                lessons_completed: self.progress.completed_lessons.len() as u64,
                quizzes_passed: self.progress.passed_quizzes.len() as u64,
                trades_made: self.progress.trades_made,
                current_streak: self.rewards.current_streak,
                level: self.rewards.level().level,
            };

            let unlocked = self.progress.unlock_achievements(&stats);
            if unlocked.is_empty() {
                return Ok(());
            }
            for id in unlocked {
                info!("Achievement unlocked: {}", id.title());
                self.grant(RewardGrant::new(
                    RewardType::AchievementUnlock,
                    id.points(),
                    id.title(),
                    id.as_str(),
                ))?;
            }
        }
    }
}

/// Tracks learning progress and pays out one-off rewards
pub struct ProgressTracker<S> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    ledger: Arc<RewardLedger<S>>,
    state: Mutex<ProgressState>,
}

impl<S: KeyValueStore> ProgressTracker<S> {
    pub async fn load(
        store: Arc<S>,
        clock: Arc<dyn Clock>,
        ledger: Arc<RewardLedger<S>>,
    ) -> Result<Self> {
        let state = keys::PROGRESS
            .load::<ProgressState, _>(store.as_ref())
            .await?
            .unwrap_or_default();

        Ok(Self {
            store,
            clock,
            ledger,
            state: Mutex::new(state),
        })
    }

    /// Complete a lesson for the first time.
    ///
    /// Returns every reward the action produced; empty if the lesson was
    /// already completed.
    pub async fn complete_lesson(&self, lesson_id: &str) -> Result<Vec<RewardTransaction>> {
        let lesson = find_lesson(lesson_id).ok_or_else(|| Error::UnknownLesson(lesson_id.to_string()))?;
        let mut state = self.state.lock().await;

        if state.completed_lessons.contains(lesson.id) {
            debug!("Lesson {} already completed", lesson.id);
            return Ok(Vec::new());
        }

        let mut plan = self.plan(&state).await;
        let multiplier = plan.rewards.reward_multiplier();
        plan.grant(
            RewardGrant::new(
                RewardType::LessonComplete,
                lesson.points,
                format!("Completed \"{}\"", lesson.title),
                lesson.id,
            )
            .with_multiplier(multiplier),
        )?;
        plan.progress.completed_lessons.insert(lesson.id.to_string());
        let completed = plan.progress.record_challenge(ChallengeKind::CompleteLesson, 1);
        plan.grant_challenges(completed)?;

        let granted = self.commit(&mut state, plan).await?;
        info!("Lesson {} completed, {} rewards", lesson.id, granted.len());
        Ok(granted)
    }

    /// Pass a lesson's quiz; pays once per lesson
    pub async fn pass_quiz(&self, lesson_id: &str) -> Result<Vec<RewardTransaction>> {
        let lesson = find_lesson(lesson_id).ok_or_else(|| Error::UnknownLesson(lesson_id.to_string()))?;
        let mut state = self.state.lock().await;

        if state.passed_quizzes.contains(lesson.id) {
            return Ok(Vec::new());
        }

        let mut plan = self.plan(&state).await;
        let multiplier = plan.rewards.reward_multiplier();
        plan.grant(
            RewardGrant::new(
                RewardType::QuizPass,
                lesson.quiz_points,
                format!("Passed the \"{}\" quiz", lesson.title),
                lesson.id,
            )
            .with_multiplier(multiplier),
        )?;
        plan.progress.passed_quizzes.insert(lesson.id.to_string());
        self.commit(&mut state, plan).await
    }

    /// Count an executed trade
    pub async fn record_trade(&self) -> Result<Vec<RewardTransaction>> {
        let mut state = self.state.lock().await;
        let mut plan = self.plan(&state).await;
        plan.progress.trades_made += 1;
        let completed = plan.progress.record_challenge(ChallengeKind::MakeTrades, 1);
        plan.grant_challenges(completed)?;
        self.commit(&mut state, plan).await
    }

    /// React to a daily bonus check
    pub async fn record_daily_login(&self, bonus: &DailyBonus) -> Result<Vec<RewardTransaction>> {
        if !bonus.claimed {
            return Ok(Vec::new());
        }

        let mut state = self.state.lock().await;
        let mut plan = self.plan(&state).await;
        let completed = plan.progress.record_challenge(ChallengeKind::ClaimDaily, 1);
        plan.grant_challenges(completed)?;
        for (days, points) in plan.progress.reach_streak_milestones(bonus.streak) {
            plan.grant(RewardGrant::new(
                RewardType::StreakBonus,
                points,
                format!("{}-day streak", days),
                "streak",
            ))?;
        }
        self.commit(&mut state, plan).await
    }

    /// Today's challenges, rolled over if the day changed
    pub async fn challenges(&self) -> Vec<DailyChallenge> {
        let mut state = self.state.lock().await;
        self.roll_day(&mut state);
        state.challenges.clone()
    }

    pub async fn snapshot(&self) -> ProgressState {
        self.state.lock().await.clone()
    }

    fn roll_day(&self, state: &mut ProgressState) {
        if state.roll_challenges(self.clock.today()) {
            debug!("Issued daily challenges for {}", self.clock.today());
        }
    }

    async fn plan(&self, state: &ProgressState) -> Plan {
        let mut progress = state.clone();
        self.roll_day(&mut progress);
        Plan {
            progress,
            rewards: self.ledger.snapshot().await,
            now: self.clock.now(),
            grants: Vec::new(),
        }
    }

    /// Save the planned progress, then record its rewards.
    ///
    /// `state` is only replaced once both writes succeeded.
    async fn commit(
        &self,
        state: &mut ProgressState,
        mut plan: Plan,
    ) -> Result<Vec<RewardTransaction>> {
        plan.settle()?;
        self.save(&plan.progress).await?;

        match self.ledger.add_rewards(&plan.grants).await {
            Ok(granted) => {
                *state = plan.progress;
                Ok(granted)
            }
            Err(e) => {
                if self.save(state).await.is_err() {
                    warn!("Stored progress may be ahead of the reward ledger");
                }
                Err(e)
            }
        }
    }

    async fn save(&self, progress: &ProgressState) -> Result<()> {
        keys::PROGRESS
            .save(self.store.as_ref(), progress)
            .await
            .map_err(|e| {
                error!("Failed to persist progress: {}", e);
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wallnance_core::{AchievementId, ManualClock};
    use wallnance_persistence::MemoryStore;

    struct Fixture {
        tracker: ProgressTracker<MemoryStore>,
        ledger: Arc<RewardLedger<MemoryStore>>,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_date(2026, 10, 18));
        let ledger = Arc::new(RewardLedger::load(store.clone(), clock.clone()).await.unwrap());
        let tracker = ProgressTracker::load(store.clone(), clock.clone(), ledger.clone())
            .await
            .unwrap();
        Fixture { tracker, ledger, store, clock }
    }

    fn types(granted: &[RewardTransaction]) -> Vec<RewardType> {
        granted.iter().map(|t| t.reward_type).collect()
    }

    #[tokio::test]
    async fn test_first_lesson_rewards() {
        let f = fixture().await;
        let granted = f.tracker.complete_lesson("what-is-money").await.unwrap();

        assert_eq!(
            types(&granted),
            vec![
                RewardType::LessonComplete,
                RewardType::ChallengeComplete,
                RewardType::AchievementUnlock,
            ]
        );
        // 100 lesson + 75 challenge + 50 achievement
        assert_eq!(f.ledger.snapshot().await.total_points, 225);
    }

    #[tokio::test]
    async fn test_lesson_pays_once() {
        let f = fixture().await;
        f.tracker.complete_lesson("saving-basics").await.unwrap();
        assert!(f.tracker.complete_lesson("saving-basics").await.unwrap().is_empty());
        assert!(matches!(
            f.tracker.complete_lesson("nope").await,
            Err(Error::UnknownLesson(_))
        ));
    }

    #[tokio::test]
    async fn test_lesson_uses_streak_multiplier() {
        let f = fixture().await;
        for day in 0..3 {
            if day > 0 {
                f.clock.advance_days(1);
            }
            f.ledger.check_daily_bonus().await.unwrap();
        }
        assert_eq!(f.ledger.reward_multiplier().await, 1.5);

        let granted = f.tracker.complete_lesson("stocks-101").await.unwrap();
        assert_eq!(granted[0].amount, 225);
    }

    #[tokio::test]
    async fn test_quiz_pays_once_and_unlocks_quiz_whiz() {
        let f = fixture().await;
        for id in ["what-is-money", "saving-basics"] {
            assert_eq!(types(&f.tracker.pass_quiz(id).await.unwrap()), vec![RewardType::QuizPass]);
        }
        let third = f.tracker.pass_quiz("crypto-101").await.unwrap();
        assert_eq!(types(&third), vec![RewardType::QuizPass, RewardType::AchievementUnlock]);
        assert!(f.tracker.pass_quiz("crypto-101").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_trades_complete_challenge() {
        let f = fixture().await;
        let first = f.tracker.record_trade().await.unwrap();
        assert_eq!(types(&first), vec![RewardType::AchievementUnlock]);
        assert!(f.tracker.record_trade().await.unwrap().is_empty());

        let third = f.tracker.record_trade().await.unwrap();
        assert_eq!(types(&third), vec![RewardType::ChallengeComplete]);

        // Next day the challenge starts over
        f.clock.advance_days(1);
        let challenges = f.tracker.challenges().await;
        assert!(challenges.iter().all(|c| c.progress == 0 && !c.completed));
    }

    #[tokio::test]
    async fn test_daily_login_streak_milestone() {
        let f = fixture().await;
        let mut last = Vec::new();
        for _ in 0..7 {
            let bonus = f.ledger.check_daily_bonus().await.unwrap();
            last = f.tracker.record_daily_login(&bonus).await.unwrap();
            f.clock.advance_days(1);
        }

        let kinds = types(&last);
        assert!(kinds.contains(&RewardType::ChallengeComplete));
        assert!(kinds.contains(&RewardType::StreakBonus));
        assert!(f
            .tracker
            .snapshot()
            .await
            .unlocked_achievements
            .contains(&AchievementId::WeekStreak));
    }

    #[tokio::test]
    async fn test_unclaimed_daily_bonus_is_ignored() {
        let f = fixture().await;
        let bonus = DailyBonus { claimed: false, points: 0, streak: 4 };
        assert!(f.tracker.record_daily_login(&bonus).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_progress_persists() {
        let f = fixture().await;
        f.tracker.complete_lesson("diversification").await.unwrap();

        let reloaded = ProgressTracker::load(f.store.clone(), f.clock.clone(), f.ledger.clone())
            .await
            .unwrap();
        assert_eq!(reloaded.snapshot().await, f.tracker.snapshot().await);
        assert!(reloaded.complete_lesson("diversification").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_progress_save_pays_nothing() {
        let f = fixture().await;
        f.store.fail_writes_to("progress");

        let err = f.tracker.complete_lesson("what-is-money").await.unwrap_err();
        assert!(err.is_storage());
        assert_eq!(f.ledger.snapshot().await.total_points, 0);
        assert!(f.tracker.snapshot().await.completed_lessons.is_empty());
        f.store.clear_write_failures();

        // Retrying in the same session pays exactly once
        assert_eq!(f.tracker.complete_lesson("what-is-money").await.unwrap().len(), 3);
        assert_eq!(f.ledger.snapshot().await.total_points, 225);

        let reloaded = ProgressTracker::load(f.store.clone(), f.clock.clone(), f.ledger.clone())
            .await
            .unwrap();
        assert!(reloaded.complete_lesson("what-is-money").await.unwrap().is_empty());
        assert_eq!(f.ledger.snapshot().await.total_points, 225);
    }

    #[tokio::test]
    async fn test_failed_reward_write_keeps_challenge_open() {
        let f = fixture().await;
        f.tracker.record_trade().await.unwrap();
        f.tracker.record_trade().await.unwrap();

        f.store.fail_writes_to("player_rewards");
        assert!(f.tracker.record_trade().await.unwrap_err().is_storage());
        f.store.clear_write_failures();

        let state = f.tracker.snapshot().await;
        assert_eq!(state.trades_made, 2);
        let trades = state
            .challenges
            .iter()
            .find(|c| c.kind == ChallengeKind::MakeTrades)
            .unwrap();
        assert_eq!(trades.progress, 2);
        assert!(!trades.completed);
        assert_eq!(types(&f.ledger.snapshot().await.transactions), vec![RewardType::AchievementUnlock]);

        // The stored progress was rolled back too
        let reloaded = ProgressTracker::load(f.store.clone(), f.clock.clone(), f.ledger.clone())
            .await
            .unwrap();
        assert_eq!(reloaded.snapshot().await.trades_made, 2);

        let retry = f.tracker.record_trade().await.unwrap();
        assert_eq!(types(&retry), vec![RewardType::ChallengeComplete]);
    }

    #[tokio::test]
    async fn test_failed_daily_login_rewards_retry_cleanly() {
        let f = fixture().await;
        let bonus = f.ledger.check_daily_bonus().await.unwrap();

        f.store.fail_writes_to("player_rewards");
        assert!(f.tracker.record_daily_login(&bonus).await.is_err());
        f.store.clear_write_failures();
        assert!(f.tracker.snapshot().await.challenges.iter().all(|c| !c.completed));

        let granted = f.tracker.record_daily_login(&bonus).await.unwrap();
        assert_eq!(types(&granted), vec![RewardType::ChallengeComplete]);
    }
}
