//! Learning progress: lessons, achievements, streak milestones and daily challenges

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A lesson the player can complete for points
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: &'static str,
    pub title: &'static str,
    /// Points for completing the lesson
    pub points: u64,
    /// Points for passing the lesson quiz
    pub quiz_points: u64,
}

/// Lesson catalog
pub static LESSONS: &[Lesson] = &[
    Lesson { id: "what-is-money", title: "What Is Money?", points: 100, quiz_points: 50 },
    Lesson { id: "saving-basics", title: "Saving Basics", points: 100, quiz_points: 50 },
    Lesson { id: "compound-interest", title: "Compound Interest", points: 150, quiz_points: 75 },
    Lesson { id: "stocks-101", title: "Stocks 101", points: 150, quiz_points: 75 },
    Lesson { id: "crypto-101", title: "Crypto 101", points: 150, quiz_points: 75 },
    Lesson { id: "diversification", title: "Diversification", points: 200, quiz_points: 100 },
    Lesson { id: "risk-and-reward", title: "Risk and Reward", points: 200, quiz_points: 100 },
    Lesson { id: "market-cycles", title: "Market Cycles", points: 250, quiz_points: 125 },
];

/// Look up a lesson by id
pub fn find_lesson(id: &str) -> Option<&'static Lesson> {
    LESSONS.iter().find(|l| l.id == id)
}

/// Streak lengths that pay a one-off bonus, with the bonus points
pub const STREAK_MILESTONES: &[(u32, u64)] = &[(7, 100), (14, 250), (30, 500)];

/// Snapshot of counters achievements are judged against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressStats {
    pub lessons_completed: u64,
    pub quizzes_passed: u64,
    pub trades_made: u64,
    pub current_streak: u32,
    pub level: u64,
}

/// Unlockable achievements
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstLesson,
    FiveLessons,
    QuizWhiz,
    FirstTrade,
    TenTrades,
    WeekStreak,
    LevelFive,
}

impl AchievementId {
    pub const ALL: [AchievementId; 7] = [
        Self::FirstLesson,
        Self::FiveLessons,
        Self::QuizWhiz,
        Self::FirstTrade,
        Self::TenTrades,
        Self::WeekStreak,
        Self::LevelFive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FirstLesson => "first_lesson",
            Self::FiveLessons => "five_lessons",
            Self::QuizWhiz => "quiz_whiz",
            Self::FirstTrade => "first_trade",
            Self::TenTrades => "ten_trades",
            Self::WeekStreak => "week_streak",
            Self::LevelFive => "level_five",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::FirstLesson => "First Steps",
            Self::FiveLessons => "Bookworm",
            Self::QuizWhiz => "Quiz Whiz",
            Self::FirstTrade => "Market Debut",
            Self::TenTrades => "Active Trader",
            Self::WeekStreak => "Dedicated",
            Self::LevelFive => "Rising Tycoon",
        }
    }

    pub fn points(&self) -> u64 {
        match self {
            Self::FirstLesson | Self::FirstTrade => 50,
            Self::QuizWhiz => 150,
            Self::FiveLessons | Self::TenTrades => 200,
            Self::WeekStreak => 250,
            Self::LevelFive => 500,
        }
    }

    pub fn is_met(&self, stats: &ProgressStats) -> bool {
        match self {
            Self::FirstLesson => stats.lessons_completed >= 1,
            Self::FiveLessons => stats.lessons_completed >= 5,
            Self::QuizWhiz => stats.quizzes_passed >= 3,
            Self::FirstTrade => stats.trades_made >= 1,
            Self::TenTrades => stats.trades_made >= 10,
            Self::WeekStreak => stats.current_streak >= 7,
            Self::LevelFive => stats.level >= 5,
        }
    }
}

/// What a daily challenge counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChallengeKind {
    CompleteLesson,
    MakeTrades,
    ClaimDaily,
}

/// One of the day's challenges
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub kind: ChallengeKind,
    pub description: String,
    pub target: u32,
    pub progress: u32,
    pub points: u64,
    pub completed: bool,
}

impl DailyChallenge {
    fn new(kind: ChallengeKind, description: &str, target: u32, points: u64) -> Self {
        Self {
            kind,
            description: description.to_string(),
            target,
            progress: 0,
            points,
            completed: false,
        }
    }
}

/// The fixed set of challenges issued each day
pub fn daily_challenge_set() -> Vec<DailyChallenge> {
    vec![
        DailyChallenge::new(ChallengeKind::CompleteLesson, "Complete a lesson", 1, 75),
        DailyChallenge::new(ChallengeKind::MakeTrades, "Make 3 trades", 3, 100),
        DailyChallenge::new(ChallengeKind::ClaimDaily, "Claim your daily bonus", 1, 25),
    ]
}

/// Persisted learning progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProgressState {
    pub completed_lessons: BTreeSet<String>,
    pub passed_quizzes: BTreeSet<String>,
    pub unlocked_achievements: BTreeSet<AchievementId>,
    /// Streak milestones already paid out
    pub streak_milestones: BTreeSet<u32>,
    pub trades_made: u64,
    pub challenge_day: Option<NaiveDate>,
    pub challenges: Vec<DailyChallenge>,
}

impl ProgressState {
    /// Issue a fresh challenge set if `today` differs from the current one
    pub fn roll_challenges(&mut self, today: NaiveDate) -> bool {
        if self.challenge_day == Some(today) {
            return false;
        }
        self.challenge_day = Some(today);
        self.challenges = daily_challenge_set();
        true
    }

    /// Count `amount` towards challenges of `kind`; returns those that just completed
    pub fn record_challenge(&mut self, kind: ChallengeKind, amount: u32) -> Vec<DailyChallenge> {
        let mut completed = Vec::new();
        for challenge in self.challenges.iter_mut().filter(|c| c.kind == kind && !c.completed) {
            challenge.progress = (challenge.progress + amount).min(challenge.target);
            if challenge.progress >= challenge.target {
                challenge.completed = true;
                completed.push(challenge.clone());
            }
        }
        completed
    }

    /// Mark and return achievements whose condition is met for the first time
    pub fn unlock_achievements(&mut self, stats: &ProgressStats) -> Vec<AchievementId> {
        let mut unlocked = Vec::new();
        for id in AchievementId::ALL {
            if !self.unlocked_achievements.contains(&id) && id.is_met(stats) {
                self.unlocked_achievements.insert(id);
                unlocked.push(id);
            }
        }
        unlocked
    }

    /// Mark and return streak milestones reached for the first time
    pub fn reach_streak_milestones(&mut self, streak: u32) -> Vec<(u32, u64)> {
        let mut reached = Vec::new();
        for &(days, points) in STREAK_MILESTONES {
            if streak >= days && self.streak_milestones.insert(days) {
                reached.push((days, points));
            }
        }
        reached
    }
}
