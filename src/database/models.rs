use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Cumulative quiz performance for one user.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub user_id: i64,
    pub correct_answers: i64,
    pub streak: i64,
    pub best_streak: i64,
    pub last_activity: Option<NaiveDate>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WeeklyScore {
    pub user_id: i64,
    pub weekly_score: i64,
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct StreakEntry {
    pub user_id: i64,
    pub streak: i64,
    pub best_streak: i64,
}

/// Daily quest progress plus the consumable reward counters. The day-scoped
/// fields roll over lazily when read with a stale `quest_date`; the
/// consumables survive the rollover.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestProgress {
    pub user_id: i64,
    pub quest_date: NaiveDate,
    pub quizzes_completed: i64,
    pub voted_today: bool,
    pub quest_completed: bool,
    pub streak_freezes: i64,
    pub bonus_hints: i64,
}

/// Per-guild counting game state. `last_user_id` is NULL whenever the count
/// is at 0 (no one has counted yet).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CountingConfig {
    pub guild_id: i64,
    pub channel_id: i64,
    pub current_count: i64,
    pub last_user_id: Option<i64>,
    pub high_score: i64,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CountingStats {
    pub user_id: i64,
    pub guild_id: i64,
    pub total_counts: i64,
    pub ruined_counts: i64,
}

/// Event kinds that advance the daily quest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestKind {
    QuizAnswer,
    Vote,
}
