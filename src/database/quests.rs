//! Daily quest progress and the consumable reward counters.
//!
//! Day rollover is lazy: the stored `quest_date` is compared against today
//! on every access and the day-scoped fields reset in place, so correctness
//! does not depend on a background scheduler. Streak freezes and bonus hints
//! survive the rollover.

use crate::database::models::{QuestKind, QuestProgress};
use crate::utils::time::today_utc;
use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{Row, SqlitePool};

/// Daily quiz answers that count toward the quest.
pub const QUEST_QUIZ_TARGET: i64 = 5;

/// Current quest progress, creating or rolling the row over as needed.
pub async fn quest_progress(pool: &SqlitePool, user_id: i64) -> Result<QuestProgress> {
    let today = today_utc();
    let mut tx = pool.begin().await?;
    let progress = progress_for_today(&mut tx, user_id, today).await?;
    tx.commit().await?;
    Ok(progress)
}

async fn progress_for_today(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: i64,
    today: NaiveDate,
) -> Result<QuestProgress> {
    let row = sqlx::query(
        "SELECT quest_date, quizzes_completed, voted_today, quest_completed, streak_freezes, bonus_hints
         FROM daily_quests WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await?;

    let Some(row) = row else {
        sqlx::query(
            "INSERT INTO daily_quests (user_id, quest_date, quizzes_completed, voted_today, quest_completed, streak_freezes, bonus_hints)
             VALUES (?, ?, 0, FALSE, FALSE, 0, 0)",
        )
        .bind(user_id)
        .bind(today)
        .execute(&mut **tx)
        .await?;

        return Ok(QuestProgress {
            user_id,
            quest_date: today,
            quizzes_completed: 0,
            voted_today: false,
            quest_completed: false,
            streak_freezes: 0,
            bonus_hints: 0,
        });
    };

    let quest_date: NaiveDate = row.get("quest_date");
    let streak_freezes: i64 = row.get("streak_freezes");
    let bonus_hints: i64 = row.get("bonus_hints");

    if quest_date < today {
        sqlx::query(
            "UPDATE daily_quests
             SET quest_date = ?, quizzes_completed = 0, voted_today = FALSE, quest_completed = FALSE
             WHERE user_id = ?",
        )
        .bind(today)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

        return Ok(QuestProgress {
            user_id,
            quest_date: today,
            quizzes_completed: 0,
            voted_today: false,
            quest_completed: false,
            streak_freezes,
            bonus_hints,
        });
    }

    Ok(QuestProgress {
        user_id,
        quest_date,
        quizzes_completed: row.get("quizzes_completed"),
        voted_today: row.get("voted_today"),
        quest_completed: row.get("quest_completed"),
        streak_freezes,
        bonus_hints,
    })
}

/// Advances the quest for one event. Returns true exactly when this event
/// newly completes the quest, in which case the reward bundle (+1 streak
/// freeze, +1 bonus hint) has been granted. The `quest_completed` flag makes
/// the grant fire at most once per day.
pub async fn advance_quest(pool: &SqlitePool, user_id: i64, kind: QuestKind) -> Result<bool> {
    let today = today_utc();
    let mut tx = pool.begin().await?;
    let progress = progress_for_today(&mut tx, user_id, today).await?;

    let newly_completed = match kind {
        QuestKind::QuizAnswer => {
            // Contribution is capped; answers past the target are ignored.
            if progress.quizzes_completed >= QUEST_QUIZ_TARGET {
                tx.commit().await?;
                return Ok(false);
            }

            let new_count = progress.quizzes_completed + 1;
            let completes = new_count >= QUEST_QUIZ_TARGET && !progress.quest_completed;

            if completes {
                sqlx::query(
                    "UPDATE daily_quests
                     SET quizzes_completed = ?, quest_completed = TRUE,
                         streak_freezes = streak_freezes + 1, bonus_hints = bonus_hints + 1
                     WHERE user_id = ?",
                )
                .bind(new_count)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query("UPDATE daily_quests SET quizzes_completed = ? WHERE user_id = ?")
                    .bind(new_count)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }

            completes
        }
        QuestKind::Vote => {
            if progress.voted_today {
                tx.commit().await?;
                return Ok(false);
            }

            let completes =
                progress.quizzes_completed >= QUEST_QUIZ_TARGET && !progress.quest_completed;

            if completes {
                sqlx::query(
                    "UPDATE daily_quests
                     SET voted_today = TRUE, quest_completed = TRUE,
                         streak_freezes = streak_freezes + 1, bonus_hints = bonus_hints + 1
                     WHERE user_id = ?",
                )
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
            } else {
                sqlx::query("UPDATE daily_quests SET voted_today = TRUE WHERE user_id = ?")
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }

            completes
        }
    };

    tx.commit().await?;
    Ok(newly_completed)
}

/// Spends one streak freeze. The conditional update is a single statement,
/// so a freeze can never be double-spent even under concurrent calls.
pub async fn consume_streak_freeze(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE daily_quests SET streak_freezes = streak_freezes - 1
         WHERE user_id = ? AND streak_freezes > 0",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Spends one bonus hint; same single-statement guarantee as freezes.
pub async fn consume_bonus_hint(pool: &SqlitePool, user_id: i64) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE daily_quests SET bonus_hints = bonus_hints - 1
         WHERE user_id = ? AND bonus_hints > 0",
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// (streak_freezes, bonus_hints) without touching the quest day.
pub async fn get_rewards(pool: &SqlitePool, user_id: i64) -> Result<(i64, i64)> {
    let row = sqlx::query("SELECT streak_freezes, bonus_hints FROM daily_quests WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok((row.get("streak_freezes"), row.get("bonus_hints"))),
        None => Ok((0, 0)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testutil::test_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn progress_row_created_lazily() {
        let pool = test_pool().await;
        let progress = quest_progress(&pool, 1).await.unwrap();
        assert_eq!(progress.quizzes_completed, 0);
        assert_eq!(progress.quest_date, today_utc());
        assert!(!progress.quest_completed);
    }

    #[tokio::test]
    async fn quest_rewards_granted_exactly_once_per_day() {
        let pool = test_pool().await;

        for i in 0..4 {
            let completed = advance_quest(&pool, 1, QuestKind::QuizAnswer).await.unwrap();
            assert!(!completed, "quest completed early at answer {}", i + 1);
        }

        let completed = advance_quest(&pool, 1, QuestKind::QuizAnswer).await.unwrap();
        assert!(completed);

        // Further answers the same day change nothing
        for _ in 0..5 {
            let completed = advance_quest(&pool, 1, QuestKind::QuizAnswer).await.unwrap();
            assert!(!completed);
        }

        let progress = quest_progress(&pool, 1).await.unwrap();
        assert_eq!(progress.quizzes_completed, QUEST_QUIZ_TARGET);
        assert_eq!(progress.streak_freezes, 1);
        assert_eq!(progress.bonus_hints, 1);
    }

    #[tokio::test]
    async fn vote_is_one_shot_and_does_not_double_grant() {
        let pool = test_pool().await;

        for _ in 0..5 {
            advance_quest(&pool, 1, QuestKind::QuizAnswer).await.unwrap();
        }
        // Quest already completed by the quiz path; voting adds no rewards
        let completed = advance_quest(&pool, 1, QuestKind::Vote).await.unwrap();
        assert!(!completed);
        let completed = advance_quest(&pool, 1, QuestKind::Vote).await.unwrap();
        assert!(!completed);

        let progress = quest_progress(&pool, 1).await.unwrap();
        assert!(progress.voted_today);
        assert_eq!(progress.streak_freezes, 1);
        assert_eq!(progress.bonus_hints, 1);
    }

    #[tokio::test]
    async fn freeze_consumption_is_exactly_once() {
        let pool = test_pool().await;
        for _ in 0..5 {
            advance_quest(&pool, 1, QuestKind::QuizAnswer).await.unwrap();
        }

        assert!(consume_streak_freeze(&pool, 1).await.unwrap());
        assert!(!consume_streak_freeze(&pool, 1).await.unwrap());

        let (freezes, hints) = get_rewards(&pool, 1).await.unwrap();
        assert_eq!(freezes, 0);
        assert_eq!(hints, 1);
    }

    #[tokio::test]
    async fn consume_without_row_fails_cleanly() {
        let pool = test_pool().await;
        assert!(!consume_streak_freeze(&pool, 42).await.unwrap());
        assert!(!consume_bonus_hint(&pool, 42).await.unwrap());
    }

    #[tokio::test]
    async fn day_rollover_resets_progress_but_keeps_consumables() {
        let pool = test_pool().await;
        for _ in 0..5 {
            advance_quest(&pool, 1, QuestKind::QuizAnswer).await.unwrap();
        }

        // Age the row by a day
        let yesterday = today_utc() - Duration::days(1);
        sqlx::query("UPDATE daily_quests SET quest_date = ? WHERE user_id = 1")
            .bind(yesterday)
            .execute(&pool)
            .await
            .unwrap();

        let progress = quest_progress(&pool, 1).await.unwrap();
        assert_eq!(progress.quest_date, today_utc());
        assert_eq!(progress.quizzes_completed, 0);
        assert!(!progress.quest_completed);
        assert_eq!(progress.streak_freezes, 1);
        assert_eq!(progress.bonus_hints, 1);

        // A fresh day can complete the quest again
        for _ in 0..5 {
            advance_quest(&pool, 1, QuestKind::QuizAnswer).await.unwrap();
        }
        let (freezes, _) = get_rewards(&pool, 1).await.unwrap();
        assert_eq!(freezes, 2);
    }
}
