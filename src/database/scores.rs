//! Scoring store: durable quiz scores, streaks and the weekly accumulator.
//!
//! Callers decide whether an answer was correct; this layer only records the
//! outcome. Every multi-statement mutation runs in one transaction.

use crate::database::models::{ScoreRecord, StreakEntry, WeeklyScore};
use crate::utils::time::{current_week, days_since, today_utc};
use anyhow::Result;
use sqlx::{Row, SqlitePool};

/// Records a correct answer worth `points` and advances the streak.
///
/// A gap of more than one calendar day since the last scoring event forces a
/// streak reset regardless of `force_streak_reset`. Also feeds the
/// current-week accumulator. Returns the resulting streak so callers can
/// apply milestone bonuses without re-reading the leaderboard.
pub async fn increment_score(
    pool: &SqlitePool,
    user_id: i64,
    points: i64,
    force_streak_reset: bool,
) -> Result<i64> {
    let today = today_utc();
    let mut tx = pool.begin().await?;

    let row = sqlx::query(
        "SELECT correct_answers, streak, best_streak, last_activity FROM leaderboard WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let new_streak = match row {
        Some(row) => {
            let streak: i64 = row.get("streak");
            let best_streak: i64 = row.get("best_streak");
            let last_activity: Option<chrono::NaiveDate> = row.get("last_activity");

            let mut reset = force_streak_reset;
            if let Some(last) = last_activity {
                if days_since(last, today) > 1 {
                    reset = true;
                }
            }

            let new_streak = if reset { 0 } else { streak + 1 };
            let new_best = best_streak.max(new_streak);

            sqlx::query(
                "UPDATE leaderboard
                 SET correct_answers = correct_answers + ?, streak = ?, best_streak = ?, last_activity = ?
                 WHERE user_id = ?",
            )
            .bind(points)
            .bind(new_streak)
            .bind(new_best)
            .bind(today)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

            new_streak
        }
        None => {
            let streak = if force_streak_reset { 0 } else { 1 };
            sqlx::query(
                "INSERT INTO leaderboard (user_id, correct_answers, streak, best_streak, last_activity)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(user_id)
            .bind(points)
            .bind(streak)
            .bind(streak)
            .bind(today)
            .execute(&mut *tx)
            .await?;

            streak
        }
    };

    add_weekly_points(&mut tx, user_id, points).await?;

    tx.commit().await?;
    Ok(new_streak)
}

/// Adds points without touching the streak. Used for streak milestone
/// bonuses, which would otherwise double-advance the streak they reward.
pub async fn add_bonus_points(pool: &SqlitePool, user_id: i64, points: i64) -> Result<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO leaderboard (user_id, correct_answers, streak, best_streak, last_activity)
         VALUES (?, ?, 0, 0, ?)
         ON CONFLICT(user_id) DO UPDATE SET correct_answers = correct_answers + excluded.correct_answers",
    )
    .bind(user_id)
    .bind(points)
    .bind(today_utc())
    .execute(&mut *tx)
    .await?;

    add_weekly_points(&mut tx, user_id, points).await?;

    tx.commit().await?;
    Ok(())
}

async fn add_weekly_points(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: i64,
    points: i64,
) -> Result<()> {
    let (week_start, week_end) = current_week();

    sqlx::query(
        "INSERT INTO weekly_leaderboard (user_id, weekly_score, week_start, week_end)
         VALUES (?, ?, ?, ?)
         ON CONFLICT(user_id, week_start) DO UPDATE SET weekly_score = weekly_score + excluded.weekly_score",
    )
    .bind(user_id)
    .bind(points)
    .bind(week_start)
    .bind(week_end)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Sets the current streak to 0. Score and best streak are untouched.
pub async fn reset_streak(pool: &SqlitePool, user_id: i64) -> Result<()> {
    sqlx::query("UPDATE leaderboard SET streak = 0 WHERE user_id = ?")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn get_leaderboard(pool: &SqlitePool, limit: i64) -> Result<Vec<ScoreRecord>> {
    let rows = sqlx::query_as::<_, ScoreRecord>(
        "SELECT user_id, correct_answers, streak, best_streak, last_activity
         FROM leaderboard ORDER BY correct_answers DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_weekly_leaderboard(pool: &SqlitePool, limit: i64) -> Result<Vec<WeeklyScore>> {
    let (week_start, _) = current_week();

    let rows = sqlx::query_as::<_, WeeklyScore>(
        "SELECT user_id, weekly_score, week_start, week_end
         FROM weekly_leaderboard WHERE week_start = ?
         ORDER BY weekly_score DESC LIMIT ?",
    )
    .bind(week_start)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_streak_leaderboard(pool: &SqlitePool, limit: i64) -> Result<Vec<StreakEntry>> {
    let rows = sqlx::query_as::<_, StreakEntry>(
        "SELECT user_id, streak, best_streak FROM leaderboard
         WHERE streak > 0 ORDER BY streak DESC, best_streak DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// (score, streak, best_streak); all zero for users who never played.
pub async fn get_user_stats(pool: &SqlitePool, user_id: i64) -> Result<(i64, i64, i64)> {
    let row = sqlx::query(
        "SELECT correct_answers, streak, best_streak FROM leaderboard WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok((
            row.get("correct_answers"),
            row.get("streak"),
            row.get("best_streak"),
        )),
        None => Ok((0, 0, 0)),
    }
}

/// 1-based rank, or None for users with no record.
pub async fn get_user_rank(pool: &SqlitePool, user_id: i64) -> Result<Option<i64>> {
    let row = sqlx::query("SELECT correct_answers FROM leaderboard WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let score: i64 = row.get("correct_answers");

    let higher: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM leaderboard WHERE correct_answers > ?")
            .bind(score)
            .fetch_one(pool)
            .await?;

    Ok(Some(higher + 1))
}

/// Point gap to the nearest-above competitor as `(gap, higher_user_id)`.
/// None means first place (or unranked).
pub async fn get_score_gap(pool: &SqlitePool, user_id: i64) -> Result<Option<(i64, i64)>> {
    let row = sqlx::query("SELECT correct_answers FROM leaderboard WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let score: i64 = row.get("correct_answers");

    let higher = sqlx::query(
        "SELECT user_id, correct_answers FROM leaderboard
         WHERE correct_answers > ? ORDER BY correct_answers ASC LIMIT 1",
    )
    .bind(score)
    .fetch_optional(pool)
    .await?;

    match higher {
        Some(row) => {
            let higher_id: i64 = row.get("user_id");
            let higher_score: i64 = row.get("correct_answers");
            Ok(Some((higher_score - score, higher_id)))
        }
        None => Ok(None),
    }
}

/// Destructive sweep of weekly rows from past weeks. Idempotent; current-week
/// reads filter by week key, so this is cleanup rather than correctness.
pub async fn reset_weekly_leaderboard(pool: &SqlitePool) -> Result<u64> {
    let (week_start, _) = current_week();

    let result = sqlx::query("DELETE FROM weekly_leaderboard WHERE week_start < ?")
        .bind(week_start)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testutil::test_pool;
    use chrono::Duration;

    #[tokio::test]
    async fn first_score_creates_row_with_streak_one() {
        let pool = test_pool().await;
        let streak = increment_score(&pool, 1, 1, false).await.unwrap();
        assert_eq!(streak, 1);

        let (score, streak, best) = get_user_stats(&pool, 1).await.unwrap();
        assert_eq!((score, streak, best), (1, 1, 1));
    }

    #[tokio::test]
    async fn best_streak_never_below_streak() {
        let pool = test_pool().await;
        for _ in 0..4 {
            increment_score(&pool, 1, 1, false).await.unwrap();
            let (_, streak, best) = get_user_stats(&pool, 1).await.unwrap();
            assert!(best >= streak);
        }
        reset_streak(&pool, 1).await.unwrap();
        let (_, streak, best) = get_user_stats(&pool, 1).await.unwrap();
        assert_eq!(streak, 0);
        assert_eq!(best, 4);

        increment_score(&pool, 1, 1, true).await.unwrap();
        let (_, streak, best) = get_user_stats(&pool, 1).await.unwrap();
        assert!(best >= streak);
    }

    #[tokio::test]
    async fn reset_streak_leaves_score_and_best_untouched() {
        let pool = test_pool().await;
        increment_score(&pool, 1, 3, false).await.unwrap();
        increment_score(&pool, 1, 2, false).await.unwrap();

        reset_streak(&pool, 1).await.unwrap();

        let (score, streak, best) = get_user_stats(&pool, 1).await.unwrap();
        assert_eq!(score, 5);
        assert_eq!(streak, 0);
        assert_eq!(best, 2);
    }

    #[tokio::test]
    async fn activity_gap_forces_streak_reset() {
        let pool = test_pool().await;
        let stale = today_utc() - Duration::days(3);
        sqlx::query(
            "INSERT INTO leaderboard (user_id, correct_answers, streak, best_streak, last_activity)
             VALUES (1, 10, 4, 4, ?)",
        )
        .bind(stale)
        .execute(&pool)
        .await
        .unwrap();

        let streak = increment_score(&pool, 1, 1, false).await.unwrap();
        assert_eq!(streak, 0);

        let (score, _, best) = get_user_stats(&pool, 1).await.unwrap();
        assert_eq!(score, 11);
        assert_eq!(best, 4);
    }

    #[tokio::test]
    async fn bonus_question_with_milestone_scenario() {
        // User at 10 points / streak 2 answers a double-points question:
        // 12 points and streak 3, then +1 milestone bonus lands at 13.
        let pool = test_pool().await;
        increment_score(&pool, 1, 4, false).await.unwrap();
        increment_score(&pool, 1, 6, false).await.unwrap();

        let streak = increment_score(&pool, 1, 2, false).await.unwrap();
        assert_eq!(streak, 3);
        add_bonus_points(&pool, 1, 1).await.unwrap();

        let (score, streak, best) = get_user_stats(&pool, 1).await.unwrap();
        assert_eq!(score, 13);
        assert_eq!(streak, 3);
        assert_eq!(best, 3);
    }

    #[tokio::test]
    async fn bonus_points_do_not_advance_streak() {
        let pool = test_pool().await;
        increment_score(&pool, 1, 1, false).await.unwrap();
        add_bonus_points(&pool, 1, 2).await.unwrap();

        let (score, streak, _) = get_user_stats(&pool, 1).await.unwrap();
        assert_eq!(score, 3);
        assert_eq!(streak, 1);
    }

    #[tokio::test]
    async fn rank_counts_strictly_greater_scores() {
        let pool = test_pool().await;
        increment_score(&pool, 1, 5, false).await.unwrap();
        increment_score(&pool, 2, 10, false).await.unwrap();
        increment_score(&pool, 3, 5, false).await.unwrap();

        assert_eq!(get_user_rank(&pool, 2).await.unwrap(), Some(1));
        // Tied users share a rank
        assert_eq!(get_user_rank(&pool, 1).await.unwrap(), Some(2));
        assert_eq!(get_user_rank(&pool, 3).await.unwrap(), Some(2));
        assert_eq!(get_user_rank(&pool, 99).await.unwrap(), None);
    }

    #[tokio::test]
    async fn score_gap_for_top_user_is_none() {
        let pool = test_pool().await;
        increment_score(&pool, 1, 10, false).await.unwrap();
        increment_score(&pool, 2, 4, false).await.unwrap();

        assert_eq!(get_score_gap(&pool, 1).await.unwrap(), None);
        assert_eq!(get_score_gap(&pool, 2).await.unwrap(), Some((6, 1)));
    }

    #[tokio::test]
    async fn weekly_scores_accumulate_and_old_weeks_sweep() {
        let pool = test_pool().await;
        increment_score(&pool, 1, 2, false).await.unwrap();
        increment_score(&pool, 1, 3, false).await.unwrap();

        let weekly = get_weekly_leaderboard(&pool, 10).await.unwrap();
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].weekly_score, 5);

        // Plant a stale row from a previous week
        let (week_start, _) = current_week();
        let old_start = week_start - Duration::days(7);
        sqlx::query(
            "INSERT INTO weekly_leaderboard (user_id, weekly_score, week_start, week_end)
             VALUES (2, 9, ?, ?)",
        )
        .bind(old_start)
        .bind(old_start + Duration::days(6))
        .execute(&pool)
        .await
        .unwrap();

        let swept = reset_weekly_leaderboard(&pool).await.unwrap();
        assert_eq!(swept, 1);

        let weekly = get_weekly_leaderboard(&pool, 10).await.unwrap();
        assert_eq!(weekly.len(), 1);
        assert_eq!(weekly[0].user_id, 1);
    }

    #[tokio::test]
    async fn streak_leaderboard_skips_zero_streaks() {
        let pool = test_pool().await;
        increment_score(&pool, 1, 1, false).await.unwrap();
        increment_score(&pool, 2, 1, false).await.unwrap();
        reset_streak(&pool, 2).await.unwrap();

        let entries = get_streak_leaderboard(&pool, 10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, 1);
    }
}
