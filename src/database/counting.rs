//! Counting game persistence.
//!
//! Writes here contend with other guilds sharing the same SQLite file, so
//! every mutation retries on lock contention with linear backoff and is then
//! dropped with a log line. Callers must not assume a turn was recorded when
//! the retry budget is exhausted.

use crate::database::models::{CountingConfig, CountingStats};
use anyhow::Result;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const LOCK_RETRIES: u32 = 3;
const RETRY_BACKOFF: Duration = Duration::from_millis(100);

/// Writes abandoned after exhausting the retry budget. Observability only.
static DROPPED_WRITES: AtomicU64 = AtomicU64::new(0);

pub fn dropped_writes() -> u64 {
    DROPPED_WRITES.load(Ordering::Relaxed)
}

fn is_lock_contention(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.message().contains("locked") || db.code().as_deref() == Some("5")
        }
        _ => false,
    }
}

pub async fn load_channels(pool: &SqlitePool) -> Result<Vec<(i64, i64)>> {
    let rows = sqlx::query_as::<_, (i64, i64)>("SELECT guild_id, channel_id FROM counting_config")
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

pub async fn set_channel(pool: &SqlitePool, guild_id: i64, channel_id: i64) -> Result<()> {
    sqlx::query(
        "INSERT INTO counting_config (guild_id, channel_id)
         VALUES (?, ?)
         ON CONFLICT(guild_id) DO UPDATE SET channel_id = excluded.channel_id",
    )
    .bind(guild_id)
    .bind(channel_id)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_config(pool: &SqlitePool, guild_id: i64) -> Result<Option<CountingConfig>> {
    let config = sqlx::query_as::<_, CountingConfig>(
        "SELECT guild_id, channel_id, current_count, last_user_id, high_score
         FROM counting_config WHERE guild_id = ?",
    )
    .bind(guild_id)
    .fetch_optional(pool)
    .await?;

    Ok(config)
}

/// Records an accepted turn: count, last author, high score and the author's
/// `total_counts`, all in one transaction. Returns false when the write was
/// dropped after lock-contention retries.
pub async fn accept_turn(
    pool: &SqlitePool,
    guild_id: i64,
    user_id: i64,
    next_count: i64,
    new_high_score: i64,
) -> Result<bool> {
    let mut attempt = 0;
    loop {
        match try_accept_turn(pool, guild_id, user_id, next_count, new_high_score).await {
            Ok(()) => return Ok(true),
            Err(e) if is_lock_contention(&e) => {
                attempt += 1;
                if attempt >= LOCK_RETRIES {
                    DROPPED_WRITES.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        guild_id,
                        user_id,
                        next_count,
                        "dropping counting turn after repeated lock contention"
                    );
                    return Ok(false);
                }
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn try_accept_turn(
    pool: &SqlitePool,
    guild_id: i64,
    user_id: i64,
    next_count: i64,
    new_high_score: i64,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE counting_config
         SET current_count = ?, last_user_id = ?, high_score = ?
         WHERE guild_id = ?",
    )
    .bind(next_count)
    .bind(user_id)
    .bind(new_high_score)
    .bind(guild_id)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO counting_stats (user_id, guild_id, total_counts, ruined_counts)
         VALUES (?, ?, 1, 0)
         ON CONFLICT(user_id, guild_id) DO UPDATE SET total_counts = total_counts + 1",
    )
    .bind(user_id)
    .bind(guild_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

/// Records a resolved rescue. `new_count = None` means the dice saved the
/// count and only the failer's `ruined_counts` moves; otherwise the count is
/// updated and `last_user_id` cleared, since no one holds the latest turn
/// after a reset or penalty. Returns false when the write was dropped.
pub async fn apply_rescue(
    pool: &SqlitePool,
    guild_id: i64,
    user_id: i64,
    new_count: Option<i64>,
) -> Result<bool> {
    let mut attempt = 0;
    loop {
        match try_apply_rescue(pool, guild_id, user_id, new_count).await {
            Ok(()) => return Ok(true),
            Err(e) if is_lock_contention(&e) => {
                attempt += 1;
                if attempt >= LOCK_RETRIES {
                    DROPPED_WRITES.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(
                        guild_id,
                        user_id,
                        "dropping rescue outcome after repeated lock contention"
                    );
                    return Ok(false);
                }
                tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

async fn try_apply_rescue(
    pool: &SqlitePool,
    guild_id: i64,
    user_id: i64,
    new_count: Option<i64>,
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    if let Some(count) = new_count {
        sqlx::query(
            "UPDATE counting_config
             SET current_count = ?, last_user_id = NULL
             WHERE guild_id = ?",
        )
        .bind(count)
        .bind(guild_id)
        .execute(&mut *tx)
        .await?;
    }

    sqlx::query(
        "INSERT INTO counting_stats (user_id, guild_id, total_counts, ruined_counts)
         VALUES (?, ?, 0, 1)
         ON CONFLICT(user_id, guild_id) DO UPDATE SET ruined_counts = ruined_counts + 1",
    )
    .bind(user_id)
    .bind(guild_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await
}

pub async fn top_counters(
    pool: &SqlitePool,
    guild_id: i64,
    limit: i64,
) -> Result<Vec<CountingStats>> {
    let rows = sqlx::query_as::<_, CountingStats>(
        "SELECT user_id, guild_id, total_counts, ruined_counts
         FROM counting_stats WHERE guild_id = ?
         ORDER BY total_counts DESC LIMIT ?",
    )
    .bind(guild_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn top_ruiners(
    pool: &SqlitePool,
    guild_id: i64,
    limit: i64,
) -> Result<Vec<CountingStats>> {
    let rows = sqlx::query_as::<_, CountingStats>(
        "SELECT user_id, guild_id, total_counts, ruined_counts
         FROM counting_stats WHERE guild_id = ?
         ORDER BY ruined_counts DESC LIMIT ?",
    )
    .bind(guild_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::testutil::test_pool;

    #[tokio::test]
    async fn set_channel_upserts_without_clobbering_count() {
        let pool = test_pool().await;
        set_channel(&pool, 1, 100).await.unwrap();
        accept_turn(&pool, 1, 7, 1, 1).await.unwrap();

        set_channel(&pool, 1, 200).await.unwrap();

        let config = get_config(&pool, 1).await.unwrap().unwrap();
        assert_eq!(config.channel_id, 200);
        assert_eq!(config.current_count, 1);
    }

    #[tokio::test]
    async fn accept_turn_updates_config_and_stats() {
        let pool = test_pool().await;
        set_channel(&pool, 1, 100).await.unwrap();

        assert!(accept_turn(&pool, 1, 7, 1, 1).await.unwrap());
        assert!(accept_turn(&pool, 1, 8, 2, 2).await.unwrap());
        assert!(accept_turn(&pool, 1, 7, 3, 3).await.unwrap());

        let config = get_config(&pool, 1).await.unwrap().unwrap();
        assert_eq!(config.current_count, 3);
        assert_eq!(config.last_user_id, Some(7));
        assert_eq!(config.high_score, 3);

        let top = top_counters(&pool, 1, 10).await.unwrap();
        assert_eq!(top[0].user_id, 7);
        assert_eq!(top[0].total_counts, 2);
    }

    #[tokio::test]
    async fn rescue_reset_clears_last_user_and_bumps_ruined() {
        let pool = test_pool().await;
        set_channel(&pool, 1, 100).await.unwrap();
        accept_turn(&pool, 1, 7, 1, 1).await.unwrap();

        assert!(apply_rescue(&pool, 1, 7, Some(0)).await.unwrap());

        let config = get_config(&pool, 1).await.unwrap().unwrap();
        assert_eq!(config.current_count, 0);
        assert_eq!(config.last_user_id, None);
        assert_eq!(config.high_score, 1);

        let ruiners = top_ruiners(&pool, 1, 10).await.unwrap();
        assert_eq!(ruiners[0].user_id, 7);
        assert_eq!(ruiners[0].ruined_counts, 1);
    }

    #[tokio::test]
    async fn saved_rescue_touches_only_ruined_counts() {
        let pool = test_pool().await;
        set_channel(&pool, 1, 100).await.unwrap();
        accept_turn(&pool, 1, 7, 42, 42).await.unwrap();

        assert!(apply_rescue(&pool, 1, 9, None).await.unwrap());

        let config = get_config(&pool, 1).await.unwrap().unwrap();
        assert_eq!(config.current_count, 42);
        assert_eq!(config.last_user_id, Some(7));

        let ruiners = top_ruiners(&pool, 1, 10).await.unwrap();
        assert_eq!(ruiners[0].user_id, 9);
        assert_eq!(ruiners[0].ruined_counts, 1);
    }

    #[tokio::test]
    async fn stats_are_scoped_per_guild() {
        let pool = test_pool().await;
        set_channel(&pool, 1, 100).await.unwrap();
        set_channel(&pool, 2, 200).await.unwrap();
        accept_turn(&pool, 1, 7, 1, 1).await.unwrap();
        accept_turn(&pool, 2, 7, 1, 1).await.unwrap();
        accept_turn(&pool, 2, 7, 2, 2).await.unwrap();

        let g1 = top_counters(&pool, 1, 10).await.unwrap();
        let g2 = top_counters(&pool, 2, 10).await.unwrap();
        assert_eq!(g1[0].total_counts, 1);
        assert_eq!(g2[0].total_counts, 2);
    }
}
