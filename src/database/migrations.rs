use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_leaderboard_table(pool).await?;
    create_weekly_leaderboard_table(pool).await?;
    create_daily_quests_table(pool).await?;
    create_counting_config_table(pool).await?;
    create_counting_stats_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_leaderboard_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS leaderboard (
            user_id INTEGER PRIMARY KEY,
            correct_answers INTEGER NOT NULL DEFAULT 0,
            streak INTEGER NOT NULL DEFAULT 0,
            best_streak INTEGER NOT NULL DEFAULT 0,
            last_activity DATE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_weekly_leaderboard_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS weekly_leaderboard (
            user_id INTEGER NOT NULL,
            weekly_score INTEGER NOT NULL DEFAULT 0,
            week_start DATE NOT NULL,
            week_end DATE NOT NULL,
            PRIMARY KEY (user_id, week_start)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_daily_quests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS daily_quests (
            user_id INTEGER PRIMARY KEY,
            quest_date DATE NOT NULL,
            quizzes_completed INTEGER NOT NULL DEFAULT 0,
            voted_today BOOLEAN NOT NULL DEFAULT FALSE,
            quest_completed BOOLEAN NOT NULL DEFAULT FALSE,
            streak_freezes INTEGER NOT NULL DEFAULT 0,
            bonus_hints INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_counting_config_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS counting_config (
            guild_id INTEGER PRIMARY KEY,
            channel_id INTEGER NOT NULL,
            current_count INTEGER NOT NULL DEFAULT 0,
            last_user_id INTEGER,
            high_score INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_counting_stats_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS counting_stats (
            user_id INTEGER NOT NULL,
            guild_id INTEGER NOT NULL,
            total_counts INTEGER NOT NULL DEFAULT 0,
            ruined_counts INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (user_id, guild_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
