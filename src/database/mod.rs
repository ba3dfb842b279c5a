pub mod counting;
pub mod migrations;
pub mod models;
pub mod quests;
pub mod scores;

use anyhow::Result;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqliteJournalMode},
};
use std::str::FromStr;

pub async fn create_connection(database_url: &str) -> Result<SqlitePool> {
    // WAL keeps concurrent guild channels from serializing on the writer.
    let connect_options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal);

    let pool = SqlitePool::connect_with(connect_options).await?;

    migrations::run_migrations(&pool).await?;

    Ok(pool)
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    /// In-memory pool pinned to one connection so every query sees the same
    /// database.
    pub async fn test_pool() -> SqlitePool {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        migrations::run_migrations(&pool).await.unwrap();
        pool
    }
}
