use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub database_url: String,
    pub quiz_channel_id: Option<u64>,
    pub quiz_interval_minutes: u64,
    pub questions_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let discord_token = env::var("DISCORD_TOKEN")
            .map_err(|_| anyhow::anyhow!("DISCORD_TOKEN environment variable is required"))?;

        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:botdata.db".to_string());

        let quiz_channel_id = match env::var("QUIZ_CHANNEL_ID") {
            Ok(raw) => Some(raw.parse::<u64>().map_err(|_| {
                anyhow::anyhow!("QUIZ_CHANNEL_ID must be a numeric channel id, got '{}'", raw)
            })?),
            Err(_) => None,
        };

        let quiz_interval_minutes = match env::var("QUIZ_INTERVAL_MINUTES") {
            Ok(raw) => raw.parse::<u64>().map_err(|_| {
                anyhow::anyhow!("QUIZ_INTERVAL_MINUTES must be a number, got '{}'", raw)
            })?,
            Err(_) => 10,
        };

        let questions_path =
            env::var("QUESTIONS_PATH").unwrap_or_else(|_| "data/questions.json".to_string());

        Ok(Config {
            discord_token,
            database_url,
            quiz_channel_id,
            quiz_interval_minutes,
            questions_path,
        })
    }
}
