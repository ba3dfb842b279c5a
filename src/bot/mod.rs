pub mod commands;
pub mod handlers;
pub mod tasks;

use crate::config::Config;
use crate::database;
use crate::utils::questions::QuestionPool;
use anyhow::Result;
use handlers::quiz::QuizSession;
use poise::serenity_prelude as serenity;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

#[derive(Clone)]
pub struct Data {
    pub pool: SqlitePool,
    pub config: Config,
    /// Shuffled question pool; the mutex is never held across an await.
    pub questions: Arc<Mutex<QuestionPool>>,
    /// Open quiz rounds keyed by channel id. All check-and-close sequences
    /// run inside this lock, so a round has exactly one winner.
    pub quiz_sessions: Arc<Mutex<HashMap<u64, QuizSession>>>,
    /// Cache of guild -> counting channel, loaded at startup.
    pub counting_channels: Arc<RwLock<HashMap<u64, u64>>>,
    /// Per-guild locks serializing counting turn evaluation.
    pub counting_locks: Arc<tokio::sync::Mutex<HashMap<u64, Arc<tokio::sync::Mutex<()>>>>>,
}

pub async fn create_bot(config: Config) -> Result<serenity::Client> {
    let pool = database::create_connection(&config.database_url).await?;

    let questions = QuestionPool::load(&config.questions_path)?;
    tracing::info!("Loaded {} quiz questions", questions.len());

    let channels = database::counting::load_channels(&pool).await?;
    tracing::info!("Loaded {} counting channels", channels.len());
    let counting_channels: HashMap<u64, u64> = channels
        .into_iter()
        .map(|(guild, channel)| (guild as u64, channel as u64))
        .collect();

    if config.quiz_channel_id.is_none() {
        tracing::warn!("QUIZ_CHANNEL_ID not set; quiz broadcasts are disabled");
    }

    let data = Data {
        pool,
        config: config.clone(),
        questions: Arc::new(Mutex::new(questions)),
        quiz_sessions: Arc::new(Mutex::new(HashMap::new())),
        counting_channels: Arc::new(RwLock::new(counting_channels)),
        counting_locks: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
    };

    // Both engines read message text; reactions drive the rescue flow.
    let intents = serenity::GatewayIntents::non_privileged()
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                commands::counting::setcountingchannel(),
                commands::counting::countleaderboard(),
                commands::counting::ruinedleaderboard(),
                commands::counting::countstats(),
                commands::leaderboard::codeleaderboard(),
                commands::leaderboard::codeweek(),
                commands::leaderboard::codestreak(),
                commands::leaderboard::codestats(),
                commands::quests::dailyquest(),
                commands::quests::inventory(),
                commands::quests::bonushint(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(handlers::event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            Box::pin(async move {
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;
                tasks::spawn_background_tasks(ctx.clone(), data.clone());
                Ok(data)
            })
        })
        .build();

    let client = serenity::ClientBuilder::new(&config.discord_token, intents)
        .framework(framework)
        .await?;

    Ok(client)
}
