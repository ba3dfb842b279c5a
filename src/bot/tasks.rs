//! Background tasks: the periodic question broadcast and the weekly
//! leaderboard sweep.

use crate::bot::Data;
use crate::bot::handlers::quiz;
use crate::database::{counting, scores};
use poise::serenity_prelude as serenity;
use std::time::Duration;

/// Stale weekly rows are cleanup, not correctness (current-week reads filter
/// by week key), so an hourly cadence is plenty.
const WEEKLY_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

pub fn spawn_background_tasks(ctx: serenity::Context, data: Data) {
    if data.config.quiz_channel_id.is_some() {
        tokio::spawn(run_question_loop(ctx, data.clone()));
    }
    tokio::spawn(run_weekly_sweep(data));
}

/// Posts a question every `quiz_interval_minutes`. The cadence is fixed
/// wall-clock: answering early does not move the next broadcast.
async fn run_question_loop(ctx: serenity::Context, data: Data) {
    let period = Duration::from_secs(data.config.quiz_interval_minutes * 60);
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        if let Err(e) = quiz::post_question(&ctx, &data).await {
            tracing::error!("Failed to post quiz question: {:?}", e);
        }
    }
}

async fn run_weekly_sweep(data: Data) {
    let mut interval = tokio::time::interval(WEEKLY_SWEEP_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        interval.tick().await;
        match scores::reset_weekly_leaderboard(&data.pool).await {
            Ok(0) => {}
            Ok(swept) => tracing::info!("Swept {} stale weekly leaderboard rows", swept),
            Err(e) => tracing::error!("Weekly leaderboard sweep failed: {:?}", e),
        }

        let dropped = counting::dropped_writes();
        if dropped > 0 {
            tracing::warn!("{} counting writes dropped to lock contention so far", dropped);
        }
    }
}
