//! Quiz engine.
//!
//! A background task broadcasts a question on a fixed interval (`tasks.rs`);
//! this module owns the per-channel session state and the answer
//! arbitration. A round has exactly one winner: the winning check-and-close
//! runs inside the session-map lock.

use crate::bot::Data;
use crate::database::models::QuestKind;
use crate::database::{quests, scores};
use crate::utils::format::{
    create_correct_answer_embed, create_freeze_embed, create_quest_complete_embed,
    create_question_embed, mention,
};
use crate::utils::questions::ANSWER_LETTERS;
use anyhow::Result;
use poise::serenity_prelude as serenity;
use rand::Rng;
use std::collections::HashSet;

/// Chance that a round is worth double points.
const BONUS_ROUND_CHANCE: f64 = 0.1;

/// One open question in one channel. Ephemeral by design; a restart simply
/// loses the open round.
pub struct QuizSession {
    pub answer: String,
    pub message_id: serenity::MessageId,
    pub bonus: bool,
    /// Users who already answered wrong this round; they get no second try
    /// and no repeated penalty.
    pub ignored_users: HashSet<u64>,
}

/// Extra points awarded the moment a streak reaches a milestone. Based on
/// the streak value returned by the score increment, so each crossing fires
/// once.
pub fn milestone_bonus(streak: i64) -> i64 {
    match streak {
        3 => 1,
        5 => 2,
        _ => 0,
    }
}

/// Posts a new question, force-closing any unresolved round first.
pub async fn post_question(ctx: &serenity::Context, data: &Data) -> Result<()> {
    let Some(channel_id) = data.config.quiz_channel_id else {
        return Ok(());
    };
    let channel = serenity::ChannelId::new(channel_id);

    let stale = {
        let mut sessions = data.quiz_sessions.lock().expect("quiz session map poisoned");
        sessions.remove(&channel_id)
    };
    if let Some(session) = stale {
        // Unanswered round: delete the message without scoring it.
        if let Err(e) = channel.delete_message(&ctx.http, session.message_id).await {
            tracing::warn!("Failed to delete stale question message: {:?}", e);
        }
    }

    let question = {
        let mut pool = data.questions.lock().expect("question pool poisoned");
        pool.next_question()
    };
    let bonus = rand::rng().random_bool(BONUS_ROUND_CHANCE);

    let message = channel
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(create_question_embed(&question, bonus)))
        .await?;

    let mut sessions = data.quiz_sessions.lock().expect("quiz session map poisoned");
    sessions.insert(
        channel_id,
        QuizSession {
            answer: question.correct,
            message_id: message.id,
            bonus,
            ignored_users: HashSet::new(),
        },
    );

    Ok(())
}

enum AnswerVerdict {
    Correct { bonus: bool, message_id: serenity::MessageId },
    Wrong,
    NotInPlay,
}

pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<()> {
    if msg.author.bot {
        return Ok(());
    }
    if data.config.quiz_channel_id != Some(msg.channel_id.get()) {
        return Ok(());
    }

    let content = msg.content.trim().to_lowercase();
    if !ANSWER_LETTERS.contains(&content.as_str()) {
        return Ok(());
    }

    let user_id = msg.author.id.get();

    // Critical section: decide the round under the lock so bursts of
    // simultaneous correct answers produce a single winner.
    let verdict = {
        let mut sessions = data.quiz_sessions.lock().expect("quiz session map poisoned");
        let channel_key = msg.channel_id.get();
        let won = match sessions.get_mut(&channel_key) {
            None => None,
            Some(session) if session.ignored_users.contains(&user_id) => None,
            Some(session) if content == session.answer => Some(true),
            Some(session) => {
                session.ignored_users.insert(user_id);
                Some(false)
            }
        };
        match won {
            Some(true) => {
                let session = sessions.remove(&channel_key).expect("winning session vanished");
                AnswerVerdict::Correct { bonus: session.bonus, message_id: session.message_id }
            }
            Some(false) => AnswerVerdict::Wrong,
            None => AnswerVerdict::NotInPlay,
        }
    };

    match verdict {
        AnswerVerdict::NotInPlay => Ok(()),
        AnswerVerdict::Correct { bonus, message_id } => {
            handle_correct_answer(ctx, msg, data, bonus, message_id).await
        }
        AnswerVerdict::Wrong => handle_wrong_answer(ctx, msg, data).await,
    }
}

async fn handle_correct_answer(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
    bonus: bool,
    question_message_id: serenity::MessageId,
) -> Result<()> {
    let user_id = msg.author.id.get() as i64;
    let points: i64 = if bonus { 2 } else { 1 };

    let streak = scores::increment_score(&data.pool, user_id, points, false).await?;

    let extra = milestone_bonus(streak);
    if extra > 0 {
        scores::add_bonus_points(&data.pool, user_id, extra).await?;
    }

    match quests::advance_quest(&data.pool, user_id, QuestKind::QuizAnswer).await {
        Ok(true) => {
            let embed = create_quest_complete_embed(user_id);
            if let Err(e) = msg
                .channel_id
                .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
                .await
            {
                tracing::warn!("Failed to send quest completion message: {:?}", e);
            }
        }
        Ok(false) => {}
        Err(e) => tracing::error!("Failed to advance quest progress: {:?}", e),
    }

    // Single-winner round: the question comes down as soon as it is won.
    if let Err(e) = msg.channel_id.delete_message(&ctx.http, question_message_id).await {
        tracing::warn!("Failed to delete answered question: {:?}", e);
    }

    let embed = create_correct_answer_embed(user_id, streak, points + extra, extra, bonus);
    if let Err(e) = msg
        .channel_id
        .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
        .await
    {
        tracing::warn!("Failed to send answer result: {:?}", e);
    }

    Ok(())
}

async fn handle_wrong_answer(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<()> {
    let user_id = msg.author.id.get() as i64;

    if let Err(e) = msg.react(&ctx.http, '❌').await {
        tracing::warn!("Failed to react to wrong answer: {:?}", e);
    }

    if quests::consume_streak_freeze(&data.pool, user_id).await? {
        let embed = create_freeze_embed(user_id);
        if let Err(e) = msg
            .channel_id
            .send_message(&ctx.http, serenity::CreateMessage::new().embed(embed))
            .await
        {
            tracing::warn!("Failed to send freeze message: {:?}", e);
        }
    } else {
        scores::reset_streak(&data.pool, user_id).await?;
        if let Err(e) = msg
            .channel_id
            .say(&ctx.http, format!("{} Wrong answer! Streak reset to 0.", mention(user_id)))
            .await
        {
            tracing::warn!("Failed to send wrong answer message: {:?}", e);
        }
    }

    Ok(())
}
