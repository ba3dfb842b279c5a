//! Counting game engine.
//!
//! Validates sequential numeric input from alternating users in each guild's
//! configured counting channel. A failed turn opens a 60 second rescue
//! window where the community can roll a dice to save the count, reset it,
//! or take a penalty.

use crate::bot::Data;
use crate::database::counting;
use crate::database::models::CountingConfig;
use crate::utils::expr;
use crate::utils::format::mention;
use anyhow::Result;
use poise::serenity_prelude as serenity;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

const RESCUE_WINDOW: Duration = Duration::from_secs(60);
const RESCUE_REACTIONS_NEEDED: usize = 2;
const RESCUE_EMOJI: char = '🎲';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    WrongNumber,
    SameAuthor,
}

impl RejectReason {
    fn text(self) -> &'static str {
        match self {
            RejectReason::WrongNumber => "Wrong number!",
            RejectReason::SameAuthor => "You can't count twice in a row!",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    Accept { next_count: i64, new_high_score: i64 },
    Reject(RejectReason),
}

/// Judges one turn attempt against the guild's current state.
pub fn evaluate_turn(value: i64, config: &CountingConfig, author_id: i64) -> Turn {
    let next_count = config.current_count + 1;

    if value != next_count {
        return Turn::Reject(RejectReason::WrongNumber);
    }
    if config.last_user_id == Some(author_id) {
        return Turn::Reject(RejectReason::SameAuthor);
    }

    Turn::Accept {
        next_count,
        new_high_score: config.high_score.max(next_count),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescueOutcome {
    Saved,
    Reset,
    Penalty(i64),
}

pub fn roll_outcome(roll: u8) -> RescueOutcome {
    match roll {
        2 | 4 | 6 => RescueOutcome::Saved,
        3 => RescueOutcome::Reset,
        1 => RescueOutcome::Penalty(10),
        _ => RescueOutcome::Penalty(5),
    }
}

/// Count to persist after a rescue. `None` means the count is unchanged.
pub fn resolved_count(outcome: RescueOutcome, current_count: i64) -> Option<i64> {
    match outcome {
        RescueOutcome::Saved => None,
        RescueOutcome::Reset => Some(0),
        RescueOutcome::Penalty(points) => Some((current_count - points).max(0)),
    }
}

pub async fn handle_message(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
) -> Result<()> {
    if msg.author.bot {
        return Ok(());
    }
    let Some(guild_id) = msg.guild_id else {
        return Ok(());
    };

    // Cache check before touching the database.
    let configured = {
        let channels = data.counting_channels.read().expect("counting channel cache poisoned");
        channels.get(&guild_id.get()).copied()
    };
    if configured != Some(msg.channel_id.get()) {
        return Ok(());
    }

    // Turn validity depends on the previous turn, so evaluation within one
    // guild is strictly sequential. The lock is held through the rescue
    // window: no turn is judged against a count that is still under rescue.
    let guild_lock = {
        let mut locks = data.counting_locks.lock().await;
        locks
            .entry(guild_id.get())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    };
    let _guard = guild_lock.lock().await;

    let Some(config) = counting::get_config(&data.pool, guild_id.get() as i64).await? else {
        // Cache said yes but the row is gone (manually cleared table).
        return Ok(());
    };

    let Some(value) = expr::eval_integer(&msg.content) else {
        // Not a turn attempt at all.
        return Ok(());
    };

    let author_id = msg.author.id.get() as i64;

    match evaluate_turn(value, &config, author_id) {
        Turn::Accept { next_count, new_high_score } => {
            if let Err(e) = msg.react(&ctx.http, '✅').await {
                tracing::warn!("Failed to react to accepted count: {:?}", e);
            }
            counting::accept_turn(
                &data.pool,
                guild_id.get() as i64,
                author_id,
                next_count,
                new_high_score,
            )
            .await?;
        }
        Turn::Reject(reason) => {
            run_rescue(ctx, msg, data, &config, reason).await?;
        }
    }

    Ok(())
}

/// The failure dialog: prompt, reaction window, dice roll, persistence,
/// prompt edit. Every failure costs the failing user one `ruined_counts`
/// regardless of how the dice land.
async fn run_rescue(
    ctx: &serenity::Context,
    msg: &serenity::Message,
    data: &Data,
    config: &CountingConfig,
    reason: RejectReason,
) -> Result<()> {
    let current_count = config.current_count;
    let author_id = msg.author.id.get() as i64;

    if let Err(e) = msg.react(&ctx.http, '❌').await {
        tracing::warn!("Failed to react to rejected count: {:?}", e);
    }

    let header = format!(
        "{} {} messed up at {}!",
        reason.text(),
        mention(author_id),
        current_count
    );
    let prompt = format!(
        "{}\n🎲 **Rolling the Dice of Fate...**\nReact with 🎲 to help roll! (Need {} reactions in {}s)",
        header,
        RESCUE_REACTIONS_NEEDED,
        RESCUE_WINDOW.as_secs()
    );
    let mut status_msg = msg.channel_id.say(&ctx.http, prompt).await?;

    if let Err(e) = status_msg.react(&ctx.http, RESCUE_EMOJI).await {
        tracing::warn!("Failed to seed rescue reaction: {:?}", e);
    }

    let helpers = collect_helpers(ctx, &status_msg).await;

    let (outcome_text, new_count) = if helpers >= RESCUE_REACTIONS_NEEDED {
        let roll: u8 = rand::rng().random_range(1..=6);
        let outcome = roll_outcome(roll);
        let text = match outcome {
            RescueOutcome::Saved => {
                format!("🎲 **Dice Roll: {}**\n✨ **Saved!** The count continues!", roll)
            }
            RescueOutcome::Reset => {
                format!("🎲 **Dice Roll: {}**\n💥 **Reset!** The count goes back to 0.", roll)
            }
            RescueOutcome::Penalty(points) => format!(
                "🎲 **Dice Roll: {}**\n🔻 **-{} Penalty!** The count drops by {}.",
                roll, points, points
            ),
        };
        (text, resolved_count(outcome, current_count))
    } else {
        (
            "⏳ **Time's up!** Not enough people helped roll the dice.\n💥 **Reset!** The count goes back to 0."
                .to_string(),
            Some(0),
        )
    };

    counting::apply_rescue(&data.pool, config.guild_id, author_id, new_count).await?;

    let final_count = new_count.unwrap_or(current_count);
    let final_text = format!(
        "{}\n{}\nNext number is **{}**.",
        header,
        outcome_text,
        final_count + 1
    );
    if let Err(e) = status_msg
        .edit(&ctx.http, serenity::EditMessage::new().content(final_text))
        .await
    {
        tracing::warn!("Failed to edit rescue outcome: {:?}", e);
    }

    Ok(())
}

/// Waits for distinct non-bot dice reactions on the rescue prompt, bounded
/// by the rescue window. Returns how many helpers reacted.
async fn collect_helpers(ctx: &serenity::Context, status_msg: &serenity::Message) -> usize {
    let deadline = Instant::now() + RESCUE_WINDOW;
    let bot_id = ctx.cache.current_user().id;
    let mut helpers: HashSet<u64> = HashSet::new();

    while helpers.len() < RESCUE_REACTIONS_NEEDED {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }

        let reaction = status_msg
            .await_reaction(&ctx.shard)
            .timeout(remaining)
            .filter(|reaction| reaction.emoji.unicode_eq("🎲"))
            .await;

        match reaction {
            Some(reaction) => {
                if let Some(user_id) = reaction.user_id {
                    if user_id != bot_id {
                        helpers.insert(user_id.get());
                    }
                }
            }
            None => break,
        }
    }

    helpers.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(current_count: i64, last_user_id: Option<i64>, high_score: i64) -> CountingConfig {
        CountingConfig {
            guild_id: 1,
            channel_id: 100,
            current_count,
            last_user_id,
            high_score,
        }
    }

    #[test]
    fn next_number_from_new_author_is_accepted() {
        // Scenario: count at 41, U1 counted last, U2 sends 42
        let turn = evaluate_turn(42, &config(41, Some(1), 41), 2);
        assert_eq!(turn, Turn::Accept { next_count: 42, new_high_score: 42 });
    }

    #[test]
    fn same_author_twice_is_rejected_even_when_correct() {
        let turn = evaluate_turn(43, &config(42, Some(2), 42), 2);
        assert_eq!(turn, Turn::Reject(RejectReason::SameAuthor));
    }

    #[test]
    fn wrong_number_is_rejected() {
        let turn = evaluate_turn(44, &config(42, Some(1), 42), 2);
        assert_eq!(turn, Turn::Reject(RejectReason::WrongNumber));
        let turn = evaluate_turn(42, &config(42, Some(1), 42), 2);
        assert_eq!(turn, Turn::Reject(RejectReason::WrongNumber));
    }

    #[test]
    fn first_count_after_reset_has_no_author_restriction() {
        let turn = evaluate_turn(1, &config(0, None, 10), 2);
        assert_eq!(turn, Turn::Accept { next_count: 1, new_high_score: 10 });
    }

    #[test]
    fn accepted_turns_increase_count_by_exactly_one() {
        let mut cfg = config(0, None, 0);
        for user in [1i64, 2, 1, 2, 1] {
            let before = cfg.current_count;
            match evaluate_turn(before + 1, &cfg, user) {
                Turn::Accept { next_count, new_high_score } => {
                    assert_eq!(next_count, before + 1);
                    cfg.current_count = next_count;
                    cfg.last_user_id = Some(user);
                    cfg.high_score = new_high_score;
                }
                Turn::Reject(_) => panic!("alternating correct turns must be accepted"),
            }
        }
        assert_eq!(cfg.current_count, 5);
        assert_eq!(cfg.high_score, 5);
    }

    #[test]
    fn even_rolls_save_the_count() {
        for roll in [2, 4, 6] {
            assert_eq!(roll_outcome(roll), RescueOutcome::Saved);
            assert_eq!(resolved_count(roll_outcome(roll), 42), None);
        }
    }

    #[test]
    fn roll_three_resets_to_zero() {
        assert_eq!(roll_outcome(3), RescueOutcome::Reset);
        assert_eq!(resolved_count(RescueOutcome::Reset, 42), Some(0));
    }

    #[test]
    fn penalty_rolls_subtract_with_floor_at_zero() {
        assert_eq!(roll_outcome(1), RescueOutcome::Penalty(10));
        assert_eq!(roll_outcome(5), RescueOutcome::Penalty(5));
        assert_eq!(resolved_count(RescueOutcome::Penalty(10), 42), Some(32));
        assert_eq!(resolved_count(RescueOutcome::Penalty(10), 7), Some(0));
        assert_eq!(resolved_count(RescueOutcome::Penalty(5), 3), Some(0));
    }
}
