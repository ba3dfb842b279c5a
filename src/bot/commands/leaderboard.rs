use crate::bot::{Context, Error};
use crate::database::scores;
use crate::utils::format::{create_error_embed, medal, mention};
use crate::utils::time::{current_week, format_week_range};
use poise::serenity_prelude as serenity;

/// Show the top players with the most correct answers
#[poise::command(slash_command)]
pub async fn codeleaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let pool = &ctx.data().pool;

    match scores::get_leaderboard(pool, 10).await {
        Ok(rows) if rows.is_empty() => {
            let embed = serenity::CreateEmbed::new()
                .title("🏆 Code Leaderboard")
                .description("No leaderboard data yet.")
                .color(serenity::Color::GOLD);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Ok(rows) => {
            let description = rows
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    format!(
                        "{} {} - {} pts 🔥 Streak: {} (Best: {})",
                        medal(i + 1),
                        mention(r.user_id),
                        r.correct_answers,
                        r.streak,
                        r.best_streak
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");

            let embed = serenity::CreateEmbed::new()
                .title("🏆 Code Leaderboard")
                .description(description)
                .color(serenity::Color::GOLD);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            let embed = create_error_embed("Error", &format!("Failed to load leaderboard: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

/// Show the weekly coding leaderboard
#[poise::command(slash_command)]
pub async fn codeweek(ctx: Context<'_>) -> Result<(), Error> {
    let pool = &ctx.data().pool;
    let (week_start, week_end) = current_week();

    match scores::get_weekly_leaderboard(pool, 10).await {
        Ok(rows) if rows.is_empty() => {
            let embed = serenity::CreateEmbed::new()
                .title("Weekly Coding Leaderboard")
                .description(
                    "No one has scored points this week yet!\nBe the first to solve some coding questions!",
                )
                .footer(serenity::CreateEmbedFooter::new(format!(
                    "Week: {}",
                    format_week_range(week_start, week_end)
                )))
                .color(serenity::Color::DARK_GREEN);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Ok(rows) => {
            let rankings = rows
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    format!("{} {} - {} points", medal(i + 1), mention(r.user_id), r.weekly_score)
                })
                .collect::<Vec<_>>()
                .join("\n");

            let embed = serenity::CreateEmbed::new()
                .title("Weekly Coding Leaderboard")
                .description(format!(
                    "Top coders for the week of {}",
                    format_week_range(week_start, week_end)
                ))
                .field("🏆 Rankings", rankings, false)
                .footer(serenity::CreateEmbedFooter::new(
                    "💡 Solve coding questions to climb the weekly leaderboard! Resets every Monday.",
                ))
                .color(serenity::Color::DARK_GREEN);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            let embed =
                create_error_embed("Error", &format!("Failed to load weekly leaderboard: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

/// Show the players with the longest active streaks
#[poise::command(slash_command)]
pub async fn codestreak(ctx: Context<'_>) -> Result<(), Error> {
    let pool = &ctx.data().pool;

    match scores::get_streak_leaderboard(pool, 10).await {
        Ok(rows) if rows.is_empty() => {
            ctx.say("No active streaks right now.").await?;
        }
        Ok(rows) => {
            let description = rows
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    format!(
                        "{} {} - 🔥 {} (Best: {})",
                        medal(i + 1),
                        mention(r.user_id),
                        r.streak,
                        r.best_streak
                    )
                })
                .collect::<Vec<_>>()
                .join("\n");

            let embed = serenity::CreateEmbed::new()
                .title("🔥 Streak Leaderboard")
                .description(description)
                .color(serenity::Color::ORANGE);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            let embed =
                create_error_embed("Error", &format!("Failed to load streak leaderboard: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

/// Show your personal coding quiz stats
#[poise::command(slash_command)]
pub async fn codestats(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get() as i64;
    let pool = &ctx.data().pool;

    let (score, streak, best) = match scores::get_user_stats(pool, user_id).await {
        Ok(stats) => stats,
        Err(e) => {
            let embed = create_error_embed("Error", &format!("Failed to load your stats: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
            return Ok(());
        }
    };
    let rank = scores::get_user_rank(pool, user_id).await.unwrap_or(None);
    let gap = scores::get_score_gap(pool, user_id).await.unwrap_or(None);

    let footer = match gap {
        Some((points, higher_id)) => {
            format!("⚡ {} point(s) behind {}", points, mention(higher_id))
        }
        None => "🏆 You are at the top!".to_string(),
    };

    let embed = serenity::CreateEmbed::new()
        .title(format!("{}'s Stats", ctx.author().name))
        .field("💎 Points", score.to_string(), false)
        .field("🔥 Streak", format!("{} (current)\n{} (best)", streak, best), false)
        .field(
            "🏆 Rank",
            rank.map(|r| format!("#{}", r)).unwrap_or_else(|| "Unranked".to_string()),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(footer))
        .color(serenity::Color::BLURPLE);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
