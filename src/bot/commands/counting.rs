use crate::bot::{Context, Error};
use crate::database::counting;
use crate::utils::format::{create_error_embed, medal, mention};
use poise::serenity_prelude as serenity;

/// Set the channel for the counting game
#[poise::command(slash_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn setcountingchannel(
    ctx: Context<'_>,
    #[description = "Channel to count in"] channel: serenity::GuildChannel,
) -> Result<(), Error> {
    let guild_id = ctx.guild_id().expect("guild_only command").get();
    let pool = &ctx.data().pool;

    if let Err(e) = counting::set_channel(pool, guild_id as i64, channel.id.get() as i64).await {
        let embed = create_error_embed("Error", &format!("Failed to save counting channel: {}", e));
        ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
        return Ok(());
    }

    {
        let mut channels = ctx
            .data()
            .counting_channels
            .write()
            .expect("counting channel cache poisoned");
        channels.insert(guild_id, channel.id.get());
    }

    ctx.send(
        poise::CreateReply::default()
            .content(format!("Counting channel set to <#{}>", channel.id.get()))
            .ephemeral(true),
    )
    .await?;

    Ok(())
}

/// Show who has counted the most
#[poise::command(slash_command, guild_only)]
pub async fn countleaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().expect("guild_only command").get() as i64;
    let pool = &ctx.data().pool;

    match counting::top_counters(pool, guild_id, 10).await {
        Ok(rows) if rows.is_empty() => {
            ctx.say("No counting stats yet.").await?;
        }
        Ok(rows) => {
            let description = rows
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{} {}: {}", medal(i + 1), mention(s.user_id), s.total_counts))
                .collect::<Vec<_>>()
                .join("\n");

            let embed = serenity::CreateEmbed::new()
                .title("Most Count Leaderboard")
                .description(description)
                .color(serenity::Color::BLUE);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            let embed = create_error_embed("Error", &format!("Failed to load stats: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

/// Show who has ruined the count the most
#[poise::command(slash_command, guild_only)]
pub async fn ruinedleaderboard(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().expect("guild_only command").get() as i64;
    let pool = &ctx.data().pool;

    match counting::top_ruiners(pool, guild_id, 10).await {
        Ok(rows) if rows.is_empty() => {
            ctx.say("No ruined stats yet.").await?;
        }
        Ok(rows) => {
            let description = rows
                .iter()
                .enumerate()
                .map(|(i, s)| format!("{} {}: {}", medal(i + 1), mention(s.user_id), s.ruined_counts))
                .collect::<Vec<_>>()
                .join("\n");

            let embed = serenity::CreateEmbed::new()
                .title("Most Ruined Leaderboard")
                .description(description)
                .color(serenity::Color::RED);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            let embed = create_error_embed("Error", &format!("Failed to load stats: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}

/// Show the server's current count and high score
#[poise::command(slash_command, guild_only)]
pub async fn countstats(ctx: Context<'_>) -> Result<(), Error> {
    let guild_id = ctx.guild_id().expect("guild_only command").get() as i64;
    let pool = &ctx.data().pool;

    match counting::get_config(pool, guild_id).await {
        Ok(Some(config)) => {
            let embed = serenity::CreateEmbed::new()
                .title("Server Count Stats")
                .field("Current Count", config.current_count.to_string(), true)
                .field("High Score", config.high_score.to_string(), true)
                .color(serenity::Color::DARK_GREEN);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Ok(None) => {
            ctx.say("Counting channel not set up or no data.").await?;
        }
        Err(e) => {
            let embed = create_error_embed("Error", &format!("Failed to load count stats: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
    }

    Ok(())
}
