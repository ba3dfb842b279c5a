use crate::bot::{Context, Error};
use crate::database::quests;
use crate::utils::format::{create_error_embed, create_inventory_embed, create_quest_checklist_embed};
use crate::utils::questions::ANSWER_LETTERS;

/// View your daily quest progress and rewards
#[poise::command(slash_command)]
pub async fn dailyquest(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get() as i64;
    let pool = &ctx.data().pool;

    match quests::quest_progress(pool, user_id).await {
        Ok(progress) => {
            let embed = create_quest_checklist_embed(&progress);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            let embed =
                create_error_embed("Error", &format!("Failed to load quest progress: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
        }
    }

    Ok(())
}

/// View your quest rewards inventory
#[poise::command(slash_command)]
pub async fn inventory(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get() as i64;
    let pool = &ctx.data().pool;

    match quests::get_rewards(pool, user_id).await {
        Ok((freezes, hints)) => {
            let embed = create_inventory_embed(freezes, hints);
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            let embed = create_error_embed("Error", &format!("Failed to load inventory: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
        }
    }

    Ok(())
}

/// Use a bonus hint on the current quiz question
#[poise::command(slash_command)]
pub async fn bonushint(ctx: Context<'_>) -> Result<(), Error> {
    let user_id = ctx.author().id.get() as i64;
    let data = ctx.data();

    let (_, hints) = match quests::get_rewards(&data.pool, user_id).await {
        Ok(rewards) => rewards,
        Err(e) => {
            let embed = create_error_embed("Error", &format!("Failed to load inventory: {}", e));
            ctx.send(poise::CreateReply::default().embed(embed).ephemeral(true)).await?;
            return Ok(());
        }
    };

    if hints <= 0 {
        ctx.send(
            poise::CreateReply::default()
                .content(
                    "You don't have any bonus hints! Complete your daily quest to earn one.",
                )
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    // The hint only makes sense while a question is open.
    let answer = {
        let sessions = data.quiz_sessions.lock().expect("quiz session map poisoned");
        data.config
            .quiz_channel_id
            .and_then(|channel| sessions.get(&channel).map(|s| s.answer.clone()))
    };
    let Some(answer) = answer else {
        ctx.send(
            poise::CreateReply::default()
                .content("There's no active quiz question right now. Wait for the next question!")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    };

    if !quests::consume_bonus_hint(&data.pool, user_id).await? {
        ctx.send(
            poise::CreateReply::default()
                .content("Failed to use bonus hint. Please try again.")
                .ephemeral(true),
        )
        .await?;
        return Ok(());
    }

    let wrong: Vec<&str> = ANSWER_LETTERS
        .into_iter()
        .filter(|letter| *letter != answer)
        .collect();
    let hint = format!(
        "**Bonus Hint Used!**\n\nThe correct answer is **NOT** '{}' or '{}'!\n\nYou have **{}** bonus hint(s) remaining.",
        wrong[0],
        wrong[1],
        hints - 1
    );

    ctx.send(poise::CreateReply::default().content(hint).ephemeral(true)).await?;

    Ok(())
}
