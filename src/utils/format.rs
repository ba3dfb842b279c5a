use crate::database::models::QuestProgress;
use crate::database::quests::QUEST_QUIZ_TARGET;
use crate::utils::questions::Question;
use poise::serenity_prelude as serenity;

pub fn mention(user_id: i64) -> String {
    format!("<@{}>", user_id)
}

/// Medal for the top three, plain index after that.
pub fn medal(position: usize) -> String {
    match position {
        1 => "🥇".to_string(),
        2 => "🥈".to_string(),
        3 => "🥉".to_string(),
        n => format!("{}.", n),
    }
}

pub fn create_error_embed(title: &str, description: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title(title)
        .description(description)
        .color(serenity::Color::RED)
}

pub fn create_question_embed(question: &Question, bonus: bool) -> serenity::CreateEmbed {
    let footer = if bonus {
        "⚡ BONUS QUESTION – double points!"
    } else {
        "Answer with 'a', 'b', or 'c'."
    };

    serenity::CreateEmbed::new()
        .title("❓ Coding Quiz")
        .description(format!("**{}**\n\n{}", question.question, question.options_text()))
        .color(serenity::Color::BLURPLE)
        .footer(serenity::CreateEmbedFooter::new(footer))
}

pub fn create_correct_answer_embed(
    user_id: i64,
    streak: i64,
    total_points: i64,
    milestone_bonus: i64,
    bonus_round: bool,
) -> serenity::CreateEmbed {
    let mut embed = serenity::CreateEmbed::new()
        .title(format!("🔥 {}x Streak!", streak))
        .description(format!(
            "{} answered correctly and earned **{} point(s)**!",
            mention(user_id),
            total_points
        ))
        .color(serenity::Color::DARK_GREEN);

    if milestone_bonus > 0 {
        embed = embed.field("Streak Bonus", format!("+{}", milestone_bonus), true);
    }
    if bonus_round {
        embed = embed.footer(serenity::CreateEmbedFooter::new("⚡ Bonus Question!"));
    }

    embed
}

pub fn create_freeze_embed(user_id: i64) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Streak Freeze Activated!")
        .description(format!(
            "{} Wrong answer, but your **Streak Freeze** protected your streak!\n\nYour streak remains intact.",
            mention(user_id)
        ))
        .color(serenity::Color::BLUE)
        .footer(serenity::CreateEmbedFooter::new(
            "Earn more freezes by completing daily quests!",
        ))
}

pub fn create_quest_complete_embed(user_id: i64) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Daily Quest Completed!")
        .description(format!(
            "{} You completed your daily quest!\n\n**Rewards Earned:**\n• 1 Streak Freeze\n• 1 Bonus Hint\n\nUse `/inventory` to check your rewards!",
            mention(user_id)
        ))
        .color(serenity::Color::GOLD)
}

pub fn create_quest_checklist_embed(progress: &QuestProgress) -> serenity::CreateEmbed {
    let quiz_status = if progress.quizzes_completed >= QUEST_QUIZ_TARGET {
        "Done".to_string()
    } else {
        format!("{}/{}", progress.quizzes_completed, QUEST_QUIZ_TARGET)
    };
    let vote_status = if progress.voted_today { "Done" } else { "Pending" };

    let tasks = format!(
        "**1. Solve {} Quizzes** {}\nAnswer quiz questions correctly\n\n**2. Vote for the Bot** {}\nVote on top.gg",
        QUEST_QUIZ_TARGET, quiz_status, vote_status
    );

    let rewards = if progress.quest_completed {
        "**Quest Completed!** You earned:\n• 1 Streak Freeze\n• 1 Bonus Hint"
    } else {
        "Complete the quiz task to earn:\n• 1 Streak Freeze (protects your streak)\n• 1 Bonus Hint (use `/bonushint` in quiz)"
    };

    serenity::CreateEmbed::new()
        .title("Daily Quest Checklist")
        .description("Complete tasks to earn rewards! Resets every day.")
        .field("Quest Tasks", tasks, false)
        .field("Rewards", rewards, false)
        .field(
            "Your Inventory",
            format!(
                "Streak Freezes: **{}**\nBonus Hints: **{}**",
                progress.streak_freezes, progress.bonus_hints
            ),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Quest Date: {} • Keep grinding!",
            progress.quest_date.format("%Y-%m-%d")
        )))
        .color(serenity::Color::DARK_TEAL)
}

pub fn create_inventory_embed(streak_freezes: i64, bonus_hints: i64) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Your Inventory")
        .description("Items earned from completing daily quests")
        .field(
            format!("Streak Freezes: {}", streak_freezes),
            "Protect your quiz streak when you answer incorrectly.\nAutomatically used when needed.",
            false,
        )
        .field(
            format!("Bonus Hints: {}", bonus_hints),
            "Get a hint on the current quiz question.\nUse with `/bonushint`",
            false,
        )
        .field(
            "How to Earn More",
            "Complete your daily quest! Use `/dailyquest` to check progress.",
            false,
        )
        .color(serenity::Color::DARK_TEAL)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn medal_for_podium_then_numbers() {
        assert_eq!(medal(1), "🥇");
        assert_eq!(medal(3), "🥉");
        assert_eq!(medal(4), "4.");
    }

    #[test]
    fn mention_formats_discord_style() {
        assert_eq!(mention(42), "<@42>");
    }
}
