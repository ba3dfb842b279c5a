pub mod counting;
pub mod quiz;

use crate::bot::{Data, Error};
use poise::serenity_prelude as serenity;

pub async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { data_about_bot } => {
            tracing::info!("Bot logged in as {}", data_about_bot.user.name);
        }
        serenity::FullEvent::Message { new_message } => {
            // Both engines listen on the message stream; each decides on its
            // own whether the message belongs to it. Failures are logged at
            // this boundary so one bad event never takes the process down.
            if let Err(e) = counting::handle_message(ctx, new_message, data).await {
                tracing::error!("Error in counting engine: {:?}", e);
            }
            if let Err(e) = quiz::handle_message(ctx, new_message, data).await {
                tracing::error!("Error in quiz engine: {:?}", e);
            }
        }
        _ => {}
    }
    Ok(())
}
