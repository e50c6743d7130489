use chrono_tz::Tz;
use gyroskop_engine::events::{EventHandlers, EventHooks, WindowClosedEvent};
use log::*;
use teloxide::{
    prelude::*,
    types::{MessageId, ParseMode},
};

use super::messages;
use crate::errors::BotError;

/// Assigns the event handlers that keep the group chats informed.
///
/// WindowClosedEvent - The final summary is posted to the group, and the window message is replaced with a copy of it
/// (which also drops the order buttons). This happens whether the creator ended the window or it expired.
pub fn create_announcement_handlers(bot: Bot, timezone: Tz, buffer_size: usize) -> EventHandlers {
    let mut hooks = EventHooks::default();
    hooks.on_window_closed(move |ev| {
        let bot = bot.clone();
        Box::pin(async move {
            if let Err(e) = announce_closed_window(&bot, &ev, timezone).await {
                error!("🤖 Could not announce the end of window #{}. {e}", ev.window.id);
            }
        })
    });
    EventHandlers::new(buffer_size, hooks)
}

async fn announce_closed_window(bot: &Bot, event: &WindowClosedEvent, timezone: Tz) -> Result<(), BotError> {
    let chat = ChatId(event.window.group_id.0);
    let text = messages::closed_announcement(event, timezone);
    if let Some(message) = event.window.message_ref {
        let result =
            bot.edit_message_text(chat, MessageId(message.0), text.clone()).parse_mode(ParseMode::Markdown).await;
        if let Err(e) = result {
            warn!("🤖 Could not replace message {message} of closed window #{}. {e}", event.window.id);
        }
    }
    bot.send_message(chat, text).parse_mode(ParseMode::Markdown).await?;
    info!("🤖 Announced the end of window #{} in group {}", event.window.id, event.window.group_id);
    Ok(())
}
