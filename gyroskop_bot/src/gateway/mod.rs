//! The Telegram side of the bot.
pub mod callback;
pub mod commands;
pub mod handlers;
pub mod keyboard;
pub mod messages;
pub mod notifier;

pub use handlers::{BotContext, SharedContext};
use teloxide::{dispatching::UpdateHandler, prelude::*};

use crate::errors::BotError;

/// Messages and button presses. Everything else Telegram sends is dropped by the dispatcher.
pub fn schema() -> UpdateHandler<BotError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(handlers::handle_message))
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
}
