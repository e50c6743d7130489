//! Update handlers. They translate Telegram messages and button presses into [`GyroskopApi`] calls and present the
//! results in the chat.
use std::sync::Arc;

use gyroskop_engine::{
    db_types::{GroupId, MessageRef, Order, OrderingWindow, Participant, UserId},
    summary::{format_status, format_window_message},
    window_objects::{WindowChange, WindowUpdate},
    WindowApiError,
};
use log::*;
use teloxide::{
    prelude::*,
    types::{MessageId, ParseMode, User},
    ApiError,
    RequestError,
};

use super::{callback::CallbackPayload, commands::Command, keyboard::window_keyboard, messages};
use crate::{errors::BotError, GyroskopApi};

/// State shared by all handlers.
pub struct BotContext {
    pub api: Arc<GyroskopApi>,
    /// The bot's own username, used to tell our commands from those addressed to other bots.
    pub bot_username: Option<String>,
}

pub type SharedContext = Arc<BotContext>;

pub async fn handle_message(bot: Bot, msg: Message, ctx: SharedContext) -> Result<(), BotError> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let command = Command::parse(text, ctx.bot_username.as_deref());
    if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
        let reply = if command == Some(Command::Help) { messages::HELP } else { messages::GROUPS_ONLY };
        return send_markdown(&bot, msg.chat.id, reply).await;
    }
    let participant = participant_from(user);
    match command {
        Some(Command::Help) => send_markdown(&bot, msg.chat.id, messages::HELP).await,
        Some(Command::Gyroskop(args)) => open_or_update_window(&bot, &msg, &ctx, &participant, &args).await,
        Some(Command::Status) => show_status(&bot, &msg, &ctx).await,
        Some(Command::End) => end_window(&bot, &msg, &ctx, &participant).await,
        Some(Command::Cancel) => cancel_order(&bot, &msg, &ctx, &participant).await,
        None if text.trim_start().starts_with('/') => {
            trace!("🤖 Ignoring command that is not ours: {text}");
            Ok(())
        },
        None => submit_text(&bot, &msg, &ctx, &participant, text).await,
    }
}

pub async fn handle_callback(bot: Bot, q: CallbackQuery, ctx: SharedContext) -> Result<(), BotError> {
    let Some((chat, message_id)) = q.message.as_ref().map(|m| (m.chat.id, m.id)) else {
        bot.answer_callback_query(q.id).await?;
        return Ok(());
    };
    let payload = match q.data.as_deref().map(str::parse::<CallbackPayload>) {
        Some(Ok(payload)) => payload,
        Some(Err(e)) => {
            warn!("🤖 {e}");
            bot.answer_callback_query(q.id).text(messages::INVALID_BUTTON).await?;
            return Ok(());
        },
        None => {
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        },
    };
    let selection = match payload {
        CallbackPayload::Noop => {
            bot.answer_callback_query(q.id).await?;
            return Ok(());
        },
        CallbackPayload::Selection(selection) => selection,
    };
    let participant = participant_from(&q.from);
    let group = GroupId(chat.0);
    match ctx.api.submit_selection(group, &participant, selection, Some(MessageRef(message_id.0))).await {
        Ok(submission) => {
            bot.answer_callback_query(q.id).text(messages::selection_ack(&submission)).await?;
            refresh_window_message(&bot, &ctx, submission.window.id).await;
        },
        Err(e) => {
            log_rejection(&e);
            bot.answer_callback_query(q.id).text(messages::error_text(&e)).await?;
        },
    }
    Ok(())
}

/// `/gyroskop`. As a reply to a window message it reopens or edits that window; otherwise it opens a new one.
async fn open_or_update_window(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    participant: &Participant,
    args: &str,
) -> Result<(), BotError> {
    let group = GroupId(msg.chat.id.0);
    if let Some(reply) = msg.reply_to_message() {
        match ctx.api.reopen_or_edit(group, participant.user_id, MessageRef(reply.id.0), args).await {
            Ok(update) => return present_update(bot, ctx, update).await,
            Err(WindowApiError::NotFound) => {
                debug!("🤖 /gyroskop replied to a message without a window. Opening a new one instead");
            },
            Err(e) => return report(bot, msg.chat.id, &e).await,
        }
    }
    match ctx.api.create_window(group, participant, args).await {
        Ok(window) => present_window(bot, ctx, &window, &[], Some(&participant.display_name())).await,
        Err(e) => report(bot, msg.chat.id, &e).await,
    }
}

async fn show_status(bot: &Bot, msg: &Message, ctx: &BotContext) -> Result<(), BotError> {
    match ctx.api.status(GroupId(msg.chat.id.0)).await {
        Ok(snapshot) => {
            let text = format_status(&snapshot.window, &snapshot.orders, ctx.api.timezone());
            send_markdown(bot, msg.chat.id, &text).await
        },
        Err(e) => report(bot, msg.chat.id, &e).await,
    }
}

/// `/ende`. The summary itself is posted by the closed-window hook.
async fn end_window(bot: &Bot, msg: &Message, ctx: &BotContext, participant: &Participant) -> Result<(), BotError> {
    let Some(reply) = msg.reply_to_message() else {
        return send_markdown(bot, msg.chat.id, messages::END_NEEDS_REPLY).await;
    };
    let group = GroupId(msg.chat.id.0);
    match ctx.api.close_window(group, participant.user_id, Some(MessageRef(reply.id.0))).await {
        Ok(Some(closed)) => {
            debug!("🤖 {} ended window #{}", participant.display_name(), closed.window.id);
            Ok(())
        },
        Ok(None) => send_markdown(bot, msg.chat.id, messages::NO_ACTIVE_WINDOW).await,
        Err(e) => report(bot, msg.chat.id, &e).await,
    }
}

async fn cancel_order(bot: &Bot, msg: &Message, ctx: &BotContext, participant: &Participant) -> Result<(), BotError> {
    match ctx.api.cancel_order(GroupId(msg.chat.id.0), participant).await {
        Ok(submission) => {
            reply_markdown(bot, msg, &messages::submission_text(&submission)).await?;
            refresh_window_message(bot, ctx, submission.window.id).await;
            Ok(())
        },
        Err(e) => report(bot, msg.chat.id, &e).await,
    }
}

/// Plain group chat. Text that is not an order, or that arrives while no window is open, is ignored silently.
async fn submit_text(
    bot: &Bot,
    msg: &Message,
    ctx: &BotContext,
    participant: &Participant,
    text: &str,
) -> Result<(), BotError> {
    match ctx.api.submit_text(GroupId(msg.chat.id.0), participant, text).await {
        Ok(submission) => {
            reply_markdown(bot, msg, &messages::submission_text(&submission)).await?;
            refresh_window_message(bot, ctx, submission.window.id).await;
            Ok(())
        },
        Err(WindowApiError::NotFound | WindowApiError::UnrecognisedOrder) => Ok(()),
        Err(e) => report(bot, msg.chat.id, &e).await,
    }
}

async fn present_update(bot: &Bot, ctx: &BotContext, update: WindowUpdate) -> Result<(), BotError> {
    let chat = ChatId(update.window.group_id.0);
    match update.change {
        WindowChange::Reopened => {
            // The old message shows the final summary by now, so the window gets a fresh one
            let snapshot = ctx.api.snapshot(update.window.id).await?;
            present_window(bot, ctx, &snapshot.window, &snapshot.orders, None).await?;
        },
        WindowChange::Updated => refresh_window_message(bot, ctx, update.window.id).await,
    }
    let text = messages::window_changed_text(&update.window, update.change, ctx.api.timezone());
    send_markdown(bot, chat, &text).await
}

/// Posts the window message with its keyboard and remembers it as the window's message.
async fn present_window(
    bot: &Bot,
    ctx: &BotContext,
    window: &OrderingWindow,
    orders: &[Order],
    creator_name: Option<&str>,
) -> Result<(), BotError> {
    let text = format_window_message(window, orders, creator_name, ctx.api.timezone());
    let sent = bot
        .send_message(ChatId(window.group_id.0), text)
        .parse_mode(ParseMode::Markdown)
        .reply_markup(window_keyboard(window))
        .await?;
    ctx.api.attach_message(window.group_id, window.id, MessageRef(sent.id.0)).await?;
    Ok(())
}

/// Re-renders the window message with the current orders. Failures are logged only; the order itself was saved.
async fn refresh_window_message(bot: &Bot, ctx: &BotContext, window_id: i64) {
    let snapshot = match ctx.api.snapshot(window_id).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("🤖 Could not load window #{window_id} to refresh its message. {e}");
            return;
        },
    };
    let window = &snapshot.window;
    let Some(message) = window.message_ref.filter(|_| window.is_open) else {
        return;
    };
    let text = format_window_message(window, &snapshot.orders, None, ctx.api.timezone());
    let result = bot
        .edit_message_text(ChatId(window.group_id.0), MessageId(message.0), text)
        .parse_mode(ParseMode::Markdown)
        .reply_markup(window_keyboard(window))
        .await;
    match result {
        Ok(_) => trace!("🤖 Refreshed message {message} of window #{window_id}"),
        Err(RequestError::Api(ApiError::MessageNotModified)) => {},
        Err(e) => warn!("🤖 Could not refresh message {message} of window #{window_id}. {e}"),
    }
}

async fn report(bot: &Bot, chat: ChatId, e: &WindowApiError) -> Result<(), BotError> {
    log_rejection(e);
    send_markdown(bot, chat, &messages::error_text(e)).await
}

fn log_rejection(e: &WindowApiError) {
    match e {
        WindowApiError::StoreFailure(inner) => error!("🤖 Could not complete a request. {inner}"),
        _ => debug!("🤖 Request rejected. {e}"),
    }
}

async fn send_markdown(bot: &Bot, chat: ChatId, text: &str) -> Result<(), BotError> {
    bot.send_message(chat, text).parse_mode(ParseMode::Markdown).await?;
    Ok(())
}

async fn reply_markdown(bot: &Bot, msg: &Message, text: &str) -> Result<(), BotError> {
    bot.send_message(msg.chat.id, text).parse_mode(ParseMode::Markdown).reply_to_message_id(msg.id).await?;
    Ok(())
}

pub fn participant_from(user: &User) -> Participant {
    let participant =
        Participant::new(UserId(user.id.0 as i64)).with_name(user.first_name.clone(), user.last_name.clone());
    match &user.username {
        Some(username) => participant.with_username(username.clone()),
        None => participant,
    }
}
