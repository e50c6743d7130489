use std::{path::PathBuf, sync::Arc};

use gyroskop_engine::{OrderingWindowDatabase, SqliteDatabase, WindowFlowApi};
use log::*;
use teloxide::{dispatching::ShutdownToken, prelude::*};
use tokio::sync::watch;

use crate::{
    config::BotConfig,
    errors::BotError,
    expiry_worker::start_expiry_worker,
    gateway::{notifier::create_announcement_handlers, schema, BotContext},
};

/// Runs the bot until it receives SIGINT or SIGTERM.
pub async fn run_bot(config: BotConfig) -> Result<(), BotError> {
    config.validate()?;
    ensure_database_dir(&config.database_url)?;
    let mut db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| BotError::InitializeError(format!("Could not open the database. {e}")))?;
    if config.run_migrations {
        db.migrate().await?;
    }

    let bot = Bot::new(config.bot_token.reveal().clone());
    let me = bot.get_me().await?;
    let bot_username = me.user.username.clone();
    info!("🤖 Logged in as @{}", bot_username.as_deref().unwrap_or("<no username>"));

    let handlers = create_announcement_handlers(bot.clone(), config.timezone, config.event_buffer_size);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let api = Arc::new(WindowFlowApi::new(db.clone(), producers, config.timezone));
    let restored = api.restore_open_windows().await?;
    if !restored.expired.is_empty() {
        let count = restored.expired.len();
        info!("🤖 {count} windows expired while the bot was offline. Their summaries are posted now");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let worker = start_expiry_worker(Arc::clone(&api), config.expiry_interval, shutdown_rx);

    let context = Arc::new(BotContext { api, bot_username });
    let mut dispatcher =
        Dispatcher::builder(bot, schema()).dependencies(dptree::deps![context]).enable_ctrlc_handler().build();
    shutdown_on_sigterm(dispatcher.shutdown_token());
    info!("🤖 Listening for updates");
    dispatcher.dispatch().await;

    info!("🤖 Dispatcher stopped. Shutting down");
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker.await {
        warn!("🕰️ The expiry worker did not shut down cleanly. {e}");
    }
    db.close().await?;
    Ok(())
}

#[cfg(unix)]
fn shutdown_on_sigterm(token: ShutdownToken) {
    use tokio::signal::unix::{signal, SignalKind};
    tokio::spawn(async move {
        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                warn!("🤖 Could not listen for SIGTERM. {e}");
                return;
            },
        };
        sigterm.recv().await;
        info!("🤖 SIGTERM received");
        match token.shutdown() {
            Ok(done) => done.await,
            Err(e) => warn!("🤖 Could not stop the dispatcher. {e}"),
        }
    });
}

#[cfg(not(unix))]
fn shutdown_on_sigterm(_token: ShutdownToken) {}

/// Creates the directory of a file-based SQLite database. SQLite creates the file itself, but not its directory.
fn ensure_database_dir(url: &str) -> Result<(), BotError> {
    let Some(path) = sqlite_file_path(url) else {
        return Ok(());
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
        debug!("🗃️ Database directory {} is ready", dir.display());
    }
    Ok(())
}

fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let rest = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split_once('?').map_or(rest, |(path, _)| path);
    if path.is_empty() || path == ":memory:" {
        None
    } else {
        Some(PathBuf::from(path))
    }
}
