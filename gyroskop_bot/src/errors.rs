use gyroskop_engine::{WindowApiError, WindowStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("Could not initialize the bot. {0}")]
    InitializeError(String),
    #[error("Invalid bot configuration. {0}")]
    ConfigurationError(String),
    #[error("A Telegram request failed. {0}")]
    TelegramError(#[from] teloxide::RequestError),
    #[error("{0}")]
    WindowError(#[from] WindowApiError),
    #[error("Database error. {0}")]
    StoreError(#[from] WindowStoreError),
    #[error("An I/O error happened in the bot. {0}")]
    IOError(#[from] std::io::Error),
}
