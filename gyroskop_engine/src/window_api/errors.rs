use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{helpers::DeadlineError, traits::WindowStoreError};

#[derive(Debug, Clone, Error)]
pub enum WindowApiError {
    #[error("Invalid format. {0}")]
    InvalidFormat(String),
    #[error("Invalid duration. {0}")]
    InvalidDuration(String),
    #[error("Only the creator of the window may do this")]
    Unauthorized,
    #[error("Window #{0} is already open in this group")]
    ConflictingWindow(i64),
    #[error("There is no matching ordering window")]
    NotFound,
    #[error("The window closed for orders at {0}")]
    WindowExpired(DateTime<Utc>),
    #[error("The message does not contain a recognisable order")]
    UnrecognisedOrder,
    #[error("The window has no option with index {0}")]
    InvalidSelection(usize),
    #[error("The record store failed. {0}")]
    StoreFailure(#[from] WindowStoreError),
}

impl From<DeadlineError> for WindowApiError {
    fn from(e: DeadlineError) -> Self {
        match e {
            DeadlineError::InvalidFormat(_) => Self::InvalidFormat(e.to_string()),
            DeadlineError::InvalidDuration(_) => Self::InvalidDuration(e.to_string()),
        }
    }
}
