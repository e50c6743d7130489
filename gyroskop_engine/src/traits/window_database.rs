use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::db_types::{GroupId, MessageRef, NewWindow, Order, OrderingWindow, Participant, Quantities, UserId};

/// The record store behind the ordering window state machine.
///
/// Implementations must be safe for concurrent use. The store is the durable source of truth: it is consulted at
/// startup, for every validating read and by the expiry scheduler. It knows nothing about the "one open window per
/// group" rule; that is enforced by [`crate::WindowFlowApi`].
#[allow(async_fn_in_trait)]
pub trait OrderingWindowDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Stores a new, open window and returns it with its assigned id.
    async fn create_window(&self, window: NewWindow) -> Result<OrderingWindow, WindowStoreError>;

    async fn fetch_window(&self, window_id: i64) -> Result<Option<OrderingWindow>, WindowStoreError>;

    /// Returns the open window for the group, if there is one.
    async fn fetch_open_window(&self, group: GroupId) -> Result<Option<OrderingWindow>, WindowStoreError>;

    async fn fetch_all_open_windows(&self) -> Result<Vec<OrderingWindow>, WindowStoreError>;

    /// Returns the group's most recently created window, open or closed.
    async fn fetch_latest_window(&self, group: GroupId) -> Result<Option<OrderingWindow>, WindowStoreError>;

    /// Finds the window (open or closed) that is presented by the given chat message.
    async fn fetch_window_by_message_ref(
        &self,
        group: GroupId,
        message: MessageRef,
    ) -> Result<Option<OrderingWindow>, WindowStoreError>;

    /// Marks the window as closed. Returns `false` if the window was already closed (or does not exist), so that
    /// exactly one caller observes the transition.
    async fn close_window(&self, window_id: i64) -> Result<bool, WindowStoreError>;

    /// Marks a closed window as open again with a new deadline. Returns `false` if the window was already open.
    async fn reopen_window(&self, window_id: i64, deadline: DateTime<Utc>) -> Result<bool, WindowStoreError>;

    async fn update_window_deadline(&self, window_id: i64, deadline: DateTime<Utc>) -> Result<(), WindowStoreError>;

    async fn update_window_options(
        &self,
        window_id: i64,
        name: &str,
        options: &[String],
    ) -> Result<(), WindowStoreError>;

    async fn update_window_message_ref(&self, window_id: i64, message: MessageRef) -> Result<(), WindowStoreError>;

    /// Inserts or replaces the participant's order for the window. The display fields are refreshed as well.
    async fn upsert_order(
        &self,
        window_id: i64,
        participant: &Participant,
        quantities: &Quantities,
    ) -> Result<Order, WindowStoreError>;

    /// All orders for the window in the order they were first submitted, including cleared ones.
    async fn fetch_orders(&self, window_id: i64) -> Result<Vec<Order>, WindowStoreError>;

    async fn fetch_order(&self, window_id: i64, user: UserId) -> Result<Option<Order>, WindowStoreError>;

    /// Soft-deletes the user's order by clearing its quantities. Returns `false` if there was no order.
    async fn clear_order(&self, window_id: i64, user: UserId) -> Result<bool, WindowStoreError>;

    /// Releases any resources held by the store.
    async fn close(&mut self) -> Result<(), WindowStoreError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum WindowStoreError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Window #{0} does not exist")]
    WindowNotFound(i64),
    #[error("Could not decode a stored record. {0}")]
    CorruptRecord(String),
}

impl From<sqlx::Error> for WindowStoreError {
    fn from(e: sqlx::Error) -> Self {
        WindowStoreError::DatabaseError(e.to_string())
    }
}
