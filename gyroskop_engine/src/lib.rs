//! Gyroskop Engine
//!
//! The engine coordinates group food orders. A member of a chat group opens an *ordering window* with a deadline and a
//! list of food options, the other members submit quantities (as free text or with buttons) until the deadline, and
//! a summary is produced when the window closes.
//!
//! The library is divided into these sections:
//! 1. The record store ([`traits::OrderingWindowDatabase`]) and its SQLite implementation ([`SqliteDatabase`]).
//! 2. Parsers for deadlines, command arguments and free-text orders ([`mod@helpers`]).
//! 3. The window state machine ([`WindowFlowApi`]) and the summary formatter ([`summary`]).
//!
//! Closing a window emits a [`events::WindowClosedEvent`]. Hook into it with [`events::EventHooks`] to announce the
//! final summary.
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;
mod window_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
pub use traits::{ExpiryResult, OrderingWindowDatabase, RestoreResult, WindowStoreError};
pub use window_api::{
    errors::WindowApiError,
    summary,
    window_flow_api::{Clock, WindowFlowApi},
    window_objects,
};
