//! Interfaces that storage backends implement in order to act as the record store for the window state machine.
mod data_objects;
mod window_database;

pub use data_objects::{ExpiryResult, RestoreResult};
pub use window_database::{OrderingWindowDatabase, WindowStoreError};
