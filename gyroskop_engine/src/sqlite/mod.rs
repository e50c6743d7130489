//! SQLite backend for the Gyroskop engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
