//! # Gyroskop bot
//! The Telegram front end for Gyroskop. It is responsible for:
//! Receiving commands, free-text orders and button presses from group chats.
//! Forwarding them to the [`WindowFlowApi`] and presenting the results.
//! Announcing closed windows, whether they were closed by hand or expired.
//!
//! ## Configuration
//! The bot is configured via environment variables. See [config](config/index.html) for more information.

use gyroskop_engine::{SqliteDatabase, WindowFlowApi};

pub mod bot;
pub mod cli;
pub mod config;
pub mod errors;
pub mod expiry_worker;
pub mod gateway;

/// The window flow API as the bot runs it.
pub type GyroskopApi = WindowFlowApi<SqliteDatabase>;
