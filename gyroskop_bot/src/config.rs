use std::{env, fmt::Display, str::FromStr, time::Duration};

use chrono_tz::Tz;
use gyro_common::{helpers::parse_boolean_flag, Secret};
use log::*;

use crate::errors::BotError;

const DEFAULT_DATABASE_URL: &str = "sqlite://data/gyroskop.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Berlin;
const DEFAULT_EXPIRY_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_EVENT_BUFFER_SIZE: usize = 32;

#[derive(Clone, Debug)]
pub struct BotConfig {
    /// The token issued by BotFather. Never logged.
    pub bot_token: Secret<String>,
    pub database_url: String,
    pub max_connections: u32,
    /// If true, the embedded migrations are applied on startup.
    pub run_migrations: bool,
    /// Clock-time deadlines such as `18:30` are read in this timezone, and all deadlines are displayed in it.
    pub timezone: Tz,
    /// How often the expiry worker looks for overdue windows.
    pub expiry_interval: Duration,
    pub event_buffer_size: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_token: Secret::new(String::default()),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            run_migrations: true,
            timezone: DEFAULT_TIMEZONE,
            expiry_interval: DEFAULT_EXPIRY_INTERVAL,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl BotConfig {
    pub fn from_env_or_default() -> Self {
        let bot_token =
            env::var("GYRO_TELEGRAM_BOT_TOKEN").or_else(|_| env::var("TELEGRAM_BOT_TOKEN")).unwrap_or_else(|_| {
                error!("🪛️ GYRO_TELEGRAM_BOT_TOKEN is not set. Please set it to the token BotFather issued.");
                String::default()
            });
        let database_url = env::var("GYRO_DATABASE_URL").ok().unwrap_or_else(|| {
            info!("🪛️ GYRO_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.into()
        });
        let max_connections = parse_env_value(
            "GYRO_DB_MAX_CONNECTIONS",
            env::var("GYRO_DB_MAX_CONNECTIONS").ok(),
            DEFAULT_MAX_CONNECTIONS,
        );
        let run_migrations = parse_boolean_flag(env::var("GYRO_RUN_MIGRATIONS").ok(), true);
        let timezone = parse_env_value("GYRO_TIMEZONE", env::var("GYRO_TIMEZONE").ok(), DEFAULT_TIMEZONE);
        let expiry_secs = parse_env_value(
            "GYRO_EXPIRY_INTERVAL_SECS",
            env::var("GYRO_EXPIRY_INTERVAL_SECS").ok(),
            DEFAULT_EXPIRY_INTERVAL.as_secs(),
        );
        let event_buffer_size = parse_env_value(
            "GYRO_EVENT_BUFFER_SIZE",
            env::var("GYRO_EVENT_BUFFER_SIZE").ok(),
            DEFAULT_EVENT_BUFFER_SIZE,
        );
        let config = Self {
            bot_token: Secret::new(bot_token),
            database_url,
            max_connections,
            run_migrations,
            timezone,
            expiry_interval: Duration::from_secs(expiry_secs),
            event_buffer_size,
        };
        config.with_sane_limits()
    }

    /// Checks the settings that have no usable default.
    pub fn validate(&self) -> Result<(), BotError> {
        if self.bot_token.reveal().trim().is_empty() {
            return Err(BotError::ConfigurationError(
                "No bot token was given. Set GYRO_TELEGRAM_BOT_TOKEN.".to_string(),
            ));
        }
        if self.database_url.trim().is_empty() {
            return Err(BotError::ConfigurationError("The database URL is empty. Check GYRO_DATABASE_URL.".into()));
        }
        Ok(())
    }

    fn with_sane_limits(mut self) -> Self {
        if self.max_connections == 0 {
            warn!("🪛️ GYRO_DB_MAX_CONNECTIONS must be at least 1. Using the default, {DEFAULT_MAX_CONNECTIONS}.");
            self.max_connections = DEFAULT_MAX_CONNECTIONS;
        }
        if self.expiry_interval.is_zero() {
            warn!(
                "🪛️ GYRO_EXPIRY_INTERVAL_SECS must be at least 1. Using the default, {}s.",
                DEFAULT_EXPIRY_INTERVAL.as_secs()
            );
            self.expiry_interval = DEFAULT_EXPIRY_INTERVAL;
        }
        if self.event_buffer_size == 0 {
            warn!("🪛️ GYRO_EVENT_BUFFER_SIZE must be at least 1. Using the default, {DEFAULT_EVENT_BUFFER_SIZE}.");
            self.event_buffer_size = DEFAULT_EVENT_BUFFER_SIZE;
        }
        self
    }
}

/// Parses an optional environment value, falling back to `default` (with a warning) if it is present but invalid.
fn parse_env_value<T>(name: &str, value: Option<String>, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match value {
        None => {
            debug!("🪛️ {name} is not set. Using the default value of {default}.");
            default
        },
        Some(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ Invalid configuration value for {name} ({s}). {e} Using the default, {default}, instead.");
            default
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn env_values_fall_back_to_defaults() {
        assert_eq!(parse_env_value("X", Some(" 12 ".into()), 5u32), 12);
        assert_eq!(parse_env_value("X", Some("twelve".into()), 5u32), 5);
        assert_eq!(parse_env_value("X", Some("-1".into()), 5u32), 5);
        assert_eq!(parse_env_value("X", None, 5u32), 5);
        let tz = parse_env_value("TZ", Some("America/New_York".into()), DEFAULT_TIMEZONE);
        assert_eq!(tz, chrono_tz::America::New_York);
        let tz = parse_env_value("TZ", Some("Mars/Olympus_Mons".into()), DEFAULT_TIMEZONE);
        assert_eq!(tz, DEFAULT_TIMEZONE);
    }

    #[test]
    fn zero_limits_are_replaced() {
        let config = BotConfig {
            max_connections: 0,
            expiry_interval: Duration::ZERO,
            event_buffer_size: 0,
            ..Default::default()
        }
        .with_sane_limits();
        assert_eq!(config.max_connections, DEFAULT_MAX_CONNECTIONS);
        assert_eq!(config.expiry_interval, DEFAULT_EXPIRY_INTERVAL);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }

    #[test]
    fn a_token_is_required() {
        let config = BotConfig::default();
        assert!(matches!(config.validate(), Err(BotError::ConfigurationError(_))));
        let config = BotConfig { bot_token: Secret::new("123:abc".into()), ..Default::default() };
        assert!(config.validate().is_ok());
    }
}
