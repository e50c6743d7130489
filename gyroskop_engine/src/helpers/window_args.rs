use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use regex::Regex;

use super::deadline::{parse_deadline, DeadlineError};

pub const DEFAULT_WINDOW_NAME: &str = "Gyros";
pub const DEFAULT_OPTIONS: [&str; 2] = ["Fleisch", "Vegetarisch"];

/// The arguments of a `/gyroskop` command, e.g. `18:30, Pizza, Margherita, Salami`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowArgs {
    pub deadline: DateTime<Utc>,
    /// Only set if the user supplied a name
    pub name: Option<String>,
    /// Only set if the user supplied at least one option
    pub options: Option<Vec<String>>,
}

impl WindowArgs {
    pub fn name_or_default(&self) -> String {
        self.name.clone().unwrap_or_else(|| DEFAULT_WINDOW_NAME.to_string())
    }

    pub fn options_or_default(&self) -> Vec<String> {
        self.options.clone().unwrap_or_else(|| DEFAULT_OPTIONS.iter().map(|s| s.to_string()).collect())
    }
}

fn time_like_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+(:\d*|[[:alpha:]]+)?$").expect("time-like regex is valid"))
}

/// Parses comma-separated `/gyroskop` arguments: an optional deadline, then the name, then the food options.
///
/// A leading part that looks like a time must be a valid deadline, otherwise the whole command is rejected. Options
/// are de-duplicated case-insensitively, keeping the first spelling.
pub fn parse_window_args(args: &str, now: DateTime<Utc>, tz: Tz) -> Result<WindowArgs, DeadlineError> {
    let mut parts = args.split(',').map(str::trim).filter(|p| !p.is_empty()).peekable();
    let deadline = match parts.peek() {
        Some(&first) if time_like_regex().is_match(first) => {
            let deadline = parse_deadline(first, now, tz)?;
            parts.next();
            deadline
        },
        _ => parse_deadline("", now, tz)?,
    };
    let name = parts.next().map(str::to_string);
    let mut options: Vec<String> = Vec::new();
    for option in parts {
        if !options.iter().any(|o| o.to_lowercase() == option.to_lowercase()) {
            options.push(option.to_string());
        }
    }
    let options = if options.is_empty() { None } else { Some(options) };
    Ok(WindowArgs { deadline, name, options })
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone, Timelike};
    use chrono_tz::Europe::Berlin;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments() {
        let args = parse_window_args("", now(), Berlin).unwrap();
        assert_eq!(args.deadline, now() + Duration::minutes(15));
        assert_eq!(args.name, None);
        assert_eq!(args.options, None);
        assert_eq!(args.name_or_default(), "Gyros");
        assert_eq!(args.options_or_default(), strings(&["Fleisch", "Vegetarisch"]));
    }

    #[test]
    fn name_and_options_without_deadline() {
        let args = parse_window_args("Pizza, Margherita, Salami, Hawaii", now(), Berlin).unwrap();
        assert_eq!(args.deadline, now() + Duration::minutes(15));
        assert_eq!(args.name.as_deref(), Some("Pizza"));
        assert_eq!(args.options, Some(strings(&["Margherita", "Salami", "Hawaii"])));
    }

    #[test]
    fn deadline_name_and_options() {
        let args = parse_window_args("30min, Burger, Beef, Chicken, Veggie", now(), Berlin).unwrap();
        assert_eq!(args.deadline, now() + Duration::minutes(30));
        assert_eq!(args.name.as_deref(), Some("Burger"));
        assert_eq!(args.options, Some(strings(&["Beef", "Chicken", "Veggie"])));

        let args = parse_window_args("18:30, Döner", now(), Berlin).unwrap();
        let local = args.deadline.with_timezone(&Berlin);
        assert_eq!((local.hour(), local.minute()), (18, 30));
        assert_eq!(args.name.as_deref(), Some("Döner"));
        assert_eq!(args.options, None);
    }

    #[test]
    fn single_option_and_whitespace() {
        let args = parse_window_args("  Döner ,   Classic  ", now(), Berlin).unwrap();
        assert_eq!(args.name.as_deref(), Some("Döner"));
        assert_eq!(args.options, Some(strings(&["Classic"])));
    }

    #[test]
    fn duplicates_and_empty_parts_are_dropped() {
        let args = parse_window_args("Sushi, Lachs,, lachs, Thunfisch, ", now(), Berlin).unwrap();
        assert_eq!(args.options, Some(strings(&["Lachs", "Thunfisch"])));
    }

    #[test]
    fn deadline_only() {
        let args = parse_window_args("1h", now(), Berlin).unwrap();
        assert_eq!(args.deadline, now() + Duration::hours(1));
        assert_eq!(args.name, None);
    }

    #[test]
    fn malformed_deadline_is_rejected() {
        assert!(matches!(parse_window_args("25:00, Pizza", now(), Berlin), Err(DeadlineError::InvalidFormat(_))));
        assert!(matches!(parse_window_args("30mins, Pizza", now(), Berlin), Err(DeadlineError::InvalidFormat(_))));
        assert!(matches!(parse_window_args("0min", now(), Berlin), Err(DeadlineError::InvalidDuration(_))));
    }

    #[test]
    fn names_with_digits_are_not_deadlines() {
        let args = parse_window_args("5 Guys, Cheeseburger", now(), Berlin).unwrap();
        assert_eq!(args.name.as_deref(), Some("5 Guys"));
        assert_eq!(args.deadline, now() + Duration::minutes(15));
    }
}
