use std::sync::OnceLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;

/// How long a window stays open when no deadline is given.
pub const DEFAULT_WINDOW_DURATION: Duration = Duration::minutes(15);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeadlineError {
    #[error("'{0}' is not a valid deadline. Use e.g. 30min, 1h or 18:30")]
    InvalidFormat(String),
    #[error("'{0}' is not a valid duration")]
    InvalidDuration(String),
}

fn duration_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d+)(min|m|hours|hour|h)$").expect("duration regex is valid"))
}

fn clock_time_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("clock time regex is valid"))
}

/// Converts user input into an absolute deadline.
///
/// * An empty string gives `now` + 15 minutes.
/// * `<n>min`, `<n>m`, `<n>h`, `<n>hour(s)` are relative to `now`. `n` must be positive.
/// * `H:MM` or `HH:MM` is a wall-clock time in `tz`. If that time is not strictly after `now` today, the deadline is
///   tomorrow at that time.
pub fn parse_deadline(input: &str, now: DateTime<Utc>, tz: Tz) -> Result<DateTime<Utc>, DeadlineError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(now + DEFAULT_WINDOW_DURATION);
    }
    if let Some(caps) = duration_regex().captures(input) {
        return parse_relative(input, &caps[1], &caps[2], now);
    }
    if let Some(caps) = clock_time_regex().captures(input) {
        return parse_clock_time(input, &caps[1], &caps[2], now, tz);
    }
    Err(DeadlineError::InvalidFormat(input.to_string()))
}

fn parse_relative(input: &str, amount: &str, unit: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, DeadlineError> {
    let invalid = || DeadlineError::InvalidDuration(input.to_string());
    let amount = amount.parse::<i64>().map_err(|_| invalid())?;
    if amount <= 0 {
        return Err(invalid());
    }
    let duration = match unit.to_ascii_lowercase().as_str() {
        "min" | "m" => Duration::try_minutes(amount),
        _ => Duration::try_hours(amount),
    }
    .ok_or_else(invalid)?;
    now.checked_add_signed(duration).ok_or_else(invalid)
}

fn parse_clock_time(
    input: &str,
    hour: &str,
    minute: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<DateTime<Utc>, DeadlineError> {
    let invalid = || DeadlineError::InvalidFormat(input.to_string());
    let hour = hour.parse::<u32>().map_err(|_| invalid())?;
    let minute = minute.parse::<u32>().map_err(|_| invalid())?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)?;
    let today = now.with_timezone(&tz).date_naive();
    let candidate = resolve_local(tz, today, time).ok_or_else(invalid)?;
    if candidate > now {
        return Ok(candidate);
    }
    let tomorrow = today.succ_opt().ok_or_else(invalid)?;
    resolve_local(tz, tomorrow, time).ok_or_else(invalid)
}

/// Maps a local wall-clock time to UTC. Times that fall into a DST gap are moved forward by an hour.
fn resolve_local(tz: Tz, date: NaiveDate, time: NaiveTime) -> Option<DateTime<Utc>> {
    let local = date.and_time(time);
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod test {
    use chrono::Timelike;
    use chrono_tz::Europe::Berlin;

    use super::*;

    fn now() -> DateTime<Utc> {
        // 12:00 in Berlin (CEST)
        Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn empty_input_gives_default() {
        assert_eq!(parse_deadline("", now(), Berlin).unwrap(), now() + Duration::minutes(15));
        assert_eq!(parse_deadline("   ", now(), Berlin).unwrap(), now() + Duration::minutes(15));
    }

    #[test]
    fn relative_durations() {
        let cases = [("30min", 30), ("45min", 45), ("5m", 5), ("1h", 60), ("2h", 120), ("1hour", 60), ("3HOURS", 180)];
        for (input, minutes) in cases {
            let deadline = parse_deadline(input, now(), Berlin).unwrap();
            assert_eq!(deadline, now() + Duration::minutes(minutes), "{input}");
        }
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert_eq!(parse_deadline("0min", now(), Berlin), Err(DeadlineError::InvalidDuration("0min".into())));
        assert_eq!(parse_deadline("0h", now(), Berlin), Err(DeadlineError::InvalidDuration("0h".into())));
    }

    #[test]
    fn absurd_durations_are_rejected() {
        let err = parse_deadline("99999999999999h", now(), Berlin).unwrap_err();
        assert!(matches!(err, DeadlineError::InvalidDuration(_)));
    }

    #[test]
    fn clock_times_later_today() {
        let deadline = parse_deadline("17:00", now(), Berlin).unwrap();
        assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 6, 1, 15, 0, 0).unwrap());
        let deadline = parse_deadline("23:59", now(), Berlin).unwrap();
        let local = deadline.with_timezone(&Berlin);
        assert_eq!((local.hour(), local.minute()), (23, 59));
        assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 6, 1).unwrap());
    }

    #[test]
    fn past_clock_times_roll_over() {
        for input in ["09:30", "9:30", "12:00"] {
            let deadline = parse_deadline(input, now(), Berlin).unwrap();
            assert!(deadline > now(), "{input}");
            assert!(deadline - now() <= Duration::hours(24), "{input}");
            let local = deadline.with_timezone(&Berlin);
            assert_eq!(local.date_naive(), NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(), "{input}");
        }
    }

    #[test]
    fn dst_gap_is_shifted() {
        // 02:30 does not exist in Berlin on 2024-03-31
        let now = Utc.with_ymd_and_hms(2024, 3, 30, 23, 0, 0).unwrap();
        let deadline = parse_deadline("02:30", now, Berlin).unwrap();
        let local = deadline.with_timezone(&Berlin);
        assert_eq!((local.hour(), local.minute()), (3, 30));
    }

    #[test]
    fn invalid_inputs() {
        for input in ["invalid", "25:00", "12:60", "30mins", "12:5", "1d", "-5min", "12:00pm"] {
            let err = parse_deadline(input, now(), Berlin).unwrap_err();
            assert!(matches!(err, DeadlineError::InvalidFormat(_)), "{input}: {err:?}");
        }
    }

    #[test]
    fn other_timezones() {
        let deadline = parse_deadline("17:00", now(), chrono_tz::America::New_York).unwrap();
        assert_eq!(deadline, Utc.with_ymd_and_hms(2024, 6, 1, 21, 0, 0).unwrap());
    }
}
