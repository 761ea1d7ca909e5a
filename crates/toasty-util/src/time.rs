//! Wall-clock utilities for toastyd
//!
//! Session rows store their start instant as Unix epoch seconds; the
//! same-day rules additionally need the local calendar day. Everything that
//! reads "now" goes through [`now`] so a single switch can shift the clock.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `TOASTY_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is
//! useful for exercising the midnight rollover by hand.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 23:58:00`)
//!
//! ```bash
//! TOASTY_MOCK_TIME="2025-12-25 23:58:00" toastyd --config dev.toml
//! ```

use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveDateTime, TimeZone};
use std::sync::OnceLock;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "TOASTY_MOCK_TIME";

/// Format accepted by [`MOCK_TIME_ENV_VAR`]
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Offset between mock time and real time, fixed at first use so mock time
/// keeps advancing at the real rate.
static MOCK_TIME_OFFSET: OnceLock<Option<ChronoDuration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // wraps Local::now()
fn get_mock_time_offset() -> Option<ChronoDuration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            let raw = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
            match parse_mock_time(&raw) {
                Some(mock_dt) => {
                    let offset = mock_dt.signed_duration_since(Local::now());
                    tracing::info!(
                        mock_time = %raw,
                        offset_secs = offset.num_seconds(),
                        "Mock time enabled"
                    );
                    Some(offset)
                }
                None => {
                    tracing::warn!(
                        mock_time = %raw,
                        expected_format = MOCK_TIME_FORMAT,
                        "Invalid mock time, using real clock"
                    );
                    None
                }
            }
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

fn parse_mock_time(raw: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(raw, MOCK_TIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).single()
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Current local time, respecting mock time in debug builds.
#[allow(clippy::disallowed_methods)] // the one sanctioned call site
pub fn now() -> DateTime<Local> {
    let real_now = Local::now();
    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Convert stored epoch seconds back to local time.
///
/// Out-of-range values clamp to the epoch itself.
pub fn from_epoch_secs(secs: i64) -> DateTime<Local> {
    Local
        .timestamp_opt(secs, 0)
        .single()
        .unwrap_or_else(|| DateTime::<Local>::from(std::time::UNIX_EPOCH))
}

/// Seconds elapsed between a stored epoch timestamp and `now`.
///
/// A missing session is represented by timestamp zero, which yields the full
/// epoch age and therefore never falls inside any window.
pub fn seconds_since(epoch_secs: i64, now: &DateTime<Local>) -> i64 {
    now.timestamp() - epoch_secs
}

/// Local midnight at the start of `dt`'s calendar day.
///
/// On days where midnight does not exist (DST gaps) the earliest valid
/// instant of the day is used.
pub fn local_midnight(dt: &DateTime<Local>) -> DateTime<Local> {
    let day_start = dt.date_naive().and_time(chrono::NaiveTime::MIN);
    match Local.from_local_datetime(&day_start) {
        chrono::LocalResult::Single(m) => m,
        chrono::LocalResult::Ambiguous(earliest, _) => earliest,
        chrono::LocalResult::None => {
            let since_midnight = dt.time().signed_duration_since(chrono::NaiveTime::MIN);
            *dt - since_midnight
        }
    }
}

/// Short clock rendering used in session reports, e.g. `3:04pm`.
pub fn format_report_time(dt: &DateTime<Local>) -> String {
    dt.format("%-I:%M%P").to_string()
}

/// Full timestamp rendering for logs and CLI output.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn midnight_is_start_of_same_day() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        let midnight = local_midnight(&dt);

        assert_eq!(midnight.day(), 25);
        assert_eq!(midnight.hour(), 0);
        assert_eq!(midnight.minute(), 0);
        assert!(midnight <= dt);
    }

    #[test]
    fn seconds_since_epoch_zero_is_huge() {
        let dt = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(seconds_since(0, &dt) > 43_200);
    }

    #[test]
    fn seconds_since_recent_timestamp() {
        let dt = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let started = dt.timestamp() - 200;
        assert_eq!(seconds_since(started, &dt), 200);
    }

    #[test]
    fn epoch_round_trip() {
        let dt = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(from_epoch_secs(dt.timestamp()), dt);
    }

    #[test]
    fn report_time_format() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 15, 4, 0).unwrap();
        assert_eq!(format_report_time(&dt), "3:04pm");
        assert_eq!(format_datetime_full(&dt), "2025-12-25 15:04:00");
    }

    #[test]
    fn mock_time_format_parses() {
        assert!(parse_mock_time("2025-12-25 14:30:00").is_some());
        assert!(parse_mock_time("2025-12-25T14:30:00").is_none());
        assert!(parse_mock_time("").is_none());
    }

    #[test]
    fn now_is_reasonable() {
        let t = now();
        assert!(t.year() >= 2020);
        let _ = is_mock_time_active();
    }
}
