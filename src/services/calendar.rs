//! US equity trading calendar and daily schedule arithmetic.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};

/// NYSE full-day closures for 2026 as `(month, day)`.
const HOLIDAYS_2026: &[(u32, u32)] = &[
    (1, 1),
    (1, 19),
    (2, 16),
    (4, 3),
    (5, 25),
    (7, 3),
    (9, 7),
    (11, 26),
    (11, 27),
    (12, 24),
    (12, 25),
];

/// UTC hour from which the US session of the same UTC day has closed.
const SESSION_CLOSE_HOUR_UTC: u32 = 20;

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

pub fn is_holiday(date: NaiveDate) -> bool {
    date.year() == 2026 && HOLIDAYS_2026.contains(&(date.month(), date.day()))
}

/// Whether US markets trade on `date`.
pub fn is_trading_day(date: NaiveDate) -> bool {
    !is_weekend(date) && !is_holiday(date)
}

/// The US session a run at `now` refers to.
///
/// Runs after the close collect the same UTC day; earlier runs collect the
/// previous day.
pub fn session_date(now: DateTime<Utc>) -> NaiveDate {
    let today = now.date_naive();
    if now.hour() >= SESSION_CLOSE_HOUR_UTC {
        today
    } else {
        today - Duration::days(1)
    }
}

/// Next weekday instant at `hour:minute` UTC strictly after `now`.
///
/// Returns `None` for an invalid time of day.
pub fn next_run_after(now: DateTime<Utc>, hour: u32, minute: u32) -> Option<DateTime<Utc>> {
    let mut date = now.date_naive();

    // At most a weekend plus one day away.
    for _ in 0..8 {
        let candidate = Utc.from_utc_datetime(&date.and_hms_opt(hour, minute, 0)?);
        if candidate > now && !is_weekend(date) {
            return Some(candidate);
        }
        date = date.succ_opt()?;
    }

    None
}
