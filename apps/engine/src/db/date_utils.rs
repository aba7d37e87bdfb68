//! Date utilities for daily reset hour handling.

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

/// Study day that `now` falls on, given `daily_reset_hour`.
///
/// Before the reset hour it is still "yesterday" from a study perspective, so
/// late-night sessions count towards the previous day.
pub fn study_day(now: NaiveDateTime, daily_reset_hour: u32) -> NaiveDate {
    if now.hour() < daily_reset_hour {
        (now - Duration::days(1)).date()
    } else {
        now.date()
    }
}

/// Format a date as YYYY-MM-DD for SQL queries.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn format_datetime(at: NaiveDateTime) -> String {
    at.format("%Y-%m-%dT%H:%M:%S").to_string()
}

pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").ok()
}
