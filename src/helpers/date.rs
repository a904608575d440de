//! Date helper functions

use chrono::{DateTime, Local, TimeZone};

use crate::content::parse_date_string;

/// Format a date in long Chinese form (like "2024年3月1日")
pub fn full_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y年%-m月%-d日").to_string()
}

/// Format just the calendar date (like "2024-03-01")
pub fn short_date<Tz: TimeZone>(date: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    date.format("%Y-%m-%d").to_string()
}

/// Get relative time (like "3天前") measured from `now`
///
/// Dates more than a year away fall back to [`full_date`].
pub fn relative_date(date: &DateTime<Local>, now: &DateTime<Local>) -> String {
    let days = now.signed_duration_since(*date).num_days().unsigned_abs();

    match days {
        0 => "今天".to_string(),
        1 => "昨天".to_string(),
        2..=6 => format!("{}天前", days),
        7..=29 => format!("{}周前", days / 7),
        30..=364 => format!("{}月前", days / 30),
        _ => full_date(date),
    }
}

/// Relative form of a front-matter date string, or the string itself if it does not parse
pub fn humanize_date(date: &str, now: &DateTime<Local>) -> String {
    match parse_date_string(date) {
        Some(parsed) => relative_date(&parsed, now),
        None => date.to_string(),
    }
}
