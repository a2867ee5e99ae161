use chrono::{Datelike, Duration, NaiveDate};

/// Korean one-letter weekday names, Sunday first.
const DAY_LABELS: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];

/// School days shown in the week view (Monday to Friday).
pub const SCHOOL_DAYS: i64 = 5;

/// `YYYYMMDD`, the date format NEIS uses in queries and rows.
pub fn format_ymd(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// `YYYY.MM.DD` for display
pub fn format_pretty(date: NaiveDate) -> String {
    date.format("%Y.%m.%d").to_string()
}

pub fn day_label(date: NaiveDate) -> &'static str {
    DAY_LABELS[date.weekday().num_days_from_sunday() as usize]
}

/// Monday of the week containing `date` (Sunday belongs to the week before).
pub fn start_of_week_mon(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Monday through Friday of the week containing `date`.
pub fn week_dates(date: NaiveDate) -> Vec<NaiveDate> {
    let monday = start_of_week_mon(date);
    (0..SCHOOL_DAYS).map(|i| monday + Duration::days(i)).collect()
}

/// Truncate to `max_chars` characters, adding an ellipsis if needed
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else if max_chars <= 1 {
        s.chars().take(max_chars).collect()
    } else {
        let truncated: String = s.chars().take(max_chars - 1).collect();
        format!("{}…", truncated)
    }
}
