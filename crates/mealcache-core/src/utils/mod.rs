//! Utility functions for date and string formatting.

pub mod format;

// Re-export commonly used functions at module level
pub use format::{
    day_label, format_pretty, format_ymd, start_of_week_mon, truncate, week_dates,
};
