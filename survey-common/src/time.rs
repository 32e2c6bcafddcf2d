//! Timestamp utilities

use chrono::{DateTime, Local, TimeZone};
use std::fmt::Display;

/// File-name safe timestamp layout (`2024-03-09T14-05-59`)
pub const FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H-%M-%S";

/// Get current local timestamp
pub fn now() -> DateTime<Local> {
    Local::now()
}

/// Format a timestamp for use inside file names
pub fn format_timestamp<Tz>(timestamp: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    timestamp.format(FILE_TIMESTAMP_FORMAT).to_string()
}

/// Current time as a file-name safe string
pub fn time_string() -> String {
    format_timestamp(&now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_format_timestamp_layout() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 59).unwrap();
        assert_eq!(format_timestamp(&ts), "2024-03-09T14-05-59");
    }

    #[test]
    fn test_time_string_is_file_name_safe() {
        let value = time_string();
        assert_eq!(value.len(), 19);
        assert!(!value.contains(':'));
        assert!(!value.contains('/'));
        assert!(!value.contains(' '));
    }

    #[test]
    fn test_time_string_sorts_chronologically() {
        let earlier = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(format_timestamp(&earlier) < format_timestamp(&later));
    }
}
