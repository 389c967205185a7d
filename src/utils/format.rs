//! Formatting utilities for file sizes, dates, and other display values.

use chrono::{DateTime, Utc};

/// Format file size for display (e.g., "1.2 KB", "3.4 MB").
///
/// Directories (no size) render as "-".
pub fn format_size(size: Option<u64>) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    let Some(bytes) = size else {
        return "-".to_string();
    };
    if bytes < 1_000 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1_000.0;
    let mut unit = 0;
    while value >= 1_000.0 && unit < UNITS.len() - 1 {
        value /= 1_000.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Format a modification time as "2024-03-01 10:00" (UTC).
pub fn format_date(modified: Option<DateTime<Utc>>) -> String {
    modified
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(None), "-");
        assert_eq!(format_size(Some(0)), "0 B");
        assert_eq!(format_size(Some(999)), "999 B");
        assert_eq!(format_size(Some(1_500)), "1.5 KB");
        assert_eq!(format_size(Some(2_300_000)), "2.3 MB");
        assert_eq!(format_size(Some(5_000_000_000_000_000)), "5000.0 TB");
    }

    #[test]
    fn test_format_date() {
        let dt = Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap();
        assert_eq!(format_date(Some(dt)), "2024-03-01 10:00");
        assert_eq!(format_date(None), "");
    }
}
