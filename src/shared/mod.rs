pub mod fs_atomic;
pub mod ids;
pub mod logging;

use chrono::{Local, TimeZone};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

pub fn now_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

/// Local wall-clock rendering of a millisecond timestamp.
pub fn format_local_millis(millis: i64) -> String {
    Local
        .timestamp_millis_opt(millis)
        .single()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "unknown time".to_string())
}

/// Cuts `text` to at most `max` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let keep = max.saturating_sub(3);
    let mut out: String = single_line.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
mod tests {
    use super::{format_local_millis, truncate_chars};

    #[test]
    fn truncate_chars_flattens_and_cuts_long_text() {
        assert_eq!(truncate_chars("a logo\nfor  a shop", 40), "a logo for a shop");
        assert_eq!(truncate_chars("abcdefghij", 6), "abc...");
        assert_eq!(truncate_chars("ab", 2), "ab");
    }

    #[test]
    fn format_local_millis_renders_date_and_minutes() {
        let rendered = format_local_millis(1_700_000_000_000);
        assert_eq!(rendered.len(), "2023-11-14 22:13".len());
        assert!(rendered.starts_with("2023-11-1"), "{rendered}");
    }
}
