//! Timestamps to and from fixed-point ticks.
//!
//! A tick is 10 µs: 100,000 ticks per second since the Unix epoch. Format
//! strings use the trace-log strftime dialect, where `%f` is six-digit
//! microseconds; they are rewritten to chrono's `%6f` before use.

use std::fmt::Write as _;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const TICKS_PER_SECOND: i64 = 100_000;
const MICROS_PER_TICK: i64 = 1_000_000 / TICKS_PER_SECOND;

/// Rewrites a log-style format string for chrono.
pub fn chrono_format(format: &str) -> String {
    let mut out = String::with_capacity(format.len() + 2);
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('f') => out.push_str("%6f"),
            Some(next) => {
                out.push('%');
                out.push(next);
            }
            None => out.push('%'),
        }
    }
    out
}

/// Returns true if chrono accepts every specifier in `format`.
pub fn is_valid_format(format: &str) -> bool {
    let format = chrono_format(format);
    !StrftimeItems::new(&format).any(|item| matches!(item, Item::Error))
}

/// Parses a formatted timestamp into ticks, flooring to the tick grid.
pub fn parse_ticks(value: &str, format: &str) -> Option<i64> {
    let value = value.trim();
    let format = chrono_format(format);
    // Offset-aware first: the naive parser silently ignores `%z`.
    let micros = if let Ok(dt) = DateTime::parse_from_str(value, &format) {
        dt.timestamp_micros()
    } else if let Ok(dt) = NaiveDateTime::parse_from_str(value, &format) {
        dt.and_utc().timestamp_micros()
    } else {
        NaiveDate::parse_from_str(value, &format)
            .ok()?
            .and_hms_opt(0, 0, 0)?
            .and_utc()
            .timestamp_micros()
    };
    Some(micros.div_euclid(MICROS_PER_TICK))
}

/// Formats ticks as UTC time using `format`.
///
/// Returns `None` if the tick is out of chrono's range or the format is invalid.
pub fn format_ticks(ticks: i64, format: &str) -> Option<String> {
    if !is_valid_format(format) {
        return None;
    }
    let micros = ticks.checked_mul(MICROS_PER_TICK)?;
    let dt = DateTime::<Utc>::from_timestamp_micros(micros)?.naive_utc();
    let format = chrono_format(format);
    let mut out = String::new();
    write!(out, "{}", dt.format(&format)).ok()?;
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG_FORMAT: &str = "%Y-%m-%d %H:%M:%S.%f";

    #[test]
    fn test_chrono_format_rewrites_micros() {
        assert_eq!(chrono_format(LOG_FORMAT), "%Y-%m-%d %H:%M:%S.%6f");
        assert_eq!(chrono_format("100%%f"), "100%%f");
    }

    #[test]
    fn test_epoch_ticks() {
        let ticks = parse_ticks("2024-01-01 00:00:00.000000", LOG_FORMAT).unwrap();
        assert_eq!(ticks, 1_704_067_200 * TICKS_PER_SECOND);
        assert_eq!(
            format_ticks(ticks, LOG_FORMAT).as_deref(),
            Some("2024-01-01 00:00:00.000000")
        );
    }

    #[test]
    fn test_sub_tick_precision_truncated() {
        let ticks = parse_ticks("2024-01-01 00:00:00.000017", LOG_FORMAT).unwrap();
        assert_eq!(ticks, 1_704_067_200 * TICKS_PER_SECOND + 1);
        assert_eq!(
            format_ticks(ticks, LOG_FORMAT).as_deref(),
            Some("2024-01-01 00:00:00.000010")
        );
    }

    #[test]
    fn test_pre_epoch_floors_to_tick_grid() {
        let ticks = parse_ticks("1969-12-31 23:59:59.999985", LOG_FORMAT).unwrap();
        assert_eq!(ticks, -2);
        assert_eq!(
            format_ticks(ticks, LOG_FORMAT).as_deref(),
            Some("1969-12-31 23:59:59.999980")
        );
        let ticks = parse_ticks("1969-12-31 23:59:59.999990", LOG_FORMAT).unwrap();
        assert_eq!(ticks, -1);
    }

    #[test]
    fn test_date_only_format() {
        let ticks = parse_ticks("2024-01-02", "%Y-%m-%d").unwrap();
        assert_eq!(ticks, (1_704_067_200 + 86_400) * TICKS_PER_SECOND);
    }

    #[test]
    fn test_offset_format() {
        let ticks = parse_ticks("2024-01-01 01:00:00 +0100", "%Y-%m-%d %H:%M:%S %z").unwrap();
        assert_eq!(ticks, 1_704_067_200 * TICKS_PER_SECOND);
    }

    #[test]
    fn test_unparseable_value() {
        assert_eq!(parse_ticks("yesterday", LOG_FORMAT), None);
    }

    #[test]
    fn test_invalid_format_rejected() {
        assert!(!is_valid_format("%Y-%Q"));
        assert!(is_valid_format(LOG_FORMAT));
        assert_eq!(format_ticks(0, "%Y-%Q"), None);
    }
}
