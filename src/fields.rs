use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use regex::Regex;

use crate::error::ExtractError;

static PERCENT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+ %").unwrap());
static CLOCK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+:\d{2}:\d{2}").unwrap());
static CLOCK_FULL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d{2}):(\d{2})$").unwrap());

/// A count parsed from report text: integer unless the source carried a
/// decimal point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }
}

/// Parse a numeric cell like `"12,345 mWh"` or `"3.5 %"`: thousands
/// separators stripped, trailing unit word ignored.
pub fn parse_count(text: &str) -> Result<Number, ExtractError> {
    let digits = text
        .split_whitespace()
        .next()
        .ok_or_else(|| ExtractError::field(text, "number with optional unit"))?
        .replace(',', "");
    let digits = digits.trim_end_matches('%');

    if digits.contains('.') {
        digits
            .parse::<f64>()
            .map(Number::Float)
            .map_err(|_| ExtractError::field(text, "number with optional unit"))
    } else {
        digits
            .parse::<i64>()
            .map(Number::Int)
            .map_err(|_| ExtractError::field(text, "number with optional unit"))
    }
}

/// First `N %` token embedded in a cell, if any. Used where a percentage
/// shares a cell with other text.
pub fn percent_extract(text: &str) -> Option<String> {
    PERCENT_RE.find(text).map(|m| m.as_str().to_string())
}

/// First `H:MM:SS` token embedded in a cell, if any.
pub fn clock_extract(text: &str) -> Option<String> {
    CLOCK_RE.find(text).map(|m| m.as_str().to_string())
}

/// Decode a clock-style total `H:MM:SS` into seconds. `H` is unbounded (no
/// day boundary in the source format). Empty or NaN input is "no value", not
/// zero.
pub fn parse_clock_duration(text: &str) -> Result<Option<i64>, ExtractError> {
    let text = text.trim();
    if text.is_empty() || text == "-" || text.eq_ignore_ascii_case("nan") {
        return Ok(None);
    }

    let caps = CLOCK_FULL_RE
        .captures(text)
        .ok_or_else(|| ExtractError::field(text, "H:MM:SS clock duration"))?;
    let part = |i: usize| {
        caps[i]
            .parse::<i64>()
            .map_err(|_| ExtractError::field(text, "H:MM:SS clock duration"))
    };
    let h = part(1)?;
    let m = part(2)?;
    let s = part(3)?;

    // The source restructures hours into days + hours before recombining.
    // `days * 24 + rem` reproduces `h` exactly, so the arithmetic below is a
    // deliberate no-op kept for bit-identical rounding with the original.
    let days = h / 24;
    let rem = h % 24;
    Ok(Some((days * 24 + rem) * 3600 + m * 60 + s))
}

/// Elapsed-interval variant of the clock format (`H:MM:SS`). Same decoding,
/// distinct semantics: an interval, not a wall-clock total.
pub fn parse_duration(text: &str) -> Result<Option<TimeDelta>, ExtractError> {
    Ok(parse_clock_duration(text)?.map(TimeDelta::seconds))
}

/// Split a period cell into (start, end) date strings. The separator is a
/// line break or `" - "`; a single-line cell yields an empty end date.
pub fn parse_date_range(text: &str) -> (String, String) {
    let (start, end) = if let Some((a, b)) = text.split_once('\n') {
        (a, b)
    } else if let Some((a, b)) = text.split_once(" - ") {
        (a, b)
    } else {
        (text, "")
    };
    (start.trim().to_string(), end.trim().to_string())
}

/// `YYYY-MM-DD` calendar date.
pub fn parse_date(text: &str) -> Result<NaiveDate, ExtractError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .map_err(|_| ExtractError::field(text, "YYYY-MM-DD date"))
}

/// `YYYY-MM-DD HH:MM:SS` timestamp.
pub fn parse_datetime(text: &str) -> Result<NaiveDateTime, ExtractError> {
    NaiveDateTime::parse_from_str(text.trim(), "%Y-%m-%d %H:%M:%S")
        .map_err(|_| ExtractError::field(text, "YYYY-MM-DD HH:MM:SS timestamp"))
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_integer_with_unit() {
        assert_eq!(parse_count("12,345 mWh").unwrap(), Number::Int(12345));
        assert_eq!(parse_count("50,000 mWh").unwrap().as_f64(), 50000.0);
    }

    #[test]
    fn count_float_with_percent() {
        assert_eq!(parse_count("3.5 %").unwrap(), Number::Float(3.5));
    }

    #[test]
    fn count_rejects_garbage() {
        assert!(parse_count("").is_err());
        assert!(parse_count("n/a").is_err());
    }

    #[test]
    fn percent_token_embedded_in_text() {
        assert_eq!(percent_extract("drained 8 % overnight").as_deref(), Some("8 %"));
        assert_eq!(percent_extract("10:52:59"), None);
    }

    #[test]
    fn clock_token_embedded_in_text() {
        assert_eq!(clock_extract("10:52:59\n8 %").as_deref(), Some("10:52:59"));
        assert_eq!(clock_extract("8 %"), None);
    }

    #[test]
    fn clock_duration_hours_past_midnight() {
        // 25 hours: no day boundary in the source format.
        assert_eq!(parse_clock_duration("25:30:15").unwrap(), Some(91815));
        assert_eq!(parse_clock_duration("0:00:00").unwrap(), Some(0));
        assert_eq!(parse_clock_duration("6:02:03").unwrap(), Some(21723));
    }

    #[test]
    fn clock_duration_absence_is_none_not_zero() {
        assert_eq!(parse_clock_duration("").unwrap(), None);
        assert_eq!(parse_clock_duration("-").unwrap(), None);
        assert_eq!(parse_clock_duration("NaN").unwrap(), None);
    }

    #[test]
    fn clock_duration_rejects_other_shapes() {
        assert!(parse_clock_duration("1:2:3").is_err());
        assert!(parse_clock_duration("soon").is_err());
    }

    #[test]
    fn clock_duration_hour_overflow_is_an_error_not_a_panic() {
        assert!(matches!(
            parse_clock_duration("99999999999999999999:00:00"),
            Err(ExtractError::FieldFormat { .. })
        ));
    }

    #[test]
    fn date_range_newline_separator() {
        let (s, e) = parse_date_range("2024-04-21\n2024-04-28");
        assert_eq!((s.as_str(), e.as_str()), ("2024-04-21", "2024-04-28"));
    }

    #[test]
    fn date_range_dash_separator() {
        let (s, e) = parse_date_range("2024-04-21 - 2024-04-28");
        assert_eq!((s.as_str(), e.as_str()), ("2024-04-21", "2024-04-28"));
    }

    #[test]
    fn date_range_single_line_has_empty_end() {
        let (s, e) = parse_date_range("2024-05-05");
        assert_eq!((s.as_str(), e.as_str()), ("2024-05-05", ""));
    }

    #[test]
    fn dates_and_timestamps() {
        assert_eq!(
            parse_date("2024-05-05").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 5).unwrap()
        );
        assert!(parse_datetime("2024-05-11 06:00:00").is_ok());
        assert!(parse_datetime("yesterday").is_err());
    }

    #[test]
    fn interval_duration() {
        assert_eq!(
            parse_duration("1:13:05").unwrap(),
            Some(TimeDelta::seconds(4385))
        );
        assert_eq!(parse_duration("").unwrap(), None);
    }
}
