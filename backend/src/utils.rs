use crate::services::sort_service::SortOrder;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"];

/// Coerce a raw cell into a non-negative integer.
///
/// Strings yield their leading run of digits (`"123abc"` is 123, `"12.7"` is 12).
/// Anything missing, negative or unparsable is 0.
pub fn coerce_int(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => coerce_int_str(s),
        _ => 0,
    }
}

pub fn coerce_int_str(raw: &str) -> u64 {
    let trimmed = raw.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());

    // Saturate rather than fall back to zero for absurdly long digit runs.
    match &trimmed[..digits_end] {
        "" => 0,
        digits => digits.parse::<u64>().unwrap_or(u64::MAX),
    }
}

/// Render a raw cell as text. Missing and null cells are empty.
pub fn coerce_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Parse a date or timestamp cell into its UTC calendar date.
pub fn coerce_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }

    parse_instant(raw).map(|dt| dt.date())
}

/// Parse a date or timestamp cell into Unix seconds for ordering.
///
/// Date-only values resolve to midnight UTC.
pub fn coerce_timestamp(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Some(instant) = parse_instant(raw) {
        return Some(instant.and_utc().timestamp());
    }

    coerce_date(raw)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc().timestamp())
}

fn parse_instant(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = raw.parse::<DateTime<Utc>>() {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub fn compare_with_order<T: Ord>(a: T, b: T, order: &SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => a.cmp(&b),
        SortOrder::Desc => b.cmp(&a),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_int_numbers_and_strings() {
        assert_eq!(coerce_int(Some(&json!(96079554))), 96079554);
        assert_eq!(coerce_int(Some(&json!("1300"))), 1300);
        assert_eq!(coerce_int(Some(&json!(" 42 views"))), 42);
        assert_eq!(coerce_int(Some(&json!("12.7"))), 12);
        assert_eq!(coerce_int(Some(&json!(65.9))), 65);
    }

    #[test]
    fn test_coerce_int_defaults_to_zero() {
        assert_eq!(coerce_int(None), 0);
        assert_eq!(coerce_int(Some(&Value::Null)), 0);
        assert_eq!(coerce_int(Some(&json!("n/a"))), 0);
        assert_eq!(coerce_int(Some(&json!(""))), 0);
        assert_eq!(coerce_int(Some(&json!(-5))), 0);
        assert_eq!(coerce_int(Some(&json!("-5"))), 0);
        assert_eq!(coerce_int(Some(&json!(true))), 0);
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(coerce_text(Some(&json!("  TW "))), "TW");
        assert_eq!(coerce_text(Some(&json!(2025))), "2025");
        assert_eq!(coerce_text(None), "");
        assert_eq!(coerce_text(Some(&Value::Null)), "");
    }

    #[test]
    fn test_coerce_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 9, 11);
        assert_eq!(coerce_date("2025-09-11"), expected);
        assert_eq!(coerce_date("2025/09/11"), expected);
        assert_eq!(coerce_date("2025-09-11T15:27:37Z"), expected);
        assert_eq!(coerce_date("2025-09-11T23:30:00+00:00"), expected);
        assert_eq!(coerce_date("2025-09-11 08:00:00"), expected);
        assert_eq!(coerce_date("not a date"), None);
        assert_eq!(coerce_date(""), None);
    }

    #[test]
    fn test_coerce_timestamp_keeps_time_of_day() {
        let morning = coerce_timestamp("2025-09-10T08:00:00Z").unwrap();
        let evening = coerce_timestamp("2025-09-10T20:00:00Z").unwrap();
        let midnight = coerce_timestamp("2025-09-10").unwrap();

        assert!(midnight < morning);
        assert!(morning < evening);
        assert_eq!(coerce_timestamp("garbage"), None);
    }

    #[test]
    fn test_contains_ignore_case() {
        assert!(contains_ignore_case("Mystery Cat", "cat"));
        assert!(contains_ignore_case("#AI,#Cat", "#ai"));
        assert!(!contains_ignore_case("Cooking Master", "tech"));
    }

    #[test]
    fn test_compare_with_order() {
        assert_eq!(compare_with_order(1, 2, &SortOrder::Asc), Ordering::Less);
        assert_eq!(compare_with_order(1, 2, &SortOrder::Desc), Ordering::Greater);
        assert_eq!(compare_with_order(3, 3, &SortOrder::Desc), Ordering::Equal);
    }
}
