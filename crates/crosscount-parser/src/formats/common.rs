use chrono::{NaiveDate, NaiveDateTime};

const TOTAL_SUFFIX: &str = "Total";

static TIMESTAMP_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M:%S %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%m/%d/%Y %H:%M",
];

static DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Turns the header of a per-crossing total column into a crossing name.
///
/// `Fremont Bridge Total` and `Fremont.Bridge.Total` both become `Fremont Bridge`.
pub fn derive_crossing_name(header: &str) -> Option<String> {
    let spaced = header.trim().replace('.', " ");
    let mut tokens: Vec<&str> = spaced.split_whitespace().collect();
    if tokens
        .last()
        .is_some_and(|last| last.eq_ignore_ascii_case(TOTAL_SUFFIX))
    {
        tokens.pop();
    }
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

/// Removes a leading crossing name from a reading header, comparing token by token so that
/// `Fremont.Bridge.East.Sidewalk` and `Fremont Bridge East Sidewalk` behave the same.
pub fn strip_crossing_prefix(label: &str, crossing: &str) -> String {
    let trimmed = label.trim();
    let prefix: Vec<&str> = crossing.split_whitespace().collect();
    let tokens: Vec<&str> = trimmed
        .split(|c: char| c == '.' || c.is_whitespace())
        .filter(|t| !t.is_empty())
        .collect();

    if prefix.is_empty() || tokens.len() <= prefix.len() {
        return trimmed.to_string();
    }

    let matches = tokens
        .iter()
        .zip(prefix.iter())
        .all(|(token, expected)| token.eq_ignore_ascii_case(expected));
    if !matches {
        return trimmed.to_string();
    }

    let separator = if trimmed.contains(char::is_whitespace) {
        " "
    } else {
        "."
    };
    tokens[prefix.len()..].join(separator)
}

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed.split([' ', 'T']).next().unwrap_or(trimmed);
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date_part, fmt).ok())
}

/// Counter cells are non-negative integers; anything else is treated as missing.
pub(crate) fn parse_count(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() || is_missing_marker(trimmed) {
        return None;
    }
    if let Ok(parsed) = trimmed.parse::<i64>() {
        return (parsed >= 0).then_some(parsed);
    }
    match trimmed.parse::<f64>() {
        Ok(parsed) if parsed.is_finite() && parsed >= 0.0 && parsed.fract() == 0.0 => {
            Some(parsed as i64)
        }
        _ => None,
    }
}

fn is_missing_marker(value: &str) -> bool {
    value.eq_ignore_ascii_case("na")
        || value.eq_ignore_ascii_case("nan")
        || value.eq_ignore_ascii_case("null")
}

pub(crate) fn micros(value: NaiveDateTime) -> i64 {
    value.and_utc().timestamp_micros()
}
