//! Timestamp input parsing.

use std::io::BufRead;

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a local date-time. A bare date means midnight.
pub fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    for format in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(parsed);
        }
    }
    parse_date(raw)
        .map(|date| date.and_time(chrono::NaiveTime::MIN))
        .map_err(|_| format!("'{raw}' is not a date-time (expected YYYY-MM-DD[ HH:MM[:SS]])"))
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("'{}' is not a date (expected YYYY-MM-DD): {err}", raw.trim()))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedLine {
    pub line: usize,
    pub content: String,
    pub reason: String,
}

/// One timestamp per line. Blank lines and `#` comments are ignored;
/// unparseable lines are collected rather than failing the read.
pub fn read_timestamps(reader: impl BufRead) -> Result<(Vec<NaiveDateTime>, Vec<RejectedLine>)> {
    let mut timestamps = Vec::new();
    let mut rejected = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading input line {}", index + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match parse_datetime(trimmed) {
            Ok(timestamp) => timestamps.push(timestamp),
            Err(reason) => rejected.push(RejectedLine {
                line: index + 1,
                content: trimmed.to_string(),
                reason,
            }),
        }
    }
    Ok((timestamps, rejected))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_layouts() {
        let expected = NaiveDate::from_ymd_opt(1969, 11, 24)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        for raw in [
            "1969-11-24 09:00:00",
            "1969-11-24T09:00:00",
            "1969-11-24 09:00",
            " 1969-11-24T09:00 ",
        ] {
            assert_eq!(parse_datetime(raw), Ok(expected), "{raw}");
        }
    }

    #[test]
    fn bare_date_is_midnight() {
        let parsed = parse_datetime("2024-02-10").unwrap();
        assert_eq!(parsed.to_string(), "2024-02-10 00:00:00");
    }

    #[test]
    fn skips_comments_and_reports_bad_lines() {
        let input = "# header\n2024-01-01 00:00\n\nnot a date\n2024-01-01 02:00:00\n";
        let (timestamps, rejected) = read_timestamps(input.as_bytes()).unwrap();
        assert_eq!(timestamps.len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].line, 4);
        assert_eq!(rejected[0].content, "not a date");
    }
}
