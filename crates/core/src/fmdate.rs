//! FileMan-style date handling.
//!
//! The wire encodes dates as `YYYMMDD` or `YYYMMDD.HHMM`, where `YYY` is the
//! Gregorian year minus 1700 (so 2025-04-15 is `3250415`). Fixture files may
//! additionally use a relative notation `T±N[.HHMM]` — N whole days from
//! "today" — which is resolved to the absolute form at data-access time and
//! never appears on the wire.

use chrono::{Datelike, Days, NaiveDate};

/// Encode a calendar date in FileMan form (`YYYMMDD`).
pub fn encode(date: NaiveDate) -> String {
    format!(
        "{:03}{:02}{:02}",
        date.year() - 1700,
        date.month(),
        date.day()
    )
}

/// Encode a calendar date plus an `HHMM` time-of-day suffix.
pub fn encode_with_time(date: NaiveDate, hhmm: &str) -> String {
    format!("{}.{hhmm}", encode(date))
}

/// Convert an ISO `YYYY-MM-DD` date into FileMan form.
///
/// Returns `None` when the input does not parse as an ISO date; callers render
/// that as an empty wire field, as the source system does for a missing DOB.
pub fn from_iso(iso: &str) -> Option<String> {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .ok()
        .map(encode)
}

/// Resolve a fixture date token against `today`.
///
/// A token of the form `T±N` or `T±N.HHMM` becomes the absolute FileMan date
/// `today ± N days`, with the time-of-day suffix preserved verbatim. Any other
/// token — including an already-absolute date or malformed input — is returned
/// unchanged. This function never fails: fixture data that does not match the
/// relative pattern degrades to a pass-through rather than crashing the
/// simulator.
pub fn resolve(token: &str, today: NaiveDate) -> String {
    match resolve_relative(token, today) {
        Some(absolute) => absolute,
        None => token.to_owned(),
    }
}

fn resolve_relative(token: &str, today: NaiveDate) -> Option<String> {
    let rest = token.strip_prefix('T')?;
    let (sign, rest) = match rest.as_bytes().first()? {
        b'+' => (1i64, &rest[1..]),
        b'-' => (-1i64, &rest[1..]),
        _ => return None,
    };

    let (days_part, time_part) = match rest.split_once('.') {
        Some((days, time)) => (days, Some(time)),
        None => (rest, None),
    };

    if days_part.is_empty() || !days_part.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // An empty suffix after the dot ("T-1.") is malformed, not "no time".
    if matches!(time_part, Some(t) if t.is_empty()) {
        return None;
    }

    let days: u64 = days_part.parse().ok()?;
    let date = if sign >= 0 {
        today.checked_add_days(Days::new(days))?
    } else {
        today.checked_sub_days(Days::new(days))?
    };

    Some(match time_part {
        Some(hhmm) => encode_with_time(date, hhmm),
        None => encode(date),
    })
}
