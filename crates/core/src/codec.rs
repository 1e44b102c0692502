//! Legacy wire-format codec.
//!
//! The simulated protocol exchanges caret-delimited strings: fields within a
//! record are separated by `^`, records are separated by newlines, and error
//! payloads are `<negative-code>^<message>`. This module is the single place
//! where those conventions live; handlers never join strings by hand.
//!
//! Responsibilities:
//! - Pack structured values into wire strings (fields, records, arrays)
//! - Parse wire strings back into positional values
//! - Format the canonical error payload
//!
//! Escaping is lossy by design: a delimiter character inside a value is
//! replaced with a single space before packing, matching the source protocol.

use std::collections::BTreeMap;

/// Separates fields within a record.
pub const FIELD_DELIMITER: char = '^';

/// Separates records in a multi-record response.
pub const RECORD_DELIMITER: char = '\n';

/// Separates sub-fields within a field (e.g. grouped codes).
pub const SUBFIELD_DELIMITER: char = ';';

/// Replace any in-value delimiter character with a single space.
///
/// Values on this wire cannot carry `^` or a newline; the protocol has no
/// escape sequence, so the character is dropped to a space instead.
pub fn escape_field(value: &str) -> String {
    value
        .replace(FIELD_DELIMITER, " ")
        .replace(RECORD_DELIMITER, " ")
}

/// Pack a list of optional field values into a single caret-delimited record.
///
/// `None` becomes an empty field. Never fails.
pub fn pack_fields<S: AsRef<str>>(fields: &[Option<S>]) -> String {
    let escaped: Vec<String> = fields
        .iter()
        .map(|field| match field {
            Some(value) => escape_field(value.as_ref()),
            None => String::new(),
        })
        .collect();
    escaped.join(&FIELD_DELIMITER.to_string())
}

/// Pack rows of positional field values into a multi-record response.
///
/// Each row becomes one caret-delimited line; lines are joined with the
/// record delimiter.
pub fn pack_records(records: &[Vec<Option<String>>]) -> String {
    let lines: Vec<String> = records.iter().map(|row| pack_fields(row)).collect();
    lines.join(&RECORD_DELIMITER.to_string())
}

/// Pack keyed records by extracting `field_order` from each map.
///
/// A missing key (or an explicit JSON null) becomes an empty field. Non-string
/// scalar values are rendered with their JSON display form.
pub fn pack_keyed_records(
    records: &[serde_json::Map<String, serde_json::Value>],
    field_order: &[&str],
) -> String {
    let rows: Vec<Vec<Option<String>>> = records
        .iter()
        .map(|record| {
            field_order
                .iter()
                .map(|key| record.get(*key).and_then(value_to_field))
                .collect()
        })
        .collect();
    pack_records(&rows)
}

fn value_to_field(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Format the canonical wire-level error payload.
///
/// Error codes are negative integers by convention, which keeps error payloads
/// distinguishable from ordinary domain responses.
pub fn pack_error(message: &str, code: &str) -> String {
    pack_fields(&[Some(code), Some(message)])
}

/// Format an error payload with the generic `-1` code.
pub fn pack_error_default(message: &str) -> String {
    pack_error(message, "-1")
}

/// Pack key/value pairs into the `KEY=value` array form.
///
/// Used for associative responses; one pair per line, keys in map order.
pub fn pack_array(data: &BTreeMap<String, Option<String>>) -> String {
    let lines: Vec<String> = data
        .iter()
        .map(|(key, value)| format!("{key}={}", value.as_deref().unwrap_or("")))
        .collect();
    lines.join(&RECORD_DELIMITER.to_string())
}

/// Split a single record into its positional fields.
///
/// Inverse of [`pack_fields`] for values without embedded delimiters.
pub fn parse_fields(record: &str) -> Vec<String> {
    record.split(FIELD_DELIMITER).map(str::to_owned).collect()
}

/// Split a multi-record response into rows of positional fields.
///
/// Blank lines are skipped, so the empty "no data" response parses to no rows.
pub fn parse_records(payload: &str) -> Vec<Vec<String>> {
    payload
        .trim()
        .split(RECORD_DELIMITER)
        .filter(|line| !line.is_empty())
        .map(parse_fields)
        .collect()
}
