// SPDX-License-Identifier: Apache-2.0

//! Display-safe shaping of backend results.
//!
//! Drivers hand back [`RawRowSet`]s with whatever the wire produced; this
//! module turns them into named [`Row`]s of [`Value`]s the console can render.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::engine::types::{Row, Value};

/// Binary payloads longer than this are replaced by a placeholder.
pub const MAX_DISPLAY_BYTES: usize = (1 << 20) - 1;

pub const BLOB_PLACEHOLDER: &str = "Blob field cannot be displayed";

/// Columns of the single row a key-value command produces.
pub const KV_RESULT_COLUMNS: [&str; 3] = ["redis_command", "redis_key_type", "command_result"];

/// A value as decoded by a driver, before normalization
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Json(serde_json::Value),
}

/// Columns plus positional rows, as returned by a driver
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRowSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<RawValue>>,
}

/// Renames repeated column names to `name(n)`.
///
/// `n` is a running count of duplicates across the whole list, so
/// `id, name, id, name` becomes `id, name, id(1), name(2)`. A generated name
/// that is already taken bumps the counter again.
pub fn dedupe_columns(columns: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::with_capacity(columns.len());
    let mut counter = 0usize;
    let mut result = Vec::with_capacity(columns.len());

    for name in columns {
        if seen.insert(name.clone()) {
            result.push(name.clone());
            continue;
        }
        let renamed = loop {
            counter += 1;
            let candidate = format!("{}({})", name, counter);
            if !seen.contains(&candidate) {
                break candidate;
            }
        };
        seen.insert(renamed.clone());
        result.push(renamed);
    }

    result
}

fn normalize_bytes(bytes: Vec<u8>) -> Value {
    if bytes.len() > MAX_DISPLAY_BYTES {
        return Value::Text(BLOB_PLACEHOLDER.to_string());
    }
    match bytes.as_slice() {
        [0x01] => Value::Text("true".to_string()),
        [0x00] => Value::Text("false".to_string()),
        _ => Value::Text(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

pub fn normalize_value(value: RawValue) -> Value {
    match value {
        RawValue::Null => Value::Null,
        RawValue::Bool(b) => Value::Bool(b),
        RawValue::Int(i) => Value::Int(i),
        RawValue::UInt(u) => match i64::try_from(u) {
            Ok(i) => Value::Int(i),
            Err(_) => Value::Text(u.to_string()),
        },
        RawValue::Float(f) => Value::Float(f),
        RawValue::Text(s) => Value::Text(s),
        RawValue::Bytes(bytes) => normalize_bytes(bytes),
        RawValue::DateTime(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        RawValue::Date(d) => Value::Text(d.format("%Y-%m-%d").to_string()),
        RawValue::Time(t) => Value::Text(t.format("%H:%M:%S").to_string()),
        RawValue::Json(j) => Value::Json(j),
    }
}

/// Normalizes a row set into de-duplicated column names and keyed rows.
pub fn normalize_rows(set: RawRowSet) -> (Vec<String>, Vec<Row>) {
    let columns = dedupe_columns(&set.columns);
    let rows = set
        .rows
        .into_iter()
        .map(|raw| {
            let mut row = Row::new();
            for (name, value) in columns.iter().zip(raw) {
                row.values.insert(name.clone(), normalize_value(value));
            }
            row
        })
        .collect();
    (columns, rows)
}

/// Builds the single result row of a key-value command; `verb` is the first
/// word exactly as typed.
pub fn command_row(verb: &str, key_type: &str, result: Value) -> Row {
    Row::new()
        .with_column(KV_RESULT_COLUMNS[0], Value::from(verb))
        .with_column(KV_RESULT_COLUMNS[1], Value::from(key_type))
        .with_column(KV_RESULT_COLUMNS[2], result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn dedupes_with_running_counter() {
        assert_eq!(dedupe_columns(&names(&["id", "id"])), names(&["id", "id(1)"]));
        assert_eq!(
            dedupe_columns(&names(&["id", "name", "id", "name", "id"])),
            names(&["id", "name", "id(1)", "name(2)", "id(3)"])
        );
    }

    #[test]
    fn generated_names_never_collide() {
        let out = dedupe_columns(&names(&["id", "id(1)", "id"]));
        assert_eq!(out, names(&["id", "id(1)", "id(2)"]));
        let unique: HashSet<_> = out.iter().collect();
        assert_eq!(unique.len(), out.len());
    }

    #[test]
    fn single_bytes_render_as_booleans() {
        assert_eq!(normalize_value(RawValue::Bytes(vec![0x01])), Value::from("true"));
        assert_eq!(normalize_value(RawValue::Bytes(vec![0x00])), Value::from("false"));
        assert_eq!(normalize_value(RawValue::Bytes(b"a".to_vec())), Value::from("a"));
    }

    #[test]
    fn oversized_blob_is_replaced() {
        let blob = vec![b'x'; MAX_DISPLAY_BYTES + 1];
        assert_eq!(normalize_value(RawValue::Bytes(blob)), Value::from(BLOB_PLACEHOLDER));

        let fits = vec![b'x'; MAX_DISPLAY_BYTES];
        match normalize_value(RawValue::Bytes(fits)) {
            Value::Text(s) => assert_eq!(s.len(), MAX_DISPLAY_BYTES),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn temporal_values_use_fixed_layouts() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 1)
            .unwrap();
        assert_eq!(normalize_value(RawValue::DateTime(dt)), Value::from("2024-03-09 07:05:01"));
        assert_eq!(normalize_value(RawValue::Date(dt.date())), Value::from("2024-03-09"));
        assert_eq!(normalize_value(RawValue::Time(dt.time())), Value::from("07:05:01"));
    }

    #[test]
    fn null_and_numbers_pass_through() {
        assert_eq!(normalize_value(RawValue::Null), Value::Null);
        assert_eq!(normalize_value(RawValue::Int(-3)), Value::Int(-3));
        assert_eq!(normalize_value(RawValue::UInt(7)), Value::Int(7));
        assert_eq!(
            normalize_value(RawValue::UInt(u64::MAX)),
            Value::Text(u64::MAX.to_string())
        );
    }

    #[test]
    fn rows_are_keyed_by_deduped_columns() {
        let set = RawRowSet {
            columns: names(&["id", "id"]),
            rows: vec![vec![RawValue::Int(1), RawValue::Int(2)]],
        };
        let (columns, rows) = normalize_rows(set);
        assert_eq!(columns, names(&["id", "id(1)"]));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("id"), Some(&Value::Int(1)));
        assert_eq!(rows[0].get("id(1)"), Some(&Value::Int(2)));
    }

    #[test]
    fn command_row_has_three_columns() {
        let row = command_row("type", "string", Value::from("v"));
        assert_eq!(row.values.len(), 3);
        assert_eq!(row.get("redis_key_type"), Some(&Value::from("string")));
    }
}
