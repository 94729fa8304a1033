//! Collections come back bare or wrapped under one of a few keys. Records
//! are decoded one at a time so a malformed one is reported by its id.

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::error::{ApiError, Result};

const ID_FIELDS: [&str; 2] = ["id", "taskId"];

fn shape(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

/// The record array: `body` itself, or the first of `keys` holding an array.
pub(crate) fn unwrap_list(body: Value, keys: &[&str]) -> Result<Vec<Value>> {
    match body {
        Value::Array(records) => Ok(records),
        Value::Object(mut fields) => keys
            .iter()
            .find_map(|key| match fields.remove(*key) {
                Some(Value::Array(records)) => Some(records),
                _ => None,
            })
            .ok_or_else(|| {
                ApiError::Decode(format!("expected a list under one of {}", keys.join(", ")))
            }),
        other => Err(ApiError::Decode(format!(
            "expected a list, got {}",
            shape(&other)
        ))),
    }
}

fn record_label(record: &Value, index: usize) -> String {
    ID_FIELDS
        .iter()
        .find_map(|field| match record.get(*field) {
            Some(Value::String(id)) => Some(id.clone()),
            Some(Value::Number(id)) => Some(id.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| format!("#{}", index))
}

/// Decodes every record; the first that does not fit fails the whole list.
pub(crate) fn decode_records<T: DeserializeOwned>(
    records: Vec<Value>,
    kind: &str,
) -> Result<Vec<T>> {
    records
        .into_iter()
        .enumerate()
        .map(|(index, record)| {
            let label = record_label(&record, index);
            serde_json::from_value(record)
                .map_err(|e| ApiError::Decode(format!("{} {}: {}", kind, label, e)))
        })
        .collect()
}

pub(crate) fn decode_list<T: DeserializeOwned>(
    body: Value,
    keys: &[&str],
    kind: &str,
) -> Result<Vec<T>> {
    decode_records(unwrap_list(body, keys)?, kind)
}
