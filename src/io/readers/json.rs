use serde_json::Value;
use std::path::Path;

use crate::core::{Error, RawRecordSet, RawRow, RawValue, Result};

/// Parse a JSON document holding either an array of row objects or an
/// object with a `records` array.
pub fn parse_json(text: &str, source: &Path) -> Result<RawRecordSet> {
    let document: Value =
        serde_json::from_str(text).map_err(|e| Error::input_parse(source, e.to_string()))?;

    let rows = match document {
        Value::Array(rows) => rows,
        Value::Object(mut map) => match map.remove("records") {
            Some(Value::Array(rows)) => rows,
            _ => {
                return Err(Error::input_parse(
                    source,
                    "expected an array of records or an object with a \"records\" array",
                ))
            }
        },
        _ => {
            return Err(Error::input_parse(
                source,
                "expected an array of records or an object with a \"records\" array",
            ))
        }
    };

    let mut set = RawRecordSet::default();
    for (idx, row) in rows.into_iter().enumerate() {
        let Value::Object(fields) = row else {
            return Err(Error::input_parse(
                source,
                format!("record {} is not an object", idx + 1),
            ));
        };
        set.push_row(fields.into_iter().map(|(k, v)| (k, raw_value(v))).collect::<RawRow>());
    }
    Ok(set)
}

fn raw_value(value: Value) -> RawValue {
    match value {
        Value::Null => RawValue::Empty,
        Value::Bool(b) => RawValue::Bool(b),
        Value::Number(n) => n.as_f64().map(RawValue::Number).unwrap_or(RawValue::Empty),
        Value::String(s) => RawValue::Text(s),
        nested => RawValue::Text(nested.to_string()),
    }
}
