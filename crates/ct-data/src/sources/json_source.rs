//! JSON decoding into tabular datasets
//!
//! Each record object becomes one row. Nested objects are flattened into
//! dotted column names (`coordinates.latitude`); arrays are kept as their
//! JSON text.

use ct_core::Value;
use indexmap::IndexMap;
use serde_json::{Map, Value as Json};
use tracing::debug;

use crate::config::SourceConfig;
use crate::dataset::TabularDataset;
use crate::schema::SchemaDetector;
use crate::DataError;

/// Decode a JSON body.
///
/// A top-level array holds the records. For a top-level object the records
/// are read from `record_path` when given, otherwise the object is a single
/// record.
pub fn decode_json(
    path: &str,
    body: &[u8],
    record_path: Option<&str>,
    config: &SourceConfig,
) -> Result<TabularDataset, DataError> {
    let root: Json = serde_json::from_slice(body)
        .map_err(|e| DataError::decode(path, format!("malformed JSON: {}", e)))?;

    let records: Vec<&Json> = match (&root, record_path) {
        (Json::Array(items), _) => items.iter().collect(),
        (Json::Object(obj), Some(key)) => match obj.get(key) {
            Some(Json::Array(items)) => items.iter().collect(),
            Some(_) => {
                return Err(DataError::decode(path, format!("'{}' is not an array", key)));
            }
            None => {
                return Err(DataError::decode(path, format!("missing record array '{}'", key)));
            }
        },
        (Json::Object(_), None) => vec![&root],
        _ => {
            return Err(DataError::decode(path, "expected a JSON array or object"));
        }
    };

    let mut columns: IndexMap<String, Vec<Value>> = IndexMap::new();
    for (row_idx, record) in records.iter().enumerate() {
        let obj = record.as_object().ok_or_else(|| {
            DataError::decode(path, format!("record {} is not an object", row_idx))
        })?;

        let mut flat = IndexMap::new();
        flatten_into("", obj, &mut flat);

        for (name, value) in flat {
            let column = columns
                .entry(name)
                .or_insert_with(|| vec![Value::Null; row_idx]);
            column.push(value);
        }

        // Keys absent from this record read as null
        for column in columns.values_mut() {
            if column.len() == row_idx {
                column.push(Value::Null);
            }
        }
    }

    let detector = SchemaDetector::new(config);
    for values in columns.values_mut() {
        promote_dates(values, &detector);
    }

    debug!(
        "Decoded {} records x {} columns from {}",
        records.len(),
        columns.len(),
        path
    );

    TabularDataset::from_columns(columns.into_iter().collect())
}

/// Flatten nested objects into dotted keys
fn flatten_into(prefix: &str, obj: &Map<String, Json>, out: &mut IndexMap<String, Value>) {
    for (key, value) in obj {
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Json::Object(nested) => flatten_into(&name, nested, out),
            other => {
                out.insert(name, json_cell(other));
            }
        }
    }
}

fn json_cell(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Str(b.to_string()),
        Json::Number(n) => match n.as_i64() {
            Some(i) => Value::Int(i),
            None => n.as_f64().map(Value::Float).unwrap_or(Value::Null),
        },
        Json::String(s) => Value::Str(s.clone()),
        Json::Array(_) | Json::Object(_) => Value::Str(value.to_string()),
    }
}

/// Turn a string column into dates when every non-null cell is a date
fn promote_dates(values: &mut [Value], detector: &SchemaDetector<'_>) {
    let mut saw_date = false;
    for value in values.iter() {
        match value {
            Value::Null => {}
            Value::Str(s) if detector.parse_date(s).is_some() => saw_date = true,
            _ => return,
        }
    }

    if !saw_date {
        return;
    }

    for value in values.iter_mut() {
        if let Value::Str(s) = value {
            if let Some(date) = detector.parse_date(s) {
                *value = Value::Date(date);
            }
        }
    }
}
