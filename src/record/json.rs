//! Conversion of JSON documents into [`RawRecord`] trees.
//!
//! - objects become named records, fields in document order
//! - arrays of numbers (nulls read as missing) become column vectors
//! - arrays of two or more equal-length number arrays become row-major
//!   matrices, one inner array per sample
//! - any other array, including a single-element array wrapping another
//!   array, stays an array of records
//! - strings become text leaves

use serde_json::Value;

use super::{NumericArray, Opaque, RawRecord};

impl From<&Value> for RawRecord {
    fn from(value: &Value) -> Self {
        match value {
            Value::Number(number) => RawRecord::vector(vec![number.as_f64().unwrap_or(f64::NAN)]),
            Value::String(text) => RawRecord::text(text.clone()),
            Value::Object(map) => RawRecord::record(
                map.iter()
                    .map(|(name, value)| (name.clone(), RawRecord::from(value))),
            ),
            Value::Array(items) => array_to_record(items),
            Value::Bool(_) => RawRecord::Opaque(Opaque::Unsupported("bool".to_string())),
            Value::Null => RawRecord::Opaque(Opaque::Unsupported("null".to_string())),
        }
    }
}

impl From<Value> for RawRecord {
    fn from(value: Value) -> Self {
        RawRecord::from(&value)
    }
}

fn array_to_record(items: &[Value]) -> RawRecord {
    if items.is_empty() {
        return RawRecord::vector(Vec::new());
    }
    if let Some(values) = numeric_items(items) {
        return RawRecord::vector(values);
    }
    if items.len() > 1 {
        let rows: Option<Vec<Vec<f64>>> = items
            .iter()
            .map(|item| item.as_array().and_then(|inner| numeric_items(inner)))
            .collect();
        if let Some(array) = rows.as_deref().and_then(NumericArray::from_rows) {
            return RawRecord::NumericArray(array);
        }
    }
    RawRecord::ArrayOfRecord(items.iter().map(RawRecord::from).collect())
}

/// Numbers of a flat array, with nulls as NaN. `None` unless every item is a
/// number or null and at least one is a number.
fn numeric_items(items: &[Value]) -> Option<Vec<f64>> {
    let mut saw_number = false;
    let values = items
        .iter()
        .map(|item| match item {
            Value::Number(number) => {
                saw_number = true;
                number.as_f64()
            }
            Value::Null => Some(f64::NAN),
            _ => None,
        })
        .collect::<Option<Vec<f64>>>()?;
    saw_number.then_some(values)
}
