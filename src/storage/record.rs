//! Record model
//!
//! A record is a flat mapping from bare field name to a numeric or textual
//! value. Records are immutable once loaded and are shared read-only by
//! every query that runs against their dataset.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::errors::{StoreError, StoreResult};

/// A single field value
#[derive(Debug, Clone)]
pub enum FieldValue {
    /// Numeric value; never NaN when read from JSON
    Number(f64),
    /// Textual value
    Text(String),
}

impl FieldValue {
    /// Returns the numeric value, if numeric
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(_) => None,
        }
    }

    /// Returns the string value, if textual
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Number(_) => None,
            FieldValue::Text(s) => Some(s),
        }
    }

    /// Natural ordering: numeric for numbers, lexical for text.
    ///
    /// Mixed kinds order numbers before text.
    pub fn compare(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => {
                a.partial_cmp(b).unwrap_or(Ordering::Equal)
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => a.cmp(b),
            (FieldValue::Number(_), FieldValue::Text(_)) => Ordering::Less,
            (FieldValue::Text(_), FieldValue::Number(_)) => Ordering::Greater,
        }
    }

    /// Converts to a JSON value, emitting integral numbers as integers
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Number(n) => number_to_json(*n),
            FieldValue::Text(s) => Value::String(s.clone()),
        }
    }

    /// Reads a JSON scalar. Only numbers and strings are field values.
    pub fn from_json(value: &Value) -> Option<FieldValue> {
        match value {
            Value::Number(n) => n.as_f64().map(FieldValue::Number),
            Value::String(s) => Some(FieldValue::Text(s.clone())),
            _ => None,
        }
    }

    // -0.0 and 0.0 compare equal, so they must hash equal too
    fn number_bits(n: f64) -> u64 {
        if n == 0.0 {
            0.0f64.to_bits()
        } else {
            n.to_bits()
        }
    }
}

fn number_to_json(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < 9.007_199_254_740_992e15 {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Strict value-and-kind equality: `60` never equals `"60"`.
impl PartialEq for FieldValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldValue::Number(a), FieldValue::Number(b)) => {
                Self::number_bits(*a) == Self::number_bits(*b)
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldValue {}

impl Hash for FieldValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            FieldValue::Number(n) => {
                0u8.hash(state);
                Self::number_bits(*n).hash(state);
            }
            FieldValue::Text(s) => {
                1u8.hash(state);
                s.hash(state);
            }
        }
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        FieldValue::from_json(&value).ok_or_else(|| {
            serde::de::Error::custom(format!(
                "field values must be numbers or strings, got {}",
                value
            ))
        })
    }
}

/// A flat record keyed by bare field name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    /// Creates an empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field (builder style)
    pub fn with(mut self, field: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.insert(field, value);
        self
    }

    /// Inserts or replaces a field
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<FieldValue>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Returns a field value
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    /// Returns a numeric field value
    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).and_then(FieldValue::as_number)
    }

    /// Returns a textual field value
    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    /// Returns the number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates fields in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Builds a record from a JSON object, normalizing keys.
    ///
    /// A key of the form `<dataset_id>_<field>` is stored as `<field>`;
    /// bare keys are kept as they are. Values must be numbers or strings.
    pub fn from_json(value: &Value, dataset_id: &str) -> StoreResult<Record> {
        let object = value.as_object().ok_or_else(|| {
            StoreError::InvalidRecord(format!("record must be a JSON object, got {}", value))
        })?;

        let prefix = format!("{}_", dataset_id);
        let mut record = Record::new();
        for (key, raw) in object {
            let field = key.strip_prefix(&prefix).unwrap_or(key);
            let field_value = FieldValue::from_json(raw).ok_or_else(|| {
                StoreError::InvalidRecord(format!(
                    "field '{}' must be a number or a string, got {}",
                    key, raw
                ))
            })?;
            record.insert(field, field_value);
        }
        Ok(record)
    }
}
