//! Cell values and records
//!
//! A [`Record`] is one beneficiary as received from the dashboard: an
//! ordered mapping from trimmed column name to [`CellValue`].

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Number, Value};
use std::fmt;

/// Column carrying the upsert key
pub const ID_COLUMN: &str = "ID";

/// A single scalar cell
///
/// Empty strings are normalized to [`CellValue::Empty`] so that a grid has a
/// single representation of "nothing here".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum CellValue {
    /// No value
    #[default]
    Empty,
    /// Numeric value, kept in its JSON representation
    Number(Number),
    /// Text value
    Text(String),
}

impl CellValue {
    /// Create a text cell (empty text becomes [`CellValue::Empty`])
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }

    /// True for empty cells and whitespace-only text
    #[inline]
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Number(_) => false,
            Self::Text(s) => s.trim().is_empty(),
        }
    }

    /// String form with surrounding whitespace removed
    #[must_use]
    pub fn to_trimmed_string(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.trim().to_string(),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(b) => Self::Text(b.to_string()),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::text(s),
            // nested structures are flattened to their JSON text
            other @ (Value::Array(_) | Value::Object(_)) => Self::Text(other.to_string()),
        }
    }
}

impl From<CellValue> for Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Empty => Value::Null,
            CellValue::Number(n) => Value::Number(n),
            CellValue::Text(s) => Value::String(s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::text(value)
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        Self::Number(Number::from(value))
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        Self::from(i64::from(value))
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Self::Empty, Self::Number)
    }
}

static EMPTY: CellValue = CellValue::Empty;

/// One beneficiary record
///
/// Keys are trimmed on insertion; insertion order is preserved and drives the
/// order in which new columns are appended to the sheet.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Record(IndexMap<String, CellValue>);

impl Record {
    /// Create empty record
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, trimming the key. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<CellValue>) -> Option<CellValue> {
        self.0.insert(key.as_ref().trim().to_string(), value.into())
    }

    /// Builder-style insert
    #[inline]
    #[must_use]
    pub fn with(mut self, key: impl AsRef<str>, value: impl Into<CellValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Field lookup by (trimmed) column name
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.0.get(key.trim())
    }

    /// Field lookup defaulting to an empty cell
    #[inline]
    #[must_use]
    pub fn get_or_empty(&self, key: &str) -> &CellValue {
        self.get(key).unwrap_or(&EMPTY)
    }

    /// Trimmed, non-empty value of the ID field
    #[must_use]
    pub fn id(&self) -> Option<String> {
        let id = self.get_or_empty(ID_COLUMN).to_trimmed_string();
        (!id.is_empty()).then_some(id)
    }

    /// Field names in insertion order
    #[must_use]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Fields in insertion order
    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of fields
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the record has no fields
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<CellValue>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl<'de> Deserialize<'de> for Record {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, CellValue>::deserialize(deserializer)?;
        Ok(raw.into_iter().collect())
    }
}
