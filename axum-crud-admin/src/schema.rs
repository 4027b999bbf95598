//! Wire types shared by the SQL tool and the persistence layer
//!
//! Query results have no static shape: every row is rebuilt per query from
//! the engine's column metadata, so a row is an ordered list of
//! column/value pairs rather than a struct.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// One record of a query result, keyed by column name in engine order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRow {
    columns: Vec<(String, Value)>,
}

impl QueryRow {
    /// Create an empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty row with room for `capacity` columns
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            columns: Vec::with_capacity(capacity),
        }
    }

    /// Insert a column value
    ///
    /// A projection may repeat a column name (`select 1, 2` yields two
    /// `?column?` columns). The key keeps its first position and the later
    /// value replaces the earlier one.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.columns.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, slot)) => *slot = value,
            None => self.columns.push((name, value)),
        }
    }

    /// Builder-style variant of [`QueryRow::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value.into());
        self
    }

    /// Look up a column value by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value)
    }

    /// Column names in engine order
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over column/value pairs in engine order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for QueryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl From<QueryRow> for Value {
    fn from(row: QueryRow) -> Self {
        Value::Object(row.columns.into_iter().collect())
    }
}

/// Query parameters accepted by `GET /tools/sql`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SqlToolQuery {
    /// Raw SQL text, executed verbatim
    pub q: Option<String>,
}

/// Body returned by `GET /tools/sql`
///
/// Exactly one of the two shapes is produced per request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ToolResponse {
    /// The statement ran; `q` echoes the original text
    Success { q: String, out: Vec<QueryRow> },

    /// The statement failed; the query text is deliberately absent
    Failure { error: String },
}

/// A value bound to a parameterized write
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Text(String),
    Integer(i64),
    Timestamp(DateTime<Utc>),
}

impl SqlValue {
    /// JSON rendering matching what the row marshaler produces for the
    /// same column type
    pub fn to_json(&self) -> Value {
        match self {
            SqlValue::Text(text) => Value::String(text.clone()),
            SqlValue::Integer(number) => Value::from(*number),
            SqlValue::Timestamp(timestamp) => Value::String(format_timestamp(timestamp)),
        }
    }
}

/// Column assignments for an insert or update, in statement order
pub type Changes = Vec<(&'static str, SqlValue)>;

/// Render a timestamp the way query results expose it
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
