//! Managed resource types
//!
//! A resource describes one table: its columns as form fields with
//! validation rules, and how a stored row reads back as a typed record.
//! The CRUD service and the HTTP handlers are generic over [`Resource`].

use crate::database::DatabaseError;
use crate::schema::QueryRow;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;

pub mod page;
pub mod user;

pub use page::Page;
pub use user::User;

/// Submitted form data, keyed by field name
pub type FormValues = HashMap<String, String>;

/// How a field is rendered and persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    TextArea,
    /// Stored as a one-way hash and never rendered back
    Password,
}

/// A writable column
#[derive(Debug, Clone, Copy)]
pub struct Field {
    /// Column and form field name
    pub name: &'static str,

    /// Human-facing name used in labels and validation messages
    pub label: &'static str,

    pub input: InputKind,
    pub required: bool,
    pub min_length: Option<usize>,

    /// On update, a blank value leaves the stored value untouched
    pub blank_keeps_value: bool,
}

impl Field {
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            input: InputKind::Text,
            required: true,
            min_length: None,
            blank_keeps_value: false,
        }
    }

    pub const fn textarea(name: &'static str, label: &'static str) -> Self {
        Self {
            input: InputKind::TextArea,
            ..Self::text(name, label)
        }
    }

    pub const fn password(name: &'static str, label: &'static str) -> Self {
        Self {
            input: InputKind::Password,
            blank_keeps_value: true,
            ..Self::text(name, label)
        }
    }

    pub const fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }
}

/// A table managed through the generic CRUD handlers
pub trait Resource: DeserializeOwned + Serialize + Send + Sync + 'static {
    /// Table name
    const TABLE: &'static str;

    /// Singular display name (`Page`)
    const NAME: &'static str;

    /// Plural display name (`Pages`)
    const PLURAL: &'static str;

    /// URL segment under `/admin` (`pages`)
    const COLLECTION: &'static str;

    /// Writable columns in form order; the first one identifies a row to
    /// humans and must be unique
    const FIELDS: &'static [Field];

    fn id(&self) -> i64;

    /// Human identifier (slug, login)
    fn label(&self) -> &str;

    /// Read a stored row
    fn from_row(row: QueryRow) -> Result<Self, DatabaseError> {
        Ok(serde_json::from_value(Value::from(row))?)
    }

    /// Current values for the edit form; password inputs stay blank
    fn form_values(&self) -> FormValues {
        let stored = serde_json::to_value(self).unwrap_or(Value::Null);
        Self::FIELDS
            .iter()
            .map(|field| {
                let value = match field.input {
                    InputKind::Password => String::new(),
                    _ => stored
                        .get(field.name)
                        .and_then(Value::as_str)
                        .unwrap_or_default()
                        .to_string(),
                };
                (field.name.to_string(), value)
            })
            .collect()
    }

    fn index_path() -> String {
        format!("/admin/{}", Self::COLLECTION)
    }

    fn show_path(id: i64) -> String {
        format!("/admin/{}/{}", Self::COLLECTION, id)
    }
}
