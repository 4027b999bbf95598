//! Form validation from per-field rules
//!
//! Runs before any storage call. Uniqueness is not checked here; the
//! database constraint is the only authority for it.

use crate::resource::{Field, FormValues};
use std::fmt;

/// Whether a form creates a new row or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Create,
    Update,
}

/// Why a field was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    Required,
    TooShort,
}

impl Violation {
    pub fn reason(self) -> &'static str {
        match self {
            Violation::Required => "Field is required",
            Violation::TooShort => "Field is too short",
        }
    }
}

/// A rejected form field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Label of the offending field (`Login`, `Slug`, ...)
    pub field: &'static str,
    pub violation: Violation,
}

impl fmt::Display for FieldError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "[Validation error] {}: {}",
            self.field,
            self.violation.reason()
        )
    }
}

/// Check submitted values against the field rules
///
/// Every field is checked so the caller can report all problems at once.
/// A field that fails `required` is not checked for length.
pub fn validate(fields: &[Field], values: &FormValues, mode: WriteMode) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();

    for field in fields {
        let value = values.get(field.name).map(String::as_str).unwrap_or("");

        if value.is_empty() {
            let optional = mode == WriteMode::Update && field.blank_keeps_value;
            if field.required && !optional {
                errors.push(FieldError {
                    field: field.label,
                    violation: Violation::Required,
                });
            }
            continue;
        }

        if let Some(min_length) = field.min_length {
            if value.chars().count() < min_length {
                errors.push(FieldError {
                    field: field.label,
                    violation: Violation::TooShort,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
