//! PostgreSQL row marshaling
//!
//! Turns rows of unknown shape into [`QueryRow`] records using the column
//! metadata the engine sent with the result. Values are read by position so
//! repeated column names never shadow each other during decoding.

use crate::database::traits::DatabaseError;
use crate::schema::{format_timestamp, QueryRow};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Number, Value};
use sqlx::postgres::{PgRow, PgValueFormat, Postgres};
use sqlx::types::Uuid;
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};

/// Convert every row of a result set
pub fn marshal_rows(rows: &[PgRow]) -> Result<Vec<QueryRow>, DatabaseError> {
    rows.iter().map(marshal_row).collect()
}

/// Convert a PostgreSQL row to an ordered record
pub fn marshal_row(row: &PgRow) -> Result<QueryRow, DatabaseError> {
    let mut record = QueryRow::with_capacity(row.len());

    for column in row.columns() {
        let value = column_value(row, column.ordinal(), column.type_info().name())?;
        record.insert(column.name(), value);
    }

    Ok(record)
}

fn column_value(row: &PgRow, index: usize, type_name: &str) -> Result<Value, DatabaseError> {
    let value = match type_name {
        "BOOL" => row.try_get::<Option<bool>, _>(index)?.map(Value::Bool),
        "INT2" => row.try_get::<Option<i16>, _>(index)?.map(Value::from),
        "INT4" => row.try_get::<Option<i32>, _>(index)?.map(Value::from),
        "INT8" => row.try_get::<Option<i64>, _>(index)?.map(Value::from),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)?
            .map(|number| float_value(f64::from(number))),
        "FLOAT8" => row.try_get::<Option<f64>, _>(index)?.map(float_value),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
            row.try_get::<Option<String>, _>(index)?.map(Value::String)
        }
        "TIMESTAMPTZ" => typed_or_text(row, index, type_name, |timestamp: DateTime<Utc>| {
            Value::String(format_timestamp(&timestamp))
        })?,
        "TIMESTAMP" => typed_or_text(row, index, type_name, |timestamp: NaiveDateTime| {
            Value::String(timestamp.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        })?,
        "DATE" => typed_or_text(row, index, type_name, |date: NaiveDate| {
            Value::String(date.to_string())
        })?,
        "TIME" => row
            .try_get::<Option<NaiveTime>, _>(index)?
            .map(|time| Value::String(time.to_string())),
        "JSON" | "JSONB" => row.try_get::<Option<Value>, _>(index)?,
        "UUID" => row
            .try_get::<Option<Uuid>, _>(index)?
            .map(|uuid| Value::String(uuid.to_string())),
        "BYTEA" => row
            .try_get::<Option<Vec<u8>>, _>(index)?
            .map(|bytes| Value::String(format!("[BLOB: {} bytes]", bytes.len()))),
        _ => text_fallback(row, index, type_name)?,
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Decode into `T`, or keep the engine's text when `T` cannot hold the value
///
/// `infinity` and BC dates are valid temporal values with no chrono form.
fn typed_or_text<'r, T, F>(
    row: &'r PgRow,
    index: usize,
    type_name: &str,
    convert: F,
) -> Result<Option<Value>, DatabaseError>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
    F: FnOnce(T) -> Value,
{
    match row.try_get::<Option<T>, _>(index) {
        Ok(value) => Ok(value.map(convert)),
        Err(error) => match row.try_get_raw(index)?.format() {
            PgValueFormat::Text => text_fallback(row, index, type_name),
            PgValueFormat::Binary => Err(error.into()),
        },
    }
}

/// NaN and infinities have no JSON number form; use the engine's spelling
fn float_value(number: f64) -> Value {
    if let Some(number) = Number::from_f64(number) {
        return Value::Number(number);
    }
    let text = if number.is_nan() {
        "NaN"
    } else if number.is_sign_positive() {
        "Infinity"
    } else {
        "-Infinity"
    };
    Value::String(text.to_string())
}

/// Types without a dedicated decoder (NUMERIC, INTERVAL, arrays, enums, ...)
///
/// The simple query protocol delivers every value as text, which is exactly
/// the form the engine would print. Binary values have no portable text
/// form, so only their type is reported.
fn text_fallback(row: &PgRow, index: usize, type_name: &str) -> Result<Option<Value>, DatabaseError> {
    let raw = row.try_get_raw(index)?;
    if raw.is_null() {
        return Ok(None);
    }

    match raw.format() {
        PgValueFormat::Text => raw
            .as_str()
            .map(|text| Some(Value::String(text.to_string())))
            .map_err(|error| DatabaseError::Serialization(error.to_string())),
        PgValueFormat::Binary => Ok(Some(Value::String(format!("[{}]", type_name)))),
    }
}
