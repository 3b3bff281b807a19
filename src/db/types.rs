//! Database-agnostic values and rows.
//!
//! Records never see driver rows directly. Each backend row is decoded once
//! into a [`Row`] of [`Value`]s, and records read their fields from it by
//! column name through [`FromValue`]. Writing goes the other way through
//! [`ToValue`].
//!
//! # Architecture
//!
//! Decoding uses a two-phase approach:
//! 1. `TypeCategory` classifies column types into logical categories
//! 2. Database-specific decoders handle the actual value extraction

use crate::error::{DbError, DbResult};
use crate::models::DatabaseType;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Json;
use sqlx::{Column, Row as _, TypeInfo};

// =============================================================================
// Values
// =============================================================================

/// A single bound parameter or decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
    Json(JsonValue),
    Timestamp(DateTime<Utc>),
}

impl Value {
    /// Get the type name of this value for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Json(_) => "json",
            Self::Timestamp(_) => "timestamp",
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<JsonValue> for Value {
    fn from(v: JsonValue) -> Self {
        Self::Json(v)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

// =============================================================================
// Field Conversions
// =============================================================================

/// Converts a record field into a bindable value.
pub trait ToValue {
    fn to_value(&self) -> DbResult<Value>;
}

/// Converts a decoded column value back into a record field.
///
/// The error is a plain description; [`Row::get`] attaches the column name.
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, String>;
}

fn mismatch(expected: &str, value: &Value) -> String {
    format!("expected {expected}, found {}", value.type_name())
}

macro_rules! impl_to_value_copy {
    ($($ty:ty),+) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> DbResult<Value> {
                    Ok(Value::from(*self))
                }
            }
        )+
    };
}

impl_to_value_copy!(bool, i32, i64, f64, DateTime<Utc>);

impl ToValue for String {
    fn to_value(&self) -> DbResult<Value> {
        Ok(Value::String(self.clone()))
    }
}

impl ToValue for Vec<u8> {
    fn to_value(&self) -> DbResult<Value> {
        Ok(Value::Bytes(self.clone()))
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> DbResult<Value> {
        match self {
            Some(v) => v.to_value(),
            None => Ok(Value::Null),
        }
    }
}

impl<T: Serialize> ToValue for Json<T> {
    fn to_value(&self) -> DbResult<Value> {
        Ok(Value::Json(serde_json::to_value(&self.0)?))
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Int(v) => Ok(v),
            other => Err(mismatch("int", &other)),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> Result<Self, String> {
        let v = i64::from_value(value)?;
        i32::try_from(v).map_err(|_| format!("integer {v} out of range for i32"))
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bool(v) => Ok(v),
            // SQLite stores booleans as 0/1
            Value::Int(v) => Ok(v != 0),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Int(v) => Ok(v as f64),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::String(v) => Ok(v),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(mismatch("bytes", &other)),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Timestamp(v) => Ok(v),
            Value::String(s) => parse_timestamp(&s),
            other => Err(mismatch("timestamp", &other)),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: DeserializeOwned> FromValue for Json<T> {
    fn from_value(value: Value) -> Result<Self, String> {
        let parsed = match value {
            Value::Json(v) => serde_json::from_value(v),
            // Text-backed JSON columns (SQLite)
            Value::String(s) => serde_json::from_str(&s),
            other => return Err(mismatch("json", &other)),
        };
        parsed.map(Json).map_err(|e| format!("invalid JSON: {e}"))
    }
}

/// Parse the textual timestamp forms SQLite hands back.
fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("invalid timestamp '{s}'"))
}

// =============================================================================
// Rows
// =============================================================================

/// A decoded result row: column names with their values, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Raw value of a column, if present.
    pub fn value(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }

    /// Read a column as a typed field.
    pub fn get<T: FromValue>(&self, column: &str) -> DbResult<T> {
        let value = self.value(column).ok_or_else(|| {
            DbError::binding(
                format!("result has no column named '{column}'"),
                Some(column),
            )
        })?;
        T::from_value(value.clone())
            .map_err(|e| DbError::binding(format!("column '{column}': {e}"), Some(column)))
    }
}

/// Conversion from driver rows into [`Row`].
pub trait IntoRow {
    fn into_row(&self) -> DbResult<Row>;
}

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for database column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    Integer,
    Float,
    Boolean,
    Text,
    Binary,
    Json,
    Timestamp,
    Unknown,
}

/// Classify a database type name into a logical category.
pub fn categorize_type(type_name: &str, db: DatabaseType) -> TypeCategory {
    let lower = type_name.to_lowercase();

    // SQLite's NUMERIC is actually a float
    if lower.contains("decimal") || lower.contains("numeric") {
        return if db == DatabaseType::SQLite {
            TypeCategory::Float
        } else {
            TypeCategory::Unknown
        };
    }

    if lower.contains("int") || lower.contains("serial") {
        return TypeCategory::Integer;
    }

    if lower == "bool" || lower == "boolean" {
        return TypeCategory::Boolean;
    }

    if lower.contains("float")
        || lower.contains("double")
        || lower == "real"
        || lower == "float4"
        || lower == "float8"
    {
        return TypeCategory::Float;
    }

    if lower == "json" || lower == "jsonb" {
        return TypeCategory::Json;
    }

    if lower.starts_with("timestamp") || lower == "datetime" {
        return TypeCategory::Timestamp;
    }

    if lower.contains("blob") || lower == "bytea" {
        return TypeCategory::Binary;
    }

    if lower.contains("char") || lower.contains("text") || lower == "name" {
        return TypeCategory::Text;
    }

    TypeCategory::Unknown
}

impl IntoRow for PgRow {
    fn into_row(&self) -> DbResult<Row> {
        let mut columns = Vec::with_capacity(self.len());
        let mut values = Vec::with_capacity(self.len());
        for (idx, col) in self.columns().iter().enumerate() {
            let category = categorize_type(col.type_info().name(), DatabaseType::PostgreSQL);
            values.push(postgres::decode_column(self, idx, category)?);
            columns.push(col.name().to_string());
        }
        Ok(Row::new(columns, values))
    }
}

impl IntoRow for SqliteRow {
    fn into_row(&self) -> DbResult<Row> {
        let mut columns = Vec::with_capacity(self.len());
        let mut values = Vec::with_capacity(self.len());
        for (idx, col) in self.columns().iter().enumerate() {
            let category = categorize_type(col.type_info().name(), DatabaseType::SQLite);
            values.push(sqlite::decode_column(self, idx, category)?);
            columns.push(col.name().to_string());
        }
        Ok(Row::new(columns, values))
    }
}

// =============================================================================
// Database-Specific Decoders
// =============================================================================

fn or_null<T>(decoded: Option<T>, wrap: impl FnOnce(T) -> Value) -> Value {
    decoded.map(wrap).unwrap_or(Value::Null)
}

mod postgres {
    use super::*;

    pub fn decode_column(row: &PgRow, idx: usize, category: TypeCategory) -> DbResult<Value> {
        match category {
            TypeCategory::Integer => decode_integer(row, idx),
            TypeCategory::Boolean => Ok(or_null(row.try_get::<Option<bool>, _>(idx)?, Value::Bool)),
            TypeCategory::Float => decode_float(row, idx),
            TypeCategory::Binary => Ok(or_null(row.try_get::<Option<Vec<u8>>, _>(idx)?, Value::Bytes)),
            TypeCategory::Json => Ok(or_null(
                row.try_get::<Option<JsonValue>, _>(idx)?,
                Value::Json,
            )),
            TypeCategory::Timestamp => decode_timestamp(row, idx),
            TypeCategory::Text | TypeCategory::Unknown => {
                Ok(or_null(row.try_get::<Option<String>, _>(idx)?, Value::String))
            }
        }
    }

    fn decode_integer(row: &PgRow, idx: usize) -> DbResult<Value> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Ok(or_null(v, Value::Int));
        }
        if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
            return Ok(or_null(v, |v| Value::Int(v.into())));
        }
        let v = row.try_get::<Option<i16>, _>(idx)?;
        Ok(or_null(v, |v| Value::Int(v.into())))
    }

    fn decode_float(row: &PgRow, idx: usize) -> DbResult<Value> {
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Ok(or_null(v, Value::Float));
        }
        let v = row.try_get::<Option<f32>, _>(idx)?;
        Ok(or_null(v, |v| Value::Float(v.into())))
    }

    fn decode_timestamp(row: &PgRow, idx: usize) -> DbResult<Value> {
        // TIMESTAMPTZ decodes directly, plain TIMESTAMP is taken as UTC
        if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
            return Ok(or_null(v, Value::Timestamp));
        }
        let v = row.try_get::<Option<NaiveDateTime>, _>(idx)?;
        Ok(or_null(v, |v| Value::Timestamp(v.and_utc())))
    }
}

mod sqlite {
    use super::*;

    pub fn decode_column(row: &SqliteRow, idx: usize, category: TypeCategory) -> DbResult<Value> {
        match category {
            TypeCategory::Integer => Ok(or_null(row.try_get::<Option<i64>, _>(idx)?, Value::Int)),
            TypeCategory::Boolean => Ok(or_null(row.try_get::<Option<bool>, _>(idx)?, Value::Bool)),
            TypeCategory::Float => Ok(or_null(row.try_get::<Option<f64>, _>(idx)?, Value::Float)),
            TypeCategory::Binary => Ok(or_null(row.try_get::<Option<Vec<u8>>, _>(idx)?, Value::Bytes)),
            TypeCategory::Timestamp => decode_timestamp(row, idx),
            // JSON columns are text in SQLite; FromValue parses them
            TypeCategory::Json | TypeCategory::Text => {
                Ok(or_null(row.try_get::<Option<String>, _>(idx)?, Value::String))
            }
            TypeCategory::Unknown => decode_dynamic(row, idx),
        }
    }

    fn decode_timestamp(row: &SqliteRow, idx: usize) -> DbResult<Value> {
        if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
            return Ok(or_null(v, Value::Timestamp));
        }
        Ok(or_null(row.try_get::<Option<String>, _>(idx)?, Value::String))
    }

    /// Columns without a declared type (expressions, untyped tables) are
    /// decoded by their runtime storage class.
    fn decode_dynamic(row: &SqliteRow, idx: usize) -> DbResult<Value> {
        if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
            return Ok(or_null(v, Value::Int));
        }
        if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
            return Ok(or_null(v, Value::Float));
        }
        if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
            return Ok(or_null(v, Value::String));
        }
        Ok(or_null(row.try_get::<Option<Vec<u8>>, _>(idx)?, Value::Bytes))
    }
}
