//! Per-column value processors.
//!
//! A [`Processor`] turns a raw column value into the value stored in a
//! [`crate::row::Row`]. Processors run once, when the row is built. Columns without a processor
//! keep their raw value.
//!
//! All built-in processors pass [`Value::Null`] through untouched.

use std::sync::Arc;

use crate::types::{DataType, Value};

/// Error raised by a processor. It is carried verbatim as the source of
/// [`crate::RowError::Processor`].
pub type ProcessorError = Box<dyn std::error::Error + Send + Sync>;

/// A shared, thread-safe unary value transform.
pub type Processor = Arc<dyn Fn(Value) -> Result<Value, ProcessorError> + Send + Sync>;

/// Wrap a closure as a [`Processor`].
pub fn processor<F>(f: F) -> Processor
where
    F: Fn(Value) -> Result<Value, ProcessorError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Parse text values into `data_type`.
///
/// Rules:
///
/// - Empty (or whitespace-only) text becomes [`Value::Null`].
/// - Values that already have the target type are kept.
/// - `Int64` widens into `Float64`.
/// - Bools accept `true/false/t/f/1/0/yes/no/y/n` (case-insensitive).
pub fn coerce(data_type: DataType) -> Processor {
    processor(move |value| coerce_value(data_type, value))
}

/// Upper-case text values.
pub fn to_upper() -> Processor {
    processor(|value| match value {
        Value::Utf8(s) => Ok(Value::Utf8(s.to_uppercase())),
        Value::Null => Ok(Value::Null),
        other => Err(format!("expected text, got {other}").into()),
    })
}

/// Map integers to bools (`0` is `false`, anything else `true`).
pub fn int_to_bool() -> Processor {
    processor(|value| match value {
        Value::Int64(v) => Ok(Value::Bool(v != 0)),
        Value::Null => Ok(Value::Null),
        other => Err(format!("expected integer, got {other}").into()),
    })
}

fn coerce_value(data_type: DataType, value: Value) -> Result<Value, ProcessorError> {
    if value.data_type() == Some(data_type) || value.is_null() {
        return Ok(value);
    }

    match (data_type, value) {
        (DataType::Float64, Value::Int64(v)) => Ok(Value::Float64(v as f64)),
        (target, Value::Utf8(s)) => parse_text(target, &s),
        (target, other) => Err(format!("cannot coerce {other} to {target:?}").into()),
    }
}

fn parse_text(data_type: DataType, raw: &str) -> Result<Value, ProcessorError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    match data_type {
        DataType::Utf8 => Ok(Value::Utf8(trimmed.to_owned())),
        DataType::Bytes => Ok(Value::Bytes(trimmed.as_bytes().to_vec())),
        DataType::Int64 => Ok(Value::Int64(trimmed.parse::<i64>()?)),
        DataType::Float64 => Ok(Value::Float64(trimmed.parse::<f64>()?)),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool),
    }
}

fn parse_bool(s: &str) -> Result<bool, ProcessorError> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err(format!("expected bool (true/false/1/0/yes/no), got '{s}'").into()),
    }
}
