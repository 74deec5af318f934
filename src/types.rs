use std::fmt;
use std::io::{BufRead, Read};
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::ser::{Serialize, Serializer};
use serde_json::Value as JsonValue;

/// A character large object whose content is only reachable through a stream.
pub trait CharacterLargeObject: fmt::Debug + Send + Sync {
    /// Open a fresh reader over the object's characters.
    ///
    /// # Errors
    /// Returns the driver's I/O failure when the stream cannot be opened.
    fn character_stream(&self) -> std::io::Result<Box<dyn BufRead + '_>>;
}

/// A binary large object whose content is only reachable through a stream.
pub trait BinaryLargeObject: fmt::Debug + Send + Sync {
    /// Length in bytes as reported by the driver.
    ///
    /// # Errors
    /// Returns the driver's I/O failure when the length cannot be read.
    fn length(&self) -> std::io::Result<u64>;

    /// Open a fresh reader over the object's bytes.
    ///
    /// # Errors
    /// Returns the driver's I/O failure when the stream cannot be opened.
    fn binary_stream(&self) -> std::io::Result<Box<dyn Read + '_>>;
}

/// Values that can be stored in a database row or used as query parameters.
///
/// ```rust
/// use sql_pager::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
    /// Character large-object handle, not yet materialised
    Clob(Arc<dyn CharacterLargeObject>),
    /// Binary large-object handle, not yet materialised
    BlobHandle(Arc<dyn BinaryLargeObject>),
}

impl PartialEq for RowValues {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Timestamp(a), Self::Timestamp(b)) => a == b,
            (Self::Null, Self::Null) => true,
            (Self::JSON(a), Self::JSON(b)) => a == b,
            (Self::Blob(a), Self::Blob(b)) => a == b,
            (Self::Clob(a), Self::Clob(b)) => std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b)),
            (Self::BlobHandle(a), Self::BlobHandle(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl RowValues {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Textual form used by scalar coercion; `None` for SQL NULL.
    #[must_use]
    pub fn text_form(&self) -> Option<String> {
        match self {
            RowValues::Null => None,
            RowValues::Int(i) => Some(i.to_string()),
            RowValues::Float(f) => Some(f.to_string()),
            RowValues::Text(s) => Some(s.clone()),
            RowValues::Bool(b) => Some(b.to_string()),
            RowValues::Timestamp(dt) => Some(dt.format("%F %T%.f").to_string()),
            RowValues::JSON(json) => Some(json.to_string()),
            RowValues::Blob(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
            RowValues::Clob(handle) => Some(format!("{handle:?}")),
            RowValues::BlobHandle(handle) => Some(format!("{handle:?}")),
        }
    }
}

impl fmt::Display for RowValues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.text_form() {
            Some(text) => f.write_str(&text),
            None => f.write_str("null"),
        }
    }
}

impl Serialize for RowValues {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RowValues::Int(i) => serializer.serialize_i64(*i),
            RowValues::Float(f) => serializer.serialize_f64(*f),
            RowValues::Text(s) => serializer.serialize_str(s),
            RowValues::Bool(b) => serializer.serialize_bool(*b),
            RowValues::Timestamp(dt) => dt.serialize(serializer),
            RowValues::Null => serializer.serialize_none(),
            RowValues::JSON(json) => json.serialize(serializer),
            RowValues::Blob(bytes) => serializer.serialize_bytes(bytes),
            RowValues::Clob(_) | RowValues::BlobHandle(_) => serializer.serialize_none(),
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_string())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

/// Render parameters the way failures report them: `[1, alice, null]`.
#[must_use]
pub fn render_params(params: Option<&[RowValues]>) -> String {
    match params {
        None => "null".to_string(),
        Some(values) => {
            let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
            format!("[{}]", parts.join(", "))
        }
    }
}
