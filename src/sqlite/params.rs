use rusqlite::types::Value;

use crate::error::SqlPagerError;
use crate::lob;
use crate::types::RowValues;

/// Convert a single `RowValues` to a rusqlite `Value`.
///
/// Large-object handles are read into memory first.
///
/// # Errors
/// Returns `SqlPagerError::ParameterError` when a large object cannot be read.
pub fn row_value_to_sqlite_value(value: &RowValues) -> Result<Value, SqlPagerError> {
    let converted = match value {
        RowValues::Int(i) => Value::Integer(*i),
        RowValues::Float(f) => Value::Real(*f),
        RowValues::Text(s) => Value::Text(s.clone()),
        RowValues::Bool(b) => Value::Integer(i64::from(*b)),
        RowValues::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        RowValues::Null => Value::Null,
        RowValues::JSON(jval) => Value::Text(jval.to_string()),
        RowValues::Blob(bytes) => Value::Blob(bytes.clone()),
        RowValues::Clob(_) | RowValues::BlobHandle(_) => match lob::normalize(value.clone()) {
            RowValues::Text(s) => Value::Text(s),
            RowValues::Blob(bytes) => Value::Blob(bytes),
            _ => {
                return Err(SqlPagerError::ParameterError(
                    "large object parameter could not be read".into(),
                ));
            }
        },
    };
    Ok(converted)
}

/// Positional `SQLite` parameters.
#[derive(Debug, Clone, Default)]
pub struct Params(pub Vec<Value>);

impl Params {
    /// # Errors
    /// Returns `SqlPagerError::ParameterError` if any parameter cannot be converted.
    pub fn convert(params: &[RowValues]) -> Result<Self, SqlPagerError> {
        params
            .iter()
            .map(row_value_to_sqlite_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Params)
    }

    #[must_use]
    pub fn as_values(&self) -> &[Value] {
        &self.0
    }
}
