use std::sync::Arc;

use rusqlite::types::Value;

use crate::error::SqlPagerError;
use crate::results::BufferedCursor;
use crate::types::RowValues;

/// Extract a `RowValues` from a `SQLite` row.
///
/// # Errors
/// Returns `SqlPagerError::SqliteError` if the value cannot be read.
pub fn sqlite_extract_value(row: &rusqlite::Row, idx: usize) -> Result<RowValues, SqlPagerError> {
    let value: Value = row.get(idx)?;
    Ok(match value {
        Value::Null => RowValues::Null,
        Value::Integer(i) => RowValues::Int(i),
        Value::Real(f) => RowValues::Float(f),
        Value::Text(s) => RowValues::Text(s),
        Value::Blob(b) => RowValues::Blob(b),
    })
}

/// Run a query and read its rows into a scrollable buffer, stopping after `max_rows`.
///
/// # Errors
/// Returns `SqlPagerError::SqliteError` if execution or row reading fails.
pub fn build_cursor(
    stmt: &mut rusqlite::Statement<'_>,
    params: &[Value],
    max_rows: Option<usize>,
) -> Result<BufferedCursor, SqlPagerError> {
    let column_names: Arc<Vec<String>> = Arc::new(
        stmt.column_names()
            .iter()
            .map(std::string::ToString::to_string)
            .collect(),
    );
    let width = column_names.len();
    let mut cursor = BufferedCursor::with_capacity(column_names, max_rows.unwrap_or(16).min(1024));
    if max_rows == Some(0) {
        return Ok(cursor);
    }

    let mut rows = stmt.query(rusqlite::params_from_iter(params.iter()))?;
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(width);
        for idx in 0..width {
            values.push(sqlite_extract_value(row, idx)?);
        }
        cursor.push_row(values);
        if max_rows.is_some_and(|max| cursor.row_count() >= max) {
            break;
        }
    }
    Ok(cursor)
}
