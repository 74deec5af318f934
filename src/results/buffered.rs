use std::sync::Arc;

use crate::driver::Cursor;
use crate::error::SqlPagerError;
use crate::types::RowValues;

/// A fully materialised result that scrolls like a scroll-insensitive cursor.
///
/// Backends whose native cursors only move forward read their rows into one of these.
#[derive(Debug, Clone, Default)]
pub struct BufferedCursor {
    column_names: Arc<Vec<String>>,
    rows: Vec<Vec<RowValues>>,
    // 0 = before first, rows.len() + 1 = after last
    position: usize,
    closed: bool,
}

impl BufferedCursor {
    #[must_use]
    pub fn new(column_names: Arc<Vec<String>>, rows: Vec<Vec<RowValues>>) -> Self {
        Self {
            column_names,
            rows,
            position: 0,
            closed: false,
        }
    }

    /// Start an empty buffer with known columns; used while rows are still being read.
    #[must_use]
    pub fn with_capacity(column_names: Arc<Vec<String>>, capacity: usize) -> Self {
        Self::new(column_names, Vec::with_capacity(capacity))
    }

    pub fn push_row(&mut self, row: Vec<RowValues>) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn ensure_open(&self) -> Result<(), SqlPagerError> {
        if self.closed {
            Err(SqlPagerError::ExecutionError("cursor is closed".to_string()))
        } else {
            Ok(())
        }
    }
}

impl Cursor for BufferedCursor {
    fn next(&mut self) -> Result<bool, SqlPagerError> {
        self.ensure_open()?;
        if self.position <= self.rows.len() {
            self.position += 1;
        }
        Ok(self.position <= self.rows.len())
    }

    fn get(&self, index: usize) -> Result<RowValues, SqlPagerError> {
        self.ensure_open()?;
        let row = self
            .position
            .checked_sub(1)
            .and_then(|i| self.rows.get(i))
            .ok_or_else(|| SqlPagerError::ExecutionError("cursor is not on a row".to_string()))?;
        row.get(index).cloned().ok_or_else(|| {
            SqlPagerError::ExecutionError(format!(
                "column index {index} out of range ({} columns)",
                row.len()
            ))
        })
    }

    fn column_names(&self) -> Arc<Vec<String>> {
        Arc::clone(&self.column_names)
    }

    fn before_first(&mut self) -> Result<(), SqlPagerError> {
        self.ensure_open()?;
        self.position = 0;
        Ok(())
    }

    fn absolute(&mut self, row: usize) -> Result<bool, SqlPagerError> {
        self.ensure_open()?;
        self.position = row.min(self.rows.len() + 1);
        Ok(self.position >= 1 && self.position <= self.rows.len())
    }

    fn close(&mut self) -> Result<(), SqlPagerError> {
        self.closed = true;
        self.rows.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(n: i64) -> BufferedCursor {
        let rows = (0..n).map(|i| vec![RowValues::Int(i)]).collect();
        BufferedCursor::new(Arc::new(vec!["id".to_string()]), rows)
    }

    #[test]
    fn walks_forward_and_stops() {
        let mut c = cursor(2);
        assert!(c.get(0).is_err());
        assert!(c.next().unwrap());
        assert_eq!(c.get(0).unwrap(), RowValues::Int(0));
        assert!(c.next().unwrap());
        assert!(!c.next().unwrap());
        assert!(!c.next().unwrap());
        assert!(c.get(0).is_err());
    }

    #[test]
    fn rewinds_and_seeks() {
        let mut c = cursor(5);
        c.next().unwrap();
        c.before_first().unwrap();
        assert!(c.next().unwrap());
        assert_eq!(c.get(0).unwrap(), RowValues::Int(0));

        assert!(c.absolute(3).unwrap());
        assert_eq!(c.get(0).unwrap(), RowValues::Int(2));
        assert!(c.next().unwrap());
        assert_eq!(c.get(0).unwrap(), RowValues::Int(3));

        assert!(!c.absolute(9).unwrap());
        assert!(!c.next().unwrap());
        assert!(!c.absolute(0).unwrap());
        assert!(c.next().unwrap());
        assert_eq!(c.get_by_name("ID").unwrap(), RowValues::Int(0));
    }

    #[test]
    fn closed_cursor_rejects_reads() {
        let mut c = cursor(1);
        c.close().unwrap();
        c.close().unwrap();
        assert!(c.next().is_err());
    }
}
