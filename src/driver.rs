//! The query-execution capability this crate runs on.
//!
//! A backend (see [`crate::sqlite`]) implements these traits; everything else in the crate
//! only talks to them. Indices are zero-based except [`Cursor::absolute`], which follows
//! the usual one-based row numbering.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::error::SqlPagerError;
use crate::types::RowValues;

/// Cursor capabilities requested when a statement is prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorKind {
    /// Rows are read once, in order.
    #[default]
    ForwardOnly,
    /// The cursor can rewind and seek to absolute positions.
    Scrollable,
}

/// A live database connection.
pub trait Connection {
    /// Prepare `sql` for execution.
    ///
    /// # Errors
    /// Returns the backend's error when the statement cannot be prepared.
    fn prepare(&self, sql: &str, kind: CursorKind)
    -> Result<Box<dyn Statement + '_>, SqlPagerError>;

    /// Metadata describing the server behind this connection.
    ///
    /// # Errors
    /// Returns the backend's error when metadata is unavailable.
    fn metadata(&self) -> Result<Box<dyn DatabaseMetadata + '_>, SqlPagerError>;

    /// Name of the configured data source this connection came from, if it has one.
    fn data_source_name(&self) -> Option<String> {
        None
    }
}

/// A prepared statement.
pub trait Statement {
    /// Bind positional parameters, replacing any earlier bindings.
    ///
    /// # Errors
    /// Returns `SqlPagerError::ParameterError` or a backend error when binding fails.
    fn bind(&mut self, params: &[RowValues]) -> Result<(), SqlPagerError>;

    /// Cap the number of rows any cursor from this statement will yield.
    fn set_max_rows(&mut self, max_rows: usize);

    /// # Errors
    /// Returns the backend's error when execution fails.
    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>, SqlPagerError>;

    /// # Errors
    /// Returns the backend's error when execution fails.
    fn execute_update(&mut self) -> Result<usize, SqlPagerError>;

    /// Release the statement. Closing twice is a no-op.
    ///
    /// # Errors
    /// Returns `SqlPagerError::ResourceClose` when the backend refuses to release it.
    fn close(&mut self) -> Result<(), SqlPagerError>;
}

/// A result cursor positioned before its first row when returned.
pub trait Cursor {
    /// Advance to the next row; `false` once the rows are exhausted.
    ///
    /// # Errors
    /// Returns the backend's error when the next row cannot be fetched.
    fn next(&mut self) -> Result<bool, SqlPagerError>;

    /// Value of column `index` on the current row.
    ///
    /// # Errors
    /// Returns `SqlPagerError::ExecutionError` when no row is current or the index is out of range.
    fn get(&self, index: usize) -> Result<RowValues, SqlPagerError>;

    /// Column names, in select-list order.
    fn column_names(&self) -> Arc<Vec<String>>;

    /// Move back before the first row.
    ///
    /// # Errors
    /// Returns `SqlPagerError::ExecutionError` on cursors that cannot scroll.
    fn before_first(&mut self) -> Result<(), SqlPagerError>;

    /// Position on row `row` (one-based; `0` means before the first row).
    /// Returns whether the cursor now sits on a row.
    ///
    /// # Errors
    /// Returns `SqlPagerError::ExecutionError` on cursors that cannot scroll.
    fn absolute(&mut self, row: usize) -> Result<bool, SqlPagerError>;

    /// Release the cursor. Closing twice is a no-op.
    ///
    /// # Errors
    /// Returns `SqlPagerError::ResourceClose` when the backend refuses to release it.
    fn close(&mut self) -> Result<(), SqlPagerError>;

    /// Value of the named column on the current row, matched case-insensitively.
    ///
    /// # Errors
    /// Returns `SqlPagerError::ExecutionError` when the column does not exist.
    fn get_by_name(&self, name: &str) -> Result<RowValues, SqlPagerError> {
        let names = self.column_names();
        let index = names
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .ok_or_else(|| SqlPagerError::ExecutionError(format!("no such column: {name}")))?;
        self.get(index)
    }
}

/// Server and driver facts exposed by a connection.
pub trait DatabaseMetadata {
    /// # Errors
    /// Returns the backend's error when the field cannot be read.
    fn product_name(&self) -> Result<String, SqlPagerError>;
    /// # Errors
    /// Returns the backend's error when the field cannot be read.
    fn product_version(&self) -> Result<String, SqlPagerError>;
    /// # Errors
    /// Returns the backend's error when the field cannot be read.
    fn driver_name(&self) -> Result<String, SqlPagerError>;
    /// # Errors
    /// Returns the backend's error when the field cannot be read.
    fn driver_version(&self) -> Result<String, SqlPagerError>;
    /// # Errors
    /// Returns the backend's error when the field cannot be read.
    fn user_name(&self) -> Result<String, SqlPagerError>;
    /// # Errors
    /// Returns the backend's error when the field cannot be read.
    fn url(&self) -> Result<String, SqlPagerError>;
    /// # Errors
    /// Returns the backend's error when the field cannot be read.
    fn max_connections(&self) -> Result<u32, SqlPagerError>;
}

/// Anything holding a driver resource that must be released.
pub trait Closeable {
    const KIND: &'static str;

    /// # Errors
    /// Returns `SqlPagerError::ResourceClose` when the resource cannot be released.
    fn close_resource(&mut self) -> Result<(), SqlPagerError>;
}

impl Closeable for Box<dyn Statement + '_> {
    const KIND: &'static str = "statement";

    fn close_resource(&mut self) -> Result<(), SqlPagerError> {
        self.close()
    }
}

impl Closeable for Box<dyn Cursor + '_> {
    const KIND: &'static str = "cursor";

    fn close_resource(&mut self) -> Result<(), SqlPagerError> {
        self.close()
    }
}

/// Close a resource, logging instead of returning any failure.
pub fn close_quietly<T: Closeable>(resource: &mut T) {
    if let Err(err) = resource.close_resource() {
        tracing::warn!(resource = T::KIND, error = %err, "ignoring close failure");
    }
}

/// Owns a statement or cursor and closes it when dropped.
///
/// Dropping happens on every exit path, so a failing handler or `?` never leaks the
/// resource, and a close failure never replaces the error already propagating.
pub struct Scoped<T: Closeable>(T);

impl<T: Closeable> Scoped<T> {
    pub fn new(resource: T) -> Self {
        Self(resource)
    }
}

impl<T: Closeable> Deref for Scoped<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Closeable> DerefMut for Scoped<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Closeable> Drop for Scoped<T> {
    fn drop(&mut self) {
        close_quietly(&mut self.0);
    }
}
