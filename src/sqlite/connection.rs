use std::fmt;

use crate::driver::{Connection, Cursor, CursorKind, DatabaseMetadata, Statement};
use crate::error::SqlPagerError;
use crate::sqlite::config::SqliteOptions;
use crate::sqlite::params::Params;
use crate::sqlite::query::build_cursor;
use crate::types::RowValues;

/// A single rusqlite connection exposed through the [`Connection`] trait.
///
/// `SQLite` statements only step forward, so query results are read into a
/// [`crate::results::BufferedCursor`] that supports rewinding and absolute seeks.
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    opts: SqliteOptions,
}

impl SqliteConnection {
    pub(crate) fn from_parts(conn: rusqlite::Connection, opts: SqliteOptions) -> Self {
        Self { conn, opts }
    }

    /// Open an in-memory database with default options.
    ///
    /// # Errors
    /// Returns `SqlPagerError::SqliteError` if `SQLite` cannot allocate the database.
    pub fn open_in_memory() -> Result<Self, SqlPagerError> {
        Self::open(SqliteOptions::new(":memory:".into()))
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.opts
    }

    /// Run one or more `;`-separated statements without parameters.
    ///
    /// # Errors
    /// Returns `SqlPagerError::SqliteError` if any statement fails.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SqlPagerError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("opts", &self.opts)
            .finish_non_exhaustive()
    }
}

impl Connection for SqliteConnection {
    fn prepare(
        &self,
        sql: &str,
        kind: CursorKind,
    ) -> Result<Box<dyn Statement + '_>, SqlPagerError> {
        tracing::trace!(sql, ?kind, "sqlite prepare");
        let stmt = self.conn.prepare(sql)?;
        Ok(Box::new(SqliteStatement {
            stmt: Some(stmt),
            params: Params::default(),
            max_rows: None,
        }))
    }

    fn metadata(&self) -> Result<Box<dyn DatabaseMetadata + '_>, SqlPagerError> {
        Ok(Box::new(SqliteMetadata { conn: self }))
    }

    fn data_source_name(&self) -> Option<String> {
        self.opts.source_name.clone()
    }
}

struct SqliteStatement<'conn> {
    // `None` once closed.
    stmt: Option<rusqlite::Statement<'conn>>,
    params: Params,
    max_rows: Option<usize>,
}

fn closed() -> SqlPagerError {
    SqlPagerError::ExecutionError("statement is closed".into())
}

impl Statement for SqliteStatement<'_> {
    fn bind(&mut self, params: &[RowValues]) -> Result<(), SqlPagerError> {
        let expected = self.stmt.as_ref().ok_or_else(closed)?.parameter_count();
        if params.len() != expected {
            return Err(SqlPagerError::ParameterError(format!(
                "statement takes {expected} parameters, {} supplied",
                params.len()
            )));
        }
        self.params = Params::convert(params)?;
        Ok(())
    }

    fn set_max_rows(&mut self, max_rows: usize) {
        self.max_rows = Some(max_rows);
    }

    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>, SqlPagerError> {
        let Self {
            stmt,
            params,
            max_rows,
        } = self;
        let stmt = stmt.as_mut().ok_or_else(closed)?;
        let cursor = build_cursor(stmt, params.as_values(), *max_rows)?;
        Ok(Box::new(cursor))
    }

    fn execute_update(&mut self) -> Result<usize, SqlPagerError> {
        let stmt = self.stmt.as_mut().ok_or_else(closed)?;
        Ok(stmt.execute(rusqlite::params_from_iter(self.params.as_values().iter()))?)
    }

    fn close(&mut self) -> Result<(), SqlPagerError> {
        match self.stmt.take() {
            Some(stmt) => stmt
                .finalize()
                .map_err(|err| SqlPagerError::ResourceClose(err.to_string())),
            None => Ok(()),
        }
    }
}

struct SqliteMetadata<'conn> {
    conn: &'conn SqliteConnection,
}

impl DatabaseMetadata for SqliteMetadata<'_> {
    fn product_name(&self) -> Result<String, SqlPagerError> {
        Ok("SQLite".into())
    }

    fn product_version(&self) -> Result<String, SqlPagerError> {
        Ok(rusqlite::version().to_string())
    }

    fn driver_name(&self) -> Result<String, SqlPagerError> {
        Ok("rusqlite".into())
    }

    fn driver_version(&self) -> Result<String, SqlPagerError> {
        Ok(env!("CARGO_PKG_VERSION").into())
    }

    fn user_name(&self) -> Result<String, SqlPagerError> {
        Ok(String::new())
    }

    fn url(&self) -> Result<String, SqlPagerError> {
        Ok(format!("sqlite:{}", self.conn.opts.db_path))
    }

    fn max_connections(&self) -> Result<u32, SqlPagerError> {
        Ok(1)
    }
}
