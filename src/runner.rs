//! Plain (unwindowed) statement execution with result projection.

use crate::driver::{Connection, CursorKind, Scoped, Statement};
use crate::error::SqlPagerError;
use crate::projector::{Projected, RowProjector, RowShape};
use crate::results::KeyCase;
use crate::types::{RowValues, render_params};

/// Options shared by every statement a runner executes.
///
/// ```rust
/// use sql_pager::prelude::*;
///
/// let options = RunnerOptions::default()
///     .with_key_case(KeyCase::Lower)
///     .with_empty_string_as_null(false);
/// # let _ = options;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerOptions {
    /// Bind empty text parameters as SQL NULL.
    pub empty_string_as_null: bool,
    /// Casing applied to column names in map rows.
    pub key_case: KeyCase,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            empty_string_as_null: true,
            key_case: KeyCase::Preserve,
        }
    }
}

impl RunnerOptions {
    #[must_use]
    pub fn with_empty_string_as_null(mut self, enabled: bool) -> Self {
        self.empty_string_as_null = enabled;
        self
    }

    #[must_use]
    pub fn with_key_case(mut self, key_case: KeyCase) -> Self {
        self.key_case = key_case;
        self
    }
}

/// Executes statements against a [`Connection`], closing everything it opens.
///
/// Failures come back as `SqlPagerError::QueryFailed` carrying the SQL text and the
/// rendered parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryRunner {
    options: RunnerOptions,
}

impl QueryRunner {
    #[must_use]
    pub fn new(options: RunnerOptions) -> Self {
        Self { options }
    }

    #[must_use]
    pub fn options(&self) -> RunnerOptions {
        self.options
    }

    #[must_use]
    pub fn projector(&self) -> RowProjector {
        RowProjector::new(self.options.key_case)
    }

    /// Bind `params` to `stmt`. `None` leaves the statement unbound.
    ///
    /// # Errors
    /// Returns the statement's binding error.
    pub fn fill_statement(
        &self,
        stmt: &mut dyn Statement,
        params: Option<&[RowValues]>,
    ) -> Result<(), SqlPagerError> {
        let Some(params) = params else {
            return Ok(());
        };
        if !self.options.empty_string_as_null {
            return stmt.bind(params);
        }
        let bound: Vec<RowValues> = params
            .iter()
            .map(|p| match p {
                RowValues::Text(s) if s.is_empty() => RowValues::Null,
                other => other.clone(),
            })
            .collect();
        stmt.bind(&bound)
    }

    /// Run a query and project its rows into `shape`.
    ///
    /// # Errors
    /// Returns `SqlPagerError::QueryFailed` wrapping the underlying failure.
    pub fn query<T: Default>(
        &self,
        conn: &dyn Connection,
        sql: &str,
        params: Option<&[RowValues]>,
        shape: &RowShape<T>,
    ) -> Result<Projected<T>, SqlPagerError> {
        tracing::debug!(sql, params = %render_params(params), "query");
        self.run_query(conn, sql, params, shape)
            .map_err(|err| err.in_query(sql, params))
    }

    fn run_query<T: Default>(
        &self,
        conn: &dyn Connection,
        sql: &str,
        params: Option<&[RowValues]>,
        shape: &RowShape<T>,
    ) -> Result<Projected<T>, SqlPagerError> {
        let mut stmt = Scoped::new(conn.prepare(sql, CursorKind::ForwardOnly)?);
        self.fill_statement(&mut **stmt, params)?;
        let mut cursor = Scoped::new(stmt.execute_query()?);
        self.projector().project(&mut **cursor, shape)
    }

    /// Execute an INSERT/UPDATE/DELETE and return the affected row count.
    ///
    /// # Errors
    /// Returns `SqlPagerError::QueryFailed` wrapping the underlying failure.
    pub fn update(
        &self,
        conn: &dyn Connection,
        sql: &str,
        params: Option<&[RowValues]>,
    ) -> Result<usize, SqlPagerError> {
        tracing::debug!(sql, params = %render_params(params), "update");
        let run = || -> Result<usize, SqlPagerError> {
            let mut stmt = Scoped::new(conn.prepare(sql, CursorKind::ForwardOnly)?);
            self.fill_statement(&mut **stmt, params)?;
            stmt.execute_update()
        };
        run().map_err(|err| err.in_query(sql, params))
    }

    /// Execute one statement once per parameter set, reusing the prepared statement.
    ///
    /// # Errors
    /// Returns `SqlPagerError::QueryFailed` for the first failing set; the reported
    /// parameters are that set's.
    pub fn batch(
        &self,
        conn: &dyn Connection,
        sql: &str,
        param_sets: &[Vec<RowValues>],
    ) -> Result<Vec<usize>, SqlPagerError> {
        tracing::debug!(sql, sets = param_sets.len(), "batch");
        let mut stmt = Scoped::new(
            conn.prepare(sql, CursorKind::ForwardOnly)
                .map_err(|err| err.in_query(sql, None))?,
        );
        let mut affected = Vec::with_capacity(param_sets.len());
        for params in param_sets {
            let params = Some(params.as_slice());
            self.fill_statement(&mut **stmt, params)
                .and_then(|()| stmt.execute_update())
                .map(|rows| affected.push(rows))
                .map_err(|err| err.in_query(sql, params))?;
        }
        Ok(affected)
    }
}
