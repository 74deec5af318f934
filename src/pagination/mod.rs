//! Cross-dialect pagination.
//!
//! A page is fetched with two statements: the count query, which yields the total row
//! count in its first column, and the data query rewritten for the dialect so only the
//! requested window comes back.

mod page;
pub mod rewrite;

use std::sync::Arc;
use std::time::Instant;

use crate::coerce::{ScalarType, coerce};
use crate::dialect::{Dialect, DialectDetector};
use crate::driver::{Connection, CursorKind, Scoped};
use crate::error::SqlPagerError;
use crate::projector::{Projected, RowShape};
use crate::runner::{QueryRunner, RunnerOptions};
use crate::sql_text::has_placeholders;
use crate::types::RowValues;

pub use page::{PageRequest, PageResult};

/// Runs windowed and paginated queries.
///
/// ```rust,no_run
/// use std::sync::Arc;
/// use sql_pager::prelude::*;
///
/// # fn run(conn: &dyn Connection) -> Result<(), SqlPagerError> {
/// let engine = PaginationEngine::new(Arc::new(DialectDetector::new()));
/// let request = PageRequest::new("select count(*) from items", "select * from items order by id")
///     .with_page(2)
///     .with_size(10);
/// let page = engine.paginate_detected(conn, &request, &RowShape::<()>::map())?;
/// println!("{} of {} pages", page.current_page, page.total_pages);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct PaginationEngine {
    runner: QueryRunner,
    detector: Arc<DialectDetector>,
}

impl PaginationEngine {
    #[must_use]
    pub fn new(detector: Arc<DialectDetector>) -> Self {
        Self::with_options(detector, RunnerOptions::default())
    }

    #[must_use]
    pub fn with_options(detector: Arc<DialectDetector>, options: RunnerOptions) -> Self {
        Self {
            runner: QueryRunner::new(options),
            detector,
        }
    }

    #[must_use]
    pub fn runner(&self) -> &QueryRunner {
        &self.runner
    }

    #[must_use]
    pub fn detector(&self) -> &Arc<DialectDetector> {
        &self.detector
    }

    /// Dialect of `conn`, cached per data source.
    ///
    /// # Errors
    /// Returns `SqlPagerError::UnsupportedDialect` for unknown products, or the error
    /// raised while fetching metadata.
    pub fn detect(&self, conn: &dyn Connection) -> Result<Dialect, SqlPagerError> {
        let metadata = conn.metadata()?;
        match conn.data_source_name() {
            Some(source) => self.detector.detect_for(&source, &*metadata),
            None => self.detector.detect(&*metadata),
        }
    }

    /// Run `sql` restricted to the `count` rows following the first `start`, and project
    /// them into `shape`.
    ///
    /// # Errors
    /// Returns `SqlPagerError::QueryFailed` carrying the rewritten SQL.
    #[allow(clippy::too_many_arguments)]
    pub fn windowed_query<T: Default>(
        &self,
        conn: &dyn Connection,
        dialect: Dialect,
        sql: &str,
        params: Option<&[RowValues]>,
        shape: &RowShape<T>,
        start: usize,
        count: usize,
    ) -> Result<Projected<T>, SqlPagerError> {
        let window_sql = rewrite::window_sql(dialect, sql, start, count);
        tracing::debug!(%dialect, sql = %window_sql, start, count, "windowed query");
        self.run_window(conn, dialect, &window_sql, params, shape, start, count)
            .map_err(|err| err.in_query(&window_sql, params))
    }

    #[allow(clippy::too_many_arguments)]
    fn run_window<T: Default>(
        &self,
        conn: &dyn Connection,
        dialect: Dialect,
        window_sql: &str,
        params: Option<&[RowValues]>,
        shape: &RowShape<T>,
        start: usize,
        count: usize,
    ) -> Result<Projected<T>, SqlPagerError> {
        let projector = self.runner.projector();
        let mut stmt = Scoped::new(conn.prepare(window_sql, CursorKind::Scrollable)?);
        if let Some(params) = params.filter(|p| !p.is_empty()) {
            self.runner.fill_statement(&mut **stmt, Some(params))?;
        }

        match dialect {
            Dialect::SqlServer => {
                // TOP n returns rows from the first; skip to the window start.
                stmt.set_max_rows(start.saturating_add(count));
                let mut cursor = Scoped::new(stmt.execute_query()?);
                if start > 0 {
                    cursor.absolute(start)?;
                }
                projector.project(&mut **cursor, shape)
            }
            Dialect::Oracle | Dialect::MySql | Dialect::Sqlite => {
                let mut cursor = Scoped::new(stmt.execute_query()?);
                if !cursor.next()? {
                    return Ok(shape.empty_result());
                }
                cursor.before_first()?;
                projector.project(&mut **cursor, shape)
            }
        }
    }

    /// Fetch one page: total count, then the window for `request`'s page.
    ///
    /// # Errors
    /// Returns `SqlPagerError::PaginationFailed` naming both queries and the parameters.
    pub fn paginate<T: Default>(
        &self,
        conn: &dyn Connection,
        dialect: Dialect,
        request: &PageRequest,
        shape: &RowShape<T>,
    ) -> Result<PageResult<Projected<T>>, SqlPagerError> {
        let started = Instant::now();
        let total_rows = self
            .count_rows(conn, &request.count_sql, request.params())
            .map_err(|err| request.failed(err))?;
        let rows = self
            .windowed_query(
                conn,
                dialect,
                &request.data_sql,
                request.params(),
                &shape.clone().list(),
                request.start(),
                request.page_size,
            )
            .map_err(|err| request.failed(err))?;

        let page = PageResult::new(
            request.effective_page(),
            request.page_size,
            total_rows,
            rows.into_list(),
            started.elapsed(),
        );
        tracing::debug!(
            %dialect,
            page = page.current_page,
            rows = page.len(),
            total_rows,
            elapsed_ms = page.elapsed.as_millis(),
            "page fetched"
        );
        Ok(page)
    }

    /// [`PaginationEngine::paginate`] with the dialect detected from the connection.
    ///
    /// # Errors
    /// Returns detection errors unwrapped, and pagination failures as
    /// `SqlPagerError::PaginationFailed`.
    pub fn paginate_detected<T: Default>(
        &self,
        conn: &dyn Connection,
        request: &PageRequest,
        shape: &RowShape<T>,
    ) -> Result<PageResult<Projected<T>>, SqlPagerError> {
        let dialect = self.detect(conn)?;
        self.paginate(conn, dialect, request, shape)
    }

    fn count_rows(
        &self,
        conn: &dyn Connection,
        count_sql: &str,
        params: Option<&[RowValues]>,
    ) -> Result<u64, SqlPagerError> {
        let params = params.filter(|p| !p.is_empty() && has_placeholders(count_sql));
        let mut stmt = Scoped::new(conn.prepare(count_sql, CursorKind::ForwardOnly)?);
        self.runner.fill_statement(&mut **stmt, params)?;
        let mut cursor = Scoped::new(stmt.execute_query()?);
        if !cursor.next()? {
            return Err(SqlPagerError::ExecutionError(
                "count query returned no rows".into(),
            ));
        }
        let total = coerce(cursor.get(0)?, ScalarType::Long)?
            .as_i128()
            .unwrap_or(0);
        Ok(u64::try_from(total).unwrap_or(0))
    }
}
