//! Scripted in-memory connection for exercising dialect paths without a server.
//!
//! Every statement the crate prepares is answered by a responder closure, and everything
//! observable (prepared SQL, cursor kinds, bindings, row caps, seeks, closes) is recorded
//! in a [`MockLog`].

use std::sync::{Arc, Mutex, MutexGuard};

use crate::driver::{Connection, Cursor, CursorKind, DatabaseMetadata, Statement};
use crate::error::SqlPagerError;
use crate::results::BufferedCursor;
use crate::types::RowValues;

/// What the responder returns for one executed statement.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Rows {
        columns: Arc<Vec<String>>,
        rows: Vec<Vec<RowValues>>,
    },
    Updated(usize),
    Fail(String),
}

impl MockResponse {
    #[must_use]
    pub fn rows(columns: &[&str], rows: Vec<Vec<RowValues>>) -> Self {
        MockResponse::Rows {
            columns: Arc::new(columns.iter().map(|c| (*c).to_string()).collect()),
            rows,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        MockResponse::Fail(message.into())
    }
}

/// Everything the mock observed.
#[derive(Debug, Clone, Default)]
pub struct MockLog {
    pub prepared: Vec<String>,
    pub kinds: Vec<CursorKind>,
    /// `(sql, params)` for every bind call.
    pub binds: Vec<(String, Vec<RowValues>)>,
    pub max_rows: Vec<usize>,
    pub seeks: Vec<usize>,
    pub statements_opened: usize,
    pub statements_closed: usize,
    pub cursors_opened: usize,
    pub cursors_closed: usize,
}

impl MockLog {
    /// Whether every statement and cursor opened was also closed.
    #[must_use]
    pub fn all_closed(&self) -> bool {
        self.statements_opened == self.statements_closed
            && self.cursors_opened == self.cursors_closed
    }
}

type Responder = dyn Fn(&str, &[RowValues]) -> MockResponse + Send + Sync;

/// A [`Connection`] whose statements are answered by a closure.
pub struct MockConnection {
    product: String,
    url: String,
    source: Option<String>,
    responder: Box<Responder>,
    log: Arc<Mutex<MockLog>>,
    fail_close: bool,
    fail_metadata: bool,
}

impl std::fmt::Debug for MockConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockConnection")
            .field("product", &self.product)
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

fn lock(log: &Mutex<MockLog>) -> MutexGuard<'_, MockLog> {
    match log.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl MockConnection {
    /// A connection reporting `product` as its database product name.
    pub fn new(
        product: &str,
        responder: impl Fn(&str, &[RowValues]) -> MockResponse + Send + Sync + 'static,
    ) -> Self {
        Self {
            product: product.to_string(),
            url: format!("mock:{}", product.to_lowercase().replace(' ', "-")),
            source: None,
            responder: Box::new(responder),
            log: Arc::new(Mutex::new(MockLog::default())),
            fail_close: false,
            fail_metadata: false,
        }
    }

    #[must_use]
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    /// Report a data-source name so detection is cached under it.
    #[must_use]
    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    /// Make every statement and cursor close fail (after being counted).
    #[must_use]
    pub fn with_failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    #[must_use]
    pub fn with_failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    /// Snapshot of what has been observed so far.
    #[must_use]
    pub fn log(&self) -> MockLog {
        lock(&self.log).clone()
    }

    fn close_result(&self, kind: &str) -> Result<(), SqlPagerError> {
        if self.fail_close {
            Err(SqlPagerError::ResourceClose(format!("mock {kind} refused to close")))
        } else {
            Ok(())
        }
    }
}

impl Connection for MockConnection {
    fn prepare(
        &self,
        sql: &str,
        kind: CursorKind,
    ) -> Result<Box<dyn Statement + '_>, SqlPagerError> {
        let mut log = lock(&self.log);
        log.prepared.push(sql.to_string());
        log.kinds.push(kind);
        log.statements_opened += 1;
        Ok(Box::new(MockStatement {
            conn: self,
            sql: sql.to_string(),
            params: Vec::new(),
            max_rows: None,
            closed: false,
        }))
    }

    fn metadata(&self) -> Result<Box<dyn DatabaseMetadata + '_>, SqlPagerError> {
        if self.fail_metadata {
            return Err(SqlPagerError::ExecutionError("metadata unavailable".into()));
        }
        Ok(Box::new(MockMetadata { conn: self }))
    }

    fn data_source_name(&self) -> Option<String> {
        self.source.clone()
    }
}

struct MockStatement<'c> {
    conn: &'c MockConnection,
    sql: String,
    params: Vec<RowValues>,
    max_rows: Option<usize>,
    closed: bool,
}

impl Statement for MockStatement<'_> {
    fn bind(&mut self, params: &[RowValues]) -> Result<(), SqlPagerError> {
        lock(&self.conn.log)
            .binds
            .push((self.sql.clone(), params.to_vec()));
        self.params = params.to_vec();
        Ok(())
    }

    fn set_max_rows(&mut self, max_rows: usize) {
        lock(&self.conn.log).max_rows.push(max_rows);
        self.max_rows = Some(max_rows);
    }

    fn execute_query(&mut self) -> Result<Box<dyn Cursor + '_>, SqlPagerError> {
        match (self.conn.responder)(&self.sql, &self.params) {
            MockResponse::Rows { columns, mut rows } => {
                if let Some(max) = self.max_rows {
                    rows.truncate(max);
                }
                lock(&self.conn.log).cursors_opened += 1;
                Ok(Box::new(MockCursor {
                    conn: self.conn,
                    inner: BufferedCursor::new(columns, rows),
                    closed: false,
                }))
            }
            MockResponse::Updated(_) => Err(SqlPagerError::ExecutionError(
                "statement does not return rows".into(),
            )),
            MockResponse::Fail(message) => Err(SqlPagerError::ExecutionError(message)),
        }
    }

    fn execute_update(&mut self) -> Result<usize, SqlPagerError> {
        match (self.conn.responder)(&self.sql, &self.params) {
            MockResponse::Updated(n) => Ok(n),
            MockResponse::Rows { .. } => Ok(0),
            MockResponse::Fail(message) => Err(SqlPagerError::ExecutionError(message)),
        }
    }

    fn close(&mut self) -> Result<(), SqlPagerError> {
        if !self.closed {
            self.closed = true;
            lock(&self.conn.log).statements_closed += 1;
        }
        self.conn.close_result("statement")
    }
}

struct MockCursor<'c> {
    conn: &'c MockConnection,
    inner: BufferedCursor,
    closed: bool,
}

impl Cursor for MockCursor<'_> {
    fn next(&mut self) -> Result<bool, SqlPagerError> {
        self.inner.next()
    }

    fn get(&self, index: usize) -> Result<RowValues, SqlPagerError> {
        self.inner.get(index)
    }

    fn column_names(&self) -> Arc<Vec<String>> {
        self.inner.column_names()
    }

    fn before_first(&mut self) -> Result<(), SqlPagerError> {
        self.inner.before_first()
    }

    fn absolute(&mut self, row: usize) -> Result<bool, SqlPagerError> {
        lock(&self.conn.log).seeks.push(row);
        self.inner.absolute(row)
    }

    fn close(&mut self) -> Result<(), SqlPagerError> {
        if !self.closed {
            self.closed = true;
            lock(&self.conn.log).cursors_closed += 1;
            self.inner.close()?;
        }
        self.conn.close_result("cursor")
    }
}

struct MockMetadata<'c> {
    conn: &'c MockConnection,
}

impl DatabaseMetadata for MockMetadata<'_> {
    fn product_name(&self) -> Result<String, SqlPagerError> {
        Ok(self.conn.product.clone())
    }

    fn product_version(&self) -> Result<String, SqlPagerError> {
        Ok("mock".into())
    }

    fn driver_name(&self) -> Result<String, SqlPagerError> {
        Ok("sql-pager mock".into())
    }

    fn driver_version(&self) -> Result<String, SqlPagerError> {
        Ok(env!("CARGO_PKG_VERSION").into())
    }

    fn user_name(&self) -> Result<String, SqlPagerError> {
        Ok(String::new())
    }

    fn url(&self) -> Result<String, SqlPagerError> {
        Ok(self.conn.url.clone())
    }

    fn max_connections(&self) -> Result<u32, SqlPagerError> {
        Ok(0)
    }
}
