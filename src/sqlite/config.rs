use std::time::Duration;

use rusqlite::OpenFlags;

use crate::error::SqlPagerError;
use crate::sqlite::SqliteConnection;

/// Options for opening a `SQLite` connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqliteOptions {
    pub db_path: String,
    pub read_only: bool,
    pub busy_timeout: Option<Duration>,
    /// Name detection results are cached under; the path is used when unset.
    pub source_name: Option<String>,
    /// Switch file databases to write-ahead logging when opened read-write.
    pub wal: bool,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            db_path,
            read_only: false,
            busy_timeout: None,
            source_name: None,
            wal: true,
        }
    }

    #[must_use]
    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_wal(mut self, wal: bool) -> Self {
        self.wal = wal;
        self
    }

    fn is_memory(&self) -> bool {
        self.db_path == ":memory:" || self.db_path.is_empty()
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: String) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.opts.read_only = read_only;
        self
    }

    #[must_use]
    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.opts.busy_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn source_name(mut self, name: impl Into<String>) -> Self {
        self.opts.source_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Open a connection with these options.
    ///
    /// # Errors
    /// Returns `SqlPagerError::SqliteError` if the database cannot be opened or configured.
    pub fn open(self) -> Result<SqliteConnection, SqlPagerError> {
        SqliteConnection::open(self.finish())
    }
}

impl SqliteConnection {
    #[must_use]
    pub fn sqlite_builder(db_path: String) -> SqliteOptionsBuilder {
        SqliteOptionsBuilder::new(db_path)
    }

    /// Open a connection described by `opts`.
    ///
    /// # Errors
    /// Returns `SqlPagerError::SqliteError` if the database cannot be opened or configured.
    pub fn open(opts: SqliteOptions) -> Result<Self, SqlPagerError> {
        let conn = if opts.is_memory() {
            rusqlite::Connection::open_in_memory()?
        } else {
            let flags = if opts.read_only {
                OpenFlags::SQLITE_OPEN_READ_ONLY
                    | OpenFlags::SQLITE_OPEN_URI
                    | OpenFlags::SQLITE_OPEN_NO_MUTEX
            } else {
                OpenFlags::default()
            };
            rusqlite::Connection::open_with_flags(&opts.db_path, flags)?
        };

        if let Some(timeout) = opts.busy_timeout {
            conn.busy_timeout(timeout)?;
        }
        if opts.wal && !opts.read_only && !opts.is_memory() {
            let mode: String = conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
            tracing::debug!(path = %opts.db_path, journal_mode = %mode, "sqlite journal mode set");
        }

        Ok(Self::from_parts(conn, opts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_options() {
        let opts = SqliteOptionsBuilder::new("app.db".into())
            .read_only(true)
            .busy_timeout(Duration::from_millis(250))
            .source_name("primary")
            .wal(false)
            .finish();
        assert_eq!(
            opts,
            SqliteOptions::new("app.db".into())
                .with_read_only(true)
                .with_busy_timeout(Duration::from_millis(250))
                .with_source_name("primary")
                .with_wal(false)
        );
    }
}
