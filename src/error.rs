use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlPagerError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Unsupported database dialect: {product:?}")]
    UnsupportedDialect { product: String },

    #[error("Pagination failed: {source} Count query: {count_sql} Data query: {data_sql} Parameters: {params}")]
    PaginationFailed {
        count_sql: String,
        data_sql: String,
        params: String,
        #[source]
        source: Box<SqlPagerError>,
    },

    #[error("{source} Query: {sql} Parameters: {params}")]
    QueryFailed {
        sql: String,
        params: String,
        #[source]
        source: Box<SqlPagerError>,
    },

    #[error("Cannot coerce {raw:?} to {target}: {reason}")]
    CoercionError {
        raw: String,
        target: String,
        reason: String,
    },

    #[error("Record binding error: {0}")]
    BindingError(String),

    #[error("Resource close error: {0}")]
    ResourceClose(String),

    #[error("Parameter conversion error: {0}")]
    ParameterError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),
}

impl SqlPagerError {
    /// Decorate an error with the statement text and its bound parameters.
    #[must_use]
    pub fn in_query(self, sql: &str, params: Option<&[crate::types::RowValues]>) -> Self {
        SqlPagerError::QueryFailed {
            sql: sql.to_string(),
            params: crate::types::render_params(params),
            source: Box::new(self),
        }
    }

    /// The innermost error once query and pagination context has been peeled off.
    #[must_use]
    pub fn root_cause(&self) -> &SqlPagerError {
        match self {
            SqlPagerError::QueryFailed { source, .. }
            | SqlPagerError::PaginationFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
