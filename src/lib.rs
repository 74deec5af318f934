//! Cross-dialect pagination and row projection over a small driver seam.
//!
//! Queries run through the [`driver`] traits. [`pagination::PaginationEngine`] fetches a
//! page by running a count query and a data query rewritten for the connection's
//! [`dialect::Dialect`]; [`projector::RowProjector`] turns rows into scalars, arrays,
//! case-insensitive maps, or records declared with [`record_binding!`].

pub mod coerce;
pub mod dialect;
pub mod driver;
pub mod error;
pub mod lob;
pub mod pagination;
pub mod prelude;
pub mod projector;
pub mod record;
pub mod results;
pub mod runner;
pub mod sql_text;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use coerce::{ScalarType, ScalarValue, coerce};
pub use dialect::{Dialect, DialectDetector, DialectProfile};
pub use error::SqlPagerError;
pub use pagination::{PageRequest, PageResult, PaginationEngine};
pub use projector::{Projected, RowProjector, RowShape};
pub use runner::{QueryRunner, RunnerOptions};
pub use types::RowValues;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteOptions, SqliteOptionsBuilder};
