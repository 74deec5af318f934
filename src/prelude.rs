//! Convenient imports for common functionality.

pub use crate::coerce::{FromScalar, ScalarType, ScalarValue, coerce};
pub use crate::dialect::{Dialect, DialectDetector, DialectProfile};
pub use crate::driver::{Connection, Cursor, CursorKind, DatabaseMetadata, Scoped, Statement};
pub use crate::error::SqlPagerError;
pub use crate::pagination::{PageRequest, PageResult, PaginationEngine};
pub use crate::projector::{Projected, RowProjector, RowShape, Target};
pub use crate::record::{FromRecord, RecordBinding};
pub use crate::results::{BufferedCursor, CaseInsensitiveRow, KeyCase};
pub use crate::runner::{QueryRunner, RunnerOptions};
pub use crate::types::{BinaryLargeObject, CharacterLargeObject, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteOptions, SqliteOptionsBuilder};
