//! In-memory row containers: case-insensitive map rows and the scrollable buffered cursor.

mod buffered;
mod row_map;

pub use buffered::BufferedCursor;
pub use row_map::{CaseInsensitiveRow, KeyCase};
