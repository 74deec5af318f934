// SQLite backend over rusqlite.
//
// - config: connection options and opening
// - params: parameter conversion from RowValues to SQLite values
// - query: value extraction and row buffering
// - connection: the Connection/Statement/DatabaseMetadata implementations

pub mod config;
mod connection;
pub mod params;
pub mod query;

pub use config::{SqliteOptions, SqliteOptionsBuilder};
pub use connection::SqliteConnection;
