//! # Storage
//!
//! Everything that touches DuckDB: table definitions, DDL, catalog
//! introspection and the transactional row loader. Callers open one
//! [`duckdb::Connection`] per operation with [`open_connection`] and let it
//! drop when the operation ends.
pub mod column;
pub mod loader;
pub mod schema;
pub mod table;

use duckdb::Connection;
use std::path::Path;

/// Opens (creating if needed) the DuckDB database at `path`.
pub fn open_connection(path: &Path) -> Result<Connection, duckdb::Error> {
    Connection::open(path)
}

/// Quotes an identifier for use in SQL, doubling embedded `"`.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
