//! # Sheet Loader
//!
//! Turns an uploaded spreadsheet into a typed DuckDB table in three steps:
//!
//! - **Analyze**: read the file, clean every column header into an identifier and
//!   infer an `INTEGER`, `REAL` or `TEXT` type for it
//! - **Create**: once a person has confirmed (or edited) the proposal, drop any
//!   previous table for the same partition key and create the new one
//! - **Load**: re-read the file, coerce every cell to its column type (failed
//!   coercions become `NULL`) and insert all rows in a single transaction
//!
//! ## Supported formats
//!
//! - Excel 2007+ workbooks (`.xlsx`, `.xlsm`), first worksheet only
//! - Comma separated values (`.csv`), UTF-8 with a configurable legacy fallback
//!
//! The first non-empty row of the sheet is the header row.
//!
//! ## Entry points
//!
//! [`importer::Importer`] drives the pipeline one request at a time and is what
//! the HTTP front end in [`http`] calls. The individual stages live in
//! [`analyzer`], [`database::schema`] and [`database::loader`].

pub mod analyzer;
pub mod config;
pub mod database;
pub mod dataset;
pub mod error;
pub mod http;
pub mod importer;
pub mod pending;
pub mod spreadsheet;

mod helpers;

pub use crate::analyzer::{analyze, Analysis, ColumnSchema};
pub use crate::config::LoaderConfig;
pub use crate::database::column::ColumnType;
pub use crate::database::loader::LoadResult;
pub use crate::database::table::TableSchema;
pub use crate::dataset::{CellValue, Dataset};
pub use crate::error::SheetLoaderError;
pub use crate::importer::{ImportError, Importer};
