//! # Spreadsheet Reading
//!
//! Reads an uploaded file into a [`Dataset`]. The format is chosen from the
//! file extension:
//!
//! - `.xlsx`, `.xlsm` - Excel 2007+ workbooks, first worksheet only
//! - `.csv` - comma separated values
//!
//! Both readers collect positioned cells into a sheet, pick the first
//! non-empty row as the header and resolve the remaining cells into
//! [`crate::dataset::CellValue`]s.
pub(crate) mod cell;
pub(crate) mod delimited;
pub mod options;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xlsx;

use crate::dataset::Dataset;
use crate::error::ResultMessage;
use crate::error::SheetLoaderError;
use crate::spreadsheet::xlsx::XlsxWorkbook;
use std::ffi::OsStr;
use std::path::Path;
use thiserror::Error;

pub use crate::spreadsheet::options::ReadOptions;

/// Errors raised while reading a spreadsheet
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Extension is not one of the supported formats
    #[error("Unsupported file format '{0}', expected .xlsx, .xlsm or .csv")]
    UnsupportedFormat(String),

    /// A required part is missing from the workbook archive
    #[error("Missing workbook part '{0}'")]
    MissingPart(String),

    #[error("Workbook '{0}' has no worksheet")]
    NoWorksheet(String),

    /// Sheet holds no non-empty row to use as header
    #[error("Sheet '{0}' is empty")]
    EmptySheet(String),

    #[error("Invalid cell reference '{0}'")]
    InvalidReference(String),

    /// Occupied column range exceeds the worksheet limit
    #[error("Sheet '{sheet}' spans {columns} columns, at most {max} are supported")]
    TooManyColumns { sheet: String, columns: usize, max: usize },

    #[error("Invalid shared string index '{index}' at {reference}")]
    SharedStringError { reference: String, index: String },
}

/// Extensions accepted by [`read_dataset`]
pub const SUPPORTED_EXTENSIONS: [&str; 3] = ["xlsx", "xlsm", "csv"];

/// Returns true if the file name has a supported extension (case-insensitive)
pub fn is_supported(path: &Path) -> bool {
    extension(path).is_some_and(|extension| SUPPORTED_EXTENSIONS.contains(&extension.as_str()))
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(OsStr::to_str).map(str::to_ascii_lowercase)
}

/// Reads the tabular content of an uploaded file.
///
/// Failures are prefixed with the file path.
pub fn read_dataset(path: &Path, options: &ReadOptions) -> Result<Dataset, SheetLoaderError> {
    let result = match extension(path).as_deref() {
        Some("xlsx") | Some("xlsm") => {
            XlsxWorkbook::open(path).and_then(|mut workbook| workbook.read_first_sheet(options))
        }
        Some("csv") => delimited::read_csv(path, options),
        _ => Err(SpreadsheetError::UnsupportedFormat(path.display().to_string()).into()),
    };
    result.with_prefix(&path.display().to_string())
}
