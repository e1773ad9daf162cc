use thiserror::Error;

/// Crate-wide error type.
/// Collects failures from the standard library, third-party readers, DuckDB and
/// the individual modules so that `?` works across layers.
#[derive(Error, Debug)]
pub enum SheetLoaderError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Third-party library errors
    #[error("{0}")]
    DuckDBError(#[from] duckdb::Error),

    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    CsvError(#[from] csv::Error),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    TemplateError(#[from] handlebars::TemplateError),

    // Module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    ColumnError(#[from] crate::database::column::ColumnError),

    #[error("{0}")]
    TableError(#[from] crate::database::table::TableError),

    #[error("{0}")]
    PendingError(#[from] crate::pending::PendingError),

    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, SheetLoaderError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| SheetLoaderError::WithContextError(format!("{}: {}", message, e)))
    }
}
