use crate::database::column::Column;
use regex::Regex;
use serde::Deserialize;
use serde::Serialize;
use std::sync::LazyLock;
use thiserror::Error;

static PARTITION_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z_]+$").expect("Hardcode regex"));

/// Errors raised while building a table definition.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Invalid partition key '{0}', use letters, digits or '_'")]
    InvalidPartitionKey(String),

    #[error("Missing name for column {0}")]
    EmptyColumnName(usize),

    #[error("Table has no columns")]
    NoColumns,
}

/// A table definition: name plus ordered columns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<Column>,
}

impl TableSchema {
    /// Builds a schema, rejecting blank column names and empty column lists.
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Result<Self, TableError> {
        if columns.is_empty() {
            return Err(TableError::NoColumns);
        }
        if let Some(index) = columns.iter().position(|column| column.name.trim().is_empty()) {
            return Err(TableError::EmptyColumnName(index));
        }
        Ok(TableSchema {
            name: name.into(),
            columns,
        })
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// Checks a partition key and returns it trimmed.
pub fn validate_partition_key(key: &str) -> Result<&str, TableError> {
    let key = key.trim();
    if PARTITION_KEY.is_match(key) {
        Ok(key)
    } else {
        Err(TableError::InvalidPartitionKey(key.to_owned()))
    }
}

/// Derives the table name for a partition key, e.g. `internships_2024`.
pub fn table_name(prefix: &str, key: &str) -> Result<String, TableError> {
    let key = validate_partition_key(key)?;
    Ok(format!("{prefix}_{key}"))
}
