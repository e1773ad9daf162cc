use crate::dataset::CellValue;
use serde::Deserialize;
use serde::Serialize;
use std::fmt::Display;
use thiserror::Error;

/// Errors related to column type parsing and validation.
#[derive(Error, Debug)]
pub enum ColumnError {
    #[error("Invalid column type '{0}'")]
    TypeError(String),
}

/// Scalar column types a spreadsheet column can be loaded as.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColumnType {
    /// 64-bit signed integers
    Integer,
    /// Double-precision floating point numbers
    Real,
    /// Variable-length strings
    Text,
}

/// A named, typed column of a table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnType) -> Self {
        Column {
            name: name.into(),
            kind,
        }
    }
}

impl ColumnType {
    pub const ALL: [ColumnType; 3] = [ColumnType::Integer, ColumnType::Real, ColumnType::Text];

    /// Name shown to people and accepted back from forms.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::Integer => "INTEGER",
            ColumnType::Real => "REAL",
            ColumnType::Text => "TEXT",
        }
    }

    /// Type used in DuckDB DDL.
    pub const fn storage_type(&self) -> &'static str {
        match self {
            ColumnType::Integer => "BIGINT",
            ColumnType::Real => "DOUBLE",
            ColumnType::Text => "VARCHAR",
        }
    }

    /// Parses a column type from a string representation.
    /// Supports various aliases for each type.
    pub fn parse(name: &str) -> Result<Self, ColumnError> {
        match name.trim().to_ascii_uppercase().as_str() {
            "INT" | "BIGINT" | "INTEGER" => Ok(Self::Integer),
            "REAL" | "FLOAT" | "DOUBLE" | "DECIMAL" | "NUMERIC" => Ok(Self::Real),
            "TEXT" | "STRING" | "VARCHAR" => Ok(Self::Text),
            _ => Err(ColumnError::TypeError(name.to_string())),
        }
    }

    /// Maps a catalog type name back onto a column type.
    /// Anything that is not a known integer or floating point type reads as text.
    pub fn from_catalog(data_type: &str) -> Self {
        match data_type.trim().to_ascii_uppercase().as_str() {
            "BIGINT" | "INTEGER" | "INT" | "SMALLINT" | "TINYINT" | "HUGEINT" => Self::Integer,
            "DOUBLE" | "REAL" | "FLOAT" => Self::Real,
            _ => Self::Text,
        }
    }

    /// Infers the type of a single value. Missing values carry no type.
    pub fn from_cell(value: &CellValue) -> Option<Self> {
        match value {
            CellValue::Missing => None,
            value => match value.to_number() {
                Some(number) if Self::is_integer(number) => Some(ColumnType::Integer),
                Some(_) => Some(ColumnType::Real),
                None => Some(ColumnType::Text),
            },
        }
    }

    /// Checks if a number has no fractional part and fits a 64-bit integer.
    fn is_integer(number: f64) -> bool {
        number.fract() == 0.0 && number >= i64::MIN as f64 && number < i64::MAX as f64
    }

    /// Detects the most specific common type from a collection of candidate types.
    /// Falls back to TEXT if types are inconsistent or empty.
    pub fn detect(types: Vec<Option<ColumnType>>) -> ColumnType {
        let types: Vec<ColumnType> = types.into_iter().flatten().collect();
        if types.is_empty() {
            ColumnType::Text
        } else if types.iter().all(ColumnType::is_int) {
            ColumnType::Integer
        } else if types.iter().all(ColumnType::is_float) {
            ColumnType::Real
        } else {
            ColumnType::Text
        }
    }

    #[inline]
    pub fn is_int(&self) -> bool {
        matches!(self, ColumnType::Integer)
    }

    /// Returns true for numeric types (integer or floating point).
    #[inline]
    pub fn is_float(&self) -> bool {
        matches!(self, ColumnType::Integer | ColumnType::Real)
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
