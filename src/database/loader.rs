use crate::database::column::ColumnType;
use crate::database::quote_identifier;
use crate::database::table::TableSchema;
use crate::dataset::CellValue;
use crate::dataset::Dataset;
use duckdb::params_from_iter;
use duckdb::types::ToSqlOutput;
use duckdb::types::Value;
use duckdb::Connection;
use duckdb::ToSql;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;
use tracing::info;

/// Errors that abort a load. No rows are committed when one is returned.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("The file has {dataset} columns but table has {table}")]
    ColumnCountMismatch { dataset: usize, table: usize },

    #[error("{0}")]
    Storage(#[from] duckdb::Error),
}

/// Outcome of a successful load.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LoadResult {
    /// Rows inserted, including rows whose cells all coerced to null
    pub inserted_count: usize,
}

/// A cell converted to its column type, ready to bind.
#[derive(Clone, Debug, PartialEq)]
pub enum CoercedValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl ToSql for CoercedValue {
    fn to_sql(&self) -> duckdb::Result<ToSqlOutput<'_>> {
        let value = match self {
            CoercedValue::Integer(value) => Value::BigInt(*value),
            CoercedValue::Real(value) => Value::Double(*value),
            CoercedValue::Text(value) => Value::Text(value.clone()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

/// Converts a cell to `kind`, or `None` when it is missing or cannot be converted.
///
/// INTEGER parses as a float and truncates toward zero; values outside the
/// 64-bit range become `None`. TEXT never fails.
pub fn coerce(value: &CellValue, kind: ColumnType) -> Option<CoercedValue> {
    if value.is_missing() {
        return None;
    }
    match kind {
        ColumnType::Integer => value
            .to_number()
            .map(f64::trunc)
            .filter(|number| *number >= i64::MIN as f64 && *number < i64::MAX as f64)
            .map(|number| CoercedValue::Integer(number as i64)),
        ColumnType::Real => value.to_number().map(CoercedValue::Real),
        ColumnType::Text => Some(CoercedValue::Text(value.to_string())),
    }
}

/// Inserts every dataset row into the table described by `schema`.
///
/// Columns are matched by position. All inserts run in one transaction: any
/// storage error rolls back every row of this call.
pub fn load(connection: &mut Connection, dataset: &Dataset, schema: &TableSchema) -> Result<LoadResult, LoadError> {
    if dataset.column_count() != schema.column_count() {
        return Err(LoadError::ColumnCountMismatch {
            dataset: dataset.column_count(),
            table: schema.column_count(),
        });
    }

    let placeholders = vec!["?"; schema.column_count()].join(", ");
    let sql = format!("INSERT INTO {} VALUES ({placeholders})", quote_identifier(&schema.name));
    debug!(sql = %sql, rows = dataset.row_count(), "loading rows");

    let transaction = connection.transaction()?;
    let mut inserted_count = 0usize;
    {
        let mut statement = transaction.prepare(&sql)?;
        for row in dataset.rows() {
            let values = row
                .into_iter()
                .zip(&schema.columns)
                .map(|(value, column)| coerce(value, column.kind))
                .collect::<Vec<_>>();
            statement.execute(params_from_iter(values.iter()))?;
            inserted_count += 1;
        }
    }
    transaction.commit()?;

    info!(table = %schema.name, inserted_count, "loaded rows");
    Ok(LoadResult { inserted_count })
}
