//! Proposes a table schema for a dataset.
//!
//! Each column gets an identifier-safe name and the narrowest of
//! `INTEGER`, `REAL` or `TEXT` that fits every non-missing value. The
//! proposal is only a default for a person to review, so analysis never fails.

use crate::database::column::ColumnType;
use crate::dataset::CellValue;
use crate::dataset::Dataset;
use serde::Deserialize;
use serde::Serialize;
use tracing::info;

/// Proposed name and type for one dataset column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub original_name: String,
    pub cleaned_name: String,
    pub inferred_type: ColumnType,
}

/// Column proposals in dataset order plus the first rows for preview.
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    pub columns: Vec<ColumnSchema>,
    pub sample: Vec<Vec<CellValue>>,
}

/// Replaces spaces with `_` and strips `.`, `(`, `)` and `/`.
pub fn clean_column_name(name: &str) -> String {
    name.chars()
        .filter(|character| !matches!(character, '.' | '(' | ')' | '/'))
        .map(|character| if character == ' ' { '_' } else { character })
        .collect()
}

/// Infers the type of a column from its values.
/// Missing values are ignored; an all-missing column is TEXT.
pub fn infer_column_type(cells: &[CellValue]) -> ColumnType {
    ColumnType::detect(cells.iter().map(ColumnType::from_cell).collect())
}

/// Analyzes every column and keeps up to `sample_rows` rows for preview.
pub fn analyze(dataset: &Dataset, sample_rows: usize) -> Analysis {
    let columns = dataset
        .columns()
        .iter()
        .map(|column| ColumnSchema {
            original_name: column.name.clone(),
            cleaned_name: clean_column_name(&column.name),
            inferred_type: infer_column_type(&column.cells),
        })
        .collect::<Vec<_>>();
    let sample = dataset
        .rows()
        .take(sample_rows)
        .map(|row| row.into_iter().cloned().collect())
        .collect();

    info!(columns = columns.len(), rows = dataset.row_count(), "analyzed dataset");
    Analysis { columns, sample }
}
