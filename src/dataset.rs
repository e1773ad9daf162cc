//! In-memory tabular data read from an uploaded file.

use std::collections::HashMap;
use std::fmt::Display;

/// A single untyped spreadsheet value
#[derive(Clone, Debug, Default, PartialEq)]
pub enum CellValue {
    /// Empty cell, spreadsheet error, or a configured null literal
    #[default]
    Missing,
    /// Numeric cell as stored by the spreadsheet
    Number(f64),
    /// Any other cell, including formatted dates and booleans
    Text(String),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }

    /// Reads the value as a finite number.
    ///
    /// Text is trimmed and parsed, so `" 42 "` and `"1e3"` are numbers.
    /// `NaN` and infinities are not.
    pub fn to_number(&self) -> Option<f64> {
        match self {
            CellValue::Missing => None,
            CellValue::Number(value) => Some(*value),
            CellValue::Text(value) => value.trim().parse::<f64>().ok(),
        }
        .filter(|value| value.is_finite())
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Missing => Ok(()),
            CellValue::Number(value) => write!(f, "{value}"),
            CellValue::Text(value) => f.write_str(value),
        }
    }
}

/// One named column of a [`Dataset`]
#[derive(Clone, Debug, PartialEq)]
pub struct DatasetColumn {
    pub name: String,
    pub cells: Vec<CellValue>,
}

/// Ordered columns of equal length.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    columns: Vec<DatasetColumn>,
    row_count: usize,
}

impl Dataset {
    /// Builds a dataset from `(name, cells)` pairs.
    /// Shorter columns are padded with [`CellValue::Missing`].
    pub fn from_columns<N: Into<String>>(columns: Vec<(N, Vec<CellValue>)>) -> Self {
        let row_count = columns.iter().map(|(_, cells)| cells.len()).max().unwrap_or(0);
        let columns = columns
            .into_iter()
            .map(|(name, mut cells)| {
                cells.resize(row_count, CellValue::Missing);
                DatasetColumn {
                    name: name.into(),
                    cells,
                }
            })
            .collect();
        Dataset { columns, row_count }
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn columns(&self) -> &[DatasetColumn] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    /// Returns the cells of row `index` in column order
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        (index < self.row_count)
            .then(|| self.columns.iter().map(|column| &column.cells[index]).collect())
    }

    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> + '_ {
        (0..self.row_count).filter_map(|index| self.row(index))
    }
}

/// Turns raw header cells into distinct column names.
///
/// Blank headers become `Unnamed: <position>`; repeated names get a `.1`, `.2`, …
/// suffix in order of appearance.
pub(crate) fn unique_column_names(headers: Vec<Option<String>>) -> Vec<String> {
    let mut seen = HashMap::<String, usize>::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(position, header)| {
            let base = header
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| format!("Unnamed: {position}"));
            let mut name = base.clone();
            while let Some(count) = seen.get_mut(&name) {
                *count += 1;
                name = format!("{base}.{count}");
            }
            seen.insert(name.clone(), 0);
            name
        })
        .collect()
}
