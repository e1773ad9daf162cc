use crate::dataset::unique_column_names;
use crate::dataset::CellValue;
use crate::dataset::Dataset;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::reference::MAX_COLUMNS;
use crate::spreadsheet::SpreadsheetError;
use std::collections::BTreeMap;

/// Cells collected from one worksheet or delimited file, in reading order.
pub(crate) struct Sheet {
    /// Sheet name, or the file name for delimited files
    pub(crate) name: String,
    pub(crate) cells: Vec<Cell>,
    /// Actual data range (determined from cell data)
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Returns true if the sheet contains no cells.
    pub(crate) fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Adds a cell to the sheet, updating the data range.
    pub(crate) fn push(&mut self, cell: Cell) {
        self.update_bound(cell.row, cell.col);
        self.cells.push(cell);
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|row_lower_bound| row < row_lower_bound).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|row_upper_bound| row_upper_bound < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|col_lower_bound| col < col_lower_bound).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|col_upper_bound| col_upper_bound < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Converts the collected cells into a [`Dataset`].
    ///
    /// The first row holding any non-missing value is the header row. Columns
    /// span the occupied column range, and data rows whose cells all resolve
    /// to missing are skipped. A range wider than a worksheet is an error.
    pub(crate) fn into_dataset<F>(self, resolve: F) -> Result<Dataset, SpreadsheetError>
    where
        F: Fn(&Cell) -> Result<CellValue, SpreadsheetError>,
    {
        if self.is_empty() {
            return Err(SpreadsheetError::EmptySheet(self.name));
        }
        let col_lower = self.col_lower_bound.unwrap_or_default();
        let col_upper = self.col_upper_bound.unwrap_or_default();
        let width = (col_upper - col_lower).saturating_add(1);
        if width > MAX_COLUMNS {
            return Err(SpreadsheetError::TooManyColumns {
                sheet: self.name,
                columns: width,
                max: MAX_COLUMNS,
            });
        }

        let mut rows = BTreeMap::<usize, Vec<(usize, CellValue)>>::new();
        for cell in &self.cells {
            let value = resolve(cell)?;
            if !value.is_missing() {
                rows.entry(cell.row).or_default().push((cell.col - col_lower, value));
            }
        }

        let mut rows = rows.into_values();
        let header = rows.next().ok_or_else(|| SpreadsheetError::EmptySheet(self.name.clone()))?;

        let mut headers = vec![None::<String>; width];
        for (col, value) in header {
            headers[col] = Some(value.to_string());
        }

        let mut columns = vec![Vec::<CellValue>::new(); width];
        for row in rows {
            let mut record = vec![CellValue::Missing; width];
            for (col, value) in row {
                record[col] = value;
            }
            for (column, value) in columns.iter_mut().zip(record) {
                column.push(value);
            }
        }

        Ok(Dataset::from_columns(
            unique_column_names(headers).into_iter().zip(columns).collect(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::CellType;
    use std::collections::HashSet;

    fn push(sheet: &mut Sheet, row: usize, col: usize, kind: CellType, value: &str) {
        sheet.push(Cell::new(row, col, kind, value.to_owned()));
    }

    fn resolve(cell: &Cell) -> Result<CellValue, SpreadsheetError> {
        cell.resolve(&[], &HashSet::from(["".to_owned()]))
    }

    #[test]
    fn sheet_bounds() {
        let mut sheet = Sheet::new("Sheet1");
        assert!(sheet.is_empty());
        push(&mut sheet, 1, 3, CellType::InlineString, "");
        push(&mut sheet, 3, 1, CellType::InlineString, "");

        assert_eq!(sheet.row_lower_bound, Some(1));
        assert_eq!(sheet.row_upper_bound, Some(3));
        assert_eq!(sheet.col_lower_bound, Some(1));
        assert_eq!(sheet.col_upper_bound, Some(3));
    }

    #[test]
    fn first_non_empty_row_is_header() {
        let mut sheet = Sheet::new("Sheet1");
        push(&mut sheet, 0, 0, CellType::InlineString, "");
        push(&mut sheet, 1, 0, CellType::InlineString, "year");
        push(&mut sheet, 1, 2, CellType::InlineString, "year");
        push(&mut sheet, 2, 0, CellType::Number, "2023");
        push(&mut sheet, 2, 1, CellType::InlineString, "x");
        push(&mut sheet, 3, 2, CellType::InlineString, "");
        push(&mut sheet, 4, 2, CellType::Number, "1.5");

        let dataset = sheet.into_dataset(resolve).unwrap();
        assert_eq!(dataset.column_names(), vec!["year", "Unnamed: 1", "year.1"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(
            dataset.row(0).unwrap(),
            vec![&CellValue::Number(2023.0), &CellValue::Text("x".to_owned()), &CellValue::Missing]
        );
        assert_eq!(
            dataset.row(1).unwrap(),
            vec![&CellValue::Missing, &CellValue::Missing, &CellValue::Number(1.5)]
        );
    }

    #[test]
    fn header_only_sheet_has_no_rows() {
        let mut sheet = Sheet::new("Sheet1");
        push(&mut sheet, 0, 0, CellType::InlineString, "name");
        let dataset = sheet.into_dataset(resolve).unwrap();
        assert_eq!(dataset.column_names(), vec!["name"]);
        assert_eq!(dataset.row_count(), 0);
    }

    #[test]
    fn blank_sheet_is_empty() {
        let mut sheet = Sheet::new("Sheet1");
        assert!(matches!(
            Sheet::new("Sheet1").into_dataset(resolve),
            Err(SpreadsheetError::EmptySheet(_))
        ));
        push(&mut sheet, 0, 0, CellType::InlineString, "");
        assert!(matches!(sheet.into_dataset(resolve), Err(SpreadsheetError::EmptySheet(_))));
    }

    #[test]
    fn rejects_ranges_wider_than_a_worksheet() {
        let mut sheet = Sheet::new("Sheet1");
        push(&mut sheet, 0, 0, CellType::InlineString, "a");
        push(&mut sheet, 0, MAX_COLUMNS, CellType::InlineString, "b");
        assert!(matches!(
            sheet.into_dataset(resolve),
            Err(SpreadsheetError::TooManyColumns { columns, .. }) if columns == MAX_COLUMNS + 1
        ));

        let mut sheet = Sheet::new("Sheet1");
        push(&mut sheet, 0, 0, CellType::InlineString, "a");
        push(&mut sheet, 0, usize::MAX - 1, CellType::InlineString, "b");
        assert!(matches!(sheet.into_dataset(resolve), Err(SpreadsheetError::TooManyColumns { .. })));
    }
}
