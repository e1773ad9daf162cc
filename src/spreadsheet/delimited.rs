use crate::dataset::Dataset;
use crate::error::SheetLoaderError;
use crate::helpers::encoding::decode_text;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::options::ReadOptions;
use crate::spreadsheet::sheet::Sheet;
use csv::ReaderBuilder;
use std::path::Path;

/// Reads a comma separated file into a dataset.
pub(crate) fn read_csv(path: &Path, options: &ReadOptions) -> Result<Dataset, SheetLoaderError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    parse_csv(&name, &bytes, options)
}

/// Parses delimited bytes. Every field is typed as a number so that numeric
/// text resolves to [`crate::dataset::CellValue::Number`]; ragged rows are allowed.
pub(crate) fn parse_csv(name: &str, bytes: &[u8], options: &ReadOptions) -> Result<Dataset, SheetLoaderError> {
    let text = decode_text(bytes, options.fallback_encoding);
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut sheet = Sheet::new(name);
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        for (col, field) in record.iter().enumerate() {
            sheet.push(Cell::new(row, col, CellType::Number, field.to_owned()));
        }
    }
    let dataset = sheet.into_dataset(|cell| cell.resolve(&[], &options.nulls))?;
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::CellValue;
    use encoding_rs::EUC_KR;

    fn options() -> ReadOptions {
        ReadOptions::new(["", "NA", "NULL"], EUC_KR)
    }

    #[test]
    fn parses_numbers_text_and_nulls() {
        let dataset = parse_csv("a.csv", b"year,name,score\n2023,Kim,91.5\n2024,NA,\n", &options()).unwrap();
        assert_eq!(dataset.column_names(), vec!["year", "name", "score"]);
        assert_eq!(
            dataset.row(0).unwrap(),
            vec![&CellValue::Number(2023.0), &CellValue::Text("Kim".to_owned()), &CellValue::Number(91.5)]
        );
        assert_eq!(
            dataset.row(1).unwrap(),
            vec![&CellValue::Number(2024.0), &CellValue::Missing, &CellValue::Missing]
        );
    }

    #[test]
    fn allows_ragged_rows() {
        let dataset = parse_csv("a.csv", b"a,b\n1\n2,3,4\n", &options()).unwrap();
        assert_eq!(dataset.column_names(), vec!["a", "b", "Unnamed: 2"]);
        assert_eq!(dataset.row_count(), 2);
        assert_eq!(dataset.row(0).unwrap()[1], &CellValue::Missing);
        assert_eq!(dataset.row(1).unwrap()[2], &CellValue::Number(4.0));
    }

    #[test]
    fn decodes_legacy_encoding() {
        let (bytes, _, _) = EUC_KR.encode("학교,학생수\n서울고,300\n");
        let dataset = parse_csv("a.csv", &bytes, &options()).unwrap();
        assert_eq!(dataset.column_names(), vec!["학교", "학생수"]);
        assert_eq!(dataset.row(0).unwrap()[0], &CellValue::Text("서울고".to_owned()));
    }

    #[test]
    fn rejects_empty_file() {
        assert!(parse_csv("a.csv", b"", &options()).is_err());
    }
}
