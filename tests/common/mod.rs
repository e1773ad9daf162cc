#![allow(dead_code)]

use sheet_loader::Importer;
use sheet_loader::LoaderConfig;
use std::io::Cursor;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A cell written into a test workbook
pub enum Fixture {
    Blank,
    Number(f64),
    /// Stored in the shared string table
    Shared(&'static str),
    /// Stored inline in the worksheet
    Inline(&'static str),
}

const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

fn column_letter(index: usize) -> String {
    let mut index = index + 1;
    let mut letters = Vec::new();
    while index > 0 {
        let remainder = (index - 1) % 26;
        letters.push(b'A' + remainder as u8);
        index = (index - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap()
}

/// Builds a single-sheet `.xlsx` file holding `rows`.
pub fn xlsx_bytes(rows: &[Vec<Fixture>]) -> Vec<u8> {
    let mut shared = Vec::<&str>::new();
    let mut sheet = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>"#,
    );
    for (row_index, row) in rows.iter().enumerate() {
        sheet.push_str(&format!("<row r=\"{}\">", row_index + 1));
        for (col_index, cell) in row.iter().enumerate() {
            let reference = format!("{}{}", column_letter(col_index), row_index + 1);
            match cell {
                Fixture::Blank => {}
                Fixture::Number(value) => {
                    sheet.push_str(&format!("<c r=\"{reference}\"><v>{value}</v></c>"));
                }
                Fixture::Shared(text) => {
                    let index = shared.iter().position(|it| it == text).unwrap_or_else(|| {
                        shared.push(*text);
                        shared.len() - 1
                    });
                    sheet.push_str(&format!("<c r=\"{reference}\" t=\"s\"><v>{index}</v></c>"));
                }
                Fixture::Inline(text) => {
                    sheet.push_str(&format!("<c r=\"{reference}\" t=\"inlineStr\"><is><t>{text}</t></is></c>"));
                }
            }
        }
        sheet.push_str("</row>");
    }
    sheet.push_str("</sheetData></worksheet>");

    let mut strings = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        shared.len()
    );
    for text in &shared {
        strings.push_str(&format!("<si><t>{text}</t></si>"));
    }
    strings.push_str("</sst>");

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in [
        ("xl/_rels/workbook.xml.rels", RELS.to_owned()),
        ("xl/workbook.xml", WORKBOOK.to_owned()),
        ("xl/sharedStrings.xml", strings),
        ("xl/worksheets/sheet1.xml", sheet),
    ] {
        writer.start_file(name, SimpleFileOptions::default()).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Internship list used across tests:
///
/// | Start Date | Pay (KRW) | Hours | Company |
/// |---|---|---|---|
/// | 2024-03-01 | 1000 | 7.5 | Acme |
/// | 2024-04-01 | 2000 | 8 | Beta |
/// | | N/A | | Gamma |
pub fn internship_workbook() -> Vec<u8> {
    use Fixture::*;
    xlsx_bytes(&[
        vec![Inline("Start Date"), Inline("Pay (KRW)"), Inline("Hours"), Inline("Company")],
        vec![Shared("2024-03-01"), Number(1000.0), Number(7.5), Shared("Acme")],
        vec![Shared("2024-04-01"), Number(2000.0), Number(8.0), Shared("Beta")],
        vec![Blank, Shared("N/A"), Blank, Shared("Gamma")],
    ])
}

pub fn test_config(dir: &Path) -> LoaderConfig {
    LoaderConfig {
        database_path: dir.join("test.duckdb"),
        upload_dir: dir.join("uploads"),
        ..LoaderConfig::default()
    }
}

pub fn test_importer(dir: &Path) -> Importer {
    Importer::new(test_config(dir)).unwrap()
}
