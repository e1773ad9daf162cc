use crate::dataset::Dataset;
use crate::error::SheetLoaderError;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::options::ReadOptions;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::row_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;
use std::io::Seek;
use std::path::Path;
use tracing::debug;
use zip::ZipArchive;

// XML tag names for parsing Excel XLSX format
const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs"); // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh"); // Phonetic text for Asian languages
const TAG_TEXT: QName = QName(b"t");
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

const WORKBOOK_PATH: &str = "xl/workbook.xml";
const WORKBOOK_RELATIONSHIPS_PATH: &str = "xl/_rels/workbook.xml.rels";
const STYLES_PATH: &str = "xl/styles.xml";
const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";

/// An opened `.xlsx`/`.xlsm` workbook
pub(crate) struct XlsxWorkbook<RS: Read + Seek> {
    /// File name used in error messages
    name: String,
    zip: ZipArchive<RS>,
    /// Cell types indexed by style ID
    number_formats: Vec<CellType>,
    /// Worksheets as (name, zip_path) pairs in workbook order
    sheets: Vec<(String, String)>,
}

impl XlsxWorkbook<BufReader<File>> {
    pub(crate) fn open(path: &Path) -> Result<Self, SheetLoaderError> {
        let file = File::open(path)?;
        Self::new(&path.display().to_string(), BufReader::new(file))
    }
}

impl<RS: Read + Seek> XlsxWorkbook<RS> {
    /// Reads the workbook structure and styles from an archive
    pub(crate) fn new(name: &str, reader: RS) -> Result<Self, SheetLoaderError> {
        let mut zip = ZipArchive::new(reader)?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::NoWorksheet(name.to_owned()))?
        }
        let number_formats = load_number_formats(&mut zip, is_1904)?;
        Ok(XlsxWorkbook {
            name: name.to_owned(),
            zip,
            number_formats,
            sheets,
        })
    }

    pub(crate) fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Loads the first worksheet as a dataset
    pub(crate) fn read_first_sheet(&mut self, options: &ReadOptions) -> Result<Dataset, SheetLoaderError> {
        let shared_strings = self.load_shared_strings()?;
        let sheet = self.read_sheet(0)?;
        debug!(
            workbook = %self.name,
            sheets = ?self.sheet_names(),
            sheet = %sheet.name,
            cells = sheet.cells.len(),
            rows = ?sheet.row_lower_bound.zip(sheet.row_upper_bound),
            "read first worksheet"
        );
        let dataset = sheet.into_dataset(|cell| cell.resolve(&shared_strings, &options.nulls))?;
        Ok(dataset)
    }

    /// Loads the shared string table, which is optional in a workbook
    fn load_shared_strings(&mut self) -> Result<Vec<String>, SheetLoaderError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader(SHARED_STRINGS_PATH)? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }

    /// Collects the cells of the worksheet at `index`.
    /// Cells without an `r` attribute take the next position in their row;
    /// a reference outside the worksheet grid is an error.
    fn read_sheet(&mut self, index: usize) -> Result<Sheet, SheetLoaderError> {
        let (sheet_name, zip_path) = self
            .sheets
            .get(index)
            .cloned()
            .ok_or_else(|| SpreadsheetError::NoWorksheet(self.name.clone()))?;
        let mut sheet = Sheet::new(&sheet_name);
        let mut reader = self
            .zip
            .xml_reader(&zip_path)?
            .ok_or_else(|| SpreadsheetError::MissingPart(zip_path.clone()))?;

        let mut row_count = 0usize;
        let mut col_count = 0usize;
        let mut row = 0usize;
        let mut col = 0usize;
        let mut kind = CellType::default();
        let mut value = String::new();
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_ROW => {
                if let Some(row) = event.get_attribute_value("r")?.and_then(|number| row_to_index(number.trim())) {
                    row_count = row;
                }
                col_count = 0;
            }
            Event::End(event) if event.name() == TAG_ROW => {
                row_count += 1;
            }
            Event::Start(event) if event.name() == TAG_CELL => {
                (row, col) = match event.get_attribute_value("r")? {
                    Some(reference) => reference_to_index(&reference)
                        .ok_or_else(|| SpreadsheetError::InvalidReference(reference.to_string()))?,
                    None => (row_count, col_count),
                };
                col_count = col + 1;
                value.clear();
                kind = event
                    .get_attribute_value("t")?
                    .map(|t| match t.as_ref() {
                        "inlineStr" | "str" => CellType::InlineString,
                        "s" => CellType::SharedString,
                        "d" => CellType::IsoDateTime,
                        "b" => CellType::Boolean,
                        "e" => CellType::Error,
                        _ => CellType::Number,
                    })
                    .unwrap_or(CellType::Number);
                if kind == CellType::Number {
                    if let Some(style) = event.get_attribute_value("s")? {
                        if let Ok(index) = style.trim().parse::<usize>() {
                            kind = self.number_formats.get(index).copied().unwrap_or(CellType::Number);
                        }
                    }
                }
            }
            Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                value = read_string_value(&mut reader, TAG_INLINE_STRING, false)?;
            }
            Event::Start(event) if event.name() == TAG_VALUE => {
                value = read_string_value(&mut reader, TAG_VALUE, true)?;
            }
            Event::End(event) if !value.is_empty() && event.name() == TAG_CELL => {
                sheet.push(Cell::new(row, col, kind, std::mem::take(&mut value)));
            }
        });
        Ok(sheet)
    }
}

/// Loads worksheet names and paths, and whether the workbook uses the 1904 date system
fn load_workbook<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
) -> Result<(Vec<(String, String)>, bool), SheetLoaderError> {
    let relationships = load_relationships(zip, WORKBOOK_RELATIONSHIPS_PATH)?;
    let mut reader = zip
        .xml_reader(WORKBOOK_PATH)?
        .ok_or_else(|| SpreadsheetError::MissingPart(WORKBOOK_PATH.to_owned()))?;
    let mut sheets = Vec::<(String, String)>::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<String>;
            let mut id = None::<String>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?.to_string());
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?.to_string());
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&id) {
                    sheets.push((name, path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event
                .get_attribute_value("date1904")?
                .map(|value| value == "1" || value == "true")
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Maps worksheet relationship IDs to their paths inside the archive
fn load_relationships<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    path: &str,
) -> Result<HashMap<String, String>, SheetLoaderError> {
    let mut reader = zip
        .xml_reader(path)?
        .ok_or_else(|| SpreadsheetError::MissingPart(path.to_owned()))?;
    let mut relationships = HashMap::<String, String>::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.get_attribute_value("Id")?;
            let kind = event.get_attribute_value("Type")?;
            let target = event.get_attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(&target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Resolves a relationship target relative to the `xl/` folder
fn to_zip_path(path: &str) -> String {
    if let Some(path) = path.strip_prefix('/') {
        path.to_owned()
    } else if path.starts_with("xl/") {
        path.to_owned()
    } else {
        format!("xl/{path}")
    }
}

/// Maps every cell style to the cell type implied by its number format
fn load_number_formats<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    is_1904: bool,
) -> Result<Vec<CellType>, SheetLoaderError> {
    let mut reader = match zip.xml_reader(STYLES_PATH)? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?.map(|id| id.to_string());
            format_indexes.push(id.unwrap_or_else(|| "0".to_owned()));
        }
    });

    Ok(format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .copied()
                .or_else(|| CellType::parse_builtin_number_format_id(id, is_1904))
                .unwrap_or(CellType::Number)
        })
        .collect())
}

/// Reads the text of a string item, skipping phonetic runs
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, SheetLoaderError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&String::from_utf8_lossy(&event)),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}
