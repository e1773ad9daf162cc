use crate::dataset::CellValue;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use chrono::Duration;
use chrono::NaiveDate;
use std::collections::HashSet;

/// Types of cell data in spreadsheet files.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as `0`/`1`
    Boolean,
    /// Numeric values
    Number,
    /// Date/time values stored as numbers from 1900 epoch
    NumberDateTime1900,
    /// Date values stored as numbers from 1900 epoch
    NumberDate1900,
    /// Time values stored as numbers from 1900 epoch
    NumberTime1900,
    /// Date/time values stored as numbers from 1904 epoch
    NumberDateTime1904,
    /// Date values stored as numbers from 1904 epoch
    NumberDate1904,
    /// Time values stored as numbers from 1904 epoch
    NumberTime1904,
    /// ISO 8601 date/time strings
    IsoDateTime,
    /// Inline string values
    InlineString,
    /// Shared string table references
    SharedString,
    /// Error values such as `#DIV/0!`
    Error,
}

impl CellType {
    /// Parses built-in Excel number format IDs to determine cell type.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 }),
            _ => None,
        }
    }

    /// Parses custom number format strings to determine cell type.
    /// Literal text, escapes and `[...]` sections are ignored.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_bracket = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_bracket => is_literal = true,

                ']' if is_bracket => is_bracket = false,
                '[' if !is_literal => is_bracket = true,
                _ if is_literal || is_bracket => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }
}

/// A single cell in a worksheet with position, type, and raw value.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    /// Raw value; an index into the shared string table for [`CellType::SharedString`]
    pub(crate) value: String,
}

impl Cell {
    pub(crate) fn new(row: usize, col: usize, kind: CellType, value: String) -> Self {
        Cell { row, col, kind, value }
    }

    /// Returns the Excel-style cell reference (e.g., "A1", "B2").
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Resolves the raw value into a [`CellValue`].
    ///
    /// Strings listed in `nulls` resolve to [`CellValue::Missing`], as do
    /// empty and error cells. Date-formatted numbers become ISO text, and
    /// numbers that fail to parse are kept as text.
    pub(crate) fn resolve(
        &self,
        shared_strings: &[String],
        nulls: &HashSet<String>,
    ) -> Result<CellValue, SpreadsheetError> {
        let text = |value: &str| {
            if nulls.contains(value) {
                CellValue::Missing
            } else {
                CellValue::Text(value.to_owned())
            }
        };

        let value = match self.kind {
            CellType::Empty | CellType::Error => CellValue::Missing,
            CellType::Boolean => CellValue::Text(if self.value.trim() == "1" { "TRUE" } else { "FALSE" }.to_owned()),
            CellType::Number => match self.value.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => CellValue::Number(number),
                _ => text(&self.value),
            },
            CellType::NumberDateTime1900 => self.formatted(to_datetime_string(&self.value, false), nulls),
            CellType::NumberDateTime1904 => self.formatted(to_datetime_string(&self.value, true), nulls),
            CellType::NumberDate1900 => self.formatted(to_date_string(&self.value, false), nulls),
            CellType::NumberDate1904 => self.formatted(to_date_string(&self.value, true), nulls),
            CellType::NumberTime1900 | CellType::NumberTime1904 => self.formatted(to_time_string(&self.value), nulls),
            CellType::IsoDateTime => text(&self.value.replace('T', " ")),
            CellType::InlineString => text(&self.value),
            CellType::SharedString => {
                let string = self
                    .value
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| shared_strings.get(index))
                    .ok_or_else(|| SpreadsheetError::SharedStringError {
                        reference: self.reference(),
                        index: self.value.clone(),
                    })?;
                text(string)
            }
        };
        Ok(value)
    }

    /// Uses the formatted date when the raw value is a valid serial number,
    /// otherwise keeps the raw value as text.
    fn formatted(&self, formatted: Option<String>, nulls: &HashSet<String>) -> CellValue {
        match formatted {
            Some(value) => CellValue::Text(value),
            None if nulls.contains(&self.value) => CellValue::Missing,
            None => CellValue::Text(self.value.clone()),
        }
    }
}

fn parse_serial(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|serial| serial.is_finite())
}

/// Converts an Excel serial day to an ISO date.
/// Serials below 60 are shifted by one day to skip the fictitious 1900-02-29.
fn to_date(serial: f64, is_1904: bool) -> Option<NaiveDate> {
    let days = serial.trunc();
    if days.abs() > 3_000_000f64 {
        return None;
    }
    let days = days as i64;
    let offset = if is_1904 {
        1462
    } else if days < 60 {
        1
    } else {
        0
    };
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_signed(Duration::try_days(days + offset)?)
}

fn to_date_string(value: &str, is_1904: bool) -> Option<String> {
    let date = to_date(parse_serial(value)?, is_1904)?;
    Some(date.format("%Y-%m-%d").to_string())
}

/// Formats the fractional day of a serial as `HH:MM:SS`, adding milliseconds when present.
fn format_time(serial: f64) -> String {
    let mut remaining = (serial.fract().abs() * 86_400_000f64).round() as i64;
    let milliseconds = remaining % 1_000;
    remaining /= 1_000;
    let seconds = remaining % 60;
    remaining /= 60;
    let minutes = remaining % 60;
    let hours = remaining / 60;
    if milliseconds > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}.{milliseconds:03}")
    } else {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    }
}

fn to_time_string(value: &str) -> Option<String> {
    parse_serial(value).map(format_time)
}

fn to_datetime_string(value: &str, is_1904: bool) -> Option<String> {
    let serial = parse_serial(value)?;
    let date = to_date(serial, is_1904)?;
    Some(format!("{} {}", date.format("%Y-%m-%d"), format_time(serial)))
}
