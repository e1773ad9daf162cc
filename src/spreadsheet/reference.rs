//! Conversion between A1-style cell references and 0-based indexes.

/// Columns in an Excel 2007+ worksheet (`A` to `XFD`)
pub(crate) const MAX_COLUMNS: usize = 16_384;

/// Rows in an Excel 2007+ worksheet
pub(crate) const MAX_ROWS: usize = 1_048_576;

/// Converts column letters (`"A"`, `"AB"`) to a 0-based column index.
/// Columns past `XFD` are rejected.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || letters.len() > 3 || !letters.bytes().all(|byte| byte.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .bytes()
        .map(|byte| (byte.to_ascii_uppercase() - b'A') as usize + 1)
        .try_fold(0usize, |index, digit| index.checked_mul(26)?.checked_add(digit))
        .map(|column| column - 1)
        .filter(|column| *column < MAX_COLUMNS)
}

/// Converts a 1-based row number (`"12"`) to a 0-based row index.
/// Rows past the worksheet limit are rejected.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number
        .parse::<usize>()
        .ok()
        .filter(|row| (1..=MAX_ROWS).contains(row))
        .map(|row| row - 1)
}

/// Splits a reference such as `"C7"` into a 0-based `(row, col)` pair
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters)?))
}

/// Formats a 0-based `(row, col)` pair as an A1-style reference
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut letters = Vec::new();
    let mut column = col + 1;
    while column > 0 {
        column -= 1;
        letters.push(b'A' + (column % 26) as u8);
        column /= 26;
    }
    letters.reverse();
    format!("{}{}", String::from_utf8_lossy(&letters), row + 1)
}
