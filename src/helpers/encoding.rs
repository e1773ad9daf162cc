//! Text decoding for delimited files that may not be UTF-8.

use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use std::borrow::Cow;

/// Decodes `bytes` as UTF-8 when they are valid UTF-8 (dropping a BOM),
/// otherwise with `fallback`. Invalid sequences become U+FFFD.
pub(crate) fn decode_text<'a>(bytes: &'a [u8], fallback: &'static Encoding) -> Cow<'a, str> {
    let encoding = if std::str::from_utf8(bytes).is_ok() {
        UTF_8
    } else {
        fallback
    };
    let (text, _, _) = encoding.decode(bytes);
    text
}

/// Resolves an encoding label such as `"EUC-KR"` or `"windows-1252"`
pub(crate) fn encoding_for_label(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}
