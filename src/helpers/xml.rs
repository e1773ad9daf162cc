//! Streaming XML utilities for the OOXML parts inside an `.xlsx` archive.
//! Wraps `quick_xml::Reader` with a reusable buffer and adds attribute and
//! entity helpers used by the workbook, styles and worksheet parsers.

use crate::error::SheetLoaderError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use thiserror::Error;

/// Errors raised while decoding XML content
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unknown XML entity '&{0};'")]
    UnknownEntity(String),

    #[error("Invalid character reference '&{0};'")]
    InvalidCharacterReference(String),
}

/// Event reader over a buffered XML stream
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    /// Creates a reader that tolerates the loose XML some spreadsheet writers emit.
    /// Self-closing elements are expanded so every `Start` has a matching `End`.
    pub(crate) fn new(source: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(source);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Returns the next event, or `None` at end of input
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, SheetLoaderError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer)? {
            Event::Eof => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

/// Attribute lookup on start tags
pub(crate) trait XmlNodeHelper<'a> {
    /// Gets the unescaped value of the attribute `name`, if present
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, SheetLoaderError>;
}

impl<'a> XmlNodeHelper<'a> for BytesStart<'a> {
    fn get_attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, SheetLoaderError> {
        match self.try_get_attribute(name)? {
            Some(attribute) => Ok(Some(attribute.unescape_value()?)),
            None => Ok(None),
        }
    }
}

/// Appends general references (`&amp;`, `&#x41;`) to a text buffer
pub(crate) trait XmlTextContextHelper {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), SheetLoaderError>;
}

impl XmlTextContextHelper for String {
    fn push_bytes_ref(&mut self, bytes: &BytesRef) -> Result<(), SheetLoaderError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16),
                None => number.parse::<u32>(),
            }
            .map_err(|_| XmlError::InvalidCharacterReference(raw.to_string()))?;
            let character = char::from_u32(code)
                .ok_or_else(|| XmlError::InvalidCharacterReference(raw.to_string()))?;
            self.push(character);
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::UnknownEntity(raw.to_string()))?;
        }
        Ok(())
    }
}

/// Loops over the events of an [`XmlReader`], dispatching to the given match arms.
/// Events without a matching arm are skipped.
#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(event) = $reader.next()? {
            match event {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}
