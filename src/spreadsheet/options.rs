use crate::config::LoaderConfig;
use crate::helpers::encoding::encoding_for_label;
use encoding_rs::Encoding;
use encoding_rs::UTF_8;
use std::collections::HashSet;

/// Reader settings shared by every supported file format.
#[derive(Clone, Debug)]
pub struct ReadOptions {
    /// Cell texts read as missing values
    pub nulls: HashSet<String>,
    /// Encoding used for delimited files that are not valid UTF-8
    pub fallback_encoding: &'static Encoding,
}

impl ReadOptions {
    pub fn new<I, S>(nulls: I, fallback_encoding: &'static Encoding) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ReadOptions {
            nulls: nulls.into_iter().map(Into::into).collect(),
            fallback_encoding,
        }
    }

    /// Builds the options from a validated configuration.
    /// An unknown encoding label falls back to UTF-8.
    pub fn from_config(config: &LoaderConfig) -> Self {
        let encoding = encoding_for_label(&config.csv_fallback_encoding).unwrap_or(UTF_8);
        Self::new(config.null_literals.iter().cloned(), encoding)
    }
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self::from_config(&LoaderConfig::default())
    }
}
