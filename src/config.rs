//! Configuration for the loader and its HTTP front end.
//!
//! Uses `figment` for layered configuration: defaults -> TOML file -> environment.

use crate::helpers::encoding::encoding_for_label;
use figment::providers::Env;
use figment::providers::Format;
use figment::providers::Serialized;
use figment::providers::Toml;
use figment::Figment;
use serde::Deserialize;
use serde::Serialize;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Prefix of environment variables read by [`load_config`]
pub const ENV_PREFIX: &str = "SHEET_LOADER_";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("table_prefix must not be empty")]
    EmptyTablePrefix,

    #[error("Unknown encoding '{0}'")]
    UnknownEncoding(String),

    #[error("sample_rows must be at least 1")]
    ZeroSampleRows,
}

/// Settings passed explicitly to the importer and the server.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// DuckDB database file
    pub database_path: PathBuf,
    /// Where uploads and pending import records are kept
    pub upload_dir: PathBuf,
    /// Tables are named `<table_prefix>_<partition key>`
    pub table_prefix: String,
    /// Rows shown on the confirmation page
    pub sample_rows: usize,
    /// Seconds before an unconfirmed upload is purged
    pub pending_ttl_secs: u64,
    /// Cell texts read as missing values
    pub null_literals: Vec<String>,
    /// Encoding tried for CSV files that are not UTF-8
    pub csv_fallback_encoding: String,
    pub max_upload_bytes: usize,
    pub host: String,
    pub port: u16,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("internships.duckdb"),
            upload_dir: PathBuf::from("uploads"),
            table_prefix: "internships".to_owned(),
            sample_rows: 5,
            pending_ttl_secs: 24 * 60 * 60,
            null_literals: ["", "#N/A", "N/A", "NA", "NULL", "NaN", "nan", "null"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            csv_fallback_encoding: "EUC-KR".to_owned(),
            max_upload_bytes: 16 * 1024 * 1024,
            host: "127.0.0.1".to_owned(),
            port: 5000,
        }
    }
}

impl LoaderConfig {
    pub fn pending_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_ttl_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.table_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyTablePrefix);
        }
        if encoding_for_label(&self.csv_fallback_encoding).is_none() {
            return Err(ConfigError::UnknownEncoding(self.csv_fallback_encoding.clone()));
        }
        if self.sample_rows == 0 {
            return Err(ConfigError::ZeroSampleRows);
        }
        Ok(())
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Environment variables (`SHEET_LOADER_PORT`, `SHEET_LOADER_UPLOAD_DIR`, ...)
/// 2. The TOML file at `path`, if given and present
/// 3. Built-in defaults
pub fn load_config(path: Option<&Path>) -> Result<LoaderConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(LoaderConfig::default()));
    if let Some(path) = path {
        figment = figment.merge(Toml::file(path));
    }
    figment = figment.merge(Env::prefixed(ENV_PREFIX));
    figment.extract().map_err(Box::new)
}
