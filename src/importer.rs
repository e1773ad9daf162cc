//! Request-level import service.
//!
//! Each method is one step of the upload flow and opens its own storage
//! connection, so the steps can run in separate requests:
//!
//! 1. [`Importer::stage_upload`] saves and analyzes the file and returns a token
//! 2. [`Importer::create_table`] creates the confirmed table for that token
//! 3. [`Importer::load`] re-reads the file and inserts its rows

use crate::analyzer::analyze;
use crate::analyzer::Analysis;
use crate::config::LoaderConfig;
use crate::database::column::Column;
use crate::database::column::ColumnType;
use crate::database::loader;
use crate::database::loader::LoadError;
use crate::database::open_connection;
use crate::database::schema;
use crate::database::table::table_name;
use crate::database::table::validate_partition_key;
use crate::database::table::TableSchema;
use crate::error::SheetLoaderError;
use crate::pending::PendingImport;
use crate::pending::PendingStore;
use crate::spreadsheet::is_supported;
use crate::spreadsheet::read_dataset;
use crate::spreadsheet::ReadOptions;
use crate::spreadsheet::SpreadsheetError;
use serde::Serialize;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

/// Failures reported back to the person running the import.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Missing or invalid request data; nothing was changed
    #[error("{0}")]
    Input(String),

    #[error("Failed to process the file: {0}")]
    Spreadsheet(SheetLoaderError),

    #[error("Failed to create the table: {0}")]
    Schema(duckdb::Error),

    /// The insert batch failed and was rolled back
    #[error("Failed to insert data: {0}")]
    Load(duckdb::Error),
}

impl ImportError {
    fn input(message: impl ToString) -> Self {
        ImportError::Input(message.to_string())
    }
}

/// A saved and analyzed upload.
#[derive(Clone, Debug)]
pub struct StagedUpload {
    pub pending: PendingImport,
    pub analysis: Analysis,
}

/// Result of a completed load.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoadOutcome {
    pub table_name: String,
    pub inserted_count: usize,
}

/// Drives the analyze, create and load steps against one configuration.
#[derive(Clone, Debug)]
pub struct Importer {
    config: LoaderConfig,
    store: PendingStore,
    options: ReadOptions,
}

impl Importer {
    pub fn new(config: LoaderConfig) -> Result<Self, SheetLoaderError> {
        config.validate()?;
        let store = PendingStore::new(&config.upload_dir, config.pending_ttl());
        let options = ReadOptions::from_config(&config);
        Ok(Importer { config, store, options })
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Saves an upload as `<upload_dir>/<key>_<token>_<file name>`, analyzes
    /// it and records a pending import under that token.
    ///
    /// Expired pending imports are purged first. The saved file is removed
    /// again if it cannot be read.
    pub fn stage_upload(
        &self,
        file_name: &str,
        bytes: &[u8],
        partition_key: Option<&str>,
    ) -> Result<StagedUpload, ImportError> {
        let partition_key = partition_key.map(str::trim).unwrap_or_default();
        if file_name.trim().is_empty() || partition_key.is_empty() {
            return Err(ImportError::input("Choose both a year and a file"));
        }
        let partition_key = validate_partition_key(partition_key).map_err(ImportError::input)?;
        let file_name = secure_file_name(file_name);
        if !is_supported(Path::new(&file_name)) {
            let error = SpreadsheetError::UnsupportedFormat(file_name);
            return Err(ImportError::Spreadsheet(error.into()));
        }

        match self.store.purge_expired() {
            Ok(_) => {}
            Err(error) => warn!(%error, "failed to purge expired imports"),
        }

        let token = Uuid::new_v4();
        let path = self.store.upload_path(&token, partition_key, &file_name);
        self.save_upload(&path, bytes).map_err(ImportError::Spreadsheet)?;

        let staged = read_dataset(&path, &self.options).and_then(|dataset| {
            let analysis = analyze(&dataset, self.config.sample_rows);
            let pending = self.store.create(token, &path, partition_key, analysis.columns.clone())?;
            Ok(StagedUpload { pending, analysis })
        });
        match staged {
            Ok(staged) => {
                info!(token = %staged.pending.token, file = %path.display(), "staged upload");
                Ok(staged)
            }
            Err(error) => {
                if let Err(error) = std::fs::remove_file(&path) {
                    warn!(file = %path.display(), %error, "failed to remove unreadable upload");
                }
                Err(ImportError::Spreadsheet(error))
            }
        }
    }

    fn save_upload(&self, path: &Path, bytes: &[u8]) -> Result<(), SheetLoaderError> {
        std::fs::create_dir_all(&self.config.upload_dir)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    fn pending(&self, token: &str) -> Result<PendingImport, ImportError> {
        self.store.get(token).map_err(|error| {
            warn!(token, %error, "rejected import token");
            ImportError::input(error)
        })
    }

    /// Drops and recreates the table for a pending import with the confirmed
    /// `(name, type)` pairs, in order.
    pub fn create_table(&self, token: &str, columns: Vec<(String, String)>) -> Result<TableSchema, ImportError> {
        let pending = self.pending(token)?;
        if columns.is_empty() {
            return Err(ImportError::input("Required information is missing"));
        }
        let columns = columns
            .into_iter()
            .map(|(name, kind)| ColumnType::parse(&kind).map(|kind| Column::new(name.trim(), kind)))
            .collect::<Result<Vec<_>, _>>()
            .map_err(ImportError::input)?;
        let name = table_name(&self.config.table_prefix, &pending.partition_key).map_err(ImportError::input)?;
        let table = TableSchema::new(name, columns).map_err(ImportError::input)?;

        let connection = open_connection(&self.config.database_path).map_err(ImportError::Schema)?;
        schema::create_table(&connection, &table).map_err(ImportError::Schema)?;
        Ok(table)
    }

    /// Loads the pending upload into its table, then discards the upload.
    ///
    /// The table definition is read from the catalog, and the upload must
    /// still match the hash taken when it was analyzed.
    pub fn load(&self, token: &str) -> Result<LoadOutcome, ImportError> {
        let pending = self.pending(token)?;
        self.store.verify_content(&pending).map_err(ImportError::input)?;
        let name = table_name(&self.config.table_prefix, &pending.partition_key).map_err(ImportError::input)?;

        let mut connection = open_connection(&self.config.database_path).map_err(ImportError::Load)?;
        let table = schema::describe_table(&connection, &name)
            .map_err(ImportError::Load)?
            .ok_or_else(|| ImportError::Input(format!("Table '{name}' does not exist, confirm the schema first")))?;
        let dataset = read_dataset(&pending.file_path, &self.options).map_err(ImportError::Spreadsheet)?;

        let result = loader::load(&mut connection, &dataset, &table).map_err(|error| match error {
            LoadError::ColumnCountMismatch { .. } => ImportError::input(error),
            LoadError::Storage(error) => ImportError::Load(error),
        })?;
        drop(connection);

        if let Err(error) = self.store.remove(&pending) {
            warn!(token, %error, "failed to remove loaded upload");
        }
        Ok(LoadOutcome {
            table_name: table.name,
            inserted_count: result.inserted_count,
        })
    }
}

/// Reduces an uploaded file name to ASCII letters, digits, `.`, `_` and `-`.
///
/// Directory parts are dropped and spaces become `_`. A name with nothing
/// left before its extension becomes `upload.<extension>`.
pub fn secure_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|character| if character.is_whitespace() { '_' } else { character })
        .filter(|character| character.is_ascii_alphanumeric() || matches!(character, '.' | '_' | '-'))
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_owned();

    let path = Path::new(&cleaned);
    let has_stem = path.file_stem().is_some_and(|stem| !stem.is_empty()) && path.extension().is_some();
    if has_stem {
        return cleaned;
    }
    match Path::new(base).extension().and_then(|extension| extension.to_str()) {
        Some(extension) if extension.chars().all(|character| character.is_ascii_alphanumeric()) => {
            format!("upload.{}", extension.to_ascii_lowercase())
        }
        _ if cleaned.is_empty() => "upload".to_owned(),
        _ => cleaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn importer(dir: &Path) -> Importer {
        Importer::new(LoaderConfig {
            database_path: dir.join("test.duckdb"),
            upload_dir: dir.join("uploads"),
            ..LoaderConfig::default()
        })
        .unwrap()
    }

    fn confirmed(staged: &StagedUpload) -> Vec<(String, String)> {
        staged
            .analysis
            .columns
            .iter()
            .map(|column| (column.cleaned_name.clone(), column.inferred_type.to_string()))
            .collect()
    }

    const CSV: &[u8] = b"Start Date,Pay (KRW),Note\n2024-03-01,1000,a\n2024-04-01,x,\n";

    #[test]
    fn secures_file_names() {
        assert_eq!(secure_file_name("My List (2024).xlsx"), "My_List_2024.xlsx");
        assert_eq!(secure_file_name("../../etc/passwd.csv"), "passwd.csv");
        assert_eq!(secure_file_name("C:\\Users\\kim\\list.csv"), "list.csv");
        assert_eq!(secure_file_name("현장실습.xlsx"), "upload.xlsx");
        assert_eq!(secure_file_name(".hidden.csv"), "hidden.csv");
    }

    #[test]
    fn runs_full_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let importer = importer(dir.path());

        let staged = importer.stage_upload("list.csv", CSV, Some("2024")).unwrap();
        assert_eq!(
            staged.pending.file_path,
            dir.path().join("uploads").join(format!("2024_{}_list.csv", staged.pending.token))
        );
        let types: Vec<_> = staged.analysis.columns.iter().map(|column| column.inferred_type).collect();
        assert_eq!(types, vec![ColumnType::Text, ColumnType::Text, ColumnType::Text]);

        let mut columns = confirmed(&staged);
        columns[1].1 = "INTEGER".to_owned();
        let table = importer.create_table(&staged.pending.token.to_string(), columns).unwrap();
        assert_eq!(table.name, "internships_2024");

        let outcome = importer.load(&staged.pending.token.to_string()).unwrap();
        assert_eq!(
            outcome,
            LoadOutcome {
                table_name: "internships_2024".to_owned(),
                inserted_count: 2,
            }
        );
        assert!(!staged.pending.file_path.exists());

        let connection = open_connection(&dir.path().join("test.duckdb")).unwrap();
        let pay: Vec<Option<i64>> = connection
            .prepare("SELECT \"Pay_KRW\" FROM internships_2024 ORDER BY \"Start_Date\"")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(pay, vec![Some(1000), None]);

        assert!(matches!(
            importer.load(&staged.pending.token.to_string()),
            Err(ImportError::Input(_))
        ));
    }

    #[test]
    fn rejects_missing_input() {
        let dir = tempfile::tempdir().unwrap();
        let importer = importer(dir.path());
        assert!(matches!(importer.stage_upload("", CSV, Some("2024")), Err(ImportError::Input(_))));
        assert!(matches!(importer.stage_upload("a.csv", CSV, None), Err(ImportError::Input(_))));
        assert!(matches!(importer.stage_upload("a.csv", CSV, Some("20/24")), Err(ImportError::Input(_))));
        assert!(matches!(
            importer.stage_upload("a.pdf", CSV, Some("2024")),
            Err(ImportError::Spreadsheet(_))
        ));
    }

    #[test]
    fn removes_unreadable_upload() {
        let dir = tempfile::tempdir().unwrap();
        let importer = importer(dir.path());
        let error = importer.stage_upload("broken.xlsx", b"not a workbook", Some("2024")).unwrap_err();
        assert!(matches!(error, ImportError::Spreadsheet(_)));
        assert_eq!(std::fs::read_dir(dir.path().join("uploads")).unwrap().count(), 0);
    }

    #[test]
    fn rejects_unknown_column_type() {
        let dir = tempfile::tempdir().unwrap();
        let importer = importer(dir.path());
        let staged = importer.stage_upload("list.csv", CSV, Some("2024")).unwrap();
        let mut columns = confirmed(&staged);
        columns[0].1 = "BLOB".to_owned();
        let error = importer.create_table(&staged.pending.token.to_string(), columns).unwrap_err();
        assert_eq!(error.to_string(), "Invalid column type 'BLOB'");
    }

    #[test]
    fn rejects_column_count_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let importer = importer(dir.path());
        let staged = importer.stage_upload("list.csv", CSV, Some("2024")).unwrap();
        let columns = confirmed(&staged).into_iter().take(2).collect();
        importer.create_table(&staged.pending.token.to_string(), columns).unwrap();

        let error = importer.load(&staged.pending.token.to_string()).unwrap_err();
        assert!(matches!(error, ImportError::Input(_)));
        let connection = open_connection(&dir.path().join("test.duckdb")).unwrap();
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM internships_2024", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn rejects_changed_upload() {
        let dir = tempfile::tempdir().unwrap();
        let importer = importer(dir.path());
        let staged = importer.stage_upload("list.csv", CSV, Some("2024")).unwrap();
        importer.create_table(&staged.pending.token.to_string(), confirmed(&staged)).unwrap();

        std::fs::write(&staged.pending.file_path, b"Start Date\n2025-01-01\n").unwrap();
        let error = importer.load(&staged.pending.token.to_string()).unwrap_err();
        assert!(error.to_string().contains("changed since it was analyzed"));
    }

    #[test]
    fn purges_expired_uploads_on_new_upload() {
        let dir = tempfile::tempdir().unwrap();
        let config = LoaderConfig {
            database_path: dir.path().join("test.duckdb"),
            upload_dir: dir.path().join("uploads"),
            pending_ttl_secs: 0,
            ..LoaderConfig::default()
        };
        let importer = Importer::new(config).unwrap();
        let old = importer.stage_upload("old.csv", CSV, Some("2023")).unwrap();
        std::thread::sleep(Duration::from_millis(20));

        importer.stage_upload("new.csv", CSV, Some("2024")).unwrap();
        assert!(!old.pending.file_path.exists());
    }

    #[test]
    fn purging_older_upload_keeps_newer_one() {
        let dir = tempfile::tempdir().unwrap();
        let importer = importer(dir.path());
        let older = importer.stage_upload("list.csv", CSV, Some("2024")).unwrap();
        let newer = importer.stage_upload("list.csv", CSV, Some("2024")).unwrap();
        assert_ne!(older.pending.file_path, newer.pending.file_path);

        let record = dir.path().join("uploads").join(format!("{}.pending.json", older.pending.token));
        let mut expired = older.pending.clone();
        expired.created_at -= chrono::Duration::days(2);
        std::fs::write(&record, serde_json::to_vec(&expired).unwrap()).unwrap();

        importer.stage_upload("other.csv", CSV, Some("2025")).unwrap();
        assert!(!older.pending.file_path.exists());
        assert!(newer.pending.file_path.exists());

        let token = newer.pending.token.to_string();
        importer.create_table(&token, confirmed(&newer)).unwrap();
        assert_eq!(importer.load(&token).unwrap().inserted_count, 2);
    }
}
