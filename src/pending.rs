//! Hand-off records between the upload request and the confirm/load requests.
//!
//! A [`PendingImport`] is written as `<token>.pending.json` next to the
//! uploaded file. Records expire after a configured time; expired records
//! are purged together with their uploads.

use crate::analyzer::ColumnSchema;
use crate::error::SheetLoaderError;
use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;
use sha2::Digest;
use sha2::Sha256;
use std::fs::File;
use std::io::BufReader;
use std::io::ErrorKind;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use tracing::info;
use tracing::warn;
use uuid::Uuid;

const RECORD_SUFFIX: &str = ".pending.json";

/// Buffer size for reading files during hashing.
const BUFFER_SIZE: usize = 65536;

#[derive(Error, Debug)]
pub enum PendingError {
    #[error("Invalid import token '{0}'")]
    InvalidToken(String),

    #[error("Import '{0}' not found, please upload the file again")]
    NotFound(Uuid),

    #[error("Import '{0}' has expired, please upload the file again")]
    Expired(Uuid),

    #[error("File '{0}' changed since it was analyzed, please upload it again")]
    ContentChanged(String),
}

/// An analyzed upload waiting for schema confirmation and load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PendingImport {
    pub token: Uuid,
    pub file_path: PathBuf,
    pub partition_key: String,
    pub proposed_schema: Vec<ColumnSchema>,
    /// SHA-256 of the upload at analysis time, lower-case hex
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

impl PendingImport {
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        match chrono::Duration::from_std(ttl) {
            Ok(ttl) => now - self.created_at > ttl,
            Err(_) => false,
        }
    }
}

/// Computes the SHA-256 of a file as lower-case hex.
pub fn content_hash(path: &Path) -> Result<String, SheetLoaderError> {
    let file = File::open(path)?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Pending import records stored in one directory.
#[derive(Clone, Debug)]
pub struct PendingStore {
    dir: PathBuf,
    ttl: Duration,
}

impl PendingStore {
    pub fn new(dir: impl Into<PathBuf>, ttl: Duration) -> Self {
        PendingStore { dir: dir.into(), ttl }
    }

    fn record_path(&self, token: &Uuid) -> PathBuf {
        self.dir.join(format!("{token}{RECORD_SUFFIX}"))
    }

    /// Location for an upload staged under `token`.
    ///
    /// The token is part of the file name, so two uploads of the same file
    /// for the same key never share a path and purging one leaves the other.
    pub fn upload_path(&self, token: &Uuid, partition_key: &str, file_name: &str) -> PathBuf {
        self.dir.join(format!("{partition_key}_{token}_{file_name}"))
    }

    /// Hashes the upload and stores a new record for it.
    pub fn create(
        &self,
        token: Uuid,
        file_path: &Path,
        partition_key: &str,
        proposed_schema: Vec<ColumnSchema>,
    ) -> Result<PendingImport, SheetLoaderError> {
        let pending = PendingImport {
            token,
            file_path: file_path.to_owned(),
            partition_key: partition_key.to_owned(),
            proposed_schema,
            content_hash: content_hash(file_path)?,
            created_at: Utc::now(),
        };
        std::fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_vec_pretty(&pending)?;
        std::fs::write(self.record_path(&pending.token), json)?;
        debug!(token = %pending.token, file = %file_path.display(), "stored pending import");
        Ok(pending)
    }

    /// Looks up a record by its token.
    ///
    /// Only well-formed UUIDs are accepted, so a token can never address a
    /// path outside the store. Expired records are removed and reported as such.
    pub fn get(&self, token: &str) -> Result<PendingImport, SheetLoaderError> {
        let token = Uuid::parse_str(token.trim()).map_err(|_| PendingError::InvalidToken(token.to_owned()))?;
        let json = match std::fs::read(self.record_path(&token)) {
            Ok(json) => json,
            Err(error) if error.kind() == ErrorKind::NotFound => Err(PendingError::NotFound(token))?,
            Err(error) => Err(error)?,
        };
        let pending: PendingImport = serde_json::from_slice(&json)?;
        if pending.is_expired(self.ttl, Utc::now()) {
            self.remove(&pending)?;
            Err(PendingError::Expired(token))?
        }
        Ok(pending)
    }

    /// Fails unless the upload still has the hash recorded at analysis time.
    pub fn verify_content(&self, pending: &PendingImport) -> Result<(), SheetLoaderError> {
        let actual = match content_hash(&pending.file_path) {
            Ok(actual) => actual,
            Err(SheetLoaderError::IoError(error)) if error.kind() == ErrorKind::NotFound => String::new(),
            Err(error) => return Err(error),
        };
        if actual != pending.content_hash {
            Err(PendingError::ContentChanged(pending.file_path.display().to_string()))?
        }
        Ok(())
    }

    /// Deletes the record and its upload. Already-missing files are ignored.
    pub fn remove(&self, pending: &PendingImport) -> Result<(), SheetLoaderError> {
        for path in [self.record_path(&pending.token), pending.file_path.clone()] {
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(error) if error.kind() == ErrorKind::NotFound => {}
                Err(error) => Err(error)?,
            }
        }
        Ok(())
    }

    /// Removes every expired record with its upload and returns how many were purged.
    /// Unreadable records are skipped with a warning.
    pub fn purge_expired(&self) -> Result<usize, SheetLoaderError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(0),
            Err(error) => Err(error)?,
        };

        let now = Utc::now();
        let mut purged = 0usize;
        for entry in entries {
            let path = entry?.path();
            let is_record = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(RECORD_SUFFIX));
            if !is_record {
                continue;
            }
            let pending = match std::fs::read(&path)
                .map_err(SheetLoaderError::from)
                .and_then(|json| Ok(serde_json::from_slice::<PendingImport>(&json)?))
            {
                Ok(pending) => pending,
                Err(error) => {
                    warn!(record = %path.display(), %error, "skipping unreadable pending import");
                    continue;
                }
            };
            if pending.is_expired(self.ttl, now) {
                self.remove(&pending)?;
                purged += 1;
            }
        }

        if purged > 0 {
            info!(purged, "purged expired pending imports");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::column::ColumnType;

    fn schema() -> Vec<ColumnSchema> {
        vec![ColumnSchema {
            original_name: "Start Date".to_owned(),
            cleaned_name: "Start_Date".to_owned(),
            inferred_type: ColumnType::Text,
        }]
    }

    fn upload(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn hashes_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = upload(dir.path(), "a.csv", "abc");
        assert_eq!(
            content_hash(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn stores_and_reads_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::new(dir.path(), Duration::from_secs(60));
        let path = upload(dir.path(), "2024_a.csv", "year\n2024\n");

        let pending = store.create(Uuid::new_v4(), &path, "2024", schema()).unwrap();
        let read = store.get(&pending.token.to_string()).unwrap();
        assert_eq!(read, pending);
        assert!(store.verify_content(&read).is_ok());
    }

    #[test]
    fn rejects_bad_tokens() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::new(dir.path(), Duration::from_secs(60));
        assert!(matches!(
            store.get("../../etc/passwd"),
            Err(SheetLoaderError::PendingError(PendingError::InvalidToken(_)))
        ));
        assert!(matches!(
            store.get(&Uuid::new_v4().to_string()),
            Err(SheetLoaderError::PendingError(PendingError::NotFound(_)))
        ));
    }

    #[test]
    fn detects_changed_upload() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::new(dir.path(), Duration::from_secs(60));
        let path = upload(dir.path(), "2024_a.csv", "year\n2024\n");
        let pending = store.create(Uuid::new_v4(), &path, "2024", schema()).unwrap();

        std::fs::write(&path, "year\n2025\n").unwrap();
        assert!(matches!(
            store.verify_content(&pending),
            Err(SheetLoaderError::PendingError(PendingError::ContentChanged(_)))
        ));

        std::fs::remove_file(&path).unwrap();
        assert!(store.verify_content(&pending).is_err());
    }

    #[test]
    fn expires_and_purges_records() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::new(dir.path(), Duration::from_secs(60));
        let old_path = upload(dir.path(), "2023_a.csv", "year\n2023\n");
        let new_path = upload(dir.path(), "2024_a.csv", "year\n2024\n");

        let mut old = store.create(Uuid::new_v4(), &old_path, "2023", schema()).unwrap();
        old.created_at -= chrono::Duration::hours(2);
        std::fs::write(store.record_path(&old.token), serde_json::to_vec(&old).unwrap()).unwrap();
        let new = store.create(Uuid::new_v4(), &new_path, "2024", schema()).unwrap();
        std::fs::write(dir.path().join("junk.pending.json"), "{").unwrap();

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(!old_path.exists());
        assert!(new_path.exists());
        assert!(store.get(&new.token.to_string()).is_ok());
        assert!(matches!(
            store.get(&old.token.to_string()),
            Err(SheetLoaderError::PendingError(PendingError::NotFound(_)))
        ));
    }

    #[test]
    fn get_reports_expired_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::new(dir.path(), Duration::from_secs(0));
        let path = upload(dir.path(), "2024_a.csv", "year\n2024\n");
        let mut pending = store.create(Uuid::new_v4(), &path, "2024", schema()).unwrap();
        pending.created_at -= chrono::Duration::seconds(5);
        std::fs::write(store.record_path(&pending.token), serde_json::to_vec(&pending).unwrap()).unwrap();

        assert!(matches!(
            store.get(&pending.token.to_string()),
            Err(SheetLoaderError::PendingError(PendingError::Expired(_)))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn same_upload_twice_gets_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = PendingStore::new(dir.path(), Duration::from_secs(60));
        let (first_token, second_token) = (Uuid::new_v4(), Uuid::new_v4());
        let first_path = store.upload_path(&first_token, "2024", "list.csv");
        let second_path = store.upload_path(&second_token, "2024", "list.csv");
        assert_ne!(first_path, second_path);
        assert!(first_path.file_name().unwrap().to_str().unwrap().ends_with("_list.csv"));

        std::fs::write(&first_path, "year\n2024\n").unwrap();
        std::fs::write(&second_path, "year\n2024\n").unwrap();
        let mut first = store.create(first_token, &first_path, "2024", schema()).unwrap();
        let second = store.create(second_token, &second_path, "2024", schema()).unwrap();
        first.created_at -= chrono::Duration::hours(2);
        std::fs::write(store.record_path(&first.token), serde_json::to_vec(&first).unwrap()).unwrap();

        assert_eq!(store.purge_expired().unwrap(), 1);
        assert!(!first_path.exists());
        assert!(second_path.exists());
        let second = store.get(&second.token.to_string()).unwrap();
        assert!(store.verify_content(&second).is_ok());
    }
}
