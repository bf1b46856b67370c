//! Local filesystem storage implementation.
//!
//! Keeps postings in a single CSV table:
//!
//! ```text
//! Type,subType,Company,Title,Description,whenDate,pubDate,Location,link,entryDate
//! Event,workshop,Unknown,Tech Talk,Talk about bots,May 1,...,"Boston, MA",http://x/1,2024-04-01T10:00:00Z
//! ```
//!
//! Writes go to a sibling temp file that is renamed over the table, so a
//! failed write leaves the previous table intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::Posting;
use crate::storage::{PostingStore, StoreLock, WriteMetadata};

/// Column header of the table, in order.
pub const HEADER: [&str; 10] = [
    "Type",
    "subType",
    "Company",
    "Title",
    "Description",
    "whenDate",
    "pubDate",
    "Location",
    "link",
    "entryDate",
];

/// CSV file storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    path: PathBuf,
}

impl LocalStorage {
    /// Create a LocalStorage for the table at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, message: impl std::fmt::Display) -> AppError {
        AppError::storage(self.path.display(), message)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.storage_error(format!("cannot create directory: {e}")))?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let written = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(bytes).await?;
            file.flush().await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, &self.path).await
        }
        .await;

        if let Err(e) = written {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(self.storage_error(format!("write failed: {e}")));
        }
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.storage_error(format!("read failed: {e}"))),
        }
    }
}

/// Encode postings as CSV with the header row always present.
pub fn encode(postings: &[Posting]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());
    writer.write_record(HEADER)?;
    for posting in postings {
        writer.serialize(posting)?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Io(e.into_error()))
}

/// Decode a CSV table, checking the header row.
pub fn decode(bytes: &[u8]) -> Result<Vec<Posting>> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader.headers()?.clone();
    let found: Vec<&str> = headers.iter().map(str::trim).collect();
    if found != HEADER {
        return Err(AppError::validation(format!(
            "unexpected store header: {}",
            found.join(",")
        )));
    }

    reader
        .deserialize::<Posting>()
        .map(|row| row.map_err(AppError::from))
        .collect()
}

#[async_trait]
impl PostingStore for LocalStorage {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    async fn exists(&self) -> Result<bool> {
        Ok(tokio::fs::try_exists(&self.path).await?)
    }

    async fn create(&self) -> Result<()> {
        if self.exists().await? {
            return Err(self.storage_error("store already exists"));
        }
        self.write_bytes(&encode(&[])?).await?;
        log::info!("Created empty store at {}", self.path.display());
        Ok(())
    }

    async fn load(&self) -> Result<Vec<Posting>> {
        let Some(bytes) = self.read_bytes().await? else {
            return Err(self.storage_error("store does not exist (run `postboard init`)"));
        };
        let postings = decode(&bytes).map_err(|e| self.storage_error(e))?;
        log::debug!(
            "Loaded {} postings from {}",
            postings.len(),
            self.path.display()
        );
        Ok(postings)
    }

    async fn replace(&self, postings: &[Posting]) -> Result<WriteMetadata> {
        let bytes = encode(postings)?;
        self.write_bytes(&bytes).await?;
        log::info!(
            "Wrote {} postings to {}",
            postings.len(),
            self.path.display()
        );
        Ok(WriteMetadata {
            count: postings.len(),
            timestamp: Utc::now(),
        })
    }

    fn lock(&self) -> Result<StoreLock> {
        StoreLock::acquire(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, PostingKind};
    use tempfile::TempDir;

    fn posting(link: &str, title: &str) -> Posting {
        let mut p = Posting::blank(PostingKind::Event, Utc::now());
        p.sub_kind = "workshop".to_string();
        p.title = title.to_string();
        p.description = "Line one\nLine two, with a comma".to_string();
        p.occurs_at = "May 1".to_string();
        p.location = Location::from_tokens(["Remote", "Boston, MA"]);
        p.link = link.to_string();
        p
    }

    #[test]
    fn test_encode_empty_has_header() {
        let bytes = encode(&[]).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "Type,subType,Company,Title,Description,whenDate,pubDate,Location,link,entryDate\n"
        );
    }

    #[test]
    fn test_decode_rejects_foreign_header() {
        let err = decode(b"id,name\n1,x\n").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_load_missing_store_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        let err = storage.load().await.unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_create_then_load_empty() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("nested/postings.csv"));

        storage.create().await.unwrap();
        assert!(storage.exists().await.unwrap());
        assert!(storage.load().await.unwrap().is_empty());
        assert!(storage.create().await.is_err());
    }

    #[tokio::test]
    async fn test_replace_and_load_preserves_order_and_fields() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        storage.create().await.unwrap();

        let postings = vec![posting("http://x/2", "Second"), posting("http://x/1", "First")];
        let before = Utc::now();
        let meta = storage.replace(&postings).await.unwrap();
        assert_eq!(meta.count, 2);
        assert!(meta.timestamp >= before);

        let loaded = storage.load().await.unwrap();
        assert_eq!(loaded, postings);
        assert!(!dir.path().join("postings.tmp").exists());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_table() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        storage.create().await.unwrap();
        let original = vec![posting("http://x/1", "Kept")];
        storage.replace(&original).await.unwrap();

        // A directory in the temp file's place makes the write fail
        std::fs::create_dir(dir.path().join("postings.tmp")).unwrap();
        let err = storage
            .replace(&[posting("http://x/2", "Lost")])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));
        assert_eq!(storage.load().await.unwrap(), original);
    }

    #[tokio::test]
    async fn test_apostrophe_location_survives_store() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        storage.create().await.unwrap();

        let mut p = posting("http://x/1", "Field Tech");
        p.location = crate::services::location::extract_locations(
            "Location: Coeur d'Alene, ID (remote ok)",
        );
        storage.replace(std::slice::from_ref(&p)).await.unwrap();

        let loaded = storage.load().await.unwrap();
        assert_eq!(
            loaded[0].location,
            Location::Places(vec!["Remote".into(), "Coeur d'Alene, ID".into()])
        );
    }

    #[tokio::test]
    async fn test_lock_is_taken_next_to_store() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        let lock = storage.lock().unwrap();
        assert_eq!(lock.path(), dir.path().join("postings.csv.lock"));
        assert!(storage.lock().is_err());
    }
}
