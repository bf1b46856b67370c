//! Storage abstractions for posting persistence.
//!
//! The store is one table of postings, always rewritten whole. A merge
//! reads the table, combines it with new postings and replaces it; the
//! replacement never touches the previous table until the new one is
//! complete.
//!
//! ## Single writer
//!
//! Only one load→merge→write sequence may run against a store at a time.
//! [`StoreLock`] enforces this with an advisory `<store>.lock` file that is
//! created exclusively and removed when the guard drops. Queries do not
//! take the lock.

pub mod local;

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::Posting;

pub use local::LocalStorage;

/// Metadata about a store write.
#[derive(Debug, Clone)]
pub struct WriteMetadata {
    /// Rows in the table after the write
    pub count: usize,
    pub timestamp: DateTime<Utc>,
}

/// Trait for posting store backends.
#[async_trait]
pub trait PostingStore: Send + Sync {
    /// Human-readable location of the store, used in logs and errors.
    fn describe(&self) -> String;

    /// Whether the backing table exists.
    async fn exists(&self) -> Result<bool>;

    /// Create an empty table. Fails if one already exists.
    async fn create(&self) -> Result<()>;

    /// Load every posting in store order.
    ///
    /// A missing table is a storage error, not an empty result.
    async fn load(&self) -> Result<Vec<Posting>>;

    /// Replace the whole table with `postings`.
    async fn replace(&self, postings: &[Posting]) -> Result<WriteMetadata>;

    /// Take the single-writer lock for a merge.
    fn lock(&self) -> Result<StoreLock>;
}

/// Advisory single-writer lock held for the duration of a merge.
#[derive(Debug)]
pub struct StoreLock {
    path: PathBuf,
}

impl StoreLock {
    /// Lock file path for a store path.
    pub fn path_for(store: &Path) -> PathBuf {
        let mut name = store.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Acquire the lock for `store`, failing if another writer holds it.
    pub fn acquire(store: &Path) -> Result<Self> {
        let path = Self::path_for(store);
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => AppError::storage(
                    store.display(),
                    format!("another writer holds {}", path.display()),
                ),
                _ => AppError::storage(store.display(), format!("cannot create lock: {e}")),
            })?;

        // Holder pid, for operators clearing a stale lock by hand
        let _ = writeln!(file, "{}", std::process::id());
        log::debug!("Acquired store lock {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            log::warn!("Failed to release store lock {}: {}", self.path.display(), e);
        } else {
            log::debug!("Released store lock {}", self.path.display());
        }
    }
}
