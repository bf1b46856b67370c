// src/pipeline/ingest.rs

//! Ingestion pipeline.
//!
//! One run handles one source end to end: fetch, extract, then merge into
//! the store under the single-writer lock. Sources are never processed in
//! parallel against the same store.

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{Config, SourceConfig};
use crate::pipeline::merge::merge;
use crate::services::{Extractor, FeedFetcher};
use crate::storage::PostingStore;

/// Counts reported by one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestSummary {
    pub source: String,
    /// Raw entries delivered by the source
    pub fetched: usize,
    /// Entries that produced a posting
    pub extracted: usize,
    /// Entries with no recognizable field
    pub skipped: usize,
    pub added: usize,
    pub duplicates: usize,
    pub rejected_linkless: usize,
    /// Rows in the store after the run
    pub stored: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Ingest a single source into the store.
///
/// Fetch and parse failures abort the run before the store is touched.
/// The store is only rewritten when the merge added postings.
pub async fn run_ingest(
    fetcher: &FeedFetcher,
    storage: &dyn PostingStore,
    source: &SourceConfig,
) -> Result<IngestSummary> {
    let started_at = Utc::now();
    log::info!("Ingesting '{}' from {}", source.name, source.locator);

    let entries = fetcher.fetch(source).await?;
    log::info!("Fetched {} entries from '{}'", entries.len(), source.name);

    let extractor = Extractor::new(source, started_at);
    let (postings, skipped) = extractor.extract_all(&entries);
    log::info!(
        "Extracted {} postings ({} entries without signal skipped)",
        postings.len(),
        skipped
    );
    let extracted = postings.len();

    let _lock = storage.lock()?;
    let existing = storage.load().await?;
    let outcome = merge(postings, existing);
    log::info!(
        "Merge: {} added, {} duplicates, {} rejected without link",
        outcome.added,
        outcome.duplicates,
        outcome.rejected_linkless
    );

    let stored = if outcome.has_changes() {
        let meta = storage.replace(&outcome.postings).await?;
        log::info!(
            "Store {} now holds {} postings (written {})",
            storage.describe(),
            meta.count,
            meta.timestamp.to_rfc3339()
        );
        meta.count
    } else {
        log::info!("No new postings; store {} left unchanged", storage.describe());
        outcome.postings.len()
    };

    Ok(IngestSummary {
        source: source.name.clone(),
        fetched: entries.len(),
        extracted,
        skipped,
        added: outcome.added,
        duplicates: outcome.duplicates,
        rejected_linkless: outcome.rejected_linkless,
        stored,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Ingest the named sources (every configured source when `names` is
/// empty), one after another.
///
/// A source that cannot be fetched or parsed is logged and reported; it
/// does not stop the others. Any other failure (store missing, locked or
/// unwritable) ends the run, since every later source would hit it too.
pub async fn run_sources(
    config: &Config,
    storage: &dyn PostingStore,
    names: &[String],
) -> Result<Vec<(String, Result<IngestSummary>)>> {
    let sources: Vec<&SourceConfig> = if names.is_empty() {
        config.sources.iter().collect()
    } else {
        names
            .iter()
            .map(|name| {
                config
                    .source(name)
                    .ok_or_else(|| AppError::config(format!("unknown source '{name}'")))
            })
            .collect::<Result<_>>()?
    };

    if sources.is_empty() {
        return Err(AppError::config("no sources configured"));
    }

    let fetcher = FeedFetcher::new(&config.fetcher)?;
    let mut results = Vec::with_capacity(sources.len());
    for source in sources {
        let result = run_ingest(&fetcher, storage, source).await;
        let stop = match &result {
            Ok(_) => false,
            Err(e) if e.is_source_error() => {
                log::warn!("Skipping source '{}': {}", source.name, e);
                false
            }
            Err(e) => {
                log::error!("Ingestion of '{}' failed, stopping: {}", source.name, e);
                true
            }
        };
        results.push((source.name.clone(), result));
        if stop {
            break;
        }
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FetcherConfig, Location, PostingKind, RuleSetName, SourceFormat};
    use crate::storage::LocalStorage;
    use std::io::Write;
    use tempfile::TempDir;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Events</title><link>https://example.com</link><description>d</description>
<item><title>Tech Talk (2024)</title><description>When: May 1
Location: Boston, MA
Talk about bots</description><link>http://x/1</link></item>
<item><title>Linkless Mixer</title><description>When: May 2</description></item>
</channel></rss>"#;

    fn source(path: &std::path::Path) -> SourceConfig {
        SourceConfig {
            name: "events".to_string(),
            locator: path.to_string_lossy().into_owned(),
            format: SourceFormat::Syndication,
            kind: PostingKind::Event,
            sub_kind: Some("Workshop".to_string()),
            rules: RuleSetName::Events,
        }
    }

    fn write_feed(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("feed.xml");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[tokio::test]
    async fn test_ingest_twice_keeps_first_version() {
        let dir = TempDir::new().unwrap();
        let feed = write_feed(&dir, FEED);
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        storage.create().await.unwrap();
        let fetcher = FeedFetcher::new(&FetcherConfig::default()).unwrap();

        let first = run_ingest(&fetcher, &storage, &source(&feed)).await.unwrap();
        assert_eq!(first.fetched, 2);
        assert_eq!(first.added, 1);
        assert_eq!(first.rejected_linkless, 1);
        assert_eq!(first.stored, 1);

        let stored = storage.load().await.unwrap();
        assert_eq!(stored[0].title, "Tech Talk");
        assert_eq!(stored[0].sub_kind, "workshop");
        assert_eq!(stored[0].occurs_at, "May 1");
        assert_eq!(stored[0].location, Location::Places(vec!["Boston, MA".into()]));
        assert_eq!(stored[0].description, "Talk about bots");

        let second = run_ingest(&fetcher, &storage, &source(&feed)).await.unwrap();
        assert_eq!(second.added, 0);
        assert_eq!(second.duplicates, 1);

        let after = storage.load().await.unwrap();
        assert_eq!(after, stored);
    }

    #[tokio::test]
    async fn test_missing_store_aborts_without_creating_it() {
        let dir = TempDir::new().unwrap();
        let feed = write_feed(&dir, FEED);
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        let fetcher = FeedFetcher::new(&FetcherConfig::default()).unwrap();

        let err = run_ingest(&fetcher, &storage, &source(&feed)).await.unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));
        assert!(!storage.exists().await.unwrap());
        assert!(!dir.path().join("postings.csv.lock").exists());
    }

    #[tokio::test]
    async fn test_malformed_feed_leaves_store_untouched() {
        let dir = TempDir::new().unwrap();
        let feed = write_feed(&dir, "<html>not a feed</html>");
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        storage.create().await.unwrap();
        let fetcher = FeedFetcher::new(&FetcherConfig::default()).unwrap();

        let err = run_ingest(&fetcher, &storage, &source(&feed)).await.unwrap_err();
        assert!(err.is_source_error());
        assert!(storage.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_held_lock_blocks_merge() {
        let dir = TempDir::new().unwrap();
        let feed = write_feed(&dir, FEED);
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        storage.create().await.unwrap();
        let fetcher = FeedFetcher::new(&FetcherConfig::default()).unwrap();

        let _held = storage.lock().unwrap();
        let err = run_ingest(&fetcher, &storage, &source(&feed)).await.unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));
    }

    #[tokio::test]
    async fn test_run_sources_reports_each_source() {
        let dir = TempDir::new().unwrap();
        let feed = write_feed(&dir, FEED);
        let storage = LocalStorage::new(dir.path().join("postings.csv"));
        storage.create().await.unwrap();

        let mut broken = source(&dir.path().join("missing.xml"));
        broken.name = "broken".to_string();
        let config = Config {
            sources: vec![broken, source(&feed)],
            ..Config::default()
        };

        let results = run_sources(&config, &storage, &[]).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results[0].1.is_err());
        assert_eq!(results[1].1.as_ref().unwrap().added, 1);

        let err = run_sources(&config, &storage, &["nope".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[tokio::test]
    async fn test_run_sources_stops_on_store_failure() {
        let dir = TempDir::new().unwrap();
        let feed = write_feed(&dir, FEED);
        let storage = LocalStorage::new(dir.path().join("absent.csv"));

        let mut second = source(&feed);
        second.name = "second".to_string();
        let config = Config {
            sources: vec![source(&feed), second],
            ..Config::default()
        };

        let results = run_sources(&config, &storage, &[]).await.unwrap();
        assert_eq!(results.len(), 1);
        let err = results[0].1.as_ref().unwrap_err();
        assert!(!err.is_source_error());
    }
}
