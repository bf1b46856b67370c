// src/services/feeds.rs

//! Feed source adapter.
//!
//! Fetches one configured source and turns it into raw entries. Remote
//! locators go through the shared HTTP client; anything else is read from
//! the local filesystem. Nothing is cached and nothing is retried.

use reqwest::Client;
use rss::Channel;

use crate::error::{AppError, Result};
use crate::models::{FetcherConfig, RawEntry, SourceConfig, SourceFormat};
use crate::services::sections::split_sections;
use crate::utils::http::{create_client, fetch_text};

/// Fetches sources into [`RawEntry`] sequences.
pub struct FeedFetcher {
    client: Client,
    min_section_chars: usize,
}

impl FeedFetcher {
    /// Create a fetcher with a client built from the fetcher settings.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        Ok(Self {
            client: create_client(config)?,
            min_section_chars: config.min_section_chars,
        })
    }

    /// Fetch and parse a source according to its format.
    pub async fn fetch(&self, source: &SourceConfig) -> Result<Vec<RawEntry>> {
        let body = self.fetch_body(source).await?;
        log::debug!(
            "Fetched {} bytes from '{}' ({})",
            body.len(),
            source.name,
            source.locator
        );

        match source.format {
            SourceFormat::Syndication => parse_syndication(&source.locator, &body),
            SourceFormat::Markdown => {
                parse_markdown(&source.locator, &body, self.min_section_chars)
            }
        }
    }

    async fn fetch_body(&self, source: &SourceConfig) -> Result<String> {
        if source.is_remote() {
            return fetch_text(&self.client, &source.locator).await;
        }
        tokio::fs::read_to_string(&source.locator)
            .await
            .map_err(|e| AppError::fetch(&source.locator, e))
    }
}

/// Parse a syndication document. Any parser-reported defect is an error.
pub fn parse_syndication(locator: &str, body: &str) -> Result<Vec<RawEntry>> {
    let channel = Channel::read_from(body.as_bytes()).map_err(|e| AppError::feed(locator, e))?;

    let entries = channel
        .items()
        .iter()
        .map(|item| RawEntry {
            title: item.title().unwrap_or_default().to_string(),
            description: item.description().unwrap_or_default().to_string(),
            published: item.pub_date().unwrap_or_default().to_string(),
            link: item.link().unwrap_or_default().to_string(),
            ..RawEntry::default()
        })
        .collect();
    Ok(entries)
}

/// Split a markdown document into sections or table rows.
pub fn parse_markdown(locator: &str, body: &str, min_section_chars: usize) -> Result<Vec<RawEntry>> {
    if body.trim().is_empty() {
        return Err(AppError::EmptyContent(locator.to_string()));
    }
    Ok(split_sections(body, min_section_chars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{EntryShape, PostingKind, RuleSetName};
    use std::io::Write;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Workshops</title>
    <link>https://example.com</link>
    <description>Upcoming workshops</description>
    <item>
      <title>Tech Talk (2024)</title>
      <description><![CDATA[When: May 1<br/>Location: Boston, MA<br/>Talk about bots]]></description>
      <pubDate>Mon, 01 Apr 2024 10:00:00 GMT</pubDate>
      <link>http://x/1</link>
    </item>
    <item>
      <title>No Link Social</title>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_syndication() {
        let entries = parse_syndication("feed.xml", FEED).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Tech Talk (2024)");
        assert_eq!(entries[0].link, "http://x/1");
        assert_eq!(entries[0].published, "Mon, 01 Apr 2024 10:00:00 GMT");
        assert!(entries[0].description.contains("When: May 1"));
        assert_eq!(entries[0].shape, EntryShape::Syndication);
        assert_eq!(entries[1].link, "");
    }

    #[test]
    fn test_malformed_feed_is_error() {
        let err = parse_syndication("feed.xml", "<html><body>hi</body></html>").unwrap_err();
        assert!(matches!(err, AppError::Feed { .. }));

        let err = parse_syndication("feed.xml", "not xml at all").unwrap_err();
        assert!(matches!(err, AppError::Feed { .. }));
    }

    #[test]
    fn test_empty_markdown_is_error() {
        let err = parse_markdown("list.md", "  \n\t", 50).unwrap_err();
        assert!(matches!(err, AppError::EmptyContent(_)));
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FEED.as_bytes()).unwrap();

        let source = SourceConfig {
            name: "local".to_string(),
            locator: file.path().to_string_lossy().into_owned(),
            format: SourceFormat::Syndication,
            kind: PostingKind::Event,
            sub_kind: None,
            rules: RuleSetName::Events,
        };
        let fetcher = FeedFetcher::new(&FetcherConfig::default()).unwrap();
        let entries = fetcher.fetch(&source).await.unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_local_file_is_fetch_error() {
        let source = SourceConfig {
            name: "missing".to_string(),
            locator: "/nonexistent/postboard/feed.xml".to_string(),
            format: SourceFormat::Syndication,
            kind: PostingKind::Event,
            sub_kind: None,
            rules: RuleSetName::Events,
        };
        let fetcher = FeedFetcher::new(&FetcherConfig::default()).unwrap();
        let err = fetcher.fetch(&source).await.unwrap_err();
        assert!(matches!(err, AppError::Fetch { .. }));
    }
}
