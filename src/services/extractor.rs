// src/services/extractor.rs

//! Field extraction.
//!
//! Turns one [`RawEntry`] into a [`Posting`] using the rule set the source
//! was configured with. Entries without any recognizable field yield `None`
//! and are dropped by the caller.

use chrono::{DateTime, Utc};

use crate::models::{EntryShape, Location, Posting, RawEntry, RuleSetName, SourceConfig, UNKNOWN};
use crate::services::location::extract_locations;
use crate::services::markdown;
use crate::services::rules::{Field, RuleSet};
use crate::utils::html_to_text;

/// Extractor bound to one source and one ingestion timestamp.
#[derive(Debug, Clone)]
pub struct Extractor<'a> {
    source: &'a SourceConfig,
    rules: &'static RuleSet,
    ingested_at: DateTime<Utc>,
}

impl<'a> Extractor<'a> {
    pub fn new(source: &'a SourceConfig, ingested_at: DateTime<Utc>) -> Self {
        Self {
            source,
            rules: RuleSet::for_name(source.rules),
            ingested_at,
        }
    }

    /// Extract one entry. `None` means no field carried any signal.
    pub fn extract(&self, entry: &RawEntry) -> Option<Posting> {
        let base = self.base();
        match entry.shape {
            EntryShape::Syndication => self.extract_syndication(entry, base),
            EntryShape::Section => markdown::extract_section(self.rules, &entry.description, base),
            EntryShape::TableRow => {
                markdown::extract_table_row(&entry.description, &entry.columns, base)
            }
        }
    }

    /// Extract every entry, returning the postings and the skipped count.
    pub fn extract_all(&self, entries: &[RawEntry]) -> (Vec<Posting>, usize) {
        let postings: Vec<Posting> = entries.iter().filter_map(|e| self.extract(e)).collect();
        let skipped = entries.len() - postings.len();
        (postings, skipped)
    }

    fn base(&self) -> Posting {
        let mut posting = Posting::blank(self.source.kind, self.ingested_at);
        posting.sub_kind = self
            .source
            .sub_kind
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_default();
        posting
    }

    fn extract_syndication(&self, entry: &RawEntry, mut posting: Posting) -> Option<Posting> {
        let text = html_to_text(&entry.description);
        let title = self.rules.clean_title(&html_to_text(&entry.title));
        let link = entry.link.trim().to_string();

        if title.is_empty() && link.is_empty() && text.trim().is_empty() {
            return None;
        }

        posting.title = title;
        posting.link = link;
        posting.published_at = entry.published.trim().to_string();
        posting.organization = self
            .rules
            .first_match(Field::Organization, &text)
            .unwrap_or_else(|| UNKNOWN.to_string());
        posting.occurs_at = self
            .rules
            .first_match(Field::OccursAt, &text)
            .unwrap_or_default();
        posting.location = self.locate(&text);
        posting.description = self.rules.strip_labels(&text);
        Some(posting)
    }

    /// Parsed locations; event sources fall back to the raw `Location:` value.
    fn locate(&self, text: &str) -> Location {
        let parsed = extract_locations(text);
        if !parsed.is_unknown() || self.rules.name != RuleSetName::Events {
            return parsed;
        }
        Location::from_tokens(self.rules.first_match(Field::Location, text))
    }
}
