//! Posting data structure.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Sentinel used for text fields that could not be extracted.
pub const UNKNOWN: &str = "Unknown";

/// The tagged variant distinguishing postings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PostingKind {
    #[serde(alias = "event")]
    Event,
    #[serde(alias = "job")]
    Job,
    #[serde(alias = "internship")]
    Internship,
}

impl PostingKind {
    /// Canonical name as written to the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            PostingKind::Event => "Event",
            PostingKind::Job => "Job",
            PostingKind::Internship => "Internship",
        }
    }

    /// Whether this is a job-like kind (job or internship).
    pub fn is_career(&self) -> bool {
        matches!(self, PostingKind::Job | PostingKind::Internship)
    }
}

impl fmt::Display for PostingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a posting takes place.
///
/// Either unknown, or an ordered, duplicate-free list of normalized
/// tokens (`"City, ST"`, `"Remote"`, `"Hybrid"`, or a verbatim venue).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Location {
    #[default]
    Unknown,
    Places(Vec<String>),
}

impl Location {
    /// Build a location from tokens, dropping blanks and duplicates.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut places: Vec<String> = Vec::new();
        for token in tokens {
            let token: String = token.into();
            let token = token.trim();
            if token.is_empty() || token.eq_ignore_ascii_case(UNKNOWN) {
                continue;
            }
            if !places.iter().any(|p| p == token) {
                places.push(token.to_string());
            }
        }
        if places.is_empty() {
            Location::Unknown
        } else {
            Location::Places(places)
        }
    }

    /// Tokens of this location (`["Unknown"]` when unknown).
    pub fn tokens(&self) -> Vec<&str> {
        match self {
            Location::Unknown => vec![UNKNOWN],
            Location::Places(places) => places.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Location::Unknown)
    }

    /// Serialize for the tabular store.
    ///
    /// A single token is written as-is; several tokens are written as a
    /// list literal: `['Remote', 'Boston, MA']`. Tokens holding `'` are
    /// double-quoted (`"Coeur d'Alene, ID"`); backslashes and a quote that
    /// matches the delimiter are backslash-escaped.
    pub fn to_storage_string(&self) -> String {
        match self {
            Location::Unknown => UNKNOWN.to_string(),
            Location::Places(places) if places.len() == 1 => places[0].clone(),
            Location::Places(places) => {
                let quoted: Vec<String> = places.iter().map(|p| quote_item(p)).collect();
                format!("[{}]", quoted.join(", "))
            }
        }
    }

    /// Parse the store representation written by [`Location::to_storage_string`].
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('[') && raw.ends_with(']') {
            let inner = &raw[1..raw.len() - 1];
            let quoted = list_item_pattern();
            let items: Vec<String> = quoted
                .captures_iter(inner)
                .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
                .map(|m| unescape_item(m.as_str()))
                .collect();
            if items.is_empty() && !inner.trim().is_empty() {
                return Location::from_tokens(inner.split(';'));
            }
            return Location::from_tokens(items);
        }
        Location::from_tokens([raw])
    }
}

fn list_item_pattern() -> &'static Regex {
    static PATTERN: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"'((?:[^'\\]|\\.)*)'|"((?:[^"\\]|\\.)*)""#)
            .expect("list item pattern is valid")
    });
    &PATTERN
}

fn quote_item(item: &str) -> String {
    let escaped = item.replace('\\', "\\\\");
    if item.contains('\'') && !item.contains('"') {
        format!("\"{escaped}\"")
    } else {
        format!("'{}'", escaped.replace('\'', "\\'"))
    }
}

fn unescape_item(item: &str) -> String {
    let mut out = String::with_capacity(item.len());
    let mut chars = item.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tokens().join("; "))
    }
}

impl Serialize for Location {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_storage_string())
    }
}

impl<'de> Deserialize<'de> for Location {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Location::parse(&raw))
    }
}

/// A normalized event, job or internship.
///
/// Field names on disk follow the store header:
/// `Type, subType, Company, Title, Description, whenDate, pubDate, Location, link, entryDate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Posting {
    #[serde(rename = "Type")]
    pub kind: PostingKind,

    /// Free-form refinement, lower-cased ("" when absent)
    #[serde(rename = "subType", default)]
    pub sub_kind: String,

    /// Employer or host ("Unknown" when unextractable)
    #[serde(rename = "Company")]
    pub organization: String,

    #[serde(rename = "Title")]
    pub title: String,

    /// Prose only; consumed label lines are stripped
    #[serde(rename = "Description", default)]
    pub description: String,

    /// Best-effort date or expiry text, kept opaque
    #[serde(rename = "whenDate", default)]
    pub occurs_at: String,

    /// Source-provided publish timestamp, kept opaque
    #[serde(rename = "pubDate", default)]
    pub published_at: String,

    #[serde(rename = "Location", default)]
    pub location: Location,

    /// Canonical URL; the identity key in the store
    #[serde(rename = "link", default)]
    pub link: String,

    #[serde(rename = "entryDate")]
    pub ingested_at: DateTime<Utc>,
}

impl Posting {
    /// An empty posting of the given kind with every field at its sentinel.
    pub fn blank(kind: PostingKind, ingested_at: DateTime<Utc>) -> Self {
        Self {
            kind,
            sub_kind: String::new(),
            organization: UNKNOWN.to_string(),
            title: String::new(),
            description: String::new(),
            occurs_at: String::new(),
            published_at: String::new(),
            location: Location::Unknown,
            link: String::new(),
            ingested_at,
        }
    }

    /// Whether the posting carries a usable identity key.
    pub fn has_link(&self) -> bool {
        !self.link.trim().is_empty()
    }
}
