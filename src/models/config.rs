//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::PostingKind;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP fetch and section splitting settings
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Location of the persisted table
    #[serde(default)]
    pub storage: StorageConfig,

    /// Display caps and message limits
    #[serde(default)]
    pub query: QueryConfig,

    /// Configured feed sources
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Look up a source by name.
    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.storage.path.as_os_str().is_empty() {
            return Err(AppError::validation("storage.path is empty"));
        }
        if self.query.event_cap == 0 || self.query.career_cap == 0 {
            return Err(AppError::validation("query caps must be > 0"));
        }
        if self.query.description_chars >= self.query.message_limit {
            return Err(AppError::validation(
                "query.description_chars must be smaller than query.message_limit",
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if !names.insert(source.name.as_str()) {
                return Err(AppError::validation(format!(
                    "duplicate source name '{}'",
                    source.name
                )));
            }
        }
        Ok(())
    }
}

/// HTTP client and section splitting settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Markdown sections shorter than this many characters are noise
    #[serde(default = "defaults::min_section_chars")]
    pub min_section_chars: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            min_section_chars: defaults::min_section_chars(),
        }
    }
}

/// Persisted store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the CSV table
    #[serde(default = "defaults::store_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: defaults::store_path(),
        }
    }
}

/// Query display settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Maximum events per response
    #[serde(default = "defaults::event_cap")]
    pub event_cap: usize,

    /// Maximum jobs/internships per response
    #[serde(default = "defaults::career_cap")]
    pub career_cap: usize,

    /// Descriptions longer than this are cut with "..."
    #[serde(default = "defaults::description_chars")]
    pub description_chars: usize,

    /// Ceiling of the external chat channel
    #[serde(default = "defaults::message_limit")]
    pub message_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            event_cap: defaults::event_cap(),
            career_cap: defaults::career_cap(),
            description_chars: defaults::description_chars(),
            message_limit: defaults::message_limit(),
        }
    }
}

/// Shape of a source document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// RSS syndication XML
    Syndication,
    /// Markdown document (table or loose sections)
    Markdown,
}

/// Named extraction rule set a source is read with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RuleSetName {
    /// `When:` / `Location:` labels, parenthesized title dates
    Events,
    /// `Employer:` / `Expires:` labels, "at <employer>" title suffixes
    Careers,
    /// Loose markdown sections and pipe tables
    Markdown,
}

/// A configured feed source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique name used on the command line
    pub name: String,

    /// http(s) URL or local file path
    pub locator: String,

    pub format: SourceFormat,

    pub kind: PostingKind,

    /// Refinement stored in `subType` (events only in practice)
    #[serde(default)]
    pub sub_kind: Option<String>,

    pub rules: RuleSetName,
}

impl SourceConfig {
    /// Whether the locator points at a remote document.
    pub fn is_remote(&self) -> bool {
        let lower = self.locator.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    /// Validate a single source definition.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("source name is empty"));
        }
        if self.locator.trim().is_empty() {
            return Err(AppError::validation(format!(
                "source '{}' has an empty locator",
                self.name
            )));
        }
        if self.is_remote() {
            url::Url::parse(&self.locator)?;
        }
        if self.format == SourceFormat::Markdown && self.rules != RuleSetName::Markdown {
            return Err(AppError::validation(format!(
                "source '{}' is markdown but uses the {:?} rule set",
                self.name, self.rules
            )));
        }
        if self.format == SourceFormat::Syndication && self.rules == RuleSetName::Markdown {
            return Err(AppError::validation(format!(
                "source '{}' is syndication but uses the markdown rule set",
                self.name
            )));
        }
        Ok(())
    }
}

mod defaults {
    use std::path::PathBuf;

    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; postboard/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn min_section_chars() -> usize {
        50
    }

    // Storage defaults
    pub fn store_path() -> PathBuf {
        PathBuf::from("storage/postings.csv")
    }

    // Query defaults
    pub fn event_cap() -> usize {
        5
    }
    pub fn career_cap() -> usize {
        10
    }
    pub fn description_chars() -> usize {
        80
    }
    pub fn message_limit() -> usize {
        2000
    }
}
