// src/error.rs

//! Unified error handling for the posting pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Network, timeout or HTTP status failure while fetching a source
    #[error("Fetch error for {locator}: {message}")]
    Fetch { locator: String, message: String },

    /// Syndication content the parser reported as malformed
    #[error("Malformed feed {locator}: {message}")]
    Feed { locator: String, message: String },

    /// Markdown source returned an empty body
    #[error("Empty markdown content from {0}")]
    EmptyContent(String),

    /// Backing store missing, locked or not writable
    #[error("Storage error at {path}: {message}")]
    Storage { path: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be constructed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV encoding/decoding failed
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a fetch error for a source locator.
    pub fn fetch(locator: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            locator: locator.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed-feed error for a source locator.
    pub fn feed(locator: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Feed {
            locator: locator.into(),
            message: message.to_string(),
        }
    }

    /// Create a storage error for a store path.
    pub fn storage(path: impl fmt::Display, message: impl fmt::Display) -> Self {
        Self::Storage {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether this error came from reading a source (fetch or parse).
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Feed { .. } | Self::EmptyContent(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_locator() {
        let err = AppError::fetch("https://example.com/feed", "timed out");
        assert_eq!(
            err.to_string(),
            "Fetch error for https://example.com/feed: timed out"
        );
    }

    #[test]
    fn test_source_error_classification() {
        assert!(AppError::feed("x", "bad xml").is_source_error());
        assert!(AppError::EmptyContent("x".into()).is_source_error());
        assert!(!AppError::storage("postings.csv", "missing").is_source_error());
    }
}
