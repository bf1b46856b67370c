// src/models/mod.rs

//! Domain models for the posting pipeline.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod entry;
mod posting;

// Re-export all public types
pub use config::{
    Config, FetcherConfig, QueryConfig, RuleSetName, SourceConfig, SourceFormat,
    StorageConfig,
};
pub use entry::{EntryShape, RawEntry};
pub use posting::{Location, Posting, PostingKind, UNKNOWN};
