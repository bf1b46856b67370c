//! Service layer for the posting pipeline.
//!
//! This module contains the business logic for:
//! - Source fetching (`FeedFetcher`)
//! - Markdown section splitting (`sections`)
//! - Extraction rule sets (`RuleSet`)
//! - Field extraction (`Extractor`)
//! - Location parsing (`location`)

mod extractor;
mod feeds;
pub mod location;
pub mod markdown;
pub mod rules;
pub mod sections;

pub use extractor::Extractor;
pub use feeds::{FeedFetcher, parse_markdown, parse_syndication};
pub use location::extract_locations;
pub use rules::{Field, FieldRule, RuleSet};
