//! Pipeline entry points for posting operations.
//!
//! - `run_ingest` / `run_sources`: Fetch, extract and merge sources into the store
//! - `answer`: Ranked query rendered for the command layer
//! - `run_validate`: Check a configuration file

pub mod format;
pub mod ingest;
pub mod merge;
pub mod query;
pub mod validate;

pub use format::format_results;
pub use ingest::{IngestSummary, run_ingest, run_sources};
pub use merge::{MergeOutcome, merge};
pub use query::{KindFilter, QueryResult, Scored, answer, query, search};
pub use validate::run_validate;
