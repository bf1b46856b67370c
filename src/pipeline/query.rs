//! Ranked queries over the stored table.
//!
//! Scoring is a bag of substrings: every (search token, searchable field)
//! pair where the lower-cased token occurs in the lower-cased field adds
//! one point. Ties keep store order.

use serde::Serialize;

use crate::error::Result;
use crate::models::{Posting, PostingKind, QueryConfig, UNKNOWN};
use crate::pipeline::format::format_results;
use crate::storage::PostingStore;

/// Reply used when the store cannot be read.
pub const TRY_AGAIN: &str = "Sorry, postings are unavailable right now. Please try again later.";

/// Which class of postings a query reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum KindFilter {
    /// Event postings
    Events,
    /// Jobs and internships together
    Careers,
}

impl KindFilter {
    /// Keywords matched case-insensitively against the stored kind.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            KindFilter::Events => &["event"],
            KindFilter::Careers => &["job", "internship", "intern"],
        }
    }

    pub fn matches(&self, kind: PostingKind) -> bool {
        let kind = kind.as_str().to_lowercase();
        self.keywords().iter().any(|k| kind.contains(k))
    }

    /// Display cap for this class.
    pub fn cap(&self, config: &QueryConfig) -> usize {
        match self {
            KindFilter::Events => config.event_cap,
            KindFilter::Careers => config.career_cap,
        }
    }
}

/// A posting with its query-time score.
#[derive(Debug, Clone, Serialize)]
pub struct Scored {
    #[serde(flatten)]
    pub posting: Posting,
    #[serde(rename = "relevanceScore")]
    pub relevance_score: usize,
}

/// Ranked, capped query output.
#[derive(Debug, Clone, Default, Serialize)]
pub struct QueryResult {
    pub postings: Vec<Scored>,
    /// Matches before the display cap was applied
    pub total: usize,
}

impl QueryResult {
    /// Whether the cap dropped any match.
    pub fn is_truncated(&self) -> bool {
        self.total > self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// Run a query over `postings` (in store order).
///
/// Empty search text returns the first `cap` postings of the class in
/// store order; otherwise only postings scoring above zero are returned,
/// best first.
pub fn query(postings: &[Posting], filter: KindFilter, search_text: &str, cap: usize) -> QueryResult {
    let tokens = tokenize(search_text);
    let candidates = postings.iter().filter(|p| filter.matches(p.kind));

    let mut matches: Vec<Scored> = if tokens.is_empty() {
        candidates
            .map(|p| Scored {
                posting: p.clone(),
                relevance_score: 0,
            })
            .collect()
    } else {
        candidates
            .filter_map(|p| {
                let relevance_score = score(p, &tokens);
                (relevance_score > 0).then(|| Scored {
                    posting: p.clone(),
                    relevance_score,
                })
            })
            .collect()
    };

    // sort_by is stable, so equal scores keep store order
    matches.sort_by(|a, b| b.relevance_score.cmp(&a.relevance_score));

    let total = matches.len();
    matches.truncate(cap);
    QueryResult {
        postings: matches,
        total,
    }
}

/// Load the store and run a query capped for the class.
pub async fn search(
    storage: &dyn PostingStore,
    filter: KindFilter,
    search_text: &str,
    config: &QueryConfig,
) -> Result<QueryResult> {
    let postings = storage.load().await?;
    Ok(query(&postings, filter, search_text, filter.cap(config)))
}

/// Query entry point for the command layer.
///
/// Always returns displayable text; store failures are logged and answered
/// with [`TRY_AGAIN`].
pub async fn answer(
    storage: &dyn PostingStore,
    filter: KindFilter,
    search_text: &str,
    config: &QueryConfig,
) -> String {
    match search(storage, filter, search_text, config).await {
        Ok(result) => format_results(&result, filter, search_text, config),
        Err(e) => {
            log::error!("Query against {} failed: {}", storage.describe(), e);
            TRY_AGAIN.to_string()
        }
    }
}

/// Lower-cased whitespace tokens of the search text.
pub fn tokenize(search_text: &str) -> Vec<String> {
    search_text
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Count of (token, field) pairs where the token occurs in the field.
pub fn score(posting: &Posting, tokens: &[String]) -> usize {
    let fields = searchable_fields(posting);
    tokens
        .iter()
        .map(|token| fields.iter().filter(|f| f.contains(token.as_str())).count())
        .sum()
}

fn searchable_fields(posting: &Posting) -> Vec<String> {
    let location = posting.location.to_storage_string();
    [
        posting.title.as_str(),
        posting.sub_kind.as_str(),
        posting.organization.as_str(),
        posting.description.as_str(),
        location.as_str(),
        posting.occurs_at.as_str(),
        posting.published_at.as_str(),
    ]
    .into_iter()
    // "Unknown" marks an absent value, not text to match
    .filter(|f| !f.is_empty() && *f != UNKNOWN)
    .map(str::to_lowercase)
    .collect()
}
