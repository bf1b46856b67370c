//! Deduplicating merge of new postings into the stored table.
//!
//! The stored table comes first and is scanned once together with the new
//! postings; a posting is kept iff its link is non-empty and has not been
//! seen yet. The first version of a link therefore always wins.

use std::collections::HashSet;

use crate::models::Posting;

/// Result of a merge.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Table contents after the merge, stored rows first
    pub postings: Vec<Posting>,
    /// New postings that were appended
    pub added: usize,
    /// New postings dropped because their link was already present
    pub duplicates: usize,
    /// Postings dropped because they had no link
    pub rejected_linkless: usize,
}

impl MergeOutcome {
    /// Whether the merge changed the table.
    pub fn has_changes(&self) -> bool {
        self.added > 0
    }
}

/// Merge `new` into `existing`.
pub fn merge(new: Vec<Posting>, existing: Vec<Posting>) -> MergeOutcome {
    let stored = existing.len();
    let mut seen: HashSet<String> = HashSet::with_capacity(stored + new.len());
    let mut outcome = MergeOutcome::default();

    for (index, posting) in existing.into_iter().chain(new).enumerate() {
        let is_new = index >= stored;
        let link = posting.link.trim();

        if link.is_empty() {
            log::warn!(
                "Rejecting posting without link: '{}' ({})",
                posting.title,
                posting.kind
            );
            outcome.rejected_linkless += 1;
            continue;
        }
        if !seen.insert(link.to_string()) {
            if is_new {
                outcome.duplicates += 1;
            }
            continue;
        }
        if is_new {
            outcome.added += 1;
        }
        outcome.postings.push(posting);
    }

    outcome
}
