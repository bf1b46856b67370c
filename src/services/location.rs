// src/services/location.rs

//! Location parsing.
//!
//! Isolates `Remote`, `Hybrid` and `City, ST` tokens from free text. Only
//! the first `Location:` line is searched for city/state pairs, and states
//! are checked against the closed set of US postal abbreviations.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Location;

/// The fifty US state postal abbreviations.
pub const VALID_STATES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "FL", "GA", "HI", "ID", "IL", "IN", "IA", "KS",
    "KY", "LA", "ME", "MD", "MA", "MI", "MN", "MS", "MO", "MT", "NE", "NV", "NH", "NJ", "NM", "NY",
    "NC", "ND", "OH", "OK", "OR", "PA", "RI", "SC", "SD", "TN", "TX", "UT", "VT", "VA", "WA", "WV",
    "WI", "WY",
];

/// Candidates with more words than this read as prose, not a place.
pub const MAX_LOCATION_WORDS: usize = 4;

static REMOTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:remote|telecommute)\b").expect("valid regex"));
static HYBRID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bhybrid\b").expect("valid regex"));
static LOCATION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?im)^[ \t]*location[ \t]*:[ \t]*([^\n]*)").expect("valid regex"));
static CITY_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z .\-'&]+?, [A-Z]{2})\b").expect("valid regex"));

/// Extract every location token from a description.
///
/// Returns [`Location::Unknown`] when nothing is found.
pub fn extract_locations(text: &str) -> Location {
    if text.trim().is_empty() {
        return Location::Unknown;
    }

    let mut tokens = work_modes(text);
    if let Some(line) = location_line(text) {
        tokens.extend(city_states(line));
    }
    Location::from_tokens(tokens)
}

/// `Remote` / `Hybrid` markers found anywhere in the text.
pub fn work_modes(text: &str) -> Vec<String> {
    let mut modes = Vec::new();
    if REMOTE.is_match(text) {
        modes.push("Remote".to_string());
    }
    if HYBRID.is_match(text) {
        modes.push("Hybrid".to_string());
    }
    modes
}

/// Value of the first `Location:` line, trimmed.
pub fn location_line(text: &str) -> Option<&str> {
    LOCATION_LINE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// All valid `City, ST` substrings of a single line, in order of appearance.
pub fn city_states(line: &str) -> Vec<String> {
    CITY_STATE
        .captures_iter(line)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|candidate| is_valid_city_state(candidate))
        .map(String::from)
        .collect()
}

fn is_valid_city_state(candidate: &str) -> bool {
    let Some((_, state)) = candidate.rsplit_once(", ") else {
        return false;
    };
    let words = candidate.split_whitespace().count();
    VALID_STATES.contains(&state) && (1..=MAX_LOCATION_WORDS).contains(&words)
}
