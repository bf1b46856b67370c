// src/services/markdown.rs

//! Extraction for markdown sources.
//!
//! Loose sections run the markdown rule set field by field. Table rows use
//! fixed columns: `Title | Description | Location | Link(html) | PostedDate`.
//! When the table header names the first column `Company`, the first two
//! columns are read as organization and role instead, as in sections.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{Html, Selector};

use crate::models::{Location, Posting, UNKNOWN};
use crate::services::location::{city_states, extract_locations, work_modes};
use crate::services::rules::{Field, RuleSet};
use crate::services::sections::{MIN_TABLE_CELLS, is_alignment_row, table_cells};
use crate::utils::html_to_text;

/// Marker for rows that continue the previous row's entry.
pub const CONTINUATION_MARKER: &str = "↳";

static MARKDOWN_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\((https?://[^)\s]+)\)").expect("valid regex"));
static BARE_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?://[^\s)<>\]]+)").expect("valid regex"));
static HEADING_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+[^\n]*(?:\n|$)").expect("valid regex"));
static DECORATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:\*\*[^*\n]+\*\*|\[[^\]]*\]\([^)\s]+\))[ \t]*(?:\n|$)")
        .expect("valid regex")
});
static BLANK_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("valid regex"));
static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid selector"));

/// Extract a posting from a loose markdown section.
///
/// Returns `None` when no rule finds anything.
pub fn extract_section(rules: &RuleSet, text: &str, mut posting: Posting) -> Option<Posting> {
    let organization = rules.first_match(Field::Organization, text);
    let role = rules.first_match(Field::Title, text);
    let published = rules.first_match(Field::PublishedAt, text);
    let location_line = rules.first_match(Field::Location, text);
    let link = rules.first_match(Field::Link, text);

    if organization.is_none()
        && role.is_none()
        && published.is_none()
        && location_line.is_none()
        && link.is_none()
    {
        return None;
    }

    posting.title = role
        .or_else(|| organization.clone())
        .unwrap_or_default();
    posting.organization = organization.unwrap_or_else(|| UNKNOWN.to_string());
    posting.published_at = published.unwrap_or_default();
    posting.occurs_at = String::new();
    posting.link = link.unwrap_or_default();
    posting.location = match extract_locations(text) {
        Location::Unknown => Location::from_tokens(location_line),
        parsed => parsed,
    };
    posting.description = section_prose(rules, text);
    Some(posting)
}

/// Extract a posting from one table row.
///
/// `columns` are the header cells of the row's table, empty when unknown.
/// Header rows, separator rows and continuation rows yield `None`.
pub fn extract_table_row(row: &str, columns: &[String], mut posting: Posting) -> Option<Posting> {
    let cells = table_cells(row);
    if cells.len() < MIN_TABLE_CELLS || is_housekeeping(&cells) {
        return None;
    }

    let first = plain_text(cells[0]);
    let second = plain_text(cells[1]);
    let link = cell_link(cells[3]);
    if first.is_empty() && link.is_empty() {
        return None;
    }

    if company_led(columns) {
        posting.title = if second.is_empty() { first.clone() } else { second };
        posting.organization = if first.is_empty() { UNKNOWN.to_string() } else { first };
        posting.description = String::new();
    } else {
        posting.title = first;
        posting.description = second;
    }
    posting.location = cell_location(cells[2]);
    posting.link = link;
    posting.published_at = plain_text(cells[4]);
    posting.occurs_at = String::new();
    Some(posting)
}

/// Whether the table's first column holds the employer.
fn company_led(columns: &[String]) -> bool {
    columns.first().is_some_and(|c| {
        matches!(
            plain_text(c).to_ascii_lowercase().as_str(),
            "company" | "employer" | "organization"
        )
    })
}

fn is_housekeeping(cells: &[&str]) -> bool {
    let is_separator = is_alignment_row(cells);
    let is_header = matches!(
        plain_text(cells[0]).to_ascii_lowercase().as_str(),
        "title" | "company" | "name"
    ) && matches!(
        plain_text(cells[1]).to_ascii_lowercase().as_str(),
        "description" | "role" | "position"
    );
    let is_continuation = cells.iter().any(|c| c.starts_with(CONTINUATION_MARKER));
    is_separator || is_header || is_continuation
}

/// Link from a cell holding an HTML anchor, a markdown link or a bare URL.
fn cell_link(cell: &str) -> String {
    if cell.contains('<') {
        let fragment = Html::parse_fragment(cell);
        if let Some(href) = fragment
            .select(&ANCHOR)
            .filter_map(|a| a.value().attr("href"))
            .find(|href| href.starts_with("http"))
        {
            return href.trim().to_string();
        }
    }
    if let Some(caps) = MARKDOWN_LINK.captures(cell) {
        return caps[2].to_string();
    }
    BARE_URL
        .captures(cell)
        .map(|caps| caps[1].to_string())
        .unwrap_or_default()
}

/// Locations in a cell, separated by `<br>` variants or `;`.
fn cell_location(cell: &str) -> Location {
    let normalized = ["</br>", "<br/>", "<br />", "<br>"]
        .iter()
        .fold(cell.to_string(), |acc, tag| acc.replace(tag, ";"));

    let mut tokens = Vec::new();
    for piece in normalized.split(';') {
        let piece = plain_text(piece);
        if piece.is_empty() {
            continue;
        }
        let mut found = work_modes(&piece);
        found.extend(city_states(&piece));
        if found.is_empty() {
            tokens.push(piece);
        } else {
            tokens.extend(found);
        }
    }
    Location::from_tokens(tokens)
}

/// Strip markdown emphasis, links and HTML from a cell.
fn plain_text(cell: &str) -> String {
    let unlinked = MARKDOWN_LINK.replace_all(cell, "$1");
    let unbolded = unlinked.replace("**", "");
    html_to_text(&unbolded).trim().to_string()
}

/// Prose left after removing labels, headings and decoration lines.
fn section_prose(rules: &RuleSet, text: &str) -> String {
    let without_labels = rules.strip_labels(text);
    let without_headings = HEADING_LINE.replace_all(&without_labels, "");
    let without_decoration = DECORATION_LINE.replace_all(&without_headings, "");
    BLANK_RUNS
        .replace_all(&without_decoration, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PostingKind, RuleSetName};
    use chrono::Utc;

    fn blank() -> Posting {
        Posting::blank(PostingKind::Internship, Utc::now())
    }

    fn rules() -> &'static RuleSet {
        RuleSet::for_name(RuleSetName::Markdown)
    }

    #[test]
    fn test_full_section() {
        let section = "# Google
**Software Engineering Intern**
Location: Mountain View, CA
Posted: 2024-01-15
Apply: https://careers.google.com/intern";
        let posting = extract_section(rules(), section, blank()).unwrap();
        assert_eq!(posting.organization, "Google");
        assert_eq!(posting.title, "Software Engineering Intern");
        assert_eq!(posting.published_at, "2024-01-15");
        assert_eq!(
            posting.location,
            Location::Places(vec!["Mountain View, CA".into()])
        );
        assert_eq!(posting.link, "https://careers.google.com/intern");
        assert_eq!(posting.occurs_at, "");
        assert_eq!(posting.description, "");
    }

    #[test]
    fn test_labeled_section() {
        let section = "Company: Amazon
Role: Software Development Engineer Intern
Posted: 2024-02-01
Location: Seattle, WA
Apply: https://amazon.com/careers/intern
Twelve weeks on the retail platform team.";
        let posting = extract_section(rules(), section, blank()).unwrap();
        assert_eq!(posting.organization, "Amazon");
        assert_eq!(posting.title, "Software Development Engineer Intern");
        assert_eq!(posting.link, "https://amazon.com/careers/intern");
        assert_eq!(
            posting.description,
            "Twelve weeks on the retail platform team."
        );
    }

    #[test]
    fn test_title_falls_back_to_organization() {
        let posting = extract_section(rules(), "Company: Google", blank()).unwrap();
        assert_eq!(posting.title, "Google");
    }

    #[test]
    fn test_markdown_link_section() {
        let section = "[Apply Here](https://example.com/apply)\nCompany: Test";
        let posting = extract_section(rules(), section, blank()).unwrap();
        assert_eq!(posting.link, "https://example.com/apply");
    }

    #[test]
    fn test_verbatim_location_kept_when_unparsed() {
        let posting =
            extract_section(rules(), "Company: Shopify\nLocation: Toronto, Canada", blank())
                .unwrap();
        assert_eq!(
            posting.location,
            Location::Places(vec!["Toronto, Canada".into()])
        );
    }

    #[test]
    fn test_prose_section_has_no_signal() {
        let section = "This is just some random text without any internship information.";
        assert!(extract_section(rules(), section, blank()).is_none());
    }

    #[test]
    fn test_table_row() {
        let row = "| **Acme** | SWE Intern | Boston, MA</br>Remote | <a href=\"https://acme.io/apply\"><img src=\"x.png\"></a> | Jan 02 |";
        let posting = extract_table_row(row, &[], blank()).unwrap();
        assert_eq!(posting.title, "Acme");
        assert_eq!(posting.description, "SWE Intern");
        assert_eq!(
            posting.location,
            Location::Places(vec!["Boston, MA".into(), "Remote".into()])
        );
        assert_eq!(posting.link, "https://acme.io/apply");
        assert_eq!(posting.published_at, "Jan 02");
    }

    #[test]
    fn test_table_row_markdown_link() {
        let row = "| Initech | Analyst | NYC | [Apply](https://initech.com/jobs/1) | 3d |";
        let posting = extract_table_row(row, &[], blank()).unwrap();
        assert_eq!(posting.link, "https://initech.com/jobs/1");
        assert_eq!(posting.location, Location::Places(vec!["NYC".into()]));
    }

    #[test]
    fn test_company_led_table_row_matches_sections() {
        let columns: Vec<String> = ["Company", "Role", "Location", "Application", "Date Posted"]
            .into_iter()
            .map(String::from)
            .collect();
        let row = "| **Acme** | SWE Intern | Boston, MA | [Apply](https://acme.io/apply) | Jan 02 |";
        let posting = extract_table_row(row, &columns, blank()).unwrap();
        assert_eq!(posting.organization, "Acme");
        assert_eq!(posting.title, "SWE Intern");
        assert_eq!(posting.description, "");

        let section = extract_section(
            rules(),
            "Company: Acme\nRole: SWE Intern\nApply: https://acme.io/apply",
            blank(),
        )
        .unwrap();
        assert_eq!(section.organization, posting.organization);
        assert_eq!(section.title, posting.title);
    }

    #[test]
    fn test_housekeeping_rows_skipped() {
        let header = "| Title | Description | Location | Link | Posted |";
        let separator = "| --- | --- | :---: | --- | --- |";
        let continuation = "| ↳ | Backend Intern | Austin, TX | https://acme.io/2 | Jan 03 |";
        assert!(extract_table_row(header, &[], blank()).is_none());
        assert!(extract_table_row(separator, &[], blank()).is_none());
        assert!(extract_table_row(continuation, &[], blank()).is_none());
    }
}
