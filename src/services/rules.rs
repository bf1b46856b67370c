// src/services/rules.rs

//! Extraction rule sets.
//!
//! A rule set is an ordered list of [`FieldRule`]s plus the title and
//! description clean-up patterns for one family of sources. For each field
//! the first rule that captures a non-empty value wins, so supporting a new
//! source format means adding or reordering rules rather than touching the
//! extractor.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::RuleSetName;

/// Posting fields a rule can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Organization,
    Title,
    OccursAt,
    PublishedAt,
    Location,
    Link,
}

/// One pattern for one field. Capture group 1 is the value.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: Field,
    pattern: Regex,
}

impl FieldRule {
    pub fn new(field: Field, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            field,
            pattern: Regex::new(pattern)?,
        })
    }

    /// Captured value, trimmed; `None` when absent or blank.
    pub fn capture(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let value = caps.get(1)?.as_str().trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

/// Rules and clean-up patterns for one source family.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub name: RuleSetName,
    rules: Vec<FieldRule>,
    /// Whole label lines removed from the stored description
    label_lines: Regex,
    /// Suffix removed from titles
    title_suffix: Option<Regex>,
}

impl RuleSet {
    pub fn new(
        name: RuleSetName,
        rules: Vec<FieldRule>,
        label_lines: &str,
        title_suffix: Option<&str>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            rules,
            label_lines: Regex::new(label_lines)?,
            title_suffix: title_suffix.map(Regex::new).transpose()?,
        })
    }

    /// Built-in rule set for a configured name.
    pub fn for_name(name: RuleSetName) -> &'static RuleSet {
        match name {
            RuleSetName::Events => &EVENTS,
            RuleSetName::Careers => &CAREERS,
            RuleSetName::Markdown => &MARKDOWN,
        }
    }

    /// Rules for a field, in priority order.
    pub fn rules_for(&self, field: Field) -> impl Iterator<Item = &FieldRule> {
        self.rules.iter().filter(move |r| r.field == field)
    }

    /// First non-empty capture for a field.
    pub fn first_match(&self, field: Field, text: &str) -> Option<String> {
        self.rules_for(field).find_map(|rule| rule.capture(text))
    }

    /// Remove consumed label lines and trim the remaining prose.
    pub fn strip_labels(&self, text: &str) -> String {
        self.label_lines.replace_all(text, "").trim().to_string()
    }

    /// Remove the configured title suffix (dates, "at <employer>").
    pub fn clean_title(&self, title: &str) -> String {
        let title = title.trim();
        match &self.title_suffix {
            Some(suffix) => suffix.replace(title, "").trim().to_string(),
            None => title.to_string(),
        }
    }
}

static EVENTS: LazyLock<RuleSet> = LazyLock::new(|| build_events().expect("event rules are valid"));
static CAREERS: LazyLock<RuleSet> =
    LazyLock::new(|| build_careers().expect("career rules are valid"));
static MARKDOWN: LazyLock<RuleSet> =
    LazyLock::new(|| build_markdown().expect("markdown rules are valid"));

fn build_events() -> Result<RuleSet, regex::Error> {
    RuleSet::new(
        RuleSetName::Events,
        vec![
            FieldRule::new(Field::OccursAt, r"(?i)when:[ \t]*([^\n]*)")?,
            FieldRule::new(Field::Location, r"(?i)location:[ \t]*([^\n]*)")?,
            FieldRule::new(
                Field::Organization,
                r"(?im)^[ \t]*(?:host|hosted by|organizer):[ \t]*([^\n]*)",
            )?,
        ],
        r"(?im)^[ \t]*(?:when|location|host|hosted by|organizer):[^\n]*(?:\n|$)",
        Some(r"\s*\([^)]+\)\s*$"),
    )
}

fn build_careers() -> Result<RuleSet, regex::Error> {
    RuleSet::new(
        RuleSetName::Careers,
        vec![
            FieldRule::new(
                Field::Organization,
                r"(?im)employer:[ \t]*([^\n<]+?)[ \t]*(?:\n|<|expires:|$)",
            )?,
            FieldRule::new(Field::OccursAt, r"(?i)expires:\s*(\d{2}/\d{2}/\d{4})")?,
            FieldRule::new(Field::Location, r"(?im)^[ \t]*location[ \t]*:[ \t]*([^\n]*)")?,
        ],
        r"(?im)^[ \t]*(?:employer|expires|location):[^\n]*(?:\n|$)",
        Some(r"(?i)\s+at\s+.+$"),
    )
}

fn build_markdown() -> Result<RuleSet, regex::Error> {
    RuleSet::new(
        RuleSetName::Markdown,
        vec![
            FieldRule::new(
                Field::Organization,
                r"(?im)^[ \t]*(?:company|employer|organization):[ \t]*(.+?)[ \t]*$",
            )?,
            FieldRule::new(Field::Organization, r"(?m)^[ \t]*#{1,6}[ \t]+(.+?)[ \t#]*$")?,
            FieldRule::new(
                Field::Title,
                r"(?im)^[ \t]*(?:role|position|title):[ \t]*(.+?)[ \t]*$",
            )?,
            FieldRule::new(Field::Title, r"\*\*([^*\n]+?)\*\*")?,
            FieldRule::new(
                Field::PublishedAt,
                r"(?im)^[ \t]*(?:posted|date posted|date):[ \t]*(.+?)[ \t]*$",
            )?,
            FieldRule::new(Field::PublishedAt, r"\b(\d{4}-\d{2}-\d{2})\b")?,
            FieldRule::new(Field::Location, r"(?im)^[ \t]*location:[ \t]*(.+?)[ \t]*$")?,
            FieldRule::new(
                Field::Link,
                r"(?im)^[ \t]*(?:apply|link|url):[ \t]*(?:\[[^\]]*\]\()?(https?://[^\s)>]+)",
            )?,
            FieldRule::new(Field::Link, r"\[[^\]]*\]\((https?://[^)\s]+)\)")?,
            FieldRule::new(Field::Link, r"(https?://[^\s)>\]]+)")?,
        ],
        r"(?im)^[ \t]*(?:company|employer|organization|role|position|title|posted|date posted|date|location|apply|link|url):[^\n]*(?:\n|$)",
        None,
    )
}
