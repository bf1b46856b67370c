//! Raw feed entry.

use serde::{Deserialize, Serialize};

/// Where a raw entry came from, which decides how it is extracted.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryShape {
    /// Syndication item with separate title/description/published/link
    #[default]
    Syndication,
    /// Loose markdown section; the whole text is in `description`
    Section,
    /// One pipe-delimited table row; the raw row is in `description`
    TableRow,
}

/// One unprocessed entry as delivered by a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawEntry {
    pub title: String,
    pub description: String,
    pub published: String,
    pub link: String,
    pub shape: EntryShape,
    /// Header cells of the table a row came from (table rows only)
    #[serde(default)]
    pub columns: Vec<String>,
}

impl RawEntry {
    /// Entry holding a markdown section.
    pub fn section(text: impl Into<String>) -> Self {
        Self {
            description: text.into(),
            shape: EntryShape::Section,
            ..Self::default()
        }
    }

    /// Entry holding one table row.
    pub fn table_row(row: impl Into<String>) -> Self {
        Self {
            description: row.into(),
            shape: EntryShape::TableRow,
            ..Self::default()
        }
    }

    /// Attach the header cells of the row's table.
    pub fn with_columns(mut self, columns: Vec<String>) -> Self {
        self.columns = columns;
        self
    }
}
