// src/services/sections.rs

//! Markdown section splitting.
//!
//! A document is read as a pipe table when it has at least one row with
//! [`MIN_TABLE_CELLS`] or more cells; otherwise it is cut into sections at
//! headings and horizontal rules.

use crate::models::RawEntry;

/// Cells a row needs before the document counts as a table.
pub const MIN_TABLE_CELLS: usize = 5;

/// Split markdown content into raw entries.
///
/// Loose sections with fewer than `min_section_chars` characters are
/// dropped as noise.
pub fn split_sections(content: &str, min_section_chars: usize) -> Vec<RawEntry> {
    if is_table(content) {
        let rows: Vec<&str> = table_rows(content).collect();
        let columns = header_cells(&rows);
        return rows
            .into_iter()
            .map(|row| RawEntry::table_row(row).with_columns(columns.clone()))
            .collect();
    }

    loose_sections(content)
        .into_iter()
        .filter(|section| section.chars().count() >= min_section_chars)
        .map(RawEntry::section)
        .collect()
}

/// Whether any line is a table row with enough cells.
pub fn is_table(content: &str) -> bool {
    table_rows(content).next().is_some()
}

/// Cells of a pipe-delimited row, trimmed, outer pipes removed.
pub fn table_cells(row: &str) -> Vec<&str> {
    let row = row.trim();
    let row = row.strip_prefix('|').unwrap_or(row);
    let row = row.strip_suffix('|').unwrap_or(row);
    row.split('|').map(str::trim).collect()
}

/// Whether every cell is an alignment marker such as `---` or `:---:`.
pub fn is_alignment_row(cells: &[&str]) -> bool {
    cells
        .iter()
        .all(|c| !c.is_empty() && c.chars().all(|ch| matches!(ch, '-' | ':' | ' ')))
}

/// Header cells, when the first row is followed by an alignment row.
fn header_cells(rows: &[&str]) -> Vec<String> {
    match rows {
        [header, alignment, ..] if is_alignment_row(&table_cells(alignment)) => table_cells(header)
            .into_iter()
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn table_rows(content: &str) -> impl Iterator<Item = &str> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with('|') && table_cells(line).len() >= MIN_TABLE_CELLS)
}

fn loose_sections(content: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if is_separator(trimmed) {
            flush(&mut sections, &mut current);
            continue;
        }
        if trimmed.starts_with('#') {
            flush(&mut sections, &mut current);
        }
        current.push(line);
    }
    flush(&mut sections, &mut current);
    sections
}

fn flush(sections: &mut Vec<String>, current: &mut Vec<&str>) {
    let text = current.join("\n").trim().to_string();
    if !text.is_empty() {
        sections.push(text);
    }
    current.clear();
}

/// `---`, `***`, `___` (three or more of one character, spaces allowed).
fn is_separator(line: &str) -> bool {
    let compact: String = line.chars().filter(|c| !c.is_whitespace()).collect();
    compact.len() >= 3
        && ['-', '*', '_']
            .iter()
            .any(|marker| compact.chars().all(|c| c == *marker))
}
