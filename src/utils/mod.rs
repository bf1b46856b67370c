//! Utility functions and helpers.

pub mod http;

use scraper::Html;
use unicode_segmentation::UnicodeSegmentation;

/// Flatten an HTML fragment into plain text.
///
/// Block-level closers and `<br>` become newlines so labeled lines survive;
/// entities are decoded. Text without markup is returned unchanged.
pub fn html_to_text(raw: &str) -> String {
    if !raw.contains('<') && !raw.contains('&') {
        return raw.to_string();
    }

    let mut marked = raw.to_string();
    for tag in ["<br>", "<br/>", "<br />", "</br>", "</p>", "</div>", "</li>"] {
        marked = replace_ignore_case(&marked, tag, &format!("{tag}\n"));
    }

    let fragment = Html::parse_fragment(&marked);
    let text: String = fragment.root_element().text().collect();
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Cut text to at most `max_chars` grapheme clusters, appending "..." when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max_chars {
        return text.to_string();
    }
    format!("{}...", graphemes[..max_chars].concat())
}

/// Length of text in Unicode scalar values, the unit chat channels count.
pub fn display_len(text: &str) -> usize {
    text.chars().count()
}

fn replace_ignore_case(haystack: &str, needle: &str, replacement: &str) -> String {
    let lower = haystack.to_ascii_lowercase();
    let needle_lower = needle.to_ascii_lowercase();
    let mut result = String::with_capacity(haystack.len());
    let mut last = 0;
    for (idx, _) in lower.match_indices(&needle_lower) {
        result.push_str(&haystack[last..idx]);
        result.push_str(replacement);
        last = idx + needle.len();
    }
    result.push_str(&haystack[last..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_keeps_plain_text() {
        let text = "When: May 1\nLocation: Boston, MA";
        assert_eq!(html_to_text(text), text);
    }

    #[test]
    fn test_html_to_text_breaks_lines() {
        let html = "Employer: Acme Corp<br/>Expires: 06/30/2025<BR>Apply &amp; win";
        assert_eq!(
            html_to_text(html),
            "Employer: Acme Corp\nExpires: 06/30/2025\nApply & win"
        );
    }

    #[test]
    fn test_html_to_text_paragraphs() {
        let html = "<p>When: May 1</p><p>Talk about bots</p>";
        assert_eq!(html_to_text(html), "When: May 1\nTalk about bots");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 4), "abcd...");
        assert_eq!(truncate("café au lait", 4), "café...");
    }

    #[test]
    fn test_display_len_counts_chars() {
        assert_eq!(display_len("📅 Date"), 6);
    }
}
