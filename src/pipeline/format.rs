//! Presentation formatter.
//!
//! Renders a [`QueryResult`] as a chat-ready text block. Output never
//! exceeds `message_limit` characters: blocks that would push the message
//! past the ceiling are left out and counted in the closing note.

use crate::models::{Posting, QueryConfig};
use crate::pipeline::query::{KindFilter, QueryResult};
use crate::utils::{display_len, truncate};

pub const NO_EVENTS: &str = "No events found matching your criteria.";
pub const NO_JOBS: &str = "💼 No jobs found matching your criteria.";

/// Render query results for the given class and search text.
pub fn format_results(
    result: &QueryResult,
    filter: KindFilter,
    search_text: &str,
    config: &QueryConfig,
) -> String {
    if result.is_empty() {
        return match filter {
            KindFilter::Events => NO_EVENTS.to_string(),
            KindFilter::Careers => NO_JOBS.to_string(),
        };
    }

    // Header and the widest closing note must fit before any block does
    let header_room = config
        .message_limit
        .saturating_sub(display_len(&footer(filter, result.total, 0)));
    let header = header(filter, result.total, search_text, header_room);
    let mut body = String::new();
    let mut rendered = 0;

    for scored in &result.postings {
        let block = block(filter, &scored.posting, config.description_chars);
        let candidate_len = display_len(&header)
            + display_len(&body)
            + display_len(&block)
            + display_len(&footer(filter, result.total, rendered + 1));
        if candidate_len > config.message_limit {
            log::debug!(
                "Message limit {} reached after {} postings",
                config.message_limit,
                rendered
            );
            break;
        }
        body.push_str(&block);
        rendered += 1;
    }

    let message = format!("{header}{body}{}", footer(filter, result.total, rendered));
    clamp(message, config.message_limit)
}

/// Header line, with the echoed search text cut so the line fits `room`.
fn header(filter: KindFilter, total: usize, search_text: &str, room: usize) -> String {
    let render = |filters: &str| match filter {
        KindFilter::Events => format!("**📅 Found {total} event(s):{filters}**\n\n"),
        KindFilter::Careers => format!("💼 **Found {total} job(s):{filters}**\n\n"),
    };

    let search_text = search_text.trim();
    if search_text.is_empty() {
        return render("");
    }
    let full = render(&format!(" (Filters: {search_text})"));
    if display_len(&full) <= room {
        return full;
    }

    // Room left for the search text itself, after the "..." marker
    let fixed = display_len(&render(" (Filters: )")) + 3;
    match room.checked_sub(fixed) {
        Some(keep) if keep > 0 => render(&format!(" (Filters: {})", truncate(search_text, keep))),
        _ => render(""),
    }
}

/// Hard cut at `limit` characters for limits too small for any layout.
fn clamp(message: String, limit: usize) -> String {
    if display_len(&message) <= limit {
        return message;
    }
    message.chars().take(limit).collect()
}

fn footer(filter: KindFilter, total: usize, rendered: usize) -> String {
    let hidden = total.saturating_sub(rendered);
    if hidden == 0 {
        return String::new();
    }
    match filter {
        KindFilter::Events => {
            format!("Note: Only the top {rendered} events are displayed based on relevance.")
        }
        KindFilter::Careers => format!(
            "... and {hidden} more jobs. Use more specific filters to narrow results."
        ),
    }
}

fn block(filter: KindFilter, posting: &Posting, description_chars: usize) -> String {
    let description = posting
        .description
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let description = truncate(&description, description_chars);
    let location = posting.location.to_string();

    match filter {
        KindFilter::Events => {
            let mut text = format!("**{}**\n", or(&posting.title, "Unknown Event"));
            push_line(&mut text, "**Type:** ", &posting.sub_kind);
            push_line(&mut text, "Company: ", &posting.organization);
            push_line(&mut text, "Location: ", &location);
            push_line(&mut text, "Date: ", &posting.occurs_at);
            text.push_str(&format!(
                "Description: {}\n",
                or(&description, "No description available.")
            ));
            text.push_str(&format!(
                "[More Info]({})\n\n",
                or(&posting.link, "No link available.")
            ));
            text
        }
        KindFilter::Careers => {
            let mut text = format!("**{}**\n", or(&posting.title, "Untitled Position"));
            push_line(&mut text, "📝 ", posting.kind.as_str());
            push_line(&mut text, "🏢 ", &posting.organization);
            push_line(&mut text, "📍 ", &location);
            push_line(&mut text, "📅 Expires: ", &posting.occurs_at);
            push_line(&mut text, "📅 Posted: ", &posting.published_at);
            push_line(&mut text, "📝 ", &description);
            if !posting.link.is_empty() {
                text.push_str(&format!("🔗 [Apply Here]({})\n", posting.link));
            }
            text.push('\n');
            text
        }
    }
}

fn push_line(text: &mut String, label: &str, value: &str) {
    if !value.trim().is_empty() {
        text.push_str(label);
        text.push_str(value.trim());
        text.push('\n');
    }
}

fn or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}
