//! CLI output formatting for queue and review commands.
//!
//! # Quote-First Display
//!
//! Every item is shown by what a reviewer cares about: its slot in the
//! schedule, its status and the quote itself. The id is secondary context
//! on an indented line, so listings read like a posting calendar while
//! still giving the handle every review command needs.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! 001 2026-03-02 pending   "Simplicity is the soul of efficiency." (Austin Freeman)
//!     Id: 6f1c...
//! 002 2026-03-03 approved  "Every small step shapes the path." [synthetic]
//!     Id: 0b7e...
//!
//! 2 items
//! ```
//!
//! ## Stats
//!
//! ```text
//! Queue
//!     Backlog: 5 of 7 (3 pending, 2 approved)
//!     Total items: 12
//!     Needs generation: 2
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::queue::{FillReport, QueueStats};
use crate::types::{ContentItem, ContentSource};

const QUOTE_PREVIEW_CHARS: usize = 60;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let head: String = text.chars().take(max).collect();
        format!("{}...", head.trim_end())
    }
}

fn plural(n: usize, one: &str, many: &str) -> String {
    if n == 1 {
        format!("{n} {one}")
    } else {
        format!("{n} {many}")
    }
}

fn schedule_label(item: &ContentItem) -> String {
    match item.scheduled_date {
        Some(date) => date.to_string(),
        None => "unscheduled".to_string(),
    }
}

/// Attribution suffix: curated items show their author, synthetic items
/// are tagged since they never carry one.
fn attribution(item: &ContentItem) -> String {
    match (item.source, item.author.as_deref()) {
        (ContentSource::Synthetic, _) => " [synthetic]".to_string(),
        (_, Some(author)) if !author.trim().is_empty() => format!(" ({author})"),
        _ => String::new(),
    }
}

/// One-line summary used by listings.
///
/// ```text
/// 001 2026-03-02 pending   "The quote..." (Author)
/// ```
fn item_line(index: usize, item: &ContentItem) -> String {
    format!(
        "{} {} {:<9} \"{}\"{}",
        format_index(index),
        schedule_label(item),
        item.status.as_str(),
        truncate(&item.quote_text, QUOTE_PREVIEW_CHARS),
        attribution(item)
    )
}

// ============================================================================
// Queue commands
// ============================================================================

pub fn format_stats(stats: &QueueStats) -> Vec<String> {
    vec![
        "Queue".to_string(),
        format!(
            "{}Backlog: {} of {} ({} pending, {} approved)",
            indent(1),
            stats.pending + stats.approved,
            stats.target_size,
            stats.pending,
            stats.approved
        ),
        format!("{}Total items: {}", indent(1), stats.total),
        format!("{}Needs generation: {}", indent(1), stats.needs_generation),
    ]
}

pub fn print_stats(stats: &QueueStats) {
    for line in format_stats(stats) {
        println!("{}", line);
    }
}

pub fn format_fill_report(report: &FillReport) -> Vec<String> {
    if report.attempted == 0 {
        return vec!["Queue is full, nothing to generate".to_string()];
    }
    let mut lines = vec![format!(
        "Generated {} of {} ({} synthetic)",
        report.generated,
        plural(report.attempted, "item", "items"),
        report.synthetic
    )];
    if report.errors > 0 {
        lines.push(format!("{}Failed: {}", indent(1), report.errors));
    }
    lines
}

pub fn print_fill_report(report: &FillReport) {
    for line in format_fill_report(report) {
        println!("{}", line);
    }
}

pub fn format_cleanup(deleted: usize, days: u32) -> Vec<String> {
    vec![format!(
        "Deleted {} older than {}",
        plural(deleted, "item", "items"),
        plural(days as usize, "day", "days")
    )]
}

// ============================================================================
// Items
// ============================================================================

pub fn format_item_list(items: &[ContentItem]) -> Vec<String> {
    if items.is_empty() {
        return vec!["No items".to_string()];
    }
    let mut lines = Vec::new();
    for (i, item) in items.iter().enumerate() {
        lines.push(item_line(i + 1, item));
        lines.push(format!("{}Id: {}", indent(1), item.id));
    }
    lines.push(String::new());
    lines.push(plural(items.len(), "item", "items"));
    lines
}

pub fn print_item_list(items: &[ContentItem]) {
    for line in format_item_list(items) {
        println!("{}", line);
    }
}

/// Full detail view of one item. Optional fields only appear when set.
pub fn format_item_detail(item: &ContentItem) -> Vec<String> {
    let mut lines = vec![
        format!("\"{}\"{}", item.quote_text, attribution(item)),
        format!("{}Id: {}", indent(1), item.id),
        format!("{}Status: {}", indent(1), item.status),
        format!("{}Source: {}", indent(1), item.source),
        format!("{}Scheduled: {}", indent(1), schedule_label(item)),
        format!("{}Created: {}", indent(1), item.created_at.to_rfc3339()),
        format!("{}Image: {} bytes", indent(1), item.image_payload.len()),
    ];
    if let Some(at) = item.approved_at {
        lines.push(format!("{}Approved: {}", indent(1), at.to_rfc3339()));
    }
    if let Some(at) = item.published_at {
        lines.push(format!("{}Published: {}", indent(1), at.to_rfc3339()));
    }
    if let Some(post_id) = &item.external_post_id {
        lines.push(format!("{}Post: {}", indent(1), post_id));
    }
    if let Some(caption) = &item.caption {
        lines.push(format!("{}Caption: {}", indent(1), caption));
    }
    if !item.hashtags.is_empty() {
        let tags: Vec<String> = item.hashtags.iter().map(|t| format!("#{t}")).collect();
        lines.push(format!("{}Hashtags: {}", indent(1), tags.join(" ")));
    }
    if let Some(prompt) = &item.prompt_used {
        lines.push(format!("{}Prompt: {}", indent(1), truncate(prompt, 80)));
    }
    if let Some(error) = &item.error_message {
        lines.push(format!("{}Error: {}", indent(1), error));
    }
    lines
}

pub fn print_item_detail(item: &ContentItem) {
    for line in format_item_detail(item) {
        println!("{}", line);
    }
}
