//! Render entries back into the journal line format.

use super::tokenizer::escape_content;
use super::ParseOptions;
use crate::entry::Entry;

/// Format one entry as a line at the given relative depth.
pub fn format_line(entry: &Entry, relative_depth: u32, options: &ParseOptions) -> String {
    let mut line = " ".repeat(relative_depth as usize * options.indent_width.max(1));
    line.push(entry.entry_type.symbol());
    line.push(' ');
    if let Some(p) = entry.priority.symbol() {
        line.push(p);
        line.push(' ');
    }
    line.push_str(&escape_content(&entry.content));
    line
}

/// Format entries (already in display order) as journal text.
///
/// Depths are rendered relative to the shallowest entry, so a subtree
/// formats as a standalone batch.
pub fn format_entries(entries: &[Entry], options: &ParseOptions) -> String {
    let base = entries.iter().map(|e| e.depth).min().unwrap_or(0);
    entries
        .iter()
        .map(|e| format_line(e, e.depth - base, options))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{EntryType, Priority};
    use chrono::NaiveDate;

    #[test]
    fn formats_symbol_priority_and_indent() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let mut parent = Entry::new(EntryType::Task, "Ship release", date);
        parent.priority = Priority::High;
        let mut child = Entry::new(EntryType::Note, "tag the commit", date);
        child.depth = 1;

        let text = format_entries(&[parent, child], &ParseOptions::default());
        assert_eq!(text, ". ! Ship release\n  - tag the commit");
    }

    #[test]
    fn content_starting_with_a_priority_symbol_round_trips() {
        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let options = ParseOptions::default();
        let answer = Entry::new(EntryType::Note, "! see docs", date);
        let text = format_entries(&[answer], &options);
        assert_eq!(text, "- \\! see docs");

        let parsed = crate::parser::parse_journal_text(&text, date, None, &options).unwrap();
        assert_eq!(parsed[0].priority, Priority::None);
        assert_eq!(parsed[0].content, "! see docs");
    }
}
