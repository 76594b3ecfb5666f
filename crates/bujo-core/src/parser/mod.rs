//! Journal text parser.
//!
//! Parsing strategy:
//! - Each line is classified on its own by [`tokenizer::classify_line`]
//!   (type symbol, priority, depth, tags and mentions).
//! - The classified lines are assembled into a forest by
//!   [`tree::build_tree`] in one pass.
//!
//! The parser is pure: it keeps no state between calls and touches no
//! storage. Nothing is produced when any line fails.

pub mod format;
pub mod tokenizer;
pub mod tree;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, ParentAnchor};
use crate::error::ParseError;

pub use format::{format_entries, format_line};
pub use tokenizer::{classify_line, extract_tokens, ClassifiedLine};
pub use tree::{build_tree, pre_order};

/// Knobs that affect how journal text is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Number of spaces per nesting level
    pub indent_width: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { indent_width: 2 }
    }
}

/// Classify every non-blank line of `text`.
pub fn classify_text(text: &str, options: &ParseOptions) -> Result<Vec<ClassifiedLine>, ParseError> {
    let mut lines = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        if let Some(line) = classify_line(idx + 1, raw, options)? {
            lines.push(line);
        }
    }
    Ok(lines)
}

/// Parse journal text logged on `reference_date` into new entries.
///
/// When `parent` is given the whole batch is attached under that entry.
pub fn parse_journal_text(
    text: &str,
    reference_date: NaiveDate,
    parent: Option<&ParentAnchor>,
    options: &ParseOptions,
) -> Result<Vec<Entry>, ParseError> {
    let lines = classify_text(text, options)?;
    build_tree(&lines, reference_date, parent)
}
