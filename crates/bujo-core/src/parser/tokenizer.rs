//! Line classifier built on `nom`.
//!
//! One journal line has the shape
//! `<indent><type-symbol><space?><priority-symbol?><space?><content>`.
//! The space after a letter symbol (`o`, `x`) is required. Content that
//! itself starts with a priority symbol is written with a leading `\`
//! (`- \! see docs`); the backslash is dropped when the line is read.
//! Indentation is measured in spaces and must be a whole multiple of the
//! configured unit. Tags (`#word`) and mentions (`@word`) are collected from
//! the content but stay inline in it.

use nom::{
    bytes::complete::take_while1,
    branch::alt,
    character::complete::{anychar, one_of, space0, space1},
    combinator::{eof, map_opt, opt, peek, rest},
    error::VerboseError,
    sequence::{pair, preceded, tuple},
    IResult,
};
use std::borrow::Cow;
use std::collections::BTreeSet;

use super::ParseOptions;
use crate::entry::{EntryType, Priority};
use crate::error::{ParseError, ParseErrorKind};

type PResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

const TAG_MARKER: char = '#';
const MENTION_MARKER: char = '@';
const ESCAPE: char = '\\';

/// Result of classifying a single non-blank line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedLine {
    /// 1-based line number in the submitted text
    pub line_no: usize,
    /// Nesting level (indentation divided by the unit)
    pub depth: usize,
    pub entry_type: EntryType,
    pub priority: Priority,
    pub content: String,
    pub tags: BTreeSet<String>,
    pub mentions: BTreeSet<String>,
}

/// Classify one line of journal text. Blank lines yield `Ok(None)`.
pub fn classify_line(
    line_no: usize,
    line: &str,
    options: &ParseOptions,
) -> Result<Option<ClassifiedLine>, ParseError> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    let fail = |kind| ParseError::new(line_no, kind);

    let indent_len = line.len() - line.trim_start().len();
    let (indent, body) = line.split_at(indent_len);
    let depth = measure_indent(indent, options.indent_width).map_err(fail)?;

    let (_, (entry_type, priority, content)) = entry_body(body).map_err(|_| {
        let symbol = body.chars().next().map(String::from).unwrap_or_default();
        fail(ParseErrorKind::UnrecognizedSymbol(symbol))
    })?;

    let content = unescape_content(content.trim());
    if content.is_empty() {
        return Err(fail(ParseErrorKind::EmptyContent));
    }
    let (tags, mentions) = extract_tokens(content);

    Ok(Some(ClassifiedLine {
        line_no,
        depth,
        entry_type,
        priority: priority.unwrap_or_default(),
        content: content.to_string(),
        tags,
        mentions,
    }))
}

fn measure_indent(indent: &str, unit: usize) -> Result<usize, ParseErrorKind> {
    if indent.contains('\t') {
        return Err(ParseErrorKind::IllegalIndentation(
            "tab characters are not allowed".into(),
        ));
    }
    if let Some(other) = indent.chars().find(|c| *c != ' ') {
        return Err(ParseErrorKind::IllegalIndentation(format!(
            "unexpected whitespace {other:?}"
        )));
    }
    let unit = unit.max(1);
    let width = indent.len();
    if width % unit != 0 {
        return Err(ParseErrorKind::IllegalIndentation(format!(
            "{width} spaces is not a multiple of {unit}"
        )));
    }
    Ok(width / unit)
}

/// A letter symbol (`o`, `x`) must be followed by whitespace, otherwise it
/// is the first letter of a word such as `order`.
fn type_symbol(i: &str) -> PResult<'_, EntryType> {
    let (after, entry_type) = map_opt(anychar, EntryType::from_symbol)(i)?;
    if entry_type.symbol().is_alphabetic() {
        peek(alt((space1, eof)))(after)?;
    }
    Ok((after, entry_type))
}

fn priority_symbol(i: &str) -> PResult<'_, Priority> {
    map_opt(anychar, Priority::from_symbol)(i)
}

fn entry_body(i: &str) -> PResult<'_, (EntryType, Option<Priority>, &str)> {
    tuple((
        type_symbol,
        preceded(space0, opt(priority_symbol)),
        preceded(space0, rest),
    ))(i)
}

fn needs_escape(content: &str) -> bool {
    let mut chars = content.chars();
    match chars.next() {
        Some(ESCAPE) => chars.next().and_then(Priority::from_symbol).is_some(),
        Some(c) => Priority::from_symbol(c).is_some(),
        None => false,
    }
}

/// Prefix content that would otherwise read back as a priority marker.
pub fn escape_content(content: &str) -> Cow<'_, str> {
    if needs_escape(content) {
        Cow::Owned(format!("{ESCAPE}{content}"))
    } else {
        Cow::Borrowed(content)
    }
}

fn unescape_content(content: &str) -> &str {
    match content.strip_prefix(ESCAPE) {
        Some(unescaped) if needs_escape(unescaped) => unescaped,
        _ => content,
    }
}

fn marker_token(i: &str) -> PResult<'_, (char, &str)> {
    pair(
        one_of("#@"),
        take_while1(|c: char| c.is_alphanumeric()),
    )(i)
}

/// Collect `#tag` and `@mention` tokens that start at a word boundary.
pub fn extract_tokens(content: &str) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut tags = BTreeSet::new();
    let mut mentions = BTreeSet::new();
    let mut at_boundary = true;
    let mut remaining = content;

    while let Some(c) = remaining.chars().next() {
        if at_boundary {
            if let Ok((after, (marker, word))) = marker_token(remaining) {
                match marker {
                    TAG_MARKER => tags.insert(word.to_string()),
                    MENTION_MARKER => mentions.insert(word.to_string()),
                    _ => false,
                };
                remaining = after;
                at_boundary = false;
                continue;
            }
        }
        at_boundary = c.is_whitespace();
        remaining = &remaining[c.len_utf8()..];
    }

    (tags, mentions)
}
