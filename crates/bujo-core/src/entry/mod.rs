//! Journal entry model shared by the parser, the lifecycle and the stores.
//!
//! An [`Entry`] is one bullet in a day's log. Its type is a closed
//! enumeration; type changes only happen through
//! [`crate::lifecycle::apply_lifecycle_command`].

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Stable, version-independent key for one logical object.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Entry type enumeration.
///
///   TASK ──done──> DONE        TASK ──migrate──> MIGRATED
///    ^  <──undo───              |
///    +──<─uncancel── CANCELLED <┘ cancel
///
///   QUESTION ──answer──> ANSWERED ──reopen──> QUESTION
///
/// NOTE and EVENT never complete; TASK, NOTE and EVENT can be retyped
/// into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Task,
    Note,
    Event,
    Done,
    Migrated,
    Cancelled,
    Question,
    Answered,
}

impl EntryType {
    pub const ALL: [EntryType; 8] = [
        EntryType::Task,
        EntryType::Note,
        EntryType::Event,
        EntryType::Done,
        EntryType::Migrated,
        EntryType::Cancelled,
        EntryType::Question,
        EntryType::Answered,
    ];

    /// The single character that marks this type in journal text.
    pub fn symbol(self) -> char {
        match self {
            EntryType::Task => '.',
            EntryType::Note => '-',
            EntryType::Event => 'o',
            EntryType::Done => 'x',
            EntryType::Migrated => '>',
            EntryType::Cancelled => '~',
            EntryType::Question => '?',
            EntryType::Answered => '=',
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.symbol() == c)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EntryType::Task => "task",
            EntryType::Note => "note",
            EntryType::Event => "event",
            EntryType::Done => "done",
            EntryType::Migrated => "migrated",
            EntryType::Cancelled => "cancelled",
            EntryType::Question => "question",
            EntryType::Answered => "answered",
        }
    }

    /// Types that may be freely retyped into each other.
    pub fn is_retypable(self) -> bool {
        matches!(self, EntryType::Task | EntryType::Note | EntryType::Event)
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown entry type: {s}"))
    }
}

/// Entry priority. Absence of a priority marker maps to `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn symbol(self) -> Option<char> {
        match self {
            Priority::None => None,
            Priority::Low => Some('+'),
            Priority::Medium => Some('*'),
            Priority::High => Some('!'),
        }
    }

    pub fn from_symbol(c: char) -> Option<Self> {
        match c {
            '+' => Some(Priority::Low),
            '*' => Some(Priority::Medium),
            '!' => Some(Priority::High),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::None => "none",
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Priority::None),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// An existing entry a parsed batch is attached under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentAnchor {
    pub entity_id: EntityId,
    pub depth: u32,
}

impl ParentAnchor {
    pub fn of(entry: &Entry) -> Self {
        Self {
            entity_id: entry.entity_id.clone(),
            depth: entry.depth,
        }
    }
}

/// One journal item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    /// Row id; `None` until the entry has been persisted
    pub id: Option<i64>,
    pub entity_id: EntityId,
    pub entry_type: EntryType,
    pub content: String,
    #[serde(default)]
    pub priority: Priority,
    pub parent_id: Option<EntityId>,
    /// Number of ancestors
    pub depth: u32,
    /// Sibling ordering within a day; follows input line order
    pub position: u32,
    /// Day the entry was logged under
    pub date: NaiveDate,
    pub scheduled_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub mentions: BTreeSet<String>,
}

impl Entry {
    /// A fresh, unsaved root entry.
    pub fn new(entry_type: EntryType, content: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            id: None,
            entity_id: EntityId::new(),
            entry_type,
            content: content.into(),
            priority: Priority::None,
            parent_id: None,
            depth: 0,
            position: 0,
            date,
            scheduled_date: None,
            location: None,
            created_at: crate::clock::now_utc(),
            tags: BTreeSet::new(),
            mentions: BTreeSet::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_unique_and_round_trip() {
        for t in EntryType::ALL {
            assert_eq!(EntryType::from_symbol(t.symbol()), Some(t));
        }
        let mut symbols: Vec<char> = EntryType::ALL.iter().map(|t| t.symbol()).collect();
        symbols.sort();
        symbols.dedup();
        assert_eq!(symbols.len(), EntryType::ALL.len());
    }

    #[test]
    fn entry_type_parses_case_insensitively() {
        assert_eq!("Task".parse::<EntryType>().unwrap(), EntryType::Task);
        assert_eq!("ANSWERED".parse::<EntryType>().unwrap(), EntryType::Answered);
        assert!("chore".parse::<EntryType>().is_err());
    }

    #[test]
    fn priority_symbols_do_not_collide_with_type_symbols() {
        for p in [Priority::Low, Priority::Medium, Priority::High] {
            let sym = p.symbol().unwrap();
            assert_eq!(Priority::from_symbol(sym), Some(p));
            assert!(EntryType::from_symbol(sym).is_none());
        }
    }

    #[test]
    fn only_task_note_event_are_retypable() {
        let retypable: Vec<_> = EntryType::ALL
            .into_iter()
            .filter(|t| t.is_retypable())
            .collect();
        assert_eq!(
            retypable,
            vec![EntryType::Task, EntryType::Note, EntryType::Event]
        );
    }
}
