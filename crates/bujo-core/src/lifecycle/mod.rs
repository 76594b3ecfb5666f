//! Entry lifecycle state machine.
//!
//! Transitions follow a fixed table:
//!
//! | From      | Command           | To        | Side effect                      |
//! |-----------|-------------------|-----------|----------------------------------|
//! | Task      | MarkDone          | Done      |                                  |
//! | Done      | Undo              | Task      |                                  |
//! | Task      | Cancel            | Cancelled |                                  |
//! | Cancelled | Uncancel          | Task      |                                  |
//! | Task      | Migrate(date)     | Migrated  | new Task on `date`               |
//! | Question  | Answer(text)      | Answered  | child Note holding `text`        |
//! | Answered  | Reopen            | Question  | answer Note stays                |
//! | T/N/E     | Retype(T/N/E)     | new type  |                                  |
//!
//! Deletion is planned separately by [`plan_delete`] because it acts on a
//! whole subtree rather than a single entry.
//!
//! Everything here is pure; callers persist the returned entries.

pub mod delete;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entry::{Entry, EntryType, ParentAnchor};
use crate::error::{CoreError, Result, ValidationError};
use crate::parser::extract_tokens;

pub use delete::{plan_delete, ChildPolicy, DeletePlan, Reparent};

/// A named operation that may change an entry's type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCommand {
    MarkDone,
    Undo,
    Cancel,
    Uncancel,
    /// Move a task to another day; `parent` attaches the successor under
    /// an existing entry, otherwise it becomes a root
    Migrate {
        date: NaiveDate,
        parent: Option<ParentAnchor>,
    },
    Answer {
        text: String,
    },
    Reopen,
    Retype(EntryType),
}

impl LifecycleCommand {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleCommand::MarkDone => "mark-done",
            LifecycleCommand::Undo => "undo",
            LifecycleCommand::Cancel => "cancel",
            LifecycleCommand::Uncancel => "uncancel",
            LifecycleCommand::Migrate { .. } => "migrate",
            LifecycleCommand::Answer { .. } => "answer",
            LifecycleCommand::Reopen => "reopen",
            LifecycleCommand::Retype(_) => "retype",
        }
    }
}

/// Outcome of a legal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The entry with its new type
    pub entry: Entry,
    /// Successor task (migrate) or answer note (answer)
    pub spawned: Option<Entry>,
}

fn invalid(current: EntryType, command: &LifecycleCommand) -> CoreError {
    let command = match command {
        LifecycleCommand::Retype(to) => format!("retype to {to}"),
        other => other.name().to_string(),
    };
    CoreError::InvalidTransition { current, command }
}

/// Resolve the type an entry moves to, or reject the command.
pub fn next_type(current: EntryType, command: &LifecycleCommand) -> Result<EntryType> {
    use EntryType::*;
    use LifecycleCommand as C;

    let to = match (current, command) {
        (Task, C::MarkDone) => Done,
        (Done, C::Undo) => Task,
        (Task, C::Cancel) => Cancelled,
        (Cancelled, C::Uncancel) => Task,
        (Task, C::Migrate { .. }) => Migrated,
        (Question, C::Answer { .. }) => Answered,
        (Answered, C::Reopen) => Question,
        (from, C::Retype(to)) if from.is_retypable() && to.is_retypable() && from != *to => *to,
        _ => return Err(invalid(current, command)),
    };
    Ok(to)
}

/// Apply a lifecycle command to an entry.
///
/// Returns the updated entry plus any entry the transition spawns. The
/// input is never modified, so a rejected command leaves nothing to undo.
pub fn apply_lifecycle_command(entry: &Entry, command: &LifecycleCommand) -> Result<Transition> {
    let to = next_type(entry.entry_type, command)?;

    let spawned = match command {
        LifecycleCommand::Migrate { date, parent } => {
            if *date == entry.date {
                return Err(ValidationError::InvalidValue {
                    field: "date".into(),
                    message: format!("task is already on {date}"),
                }
                .into());
            }
            Some(migrated_successor(entry, *date, parent.as_ref()))
        }
        LifecycleCommand::Answer { text } => {
            let text = text.trim();
            if text.is_empty() {
                return Err(ValidationError::Empty("answer".into()).into());
            }
            Some(answer_note(entry, text))
        }
        _ => None,
    };

    let mut updated = entry.clone();
    updated.entry_type = to;
    Ok(Transition {
        entry: updated,
        spawned,
    })
}

fn migrated_successor(source: &Entry, date: NaiveDate, parent: Option<&ParentAnchor>) -> Entry {
    let mut task = Entry::new(EntryType::Task, source.content.clone(), date);
    task.priority = source.priority;
    task.tags = source.tags.clone();
    task.mentions = source.mentions.clone();
    task.location = source.location.clone();
    if let Some(anchor) = parent {
        task.parent_id = Some(anchor.entity_id.clone());
        task.depth = anchor.depth + 1;
    }
    task
}

fn answer_note(question: &Entry, text: &str) -> Entry {
    let (tags, mentions) = extract_tokens(text);
    let mut note = Entry::new(EntryType::Note, text, question.date);
    note.parent_id = Some(question.entity_id.clone());
    note.depth = question.depth + 1;
    note.position = question.position + 1;
    note.location = question.location.clone();
    note.tags = tags;
    note.mentions = mentions;
    note
}
