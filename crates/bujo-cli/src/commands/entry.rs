//! Entry commands: lifecycle transitions, delete/restore, search.

use bujo_core::{ChildPolicy, EntityId, EntryType, JournalService, LifecycleCommand, ParentAnchor};
use clap::Subcommand;

use super::{date_or_today, print_json, CmdResult, Session};

#[derive(Subcommand)]
pub enum EntryAction {
    /// Show one entry
    Show {
        /// Entry ID
        id: String,
    },
    /// Mark a task done
    Done { id: String },
    /// Turn a done entry back into a task
    Undo { id: String },
    /// Cancel a task
    Cancel { id: String },
    /// Turn a cancelled entry back into a task
    Uncancel { id: String },
    /// Move a task to another day
    Migrate {
        id: String,
        /// Target day (YYYY-MM-DD)
        #[arg(long)]
        to: String,
        /// Place the new task under this entry
        #[arg(long)]
        under: Option<String>,
    },
    /// Answer a question
    Answer {
        id: String,
        /// Answer text, stored as a note under the question
        text: String,
    },
    /// Reopen an answered question
    Reopen { id: String },
    /// Change between task, note and event
    Retype {
        id: String,
        /// New type: task, note or event
        #[arg(value_name = "TYPE")]
        entry_type: EntryType,
    },
    /// Soft-delete an entry
    Delete {
        id: String,
        /// What happens to children: cascade or reparent
        #[arg(long)]
        children: ChildPolicy,
    },
    /// Restore a deleted entry
    Restore { id: String },
    /// List deleted entries
    Deleted,
    /// Open tasks logged before a day (default today)
    Outstanding {
        #[arg(long)]
        before: Option<String>,
    },
    /// Entries with a tag
    Tagged { tag: String },
    /// Entries mentioning someone
    Mentions { name: String },
}

fn transition(journal: &JournalService<'_>, id: &str, command: LifecycleCommand) -> CmdResult {
    print_json(&journal.apply_command(&EntityId::from(id), command)?)
}

pub fn run(action: EntryAction) -> CmdResult {
    let session = Session::open()?;
    let journal = JournalService::with_config(&session.db, &session.config);

    match action {
        EntryAction::Show { id } => print_json(&journal.entry(&EntityId::from(id))?),
        EntryAction::Done { id } => transition(&journal, &id, LifecycleCommand::MarkDone),
        EntryAction::Undo { id } => transition(&journal, &id, LifecycleCommand::Undo),
        EntryAction::Cancel { id } => transition(&journal, &id, LifecycleCommand::Cancel),
        EntryAction::Uncancel { id } => transition(&journal, &id, LifecycleCommand::Uncancel),
        EntryAction::Migrate { id, to, under } => {
            let date = date_or_today(Some(&to))?;
            // depth is re-read from the store before use
            let parent = under.map(|p| ParentAnchor {
                entity_id: EntityId::from(p),
                depth: 0,
            });
            transition(&journal, &id, LifecycleCommand::Migrate { date, parent })
        }
        EntryAction::Answer { id, text } => {
            transition(&journal, &id, LifecycleCommand::Answer { text })
        }
        EntryAction::Reopen { id } => transition(&journal, &id, LifecycleCommand::Reopen),
        EntryAction::Retype { id, entry_type } => {
            transition(&journal, &id, LifecycleCommand::Retype(entry_type))
        }
        EntryAction::Delete { id, children } => {
            print_json(&journal.delete_entry(&EntityId::from(id), children)?)
        }
        EntryAction::Restore { id } => print_json(&journal.restore_entry(&EntityId::from(id))?),
        EntryAction::Deleted => print_json(&journal.deleted_entries()?),
        EntryAction::Outstanding { before } => {
            let before = date_or_today(before.as_deref())?;
            print_json(&journal.outstanding_tasks(before)?)
        }
        EntryAction::Tagged { tag } => print_json(&journal.entries_tagged(&tag)?),
        EntryAction::Mentions { name } => print_json(&journal.entries_mentioning(&name)?),
    }
}
