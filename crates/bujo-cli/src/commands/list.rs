//! List commands and versioned list items.

use bujo_core::clock::{parse_date, parse_timestamp};
use bujo_core::{EntityId, EntryType, ListService};
use chrono::{DateTime, Utc};
use clap::Subcommand;

use super::{print_json, CmdResult, Session};

#[derive(Subcommand)]
pub enum ListAction {
    /// Create a list
    Create {
        /// List name (unique among live lists)
        name: String,
    },
    /// Rename a list
    Rename {
        /// List ID or name
        list: String,
        new_name: String,
    },
    /// Delete a list and its items
    Delete { list: String },
    /// Show all lists with item counts
    All,
    /// Show the current items of a list
    Items { list: String },
    /// Add an item
    Add {
        /// List ID or name
        list: String,
        /// Item as a journal line, e.g. ". buy stamps"
        #[arg(allow_hyphen_values = true)]
        line: Option<String>,
        /// Item type when giving --content
        #[arg(long = "type", value_name = "TYPE", default_value = "task")]
        item_type: EntryType,
        /// Item text without a symbol
        #[arg(long, conflicts_with = "line")]
        content: Option<String>,
    },
    /// Change an item's text
    Edit { id: String, content: String },
    /// Move an item to another list
    Move {
        id: String,
        /// Target list ID or name
        list: String,
    },
    /// Mark an item done
    Done { id: String },
    /// Change an item's type
    Retype {
        id: String,
        #[arg(value_name = "TYPE")]
        item_type: EntryType,
    },
    /// Delete an item (its history is kept)
    Remove { id: String },
    /// Show every version of an item
    History { id: String },
    /// Bring a deleted item back from one of its versions
    Restore {
        id: String,
        #[arg(long)]
        version: u32,
    },
    /// Make a live item match one of its earlier versions
    Revert {
        id: String,
        #[arg(long)]
        version: u32,
    },
    /// Drop closed versions older than the retention window
    Archive {
        /// Cutoff (YYYY-MM-DD or RFC3339); default is now minus archive.retention_days
        #[arg(long)]
        before: Option<String>,
        /// Only count what would be removed
        #[arg(long)]
        dry_run: bool,
    },
}

fn parse_cutoff(raw: &str) -> Result<DateTime<Utc>, String> {
    parse_timestamp(raw)
        .or_else(|| parse_date(raw).map(|d| d.and_time(chrono::NaiveTime::MIN).and_utc()))
        .ok_or_else(|| format!("invalid cutoff '{raw}', expected YYYY-MM-DD or RFC3339"))
}

pub fn run(action: ListAction) -> CmdResult {
    let session = Session::open()?;
    let lists = ListService::with_config(&session.db, &session.config);

    match action {
        ListAction::Create { name } => print_json(&lists.create_list(&name)?),
        ListAction::Rename { list, new_name } => print_json(&lists.rename_list(&list, &new_name)?),
        ListAction::Delete { list } => {
            let removed = lists.delete_list(&list)?;
            println!("deleted list {list} ({removed} items)");
            Ok(())
        }
        ListAction::All => print_json(&lists.lists()?),
        ListAction::Items { list } => print_json(&lists.items(&list)?),
        ListAction::Add {
            list,
            line,
            item_type,
            content,
        } => {
            let item = match (line, content) {
                (Some(line), _) => lists.add_item_line(&list, &line)?,
                (None, Some(content)) => lists.add_item(&list, item_type, &content)?,
                (None, None) => return Err("give an item line or --content".into()),
            };
            print_json(&item)
        }
        ListAction::Edit { id, content } => {
            print_json(&lists.edit_item(&EntityId::from(id), &content)?)
        }
        ListAction::Move { id, list } => print_json(&lists.move_item(&EntityId::from(id), &list)?),
        ListAction::Done { id } => print_json(&lists.complete_item(&EntityId::from(id))?),
        ListAction::Retype { id, item_type } => {
            print_json(&lists.retype_item(&EntityId::from(id), item_type)?)
        }
        ListAction::Remove { id } => {
            lists.remove_item(&EntityId::from(id.as_str()))?;
            println!("removed {id}");
            Ok(())
        }
        ListAction::History { id } => print_json(&lists.item_history(&EntityId::from(id))?),
        ListAction::Restore { id, version } => {
            print_json(&lists.restore_item(&EntityId::from(id), version)?)
        }
        ListAction::Revert { id, version } => {
            print_json(&lists.revert_item(&EntityId::from(id), version)?)
        }
        ListAction::Archive { before, dry_run } => {
            let cutoff = before.as_deref().map(parse_cutoff).transpose()?;
            print_json(&lists.archive(cutoff, dry_run)?)
        }
    }
}
