//! Named lists whose items carry full version history.

use chrono::{DateTime, Duration, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::clock::now_utc;
use crate::entry::{EntityId, EntryType};
use crate::error::{CoreError, ParseError, ParseErrorKind, Result, ValidationError};
use crate::lifecycle::{next_type, LifecycleCommand};
use crate::parser::{classify_line, ParseOptions};
use crate::storage::list_repo::{self, ListRecord};
use crate::storage::{Config, Database, SqliteVersionRepository};
use crate::versioning::{
    self, HistoryEntry, ItemMutation, ItemVersion, ListSummary, VersionRepository,
};

/// A list together with its item counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOverview {
    #[serde(flatten)]
    pub list: ListRecord,
    pub total: u64,
    pub done: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveReport {
    pub cutoff: DateTime<Utc>,
    pub versions: u64,
    pub dry_run: bool,
}

pub struct ListService<'db> {
    db: &'db Database,
    options: ParseOptions,
    retention_days: u32,
}

fn list_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::Empty("list name".into()).into());
    }
    Ok(name.to_string())
}

/// Find a live list by entity id, falling back to its name.
fn resolve_list(conn: &Connection, key: &str) -> Result<ListRecord> {
    if let Some(list) = list_repo::find_list(conn, &EntityId::from(key))? {
        return Ok(list);
    }
    list_repo::find_list_by_name(conn, key.trim())?.ok_or_else(|| CoreError::not_found("list", key))
}

impl<'db> ListService<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self::with_config(db, &Config::default())
    }

    pub fn with_config(db: &'db Database, config: &Config) -> Self {
        Self {
            db,
            options: config.parse_options(),
            retention_days: config.archive.retention_days,
        }
    }

    pub fn create_list(&self, name: &str) -> Result<ListRecord> {
        let name = list_name(name)?;
        self.db.atomic(|conn| {
            let list = list_repo::insert_list(conn, &name, now_utc())?;
            info!(list = %list.entity_id, name = %list.name, "created list");
            Ok(list)
        })
    }

    pub fn rename_list(&self, list: &str, name: &str) -> Result<ListRecord> {
        let name = list_name(name)?;
        self.db.atomic(|conn| {
            let mut record = resolve_list(conn, list)?;
            list_repo::rename_list(conn, &record.entity_id, &name)?;
            info!(list = %record.entity_id, from = %record.name, to = %name, "renamed list");
            record.name = name;
            Ok(record)
        })
    }

    /// Delete a list and soft-delete all of its current items together.
    ///
    /// Returns how many items were deleted.
    pub fn delete_list(&self, list: &str) -> Result<u64> {
        self.db.atomic(|conn| {
            let record = resolve_list(conn, list)?;
            let repo = SqliteVersionRepository::new(conn);
            let now = now_utc();
            let items = repo.current_in_list(&record.entity_id)?;
            for item in &items {
                versioning::delete_item(&repo, &item.entity_id, now)?;
            }
            list_repo::mark_list_deleted(conn, &record.entity_id, now)?;
            info!(list = %record.entity_id, items = items.len(), "deleted list");
            Ok(items.len() as u64)
        })
    }

    /// All live lists with their summaries.
    pub fn lists(&self) -> Result<Vec<ListOverview>> {
        let conn = self.db.conn();
        let repo = SqliteVersionRepository::new(conn);
        list_repo::all_lists(conn)?
            .into_iter()
            .map(|list| {
                let ListSummary { total, done, .. } = versioning::list_summary(&repo, &list.entity_id)?;
                Ok(ListOverview { list, total, done })
            })
            .collect()
    }

    pub fn list_summary(&self, list: &str) -> Result<ListSummary> {
        let conn = self.db.conn();
        let record = resolve_list(conn, list)?;
        versioning::list_summary(&SqliteVersionRepository::new(conn), &record.entity_id)
    }

    pub fn add_item(&self, list: &str, item_type: EntryType, content: &str) -> Result<ItemVersion> {
        self.db.atomic(|conn| {
            let record = resolve_list(conn, list)?;
            let repo = SqliteVersionRepository::new(conn);
            versioning::create_item(&repo, &record.entity_id, item_type, content, now_utc())
        })
    }

    /// Add an item written as one journal line, e.g. `". buy stamps"`.
    pub fn add_item_line(&self, list: &str, line: &str) -> Result<ItemVersion> {
        let classified = classify_line(1, line, &self.options)?
            .ok_or_else(|| CoreError::from(ValidationError::Empty("line".into())))?;
        if classified.depth > 0 {
            return Err(ParseError::new(1, ParseErrorKind::OrphanChild { depth: classified.depth }).into());
        }
        self.add_item(list, classified.entry_type, &classified.content)
    }

    /// Current items of a list in insertion order.
    pub fn items(&self, list: &str) -> Result<Vec<ItemVersion>> {
        let conn = self.db.conn();
        let record = resolve_list(conn, list)?;
        SqliteVersionRepository::new(conn).current_in_list(&record.entity_id)
    }

    pub fn item(&self, entity: &EntityId) -> Result<ItemVersion> {
        versioning::current_version(&SqliteVersionRepository::new(self.db.conn()), entity)
    }

    pub fn edit_item(&self, entity: &EntityId, content: &str) -> Result<ItemVersion> {
        self.revise(entity, ItemMutation::content(content))
    }

    pub fn move_item(&self, entity: &EntityId, list: &str) -> Result<ItemVersion> {
        self.db.atomic(|conn| {
            let target = resolve_list(conn, list)?;
            let repo = SqliteVersionRepository::new(conn);
            versioning::revise_item(&repo, entity, &ItemMutation::move_to(target.entity_id), now_utc())
        })
    }

    /// Change an item's type through the lifecycle table.
    ///
    /// Only commands that change the type alone apply to list items;
    /// migrate and answer are rejected.
    pub fn transition_item(&self, entity: &EntityId, command: &LifecycleCommand) -> Result<ItemVersion> {
        if matches!(
            command,
            LifecycleCommand::Migrate { .. } | LifecycleCommand::Answer { .. }
        ) {
            return Err(ValidationError::InvalidValue {
                field: "command".into(),
                message: format!("{} does not apply to list items", command.name()),
            }
            .into());
        }
        self.db.atomic(|conn| {
            let repo = SqliteVersionRepository::new(conn);
            let current = versioning::live_version(&repo, entity)?;
            let to = next_type(current.item_type, command)?;
            versioning::revise_item(&repo, entity, &ItemMutation::item_type(to), now_utc())
        })
    }

    pub fn complete_item(&self, entity: &EntityId) -> Result<ItemVersion> {
        self.transition_item(entity, &LifecycleCommand::MarkDone)
    }

    pub fn retype_item(&self, entity: &EntityId, to: EntryType) -> Result<ItemVersion> {
        self.transition_item(entity, &LifecycleCommand::Retype(to))
    }

    pub fn remove_item(&self, entity: &EntityId) -> Result<()> {
        self.db.atomic(|conn| {
            versioning::delete_item(&SqliteVersionRepository::new(conn), entity, now_utc())
        })
    }

    pub fn item_history(&self, entity: &EntityId) -> Result<Vec<HistoryEntry>> {
        versioning::history(&SqliteVersionRepository::new(self.db.conn()), entity)
    }

    /// Restore a deleted item from one of its versions.
    ///
    /// Fails with a conflict when that version's list has been deleted.
    pub fn restore_item(&self, entity: &EntityId, version: u32) -> Result<ItemVersion> {
        self.db.atomic(|conn| {
            let repo = SqliteVersionRepository::new(conn);
            let restored = versioning::restore(&repo, entity, version, now_utc())?;
            if list_repo::find_list(conn, &restored.list_id)?.is_none() {
                return Err(CoreError::conflict(format!(
                    "list {} of item {entity} no longer exists",
                    restored.list_id
                )));
            }
            Ok(restored)
        })
    }

    pub fn revert_item(&self, entity: &EntityId, version: u32) -> Result<ItemVersion> {
        self.db.atomic(|conn| {
            let repo = SqliteVersionRepository::new(conn);
            let reverted = versioning::revert(&repo, entity, version, now_utc())?;
            if list_repo::find_list(conn, &reverted.list_id)?.is_none() {
                return Err(CoreError::conflict(format!(
                    "list {} of item {entity} no longer exists",
                    reverted.list_id
                )));
            }
            Ok(reverted)
        })
    }

    /// Remove closed versions older than the retention window (or `cutoff`).
    pub fn archive(&self, cutoff: Option<DateTime<Utc>>, dry_run: bool) -> Result<ArchiveReport> {
        let cutoff = cutoff.unwrap_or_else(|| now_utc() - Duration::days(i64::from(self.retention_days)));
        let versions = if dry_run {
            versioning::archive_preview(&SqliteVersionRepository::new(self.db.conn()), cutoff)?
        } else {
            self.db
                .atomic(|conn| versioning::archive(&SqliteVersionRepository::new(conn), cutoff))?
        };
        Ok(ArchiveReport {
            cutoff,
            versions,
            dry_run,
        })
    }

    fn revise(&self, entity: &EntityId, mutation: ItemMutation) -> Result<ItemVersion> {
        self.db.atomic(|conn| {
            versioning::revise_item(&SqliteVersionRepository::new(conn), entity, &mutation, now_utc())
        })
    }
}
