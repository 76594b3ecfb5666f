//! Journal entries: logging, lifecycle commands, delete and restore.

use chrono::NaiveDate;
use tracing::{debug, info};
use uuid::Uuid;

use crate::clock::now_utc;
use crate::entry::{EntityId, Entry, ParentAnchor};
use crate::error::{CoreError, Result};
use crate::lifecycle::{
    apply_lifecycle_command, plan_delete, ChildPolicy, DeletePlan, LifecycleCommand, Transition,
};
use crate::parser::{parse_journal_text, pre_order, ParseOptions};
use crate::storage::entry_repo::{self, DeletedEntry};
use crate::storage::{Config, Database};

pub struct JournalService<'db> {
    db: &'db Database,
    options: ParseOptions,
    default_location: Option<String>,
}

fn live_entry(conn: &rusqlite::Connection, entity: &EntityId) -> Result<Entry> {
    entry_repo::find_entry(conn, entity)?.ok_or_else(|| CoreError::not_found("entry", entity))
}

fn strip_marker(value: &str, marker: char) -> &str {
    let value = value.trim();
    value.strip_prefix(marker).unwrap_or(value)
}

impl<'db> JournalService<'db> {
    pub fn new(db: &'db Database) -> Self {
        Self {
            db,
            options: ParseOptions::default(),
            default_location: None,
        }
    }

    pub fn with_config(db: &'db Database, config: &Config) -> Self {
        Self {
            db,
            options: config.parse_options(),
            default_location: config.journal.default_location.clone(),
        }
    }

    /// Parse `text` and store the resulting entries under `date`.
    ///
    /// With `parent`, the batch is attached under that live entry. A parse
    /// failure stores nothing.
    pub fn log_entries(
        &self,
        text: &str,
        date: NaiveDate,
        parent: Option<&EntityId>,
    ) -> Result<Vec<Entry>> {
        self.db.atomic(|conn| {
            let anchor = match parent {
                Some(id) => Some(ParentAnchor::of(&live_entry(conn, id)?)),
                None => None,
            };
            let mut entries = parse_journal_text(text, date, anchor.as_ref(), &self.options)?;

            let offset = entry_repo::next_position(conn, date)?;
            for entry in &mut entries {
                entry.position += offset;
                if entry.location.is_none() {
                    entry.location = self.default_location.clone();
                }
                entry.id = Some(entry_repo::insert_entry(conn, entry)?);
            }
            info!(count = entries.len(), %date, "logged entries");
            Ok(entries)
        })
    }

    /// Live entries for one day in display order.
    pub fn entries_for_date(&self, date: NaiveDate) -> Result<Vec<Entry>> {
        let entries = entry_repo::entries_for_date(self.db.conn(), date)?;
        debug!(count = entries.len(), %date, "loaded day");
        Ok(pre_order(entries))
    }

    pub fn entry(&self, entity: &EntityId) -> Result<Entry> {
        live_entry(self.db.conn(), entity)
    }

    /// Validate and persist a lifecycle command.
    ///
    /// Rejected commands leave the stored entry untouched.
    pub fn apply_command(&self, entity: &EntityId, command: LifecycleCommand) -> Result<Transition> {
        self.db.atomic(|conn| {
            let entry = live_entry(conn, entity)?;
            let command = match command {
                LifecycleCommand::Migrate {
                    date,
                    parent: Some(anchor),
                } => LifecycleCommand::Migrate {
                    date,
                    parent: Some(ParentAnchor::of(&live_entry(conn, &anchor.entity_id)?)),
                },
                other => other,
            };

            let mut transition = apply_lifecycle_command(&entry, &command)?;
            entry_repo::update_entry(conn, &transition.entry)?;

            if let Some(spawned) = transition.spawned.as_mut() {
                if matches!(command, LifecycleCommand::Migrate { .. }) {
                    spawned.position = entry_repo::next_position(conn, spawned.date)?;
                }
                spawned.id = Some(entry_repo::insert_entry(conn, spawned)?);
            }
            info!(
                entity = %entity,
                command = command.name(),
                to = %transition.entry.entry_type,
                "applied lifecycle command"
            );
            Ok(transition)
        })
    }

    /// Soft-delete an entry, handling its children per `policy`.
    ///
    /// Deleting an entry that is already deleted succeeds with an empty plan.
    pub fn delete_entry(&self, entity: &EntityId, policy: ChildPolicy) -> Result<DeletePlan> {
        self.db.atomic(|conn| {
            let target = match entry_repo::find_entry(conn, entity)? {
                Some(target) => target,
                None if entry_repo::find_deleted(conn, entity)?.is_some() => {
                    debug!(entity = %entity, "entry already deleted");
                    return Ok(DeletePlan::default());
                }
                None => return Err(CoreError::not_found("entry", entity)),
            };

            let subtree = entry_repo::descendants(conn, entity)?;
            let plan = plan_delete(&target, &subtree, policy);
            let operation = Uuid::new_v4().to_string();
            entry_repo::mark_deleted(conn, &plan.deleted, now_utc(), &operation)?;
            for placement in &plan.reparented {
                entry_repo::set_placement(conn, placement)?;
            }
            info!(
                entity = %entity,
                %policy,
                deleted = plan.deleted.len(),
                reparented = plan.reparented.len(),
                "deleted entry"
            );
            Ok(plan)
        })
    }

    /// Undo a soft delete.
    ///
    /// Descendants removed by the same cascade come back with the entry;
    /// ones deleted earlier on their own stay deleted. Children moved by a
    /// reparenting delete stay where they are.
    pub fn restore_entry(&self, entity: &EntityId) -> Result<Vec<Entry>> {
        self.db.atomic(|conn| {
            let Some(deleted) = entry_repo::find_deleted(conn, entity)? else {
                return Err(match entry_repo::find_entry(conn, entity)? {
                    Some(_) => CoreError::conflict(format!("entry {entity} is not deleted")),
                    None => CoreError::not_found("entry", entity),
                });
            };
            if let Some(parent) = &deleted.entry.parent_id {
                if entry_repo::find_entry(conn, parent)?.is_none() {
                    return Err(CoreError::conflict(format!(
                        "parent {parent} of entry {entity} is deleted; restore it first"
                    )));
                }
            }

            let mut ids = vec![entity.clone()];
            ids.extend(
                entry_repo::deleted_in(conn, &deleted.operation)?
                    .into_iter()
                    .filter(|id| id != entity),
            );
            entry_repo::clear_deleted(conn, &ids)?;

            let mut restored = Vec::with_capacity(ids.len());
            for id in &ids {
                restored.push(live_entry(conn, id)?);
            }
            info!(entity = %entity, count = restored.len(), "restored entry");
            Ok(restored)
        })
    }

    pub fn deleted_entries(&self) -> Result<Vec<DeletedEntry>> {
        entry_repo::deleted_entries(self.db.conn())
    }

    /// Open tasks logged before `before`, oldest first.
    pub fn outstanding_tasks(&self, before: NaiveDate) -> Result<Vec<Entry>> {
        entry_repo::outstanding_tasks(self.db.conn(), before)
    }

    /// Accepts the tag with or without its `#`.
    pub fn entries_tagged(&self, tag: &str) -> Result<Vec<Entry>> {
        entry_repo::entries_tagged(self.db.conn(), strip_marker(tag, '#'))
    }

    /// Accepts the name with or without its `@`.
    pub fn entries_mentioning(&self, name: &str) -> Result<Vec<Entry>> {
        entry_repo::entries_mentioning(self.db.conn(), strip_marker(name, '@'))
    }
}
