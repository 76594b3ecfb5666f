//! SQLite access for journal entries.
//!
//! Entries are single rows keyed by entity id. Deletion sets `deleted_at`;
//! every read except the explicit "deleted" queries filters those rows out.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::clock::{format_date, format_timestamp, parse_date, parse_timestamp};
use crate::entry::{EntityId, Entry, EntryType, Priority};
use crate::error::{CoreError, DatabaseError, Result};
use crate::lifecycle::Reparent;

const ENTRY_COLUMNS: &str = "id, entity_id, entry_type, content, priority, parent_id, depth, \
     position, date, scheduled_date, location, tags, mentions, created_at, deleted_at, delete_op";

/// A soft-deleted entry and when it was deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletedEntry {
    #[serde(flatten)]
    pub entry: Entry,
    pub deleted_at: DateTime<Utc>,
    /// Shared by every entry flagged in the same delete
    pub operation: String,
}

struct EntryRow {
    id: i64,
    entity_id: String,
    entry_type: String,
    content: String,
    priority: String,
    parent_id: Option<String>,
    depth: u32,
    position: u32,
    date: String,
    scheduled_date: Option<String>,
    location: Option<String>,
    tags: String,
    mentions: String,
    created_at: String,
    deleted_at: Option<String>,
    delete_op: Option<String>,
}

fn read_row(row: &Row) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        entity_id: row.get(1)?,
        entry_type: row.get(2)?,
        content: row.get(3)?,
        priority: row.get(4)?,
        parent_id: row.get(5)?,
        depth: row.get(6)?,
        position: row.get(7)?,
        date: row.get(8)?,
        scheduled_date: row.get(9)?,
        location: row.get(10)?,
        tags: row.get(11)?,
        mentions: row.get(12)?,
        created_at: row.get(13)?,
        deleted_at: row.get(14)?,
        delete_op: row.get(15)?,
    })
}

fn corrupt(message: String) -> CoreError {
    DatabaseError::CorruptRow {
        table: "entries",
        message,
    }
    .into()
}

fn parse_token_set(raw: &str, column: &str) -> Result<BTreeSet<String>> {
    serde_json::from_str(raw).map_err(|e| corrupt(format!("{column}: {e}")))
}

fn format_token_set(set: &BTreeSet<String>) -> String {
    serde_json::to_string(set).unwrap_or_else(|_| "[]".to_string())
}

impl EntryRow {
    fn into_entry(self) -> Result<Entry> {
        let date = parse_date(&self.date).ok_or_else(|| corrupt(format!("date {:?}", self.date)))?;
        let scheduled_date = match self.scheduled_date.as_deref() {
            Some(raw) => Some(parse_date(raw).ok_or_else(|| corrupt(format!("scheduled_date {raw:?}")))?),
            None => None,
        };
        Ok(Entry {
            id: Some(self.id),
            entity_id: EntityId(self.entity_id),
            entry_type: self.entry_type.parse::<EntryType>().map_err(corrupt)?,
            content: self.content,
            priority: self.priority.parse::<Priority>().map_err(corrupt)?,
            parent_id: self.parent_id.map(EntityId),
            depth: self.depth,
            position: self.position,
            date,
            scheduled_date,
            location: self.location,
            created_at: parse_timestamp(&self.created_at)
                .ok_or_else(|| corrupt(format!("created_at {:?}", self.created_at)))?,
            tags: parse_token_set(&self.tags, "tags")?,
            mentions: parse_token_set(&self.mentions, "mentions")?,
        })
    }

    fn into_deleted(self) -> Result<DeletedEntry> {
        let raw = self.deleted_at.clone().unwrap_or_default();
        let deleted_at =
            parse_timestamp(&raw).ok_or_else(|| corrupt(format!("deleted_at {raw:?}")))?;
        let operation = self
            .delete_op
            .clone()
            .unwrap_or_else(|| self.entity_id.clone());
        Ok(DeletedEntry {
            entry: self.into_entry()?,
            deleted_at,
            operation,
        })
    }
}

fn query_rows<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<EntryRow>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params, read_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

fn query_entries<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<Entry>> {
    query_rows(conn, sql, params)?
        .into_iter()
        .map(EntryRow::into_entry)
        .collect()
}

/// Insert a new entry and return its row id.
pub fn insert_entry(conn: &Connection, entry: &Entry) -> Result<i64> {
    conn.execute(
        "INSERT INTO entries (entity_id, entry_type, content, priority, parent_id, depth, position,
                              date, scheduled_date, location, tags, mentions, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            entry.entity_id.as_str(),
            entry.entry_type.as_str(),
            entry.content,
            entry.priority.as_str(),
            entry.parent_id.as_ref().map(EntityId::as_str),
            entry.depth,
            entry.position,
            format_date(entry.date),
            entry.scheduled_date.map(format_date),
            entry.location,
            format_token_set(&entry.tags),
            format_token_set(&entry.mentions),
            format_timestamp(entry.created_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Overwrite the mutable fields of a live entry.
pub fn update_entry(conn: &Connection, entry: &Entry) -> Result<()> {
    let changed = conn.execute(
        "UPDATE entries
         SET entry_type = ?2, content = ?3, priority = ?4, parent_id = ?5, depth = ?6,
             position = ?7, scheduled_date = ?8, location = ?9, tags = ?10, mentions = ?11
         WHERE entity_id = ?1 AND deleted_at IS NULL",
        params![
            entry.entity_id.as_str(),
            entry.entry_type.as_str(),
            entry.content,
            entry.priority.as_str(),
            entry.parent_id.as_ref().map(EntityId::as_str),
            entry.depth,
            entry.position,
            entry.scheduled_date.map(format_date),
            entry.location,
            format_token_set(&entry.tags),
            format_token_set(&entry.mentions),
        ],
    )?;
    if changed == 0 {
        return Err(CoreError::not_found("entry", &entry.entity_id));
    }
    Ok(())
}

/// Live entry by entity id.
pub fn find_entry(conn: &Connection, entity: &EntityId) -> Result<Option<Entry>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE entity_id = ?1 AND deleted_at IS NULL");
    let row = conn
        .query_row(&sql, params![entity.as_str()], read_row)
        .optional()?;
    row.map(EntryRow::into_entry).transpose()
}

/// Soft-deleted entry by entity id.
pub fn find_deleted(conn: &Connection, entity: &EntityId) -> Result<Option<DeletedEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries WHERE entity_id = ?1 AND deleted_at IS NOT NULL"
    );
    let row = conn
        .query_row(&sql, params![entity.as_str()], read_row)
        .optional()?;
    row.map(EntryRow::into_deleted).transpose()
}

/// Live entries logged on `date`, in storage order.
pub fn entries_for_date(conn: &Connection, date: NaiveDate) -> Result<Vec<Entry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries
         WHERE date = ?1 AND deleted_at IS NULL
         ORDER BY position, id"
    );
    query_entries(conn, &sql, params![format_date(date)])
}

/// Next free sibling position for a batch logged on `date`.
pub fn next_position(conn: &Connection, date: NaiveDate) -> Result<u32> {
    let max: Option<u32> = conn.query_row(
        "SELECT MAX(position) FROM entries WHERE date = ?1",
        params![format_date(date)],
        |row| row.get(0),
    )?;
    Ok(max.map_or(0, |m| m + 1))
}

/// Live descendants of `entity`, shallowest first.
pub fn descendants(conn: &Connection, entity: &EntityId) -> Result<Vec<Entry>> {
    let sql = format!(
        "WITH RECURSIVE subtree(entity_id) AS (
             SELECT entity_id FROM entries WHERE parent_id = ?1 AND deleted_at IS NULL
             UNION
             SELECT e.entity_id FROM entries e
             JOIN subtree s ON e.parent_id = s.entity_id
             WHERE e.deleted_at IS NULL
         )
         SELECT {ENTRY_COLUMNS} FROM entries
         WHERE entity_id IN (SELECT entity_id FROM subtree)
         ORDER BY depth, date, position, id"
    );
    query_entries(conn, &sql, params![entity.as_str()])
}

/// Entries still deleted by `operation`, shallowest first.
pub fn deleted_in(conn: &Connection, operation: &str) -> Result<Vec<EntityId>> {
    let mut stmt = conn.prepare(
        "SELECT entity_id FROM entries
         WHERE delete_op = ?1 AND deleted_at IS NOT NULL
         ORDER BY depth, date, position, id",
    )?;
    let ids = stmt
        .query_map(params![operation], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(ids.into_iter().map(EntityId).collect())
}

/// Flag live entries as deleted by `operation`. Rows already deleted keep
/// their original operation.
pub fn mark_deleted(
    conn: &Connection,
    ids: &[EntityId],
    at: DateTime<Utc>,
    operation: &str,
) -> Result<()> {
    let mut stmt = conn.prepare(
        "UPDATE entries SET deleted_at = ?2, delete_op = ?3
         WHERE entity_id = ?1 AND deleted_at IS NULL",
    )?;
    let at = format_timestamp(at);
    for id in ids {
        stmt.execute(params![id.as_str(), at, operation])?;
    }
    Ok(())
}

pub fn clear_deleted(conn: &Connection, ids: &[EntityId]) -> Result<()> {
    let mut stmt = conn.prepare(
        "UPDATE entries SET deleted_at = NULL, delete_op = NULL WHERE entity_id = ?1",
    )?;
    for id in ids {
        stmt.execute(params![id.as_str()])?;
    }
    Ok(())
}

/// Apply a reparent step from a delete plan.
pub fn set_placement(conn: &Connection, placement: &Reparent) -> Result<()> {
    conn.execute(
        "UPDATE entries SET parent_id = ?2, depth = ?3 WHERE entity_id = ?1",
        params![
            placement.entity_id.as_str(),
            placement.parent_id.as_ref().map(EntityId::as_str),
            placement.depth,
        ],
    )?;
    Ok(())
}

/// All soft-deleted entries, most recently deleted first.
pub fn deleted_entries(conn: &Connection) -> Result<Vec<DeletedEntry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries
         WHERE deleted_at IS NOT NULL
         ORDER BY deleted_at DESC, depth, position, id"
    );
    query_rows(conn, &sql, [])?
        .into_iter()
        .map(EntryRow::into_deleted)
        .collect()
}

/// Live tasks logged before `before`; candidates for migration.
pub fn outstanding_tasks(conn: &Connection, before: NaiveDate) -> Result<Vec<Entry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries
         WHERE entry_type = 'task' AND date < ?1 AND deleted_at IS NULL
         ORDER BY date, position, id"
    );
    query_entries(conn, &sql, params![format_date(before)])
}

/// Live entries carrying `tag` (without the `#`).
pub fn entries_tagged(conn: &Connection, tag: &str) -> Result<Vec<Entry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries
         WHERE deleted_at IS NULL
           AND EXISTS (SELECT 1 FROM json_each(entries.tags) WHERE value = ?1)
         ORDER BY date, position, id"
    );
    query_entries(conn, &sql, params![tag])
}

/// Live entries mentioning `name` (without the `@`).
pub fn entries_mentioning(conn: &Connection, name: &str) -> Result<Vec<Entry>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries
         WHERE deleted_at IS NULL
           AND EXISTS (SELECT 1 FROM json_each(entries.mentions) WHERE value = ?1)
         ORDER BY date, position, id"
    );
    query_entries(conn, &sql, params![name])
}
