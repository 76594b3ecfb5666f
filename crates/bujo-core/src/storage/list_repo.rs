//! SQLite access for named lists.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::clock::{format_timestamp, parse_timestamp};
use crate::entry::EntityId;
use crate::error::{CoreError, DatabaseError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRecord {
    pub id: i64,
    pub entity_id: EntityId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

fn read_row(row: &Row) -> rusqlite::Result<(i64, String, String, String)> {
    Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
}

fn into_record((id, entity_id, name, created_at): (i64, String, String, String)) -> Result<ListRecord> {
    let created_at = parse_timestamp(&created_at).ok_or_else(|| DatabaseError::CorruptRow {
        table: "lists",
        message: format!("created_at {created_at:?}"),
    })?;
    Ok(ListRecord {
        id,
        entity_id: EntityId(entity_id),
        name,
        created_at,
    })
}

fn name_taken(err: &rusqlite::Error) -> bool {
    matches!(err, rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation)
}

pub fn insert_list(conn: &Connection, name: &str, now: DateTime<Utc>) -> Result<ListRecord> {
    let entity_id = EntityId::new();
    let inserted = conn.execute(
        "INSERT INTO lists (entity_id, name, created_at) VALUES (?1, ?2, ?3)",
        params![entity_id.as_str(), name, format_timestamp(now)],
    );
    match inserted {
        Ok(_) => Ok(ListRecord {
            id: conn.last_insert_rowid(),
            entity_id,
            name: name.to_string(),
            created_at: now,
        }),
        Err(e) if name_taken(&e) => Err(CoreError::conflict(format!("list {name:?} already exists"))),
        Err(e) => Err(e.into()),
    }
}

/// Live list by entity id.
pub fn find_list(conn: &Connection, entity: &EntityId) -> Result<Option<ListRecord>> {
    conn.query_row(
        "SELECT id, entity_id, name, created_at FROM lists
         WHERE entity_id = ?1 AND deleted_at IS NULL",
        params![entity.as_str()],
        read_row,
    )
    .optional()?
    .map(into_record)
    .transpose()
}

/// Live list by exact name.
pub fn find_list_by_name(conn: &Connection, name: &str) -> Result<Option<ListRecord>> {
    conn.query_row(
        "SELECT id, entity_id, name, created_at FROM lists
         WHERE name = ?1 AND deleted_at IS NULL",
        params![name],
        read_row,
    )
    .optional()?
    .map(into_record)
    .transpose()
}

/// All live lists ordered by name.
pub fn all_lists(conn: &Connection) -> Result<Vec<ListRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, entity_id, name, created_at FROM lists
         WHERE deleted_at IS NULL ORDER BY name",
    )?;
    let rows = stmt
        .query_map([], read_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    rows.into_iter().map(into_record).collect()
}

pub fn rename_list(conn: &Connection, entity: &EntityId, name: &str) -> Result<()> {
    let updated = conn.execute(
        "UPDATE lists SET name = ?2 WHERE entity_id = ?1 AND deleted_at IS NULL",
        params![entity.as_str(), name],
    );
    match updated {
        Ok(0) => Err(CoreError::not_found("list", entity)),
        Ok(_) => Ok(()),
        Err(e) if name_taken(&e) => Err(CoreError::conflict(format!("list {name:?} already exists"))),
        Err(e) => Err(e.into()),
    }
}

pub fn mark_list_deleted(conn: &Connection, entity: &EntityId, at: DateTime<Utc>) -> Result<()> {
    let changed = conn.execute(
        "UPDATE lists SET deleted_at = ?2 WHERE entity_id = ?1 AND deleted_at IS NULL",
        params![entity.as_str(), format_timestamp(at)],
    )?;
    if changed == 0 {
        return Err(CoreError::not_found("list", entity));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::now_utc;
    use crate::storage::Database;

    #[test]
    fn names_are_unique_among_live_lists() {
        let db = Database::open_memory().unwrap();
        let first = insert_list(db.conn(), "Groceries", now_utc()).unwrap();
        assert!(matches!(
            insert_list(db.conn(), "Groceries", now_utc()),
            Err(CoreError::Conflict(_))
        ));

        mark_list_deleted(db.conn(), &first.entity_id, now_utc()).unwrap();
        let second = insert_list(db.conn(), "Groceries", now_utc()).unwrap();
        assert_ne!(first.entity_id, second.entity_id);
        assert_eq!(
            find_list_by_name(db.conn(), "Groceries").unwrap().unwrap().entity_id,
            second.entity_id
        );
    }

    #[test]
    fn rename_and_enumerate() {
        let db = Database::open_memory().unwrap();
        let books = insert_list(db.conn(), "Books", now_utc()).unwrap();
        insert_list(db.conn(), "Albums", now_utc()).unwrap();
        rename_list(db.conn(), &books.entity_id, "Reading").unwrap();

        let names: Vec<_> = all_lists(db.conn())
            .unwrap()
            .into_iter()
            .map(|l| l.name)
            .collect();
        assert_eq!(names, vec!["Albums", "Reading"]);
        assert!(matches!(
            rename_list(db.conn(), &books.entity_id, "Albums"),
            Err(CoreError::Conflict(_))
        ));
    }
}
