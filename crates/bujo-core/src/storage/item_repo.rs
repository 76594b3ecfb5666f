//! SQLite implementation of [`VersionRepository`].

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};

use crate::clock::{format_timestamp, parse_timestamp};
use crate::entry::{EntityId, EntryType};
use crate::error::{CoreError, DatabaseError, Result};
use crate::versioning::{ItemVersion, NewVersion, VersionRepository};

const ITEM_COLUMNS: &str =
    "row_id, entity_id, version, list_id, item_type, content, valid_from, valid_to, created_at";

/// Version repository over a borrowed connection (or open transaction).
pub struct SqliteVersionRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteVersionRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

struct ItemRow {
    row_id: i64,
    entity_id: String,
    version: u32,
    list_id: String,
    item_type: String,
    content: String,
    valid_from: String,
    valid_to: Option<String>,
    created_at: String,
}

fn read_row(row: &Row) -> rusqlite::Result<ItemRow> {
    Ok(ItemRow {
        row_id: row.get(0)?,
        entity_id: row.get(1)?,
        version: row.get(2)?,
        list_id: row.get(3)?,
        item_type: row.get(4)?,
        content: row.get(5)?,
        valid_from: row.get(6)?,
        valid_to: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn corrupt(message: String) -> CoreError {
    DatabaseError::CorruptRow {
        table: "list_items",
        message,
    }
    .into()
}

fn timestamp(raw: &str, column: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(raw).ok_or_else(|| corrupt(format!("{column} {raw:?}")))
}

impl ItemRow {
    fn into_version(self) -> Result<ItemVersion> {
        Ok(ItemVersion {
            row_id: self.row_id,
            entity_id: EntityId(self.entity_id),
            version: self.version,
            list_id: EntityId(self.list_id),
            item_type: self.item_type.parse::<EntryType>().map_err(corrupt)?,
            content: self.content,
            valid_from: timestamp(&self.valid_from, "valid_from")?,
            valid_to: self
                .valid_to
                .as_deref()
                .map(|raw| timestamp(raw, "valid_to"))
                .transpose()?,
            created_at: timestamp(&self.created_at, "created_at")?,
        })
    }
}

impl SqliteVersionRepository<'_> {
    fn query_versions<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<ItemVersion>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, read_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(ItemRow::into_version).collect()
    }
}

impl VersionRepository for SqliteVersionRepository<'_> {
    fn current(&self, entity: &EntityId) -> Result<Option<ItemVersion>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM list_items WHERE entity_id = ?1 AND valid_to IS NULL"
        );
        let row = self
            .conn
            .query_row(&sql, params![entity.as_str()], read_row)
            .optional()?;
        row.map(ItemRow::into_version).transpose()
    }

    fn put(&self, version: NewVersion) -> Result<ItemVersion> {
        let valid_from = format_timestamp(version.valid_from);
        let inserted = self.conn.execute(
            "INSERT INTO list_items
                (entity_id, version, list_id, item_type, content, valid_from, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                version.entity_id.as_str(),
                version.version,
                version.list_id.as_str(),
                version.item_type.as_str(),
                version.content,
                valid_from,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                return Err(CoreError::conflict(format!(
                    "item {} already has an open version or version {}",
                    version.entity_id, version.version
                )));
            }
            Err(e) => return Err(e.into()),
        }

        Ok(ItemVersion {
            row_id: self.conn.last_insert_rowid(),
            entity_id: version.entity_id,
            version: version.version,
            list_id: version.list_id,
            item_type: version.item_type,
            content: version.content,
            valid_from: version.valid_from,
            valid_to: None,
            created_at: version.valid_from,
        })
    }

    fn close_version(&self, row_id: i64, valid_to: DateTime<Utc>) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE list_items SET valid_to = ?2 WHERE row_id = ?1 AND valid_to IS NULL",
            params![row_id, format_timestamp(valid_to)],
        )?;
        if changed == 0 {
            return Err(CoreError::not_found("open version", row_id));
        }
        Ok(())
    }

    fn query(&self, entity: &EntityId) -> Result<Vec<ItemVersion>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM list_items WHERE entity_id = ?1 ORDER BY version"
        );
        self.query_versions(&sql, params![entity.as_str()])
    }

    fn delete_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let removed = self.conn.execute(
            "DELETE FROM list_items WHERE valid_to IS NOT NULL AND valid_to < ?1",
            params![format_timestamp(cutoff)],
        )?;
        Ok(removed as u64)
    }

    fn count_closed_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM list_items WHERE valid_to IS NOT NULL AND valid_to < ?1",
            params![format_timestamp(cutoff)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn current_in_list(&self, list: &EntityId) -> Result<Vec<ItemVersion>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM list_items
             WHERE list_id = ?1 AND valid_to IS NULL
             ORDER BY row_id"
        );
        self.query_versions(&sql, params![list.as_str()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;
    use crate::versioning::{self, ItemMutation, VersionStatus};
    use chrono::{Duration, TimeZone};

    fn t(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn store_operations_round_trip_through_sqlite() {
        let db = Database::open_memory().unwrap();
        let repo = SqliteVersionRepository::new(db.conn());
        let list = EntityId::from("list");

        let v1 = versioning::create_item(&repo, &list, EntryType::Task, "Task A", t(0)).unwrap();
        let id = v1.entity_id.clone();
        versioning::revise_item(&repo, &id, &ItemMutation::content("Task B"), t(1)).unwrap();
        versioning::delete_item(&repo, &id, t(2)).unwrap();
        let v3 = versioning::restore(&repo, &id, 1, t(3)).unwrap();

        assert_eq!(v3.version, 3);
        assert_eq!(v3.content, "Task A");
        let h = versioning::history(&repo, &id).unwrap();
        assert_eq!(
            h.iter().map(|e| e.status).collect::<Vec<_>>(),
            vec![
                VersionStatus::Historical,
                VersionStatus::Deleted,
                VersionStatus::Current
            ]
        );
        assert_eq!(h[1].version.valid_to, Some(t(2)));
    }

    #[test]
    fn second_open_version_is_a_conflict() {
        let db = Database::open_memory().unwrap();
        let repo = SqliteVersionRepository::new(db.conn());
        let v1 = versioning::create_item(&repo, &EntityId::from("l"), EntryType::Note, "n", t(0)).unwrap();

        let err = repo
            .put(NewVersion {
                entity_id: v1.entity_id.clone(),
                version: 2,
                list_id: v1.list_id.clone(),
                item_type: EntryType::Note,
                content: "dup".into(),
                valid_from: t(1),
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    #[test]
    fn archive_only_counts_closed_rows() {
        let db = Database::open_memory().unwrap();
        let repo = SqliteVersionRepository::new(db.conn());
        let list = EntityId::from("l");
        let v1 = versioning::create_item(&repo, &list, EntryType::Task, "a", t(0)).unwrap();
        versioning::revise_item(&repo, &v1.entity_id, &ItemMutation::content("b"), t(1)).unwrap();

        assert_eq!(repo.count_closed_before(t(1)).unwrap(), 0);
        assert_eq!(repo.count_closed_before(t(2)).unwrap(), 1);
        assert_eq!(versioning::archive(&repo, t(60)).unwrap(), 1);
        assert_eq!(repo.current_in_list(&list).unwrap().len(), 1);
    }
}
