//! Database schema migrations for bujo.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);
    debug!(current_version, target = SCHEMA_VERSION, "checking schema");

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
        row.get::<_, Option<i32>>(0)
    })
    .unwrap_or_else(|e| {
        warn!(error = %e, "failed to read schema_version");
        None
    })
    .unwrap_or(0)
}

/// Migration v1: journal entries, lists and versioned list items.
///
/// Only one open version per item is allowed; the partial unique index
/// enforces it even if a caller skips the store's own check.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS entries (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_id       TEXT NOT NULL UNIQUE,
            entry_type      TEXT NOT NULL,
            content         TEXT NOT NULL,
            priority        TEXT NOT NULL DEFAULT 'none',
            parent_id       TEXT,
            depth           INTEGER NOT NULL DEFAULT 0,
            position        INTEGER NOT NULL DEFAULT 0,
            date            TEXT NOT NULL,
            scheduled_date  TEXT,
            location        TEXT,
            tags            TEXT NOT NULL DEFAULT '[]',
            mentions        TEXT NOT NULL DEFAULT '[]',
            created_at      TEXT NOT NULL,
            deleted_at      TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_entries_date ON entries(date);
        CREATE INDEX IF NOT EXISTS idx_entries_parent ON entries(parent_id);
        CREATE INDEX IF NOT EXISTS idx_entries_deleted_at ON entries(deleted_at);

        CREATE TABLE IF NOT EXISTS lists (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_id   TEXT NOT NULL UNIQUE,
            name        TEXT NOT NULL,
            created_at  TEXT NOT NULL,
            deleted_at  TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_lists_live_name
            ON lists(name) WHERE deleted_at IS NULL;

        CREATE TABLE IF NOT EXISTS list_items (
            row_id      INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_id   TEXT NOT NULL,
            version     INTEGER NOT NULL,
            list_id     TEXT NOT NULL,
            item_type   TEXT NOT NULL,
            content     TEXT NOT NULL,
            valid_from  TEXT NOT NULL,
            valid_to    TEXT,
            created_at  TEXT NOT NULL,
            UNIQUE (entity_id, version)
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_list_items_open
            ON list_items(entity_id) WHERE valid_to IS NULL;
        CREATE INDEX IF NOT EXISTS idx_list_items_list_open
            ON list_items(list_id) WHERE valid_to IS NULL;
        CREATE INDEX IF NOT EXISTS idx_list_items_valid_to ON list_items(valid_to);",
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [1])?;

    tx.commit()?;
    Ok(())
}

/// Migration v2: group soft deletes by the operation that made them.
///
/// Adds `delete_op` to entries. Every row flagged by one `delete_entry`
/// call shares its value, and restore brings back exactly that group.
/// Rows deleted before v2 get their own entity id, so each restores alone.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "ALTER TABLE entries ADD COLUMN delete_op TEXT;
         CREATE INDEX IF NOT EXISTS idx_entries_delete_op ON entries(delete_op);",
    )?;
    tx.execute(
        "UPDATE entries SET delete_op = entity_id WHERE deleted_at IS NOT NULL",
        [],
    )?;

    tx.execute("DELETE FROM schema_version", [])?;
    tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [2])?;

    tx.commit()?;
    Ok(())
}
