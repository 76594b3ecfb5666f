//! SQLite store handle.
//!
//! The CLI opens one [`Database`] per process and hands references to the
//! services. Every state-changing service call goes through
//! [`Database::atomic`].

use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use tracing::{debug, warn};

use super::migrations;
use crate::error::{DatabaseError, Result};

/// SQLite database holding journal entries, lists and list item versions.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open (or create) the database file at `path` and migrate it.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "opened database");
        Self::init(conn)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Run `f` inside one IMMEDIATE transaction.
    ///
    /// Commits when `f` returns `Ok`, rolls back otherwise. Validating
    /// reads inside `f` see the same snapshot the writes apply to.
    pub fn atomic<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let tx = Transaction::new_unchecked(&self.conn, TransactionBehavior::Immediate)?;
        match f(&tx) {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    warn!(error = %rollback, "rollback failed");
                }
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    fn count(db: &Database) -> i64 {
        db.conn()
            .query_row("SELECT COUNT(*) FROM lists", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn atomic_commits_on_ok() {
        let db = Database::open_memory().unwrap();
        db.atomic(|conn| {
            conn.execute(
                "INSERT INTO lists (entity_id, name, created_at) VALUES ('l1', 'Groceries', 'now')",
                [],
            )?;
            Ok(())
        })
        .unwrap();
        assert_eq!(count(&db), 1);
    }

    #[test]
    fn atomic_rolls_back_on_err() {
        let db = Database::open_memory().unwrap();
        let result: Result<()> = db.atomic(|conn| {
            conn.execute(
                "INSERT INTO lists (entity_id, name, created_at) VALUES ('l1', 'Groceries', 'now')",
                [],
            )?;
            Err(CoreError::conflict("abort"))
        });
        assert!(result.is_err());
        assert_eq!(count(&db), 0);
    }

    #[test]
    fn open_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bujo.db");
        Database::open(&path).unwrap();
        assert!(path.exists());
        // reopening an already migrated file is fine
        Database::open(&path).unwrap();
    }
}
