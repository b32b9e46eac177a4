//! SQLite-backed `KeyValueStore`.

use crate::db::{open_db, open_db_in_memory};
use crate::storage::{KeyValueStore, StorageResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Key-value table in a migrated SQLite database.
pub struct SqliteKeyValueStore {
    conn: Mutex<Connection>,
}

impl SqliteKeyValueStore {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already-migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get_item(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn()
            .query_row(
                "SELECT value FROM key_value WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_item(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn().execute(
            "INSERT INTO key_value (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StorageResult<()> {
        self.conn()
            .execute("DELETE FROM key_value WHERE key = ?1;", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::SqliteKeyValueStore;
    use crate::storage::KeyValueStore;

    #[test]
    fn set_replaces_previous_value() {
        let store = SqliteKeyValueStore::open_in_memory().unwrap();
        assert_eq!(store.get_item("tasks").unwrap(), None);

        store.set_item("tasks", "[1]").unwrap();
        store.set_item("tasks", "[2]").unwrap();
        assert_eq!(store.get_item("tasks").unwrap().as_deref(), Some("[2]"));

        store.remove_item("tasks").unwrap();
        assert_eq!(store.get_item("tasks").unwrap(), None);
    }
}
