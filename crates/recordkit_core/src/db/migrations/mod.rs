//! SQLite migration registry for the key-value backing table.
//!
//! # Invariants
//! - `version` values must remain monotonic.
//! - Applied migration version is mirrored to `PRAGMA user_version`.
//! - Only the backing table is versioned here; stored record payloads are
//!   opaque JSON and never migrated.

use crate::db::{DbError, DbResult};
use rusqlite::Connection;

/// `(user_version, sql)` pairs, oldest first.
const MIGRATIONS: &[(u32, &str)] = &[(1, include_str!("0001_key_value.sql"))];

pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Brings `conn` up to `latest_version()` inside one transaction.
///
/// # Errors
/// - `DbError::UnsupportedSchemaVersion` when the file was written by a newer build.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let latest = latest_version();
    if current > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: current,
            latest_supported: latest,
        });
    }

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _)| *version > current)
        .collect();
    if pending.is_empty() {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in pending {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", version)?;
        log::debug!("event=db_migrate module=db status=ok version={version}");
    }
    tx.commit()?;
    Ok(())
}
