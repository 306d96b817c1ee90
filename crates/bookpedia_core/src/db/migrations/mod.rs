//! Ordered schema steps for the favorites database.
//!
//! Steps are append-only; a shipped step is never edited.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// One schema step and the `user_version` it leaves behind.
struct SchemaStep {
    version: u32,
    sql: &'static str,
}

const STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    sql: include_str!("0001_favorite_books.sql"),
}];

/// Returns the newest schema version this build can open.
pub fn latest_version() -> u32 {
    STEPS.last().map_or(0, |step| step.version)
}

/// Brings `conn` up to `latest_version()` in a single transaction.
///
/// Returns the version the database was at before the call. A database
/// written by a newer build is rejected untouched.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<u32> {
    let found: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    let latest = latest_version();
    if found > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: found,
            latest_supported: latest,
        });
    }

    let pending: Vec<&SchemaStep> = STEPS.iter().filter(|step| step.version > found).collect();
    if pending.is_empty() {
        return Ok(found);
    }

    let tx = conn.transaction()?;
    for step in pending {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={found} to_version={latest}");
    Ok(found)
}
