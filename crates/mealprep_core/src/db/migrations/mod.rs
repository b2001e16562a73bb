//! Versioned schema for the meal prep store.
//!
//! Steps are listed in ascending version order and applied inside a single
//! transaction, so a failed upgrade leaves the previous schema intact. The
//! reached version is written to `PRAGMA user_version`.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::Connection;

/// One schema step: the SQL that moves the store to `version`.
struct SchemaStep {
    version: u32,
    sql: &'static str,
}

const SCHEMA_STEPS: &[SchemaStep] = &[SchemaStep {
    version: 1,
    sql: include_str!("0001_init.sql"),
}];

/// Tables every repository expects after migrations.
pub const REQUIRED_TABLES: &[&str] = &[
    "recipes",
    "recipe_ingredients",
    "recipe_steps",
    "meal_plans",
    "meal_plan_recipes",
];

/// How a store's recorded schema relates to this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaState {
    UpToDate,
    Behind { found: u32 },
    Ahead { found: u32 },
}

/// Highest schema version this build can produce.
pub fn latest_version() -> u32 {
    SCHEMA_STEPS.iter().map(|step| step.version).max().unwrap_or(0)
}

/// Compares the connection's `user_version` with [`latest_version`].
pub fn schema_state(conn: &Connection) -> DbResult<SchemaState> {
    let found = current_user_version(conn)?;
    let latest = latest_version();
    Ok(if found == latest {
        SchemaState::UpToDate
    } else if found < latest {
        SchemaState::Behind { found }
    } else {
        SchemaState::Ahead { found }
    })
}

/// Brings the connection up to [`latest_version`].
///
/// # Errors
/// - `UnsupportedSchemaVersion` when the store is ahead of this build.
/// - Any SQLite error from a step; the transaction is rolled back.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let found = match schema_state(conn)? {
        SchemaState::UpToDate => return Ok(()),
        SchemaState::Ahead { found } => {
            return Err(DbError::UnsupportedSchemaVersion {
                found,
                supported: latest_version(),
            })
        }
        SchemaState::Behind { found } => found,
    };

    let tx = conn.transaction()?;
    for step in SCHEMA_STEPS.iter().filter(|step| step.version > found) {
        tx.execute_batch(step.sql)?;
        tx.pragma_update(None, "user_version", step.version)?;
    }
    tx.commit()?;

    info!(
        "event=db_migrate module=db status=ok from_version={found} to_version={}",
        latest_version()
    );
    Ok(())
}

/// Reads `PRAGMA user_version`.
pub fn current_user_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}
