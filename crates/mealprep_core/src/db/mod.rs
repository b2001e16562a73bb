//! Storage engine: connection bootstrap, schema migrations and the
//! process-scoped store handle.
//!
//! # Invariants
//! - Schema version lives in `PRAGMA user_version`.
//! - No recipe or plan row is touched before migrations succeed.
//! - Cascade and set-null behaviour is declared in the schema and left to
//!   SQLite; callers never emulate it.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod migrations;
mod open;
mod store;

pub use open::{open_db, open_db_in_memory, StorageTarget};
pub use store::Database;

pub type DbResult<T> = Result<T, DbError>;

/// Failure raised while opening, migrating or holding the store.
#[derive(Debug)]
pub enum DbError {
    Sqlite(rusqlite::Error),
    /// The file was written by a newer build than this one.
    UnsupportedSchemaVersion { found: u32, supported: u32 },
    /// A previous holder of the store lock panicked mid-operation.
    LockPoisoned,
}

impl DbError {
    /// Short code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "sqlite_error",
            Self::UnsupportedSchemaVersion { .. } => "schema_too_new",
            Self::LockPoisoned => "store_lock_poisoned",
        }
    }
}

impl Display for DbError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite: {err}"),
            Self::UnsupportedSchemaVersion { found, supported } => write!(
                f,
                "meal prep database is at schema {found}, this build understands up to {supported}"
            ),
            Self::LockPoisoned => f.write_str("store handle lock is poisoned"),
        }
    }
}

impl Error for DbError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Sqlite(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}
