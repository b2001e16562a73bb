//! Process-scoped store handle.
//!
//! # Responsibility
//! - Hold the single SQLite connection for the process lifetime.
//! - Serialize access so at most one statement sequence is in flight.
//! - Release the connection explicitly on shutdown.
//!
//! # Invariants
//! - The handle is acquired once at startup and passed by reference; there is
//!   no global singleton.
//! - Writers queue behind the lock instead of interleaving.

use super::{open_db, open_db_in_memory, DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;

/// Owned store handle wrapping one migrated connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (and migrates) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::from_connection(open_db(path)?))
    }

    /// Opens a private in-memory database. Mostly useful for tests.
    pub fn open_in_memory() -> DbResult<Self> {
        Ok(Self::from_connection(open_db_in_memory()?))
    }

    /// Wraps an already migrated connection.
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs `f` with exclusive access to the connection.
    ///
    /// Concurrent callers block until the current holder returns.
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> DbResult<T> {
        let guard = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        Ok(f(&guard))
    }

    /// Closes the underlying connection, surfacing any close failure.
    pub fn close(self) -> DbResult<()> {
        let conn = self.conn.into_inner().map_err(|_| DbError::LockPoisoned)?;
        match conn.close() {
            Ok(()) => {
                info!("event=db_close module=db status=ok");
                Ok(())
            }
            Err((_conn, err)) => {
                error!(
                    "event=db_close module=db status=error error_code=db_close_failed error={err}"
                );
                Err(err.into())
            }
        }
    }
}
