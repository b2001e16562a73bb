//! Connection bootstrap.
//!
//! Every connection handed out here has foreign keys enforced, a busy
//! timeout, and the schema migrated to [`super::migrations::latest_version`].

use super::migrations::apply_migrations;
use super::{DbError, DbResult};
use log::{error, info};
use rusqlite::Connection;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Where the meal prep store lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageTarget {
    File(PathBuf),
    /// Private database that disappears with its connection.
    Memory,
}

impl StorageTarget {
    fn mode(&self) -> &'static str {
        match self {
            Self::File(_) => "file",
            Self::Memory => "memory",
        }
    }

    /// Opens a connection to the target and brings it to the latest schema.
    ///
    /// Emits `event=db_open` with `duration_ms`; failures carry
    /// `error_code=db_connect_failed` or the bootstrap error's code.
    pub fn open(&self) -> DbResult<Connection> {
        let started_at = Instant::now();
        let mode = self.mode();
        info!("event=db_open module=db status=start mode={mode}");

        let outcome = self
            .connect()
            .map_err(|err| ("db_connect_failed", DbError::from(err)))
            .and_then(|mut conn| match bootstrap(&mut conn) {
                Ok(()) => Ok(conn),
                Err(err) => Err((err.code(), err)),
            });

        let duration_ms = started_at.elapsed().as_millis();
        match outcome {
            Ok(conn) => {
                info!("event=db_open module=db status=ok mode={mode} duration_ms={duration_ms}");
                Ok(conn)
            }
            Err((code, err)) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={duration_ms} error_code={code} error={err}"
                );
                Err(err)
            }
        }
    }

    fn connect(&self) -> rusqlite::Result<Connection> {
        match self {
            Self::File(path) => Connection::open(path),
            Self::Memory => Connection::open_in_memory(),
        }
    }
}

impl Display for StorageTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Memory => f.write_str(":memory:"),
        }
    }
}

/// Opens (creating if needed) the store file at `path`.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    StorageTarget::File(path.as_ref().to_path_buf()).open()
}

/// Opens a fresh in-memory store.
pub fn open_db_in_memory() -> DbResult<Connection> {
    StorageTarget::Memory.open()
}

fn bootstrap(conn: &mut Connection) -> DbResult<()> {
    // Off by default in SQLite; cascades and SET NULL depend on it.
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    apply_migrations(conn)
}
