//! Data access for the meal prep store.
//!
//! Repositories translate between rows and model types and report failures
//! as [`RepoError`]. Services decide what those failures mean for a caller.
//!
//! # Invariants
//! - A repository is only built over a connection at the latest schema that
//!   carries every table in [`REQUIRED_TABLES`].
//! - Update or delete touching zero rows is `NotFound`.
//! - A broken foreign key surfaces as `ForeignKeyViolation`, never as a
//!   generic constraint error.

use crate::db::migrations::{latest_version, schema_state, SchemaState, REQUIRED_TABLES};
use crate::db::DbError;
use crate::model::Entity;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod meal_plan_repo;
pub mod recipe_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    /// Storage failure not tied to a declared constraint.
    Db(DbError),
    NotFound { entity: Entity, id: i64 },
    ForeignKeyViolation,
    /// CHECK, NOT NULL or UNIQUE rejected the write.
    ConstraintViolation(String),
    /// A stored row cannot be turned into a model value.
    InvalidData(String),
    /// The connection was never migrated, or sits at another version.
    SchemaNotReady { expected: u32, found: u32 },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => Display::fmt(err, f),
            Self::NotFound { entity, id } => write!(f, "{entity} {id} does not exist"),
            Self::ForeignKeyViolation => f.write_str("referenced row does not exist"),
            Self::ConstraintViolation(detail) => write!(f, "constraint failed: {detail}"),
            Self::InvalidData(detail) => write!(f, "stored data is invalid: {detail}"),
            Self::SchemaNotReady { expected, found } => write!(
                f,
                "connection is at schema {found}, repositories need {expected}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        if let Self::Db(err) = self {
            return Some(err);
        }
        None
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        if let DbError::Sqlite(err) = value {
            return Self::from(err);
        }
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        let classified = match &value {
            rusqlite::Error::SqliteFailure(failure, detail)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY {
                    Some(Self::ForeignKeyViolation)
                } else {
                    Some(Self::ConstraintViolation(
                        detail.clone().unwrap_or_else(|| failure.to_string()),
                    ))
                }
            }
            _ => None,
        };
        classified.unwrap_or_else(|| Self::Db(DbError::Sqlite(value)))
    }
}

/// Rejects connections that are not migrated or lack a core table.
pub(crate) fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    match schema_state(conn)? {
        SchemaState::UpToDate => {}
        SchemaState::Behind { found } | SchemaState::Ahead { found } => {
            return Err(RepoError::SchemaNotReady {
                expected: latest_version(),
                found,
            })
        }
    }

    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table';")?;
    let present = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<HashSet<_>, _>>()?;
    match REQUIRED_TABLES
        .iter()
        .copied()
        .find(|table| !present.contains(*table))
    {
        Some(table) => Err(RepoError::MissingRequiredTable(table)),
        None => Ok(()),
    }
}

/// Returns whether a row with `id` exists in `table`.
///
/// `table` must be a trusted identifier, never user input.
pub(crate) fn row_exists(conn: &Connection, table: &'static str, id: i64) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

/// Deletes one row by id, mapping zero affected rows to `NotFound`.
pub(crate) fn delete_row(
    conn: &Connection,
    table: &'static str,
    entity: Entity,
    id: i64,
) -> RepoResult<()> {
    let changed = conn.execute(&format!("DELETE FROM {table} WHERE id = ?1;"), [id])?;
    if changed == 0 {
        return Err(RepoError::NotFound { entity, id });
    }
    Ok(())
}

/// Incrementally built `UPDATE ... SET` statement for partial updates.
///
/// Only columns explicitly pushed are written; everything else keeps its
/// stored value.
pub(crate) struct PartialUpdate {
    table: &'static str,
    entity: Entity,
    assignments: Vec<String>,
    bind_values: Vec<Value>,
    has_fields: bool,
}

impl PartialUpdate {
    pub(crate) fn new(table: &'static str, entity: Entity) -> Self {
        Self {
            table,
            entity,
            assignments: Vec::new(),
            bind_values: Vec::new(),
            has_fields: false,
        }
    }

    pub(crate) fn set(&mut self, column: &'static str, value: Value) {
        self.assignments.push(format!("{column} = ?"));
        self.bind_values.push(value);
        self.has_fields = true;
    }

    /// Adds a bookkeeping assignment (e.g. `updated_at`) that is written
    /// only when at least one real field changes.
    pub(crate) fn touch(&mut self, assignment: &'static str) {
        self.assignments.push(assignment.to_string());
    }

    /// Executes the update for row `id`.
    ///
    /// An update with no fields still reports `NotFound` for missing rows.
    pub(crate) fn execute(mut self, conn: &Connection, id: i64) -> RepoResult<()> {
        if !self.has_fields {
            if row_exists(conn, self.table, id)? {
                return Ok(());
            }
            return Err(RepoError::NotFound {
                entity: self.entity,
                id,
            });
        }

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?;",
            self.table,
            self.assignments.join(", ")
        );
        self.bind_values.push(Value::Integer(id));

        let changed = conn.execute(&sql, params_from_iter(self.bind_values))?;
        if changed == 0 {
            return Err(RepoError::NotFound {
                entity: self.entity,
                id,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::RepoError;
    use crate::db::open_db_in_memory;

    #[test]
    fn foreign_key_failure_is_classified() {
        let conn = open_db_in_memory().unwrap();
        let err = conn
            .execute(
                "INSERT INTO recipe_ingredients (recipe_id, name) VALUES (?1, ?2);",
                rusqlite::params![404_i64, "salt"],
            )
            .unwrap_err();
        assert!(matches!(RepoError::from(err), RepoError::ForeignKeyViolation));
    }

    #[test]
    fn check_failure_is_classified_as_constraint_violation() {
        let conn = open_db_in_memory().unwrap();
        let err = conn
            .execute("INSERT INTO recipes (title) VALUES ('   ');", [])
            .unwrap_err();
        assert!(matches!(
            RepoError::from(err),
            RepoError::ConstraintViolation(_)
        ));
    }

    #[test]
    fn non_constraint_failure_stays_db_error() {
        let conn = open_db_in_memory().unwrap();
        let err = conn.execute("SELECT * FROM no_such_table;", []).unwrap_err();
        assert!(matches!(RepoError::from(err), RepoError::Db(_)));
    }
}
