use mealprep_core::db::migrations::{
    current_user_version, latest_version, schema_state, SchemaState, REQUIRED_TABLES,
};
use mealprep_core::db::{open_db, open_db_in_memory, DbError};
use mealprep_core::{RepoError, SqliteMealPlanRepository, SqliteRecipeRepository};
use rusqlite::Connection;

fn table_names(conn: &Connection) -> Vec<String> {
    let mut stmt = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name;")
        .unwrap();
    stmt.query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

/// `(from column, parent table, on_delete)` for each foreign key of `table`.
fn foreign_keys(conn: &Connection, table: &str) -> Vec<(String, String, String)> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA foreign_key_list({table});"))
        .unwrap();
    let mut keys: Vec<(String, String, String)> = stmt
        .query_map([], |row| {
            Ok((row.get("from")?, row.get("table")?, row.get("on_delete")?))
        })
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    keys.sort();
    keys
}

#[test]
fn fresh_store_has_every_table_at_latest_schema() {
    let conn = open_db_in_memory().unwrap();

    assert_eq!(schema_state(&conn).unwrap(), SchemaState::UpToDate);
    let names = table_names(&conn);
    for table in REQUIRED_TABLES {
        assert!(names.iter().any(|name| name == table), "missing {table}");
    }
}

#[test]
fn foreign_keys_are_enforced_with_declared_delete_rules() {
    let conn = open_db_in_memory().unwrap();
    let enforced: bool = conn
        .pragma_query_value(None, "foreign_keys", |row| row.get(0))
        .unwrap();
    assert!(enforced);

    let cascade = |from: &str| (from.to_string(), "recipes".to_string(), "CASCADE".to_string());
    assert_eq!(foreign_keys(&conn, "recipe_ingredients"), vec![cascade("recipe_id")]);
    assert_eq!(foreign_keys(&conn, "recipe_steps"), vec![cascade("recipe_id")]);
    assert_eq!(
        foreign_keys(&conn, "meal_plan_recipes"),
        vec![
            (
                "meal_plan_id".to_string(),
                "meal_plans".to_string(),
                "CASCADE".to_string()
            ),
            (
                "recipe_id".to_string(),
                "recipes".to_string(),
                "SET NULL".to_string()
            ),
        ]
    );
}

#[test]
fn storage_defaults_fill_flags_and_timestamps() {
    let conn = open_db_in_memory().unwrap();
    conn.execute("INSERT INTO recipes (title) VALUES ('Porridge');", [])
        .unwrap();

    let (is_public, created_at, updated_at): (i64, i64, i64) = conn
        .query_row(
            "SELECT is_public, created_at, updated_at FROM recipes;",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(is_public, 0);
    // Milliseconds since the epoch, not seconds.
    assert!(created_at > 1_000_000_000_000);
    assert_eq!(created_at, updated_at);
}

#[test]
fn reopening_a_file_store_keeps_rows_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("meal_prep.db");

    {
        let conn = open_db(&path).unwrap();
        conn.execute(
            "INSERT INTO meal_plans (name, start_date, end_date)
             VALUES ('Week 1', '2024-01-01', '2024-01-07');",
            [],
        )
        .unwrap();
    }

    let conn = open_db(&path).unwrap();
    assert_eq!(current_user_version(&conn).unwrap(), latest_version());
    let plans: i64 = conn
        .query_row("SELECT COUNT(*) FROM meal_plans;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(plans, 1);
}

#[test]
fn store_written_by_newer_build_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("future.db");
    Connection::open(&path)
        .unwrap()
        .pragma_update(None, "user_version", latest_version() + 7)
        .unwrap();

    match open_db(&path).unwrap_err() {
        DbError::UnsupportedSchemaVersion { found, supported } => {
            assert_eq!(found, latest_version() + 7);
            assert_eq!(supported, latest_version());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn repositories_refuse_unmigrated_connection() {
    let conn = Connection::open_in_memory().unwrap();

    assert!(matches!(
        SqliteRecipeRepository::try_new(&conn),
        Err(RepoError::SchemaNotReady { found: 0, .. })
    ));
}

#[test]
fn repositories_refuse_connection_without_tables() {
    let conn = Connection::open_in_memory().unwrap();
    conn.pragma_update(None, "user_version", latest_version())
        .unwrap();

    assert!(matches!(
        SqliteMealPlanRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("recipes"))
    ));
}
