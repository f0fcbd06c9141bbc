//! Schema migration runner
//!
//! Migration scripts are bundled at build time and executed in lexical name
//! order; names carry zero-padded sequence prefixes so lexical order equals
//! dependency order. Each script runs in its own transaction and records its
//! name in the `migrations` table, so re-running the runner is a no-op. A
//! failing script rolls back alone and aborts the run, leaving the database
//! at the last recorded migration.

use rusqlite::Connection;

use crate::{Error, Result};

/// One embedded migration script.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

/// All migrations bundled into the binary.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0001_create_star_schema",
        sql: include_str!("../migrations/0001_create_star_schema.sql"),
    },
    Migration {
        name: "0002_repo_fts",
        sql: include_str!("../migrations/0002_repo_fts.sql"),
    },
];

/// Bring the database to the latest schema, applying each pending script
/// exactly once.
pub fn run(conn: &mut Connection, migrations: &[Migration]) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (name TEXT PRIMARY KEY)",
        [],
    )?;

    let mut ordered: Vec<&Migration> = migrations.iter().collect();
    ordered.sort_by_key(|m| m.name);

    for migration in ordered {
        apply(conn, migration).map_err(|source| Error::Migration {
            name: migration.name.to_string(),
            source: Box::new(source),
        })?;
        tracing::debug!(name = migration.name, "migration checked");
    }
    Ok(())
}

/// Run a single script in a dedicated transaction, skipping it when its name
/// is already recorded.
fn apply(conn: &mut Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction()?;

    let applied: i64 = tx.query_row(
        "SELECT COUNT(*) FROM migrations WHERE name = ?1",
        [migration.name],
        |row| row.get(0),
    )?;
    if applied == 0 {
        tx.execute_batch(migration.sql)?;
        tx.execute("INSERT INTO migrations (name) VALUES (?1)", [migration.name])?;
    }

    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage;

    fn recorded_names(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare("SELECT name FROM migrations ORDER BY name")
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_applies_bundled_migrations() {
        let mut conn = storage::open_in_memory().unwrap();
        run(&mut conn, MIGRATIONS).unwrap();

        let names = recorded_names(&conn);
        assert_eq!(names, vec!["0001_create_star_schema", "0002_repo_fts"]);
        // Schema actually exists.
        conn.execute("INSERT INTO Language (Name) VALUES ('go')", [])
            .unwrap();
    }

    #[test]
    fn test_running_twice_is_noop() {
        let mut conn = storage::open_in_memory().unwrap();
        run(&mut conn, MIGRATIONS).unwrap();
        run(&mut conn, MIGRATIONS).unwrap();
        assert_eq!(recorded_names(&conn).len(), MIGRATIONS.len());
    }

    #[test]
    fn test_lexical_order_defines_application_order() {
        // Listed out of order on purpose; 0002 depends on the table 0001
        // creates, so only lexical sorting makes this succeed.
        let scripts = &[
            Migration {
                name: "0002_add_column",
                sql: "ALTER TABLE t ADD COLUMN b INTEGER",
            },
            Migration {
                name: "0001_create_table",
                sql: "CREATE TABLE t (a INTEGER)",
            },
        ];
        let mut conn = storage::open_in_memory().unwrap();
        run(&mut conn, scripts).unwrap();
        conn.execute("INSERT INTO t (a, b) VALUES (1, 2)", []).unwrap();
    }

    #[test]
    fn test_failing_script_rolls_back_and_fails_closed() {
        let scripts = &[
            Migration {
                name: "0001_ok",
                sql: "CREATE TABLE ok (a INTEGER)",
            },
            Migration {
                name: "0002_broken",
                sql: "CREATE TABLE partial (a INTEGER); THIS IS NOT SQL;",
            },
        ];
        let mut conn = storage::open_in_memory().unwrap();
        let err = run(&mut conn, scripts).unwrap_err();
        assert!(matches!(err, Error::Migration { name, .. } if name == "0002_broken"));

        // First script committed, broken one fully rolled back.
        assert_eq!(recorded_names(&conn), vec!["0001_ok"]);
        let partial: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE name = 'partial'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(partial, 0);
    }
}
