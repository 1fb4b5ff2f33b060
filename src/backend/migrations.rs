//! Embedded backend migrations, compiled in.
//!
//! Migrations are sourced from `/migrations/` at the repo root and
//! embedded with `include_str!`, so the binary has no runtime file
//! dependencies.

use rusqlite::{Connection, Result};
use tracing::info;

/// A single migration with version identifier and SQL content.
struct Migration {
    version: &'static str,
    sql: &'static str,
}

/// All migrations in order.
///
/// Version names match the SQL filenames (without .sql extension).
/// The `schema_migrations` table tracks which have been applied.
const MIGRATIONS: &[Migration] = &[
    Migration {
        version: "001_planner_tables",
        sql: include_str!("../../migrations/001_planner_tables.sql"),
    },
    Migration {
        version: "002_auth",
        sql: include_str!("../../migrations/002_auth.sql"),
    },
];

/// Run all pending migrations.
///
/// Already-applied migrations are skipped, so this is safe on every open.
/// Each migration runs in its own transaction together with its
/// `schema_migrations` record.
///
/// # Errors
///
/// Returns an error if a migration fails to apply.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version TEXT PRIMARY KEY,
            applied_at INTEGER NOT NULL
        )",
        [],
    )?;

    let applied: std::collections::HashSet<String> = conn
        .prepare("SELECT version FROM schema_migrations")?
        .query_map([], |row| row.get(0))?
        .collect::<Result<_, _>>()?;

    for migration in MIGRATIONS {
        if applied.contains(migration.version) {
            continue;
        }

        info!(version = migration.version, "Applying migration");

        let tx = conn.transaction()?;
        tx.execute_batch(migration.sql)?;
        tx.execute(
            "INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![migration.version, chrono::Utc::now().timestamp_millis()],
        )?;
        tx.commit()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(conn: &Connection) -> i64 {
        conn.query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_run_migrations_fresh_db() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).expect("Migrations should apply to fresh database");
        assert_eq!(count(&conn), MIGRATIONS.len() as i64);

        // Tables exist
        for table in ["operating_code", "daily_plans", "goals", "user_profiles", "auth_users"] {
            let rows: i64 = conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
                .unwrap();
            assert_eq!(rows, 0);
        }
    }

    #[test]
    fn test_run_migrations_idempotent() {
        let mut conn = Connection::open_in_memory().unwrap();
        run_migrations(&mut conn).expect("First run should succeed");
        run_migrations(&mut conn).expect("Second run should succeed (idempotent)");
        assert_eq!(count(&conn), MIGRATIONS.len() as i64);
    }
}
