//! Startup schema bootstrap for the agent and call tables.
//!
//! The schema version lives in SQLite's `PRAGMA user_version`. A fresh
//! database (version 0) gets `schema.sql` applied in one transaction; a
//! database already at [`SCHEMA_VERSION`] is left alone.

use rusqlite::Connection;
use thiserror::Error;

/// Version stamped into `user_version` once the tables exist.
pub const SCHEMA_VERSION: i32 = 1;

const SCHEMA_SQL: &str = include_str!("schema.sql");

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to initialize database schema: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database schema version {found} is newer than this build supports ({supported})")]
    TooNew { found: i32, supported: i32 },
}

/// Reads the schema version recorded in the database.
pub fn schema_version(conn: &Connection) -> Result<i32, SchemaError> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

/// Creates the agent and call tables if this database has not been
/// initialized yet.
///
/// Returns `true` when this call created the schema.
///
/// # Errors
///
/// `SchemaError::TooNew` if the database was stamped by a newer build;
/// `SchemaError::Sqlite` if the DDL fails, in which case nothing is kept.
pub fn init_schema(conn: &Connection) -> Result<bool, SchemaError> {
    let found = schema_version(conn)?;
    if found == SCHEMA_VERSION {
        tracing::debug!(version = found, "database schema up to date");
        return Ok(false);
    }
    if found > SCHEMA_VERSION {
        return Err(SchemaError::TooNew {
            found,
            supported: SCHEMA_VERSION,
        });
    }

    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(SCHEMA_SQL)?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    tracing::info!(version = SCHEMA_VERSION, "database schema initialized");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tables(conn: &Connection) -> Vec<String> {
        let mut stmt = conn
            .prepare(
                "SELECT name FROM sqlite_master
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
                 ORDER BY name",
            )
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .map(Result::unwrap)
            .collect()
    }

    #[test]
    fn fresh_database_gets_both_tables() {
        let conn = Connection::open_in_memory().unwrap();

        assert!(init_schema(&conn).unwrap());
        assert_eq!(tables(&conn), vec!["agents", "calls"]);
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO calls (id, room_name, started_at) VALUES ('c1', 'r', 't')",
            [],
        )
        .unwrap();

        assert!(!init_schema(&conn).unwrap());
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM calls", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn unstamped_database_with_tables_is_adopted() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA_SQL).unwrap();

        assert!(init_schema(&conn).unwrap());
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn newer_database_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        let err = init_schema(&conn).unwrap_err();
        assert!(matches!(
            err,
            SchemaError::TooNew { found, supported } if found == SCHEMA_VERSION + 1 && supported == SCHEMA_VERSION
        ));
        assert!(tables(&conn).is_empty());
    }
}
