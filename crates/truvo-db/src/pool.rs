//! Connection pooling for request handlers.
//!
//! Handlers check a connection out inside `spawn_blocking`, run one
//! statement, and return it, so the pool only needs a few connections. A
//! handler that cannot get one within `acquire_timeout_ms` fails instead of
//! parking a blocking thread.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// The shared SQLite connection pool.
pub type DbPool = Pool<SqliteConnectionManager>;

/// Runtime tunables for SQLite connection behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a statement waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,

    /// Upper bound on pooled connections. Ignored for in-memory databases,
    /// which always use exactly one.
    pub pool_max_size: u32,

    /// How long a handler waits for a free connection, in milliseconds.
    pub acquire_timeout_ms: u64,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: default_pool_size(),
            acquire_timeout_ms: 5_000,
        }
    }
}

/// One connection per core, between 2 and 8. SQLite serializes writers,
/// so more connections only add readers waiting on the same lock.
pub fn default_pool_size() -> u32 {
    std::thread::available_parallelism()
        .map(|n| n.get() as u32)
        .unwrap_or(4)
        .clamp(2, 8)
}

/// Where the database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    /// A private in-memory database. Each SQLite connection to `:memory:`
    /// opens a separate database, so this is only coherent with a single
    /// pooled connection.
    Memory,
    File(PathBuf),
}

impl DbLocation {
    pub fn parse(path: &str) -> Self {
        if path == ":memory:" {
            Self::Memory
        } else {
            Self::File(PathBuf::from(path))
        }
    }

    /// The pool size to use here given the requested `max`.
    pub fn pool_size(&self, max: u32) -> u32 {
        match self {
            Self::Memory => 1,
            Self::File(_) => max.max(1),
        }
    }
}

impl fmt::Display for DbLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => f.write_str(":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Errors that can occur when creating the database pool.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

fn init_connection(conn: &mut Connection, wal: bool, busy_timeout: Duration) -> rusqlite::Result<()> {
    if wal {
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "wal", |row| row.get(0))?;
        if !mode.eq_ignore_ascii_case("wal") {
            return Err(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
                Some(format!("journal_mode is {mode}, expected wal")),
            ));
        }
    }
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.busy_timeout(busy_timeout)
}

/// Opens the pool for `db_path` (`:memory:` or a file path).
///
/// File databases run in WAL mode so readers never block the webhook
/// writer. Every connection gets foreign keys and the busy timeout.
///
/// # Errors
///
/// Returns `PoolError::PoolInit` if the first connection cannot be opened
/// or initialized.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let location = DbLocation::parse(db_path);
    let max_size = location.pool_size(settings.pool_max_size);
    if max_size != settings.pool_max_size {
        tracing::debug!(
            requested = settings.pool_max_size,
            max_size,
            %location,
            "adjusted database pool size"
        );
    }

    let wal = matches!(location, DbLocation::File(_));
    let busy_timeout = Duration::from_millis(settings.busy_timeout_ms);
    let manager = match &location {
        DbLocation::Memory => SqliteConnectionManager::memory(),
        DbLocation::File(path) => SqliteConnectionManager::file(path),
    }
    .with_init(move |conn| init_connection(conn, wal, busy_timeout));

    let pool = Pool::builder()
        .max_size(max_size)
        .connection_timeout(Duration::from_millis(settings.acquire_timeout_ms))
        .build(manager)?;

    tracing::info!(%location, max_size, "database pool ready");
    Ok(pool)
}
