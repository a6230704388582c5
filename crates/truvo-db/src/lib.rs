//! SQLite storage for the Truvo dashboard backend.
//!
//! A pooled connection per request, plus the bootstrap that creates the
//! `agents` and `calls` tables on first start.

mod pool;
mod schema;

pub use pool::{create_pool, default_pool_size, DbLocation, DbPool, DbRuntimeSettings, PoolError};
pub use schema::{init_schema, schema_version, SchemaError, SCHEMA_VERSION};
