//! Sqlite connection pool.
//!
//! Uses diesel's r2d2 integration. Every connection gets foreign keys and a
//! busy timeout switched on before use, so concurrent event handlers and
//! scheduled jobs serialize through sqlite's own locking instead of failing
//! fast with `SQLITE_BUSY`.

use diesel::connection::SimpleConnection;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel::sqlite::SqliteConnection;

use crate::config::DatabaseConfig;
use crate::error::AppError;

/// Connection pool type alias.
///
/// r2d2::Pool internally uses Arc, so Clone is cheap; structures holding a
/// DbPool can derive Clone without additional wrapping.
pub type DbPool = Pool<ConnectionManager<SqliteConnection>>;

#[derive(Debug)]
struct ConnectionPragmas {
    busy_timeout_ms: u64,
}

impl CustomizeConnection<SqliteConnection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))
        .map_err(diesel::r2d2::Error::QueryError)
    }
}

/// Creates the connection pool for the configured database file.
///
/// The file is created on first connection when absent; the schema itself is
/// bootstrapped separately by [`crate::db::bootstrap::ensure_schema`].
pub fn establish_pool(config: &DatabaseConfig) -> Result<DbPool, AppError> {
    let manager = ConnectionManager::<SqliteConnection>::new(&config.path);
    let pool = Pool::builder()
        .max_size(config.max_connections)
        .connection_customizer(Box::new(ConnectionPragmas {
            busy_timeout_ms: config.busy_timeout * 1000,
        }))
        .build(manager)?;
    Ok(pool)
}
