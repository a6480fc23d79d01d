//! Database access foundation: pool, schema bootstrap, and the
//! transactional unit-of-work helper every repository call goes through.

pub mod bootstrap;
mod pool;

pub use pool::{DbPool, establish_pool};

use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;

use crate::error::{AppError, AppResult};

/// Runs `f` inside a single transaction on a pooled connection.
///
/// This is the unit of work for one external event: the transaction commits
/// on clean exit and rolls back on any error, so no handler can leave a
/// half-applied mutation visible to the next read. Diesel work is blocking,
/// so it is moved off the async runtime.
pub async fn run<T, F>(pool: &DbPool, f: F) -> AppResult<T>
where
    F: FnOnce(&mut SqliteConnection) -> QueryResult<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> AppResult<T> {
        let mut conn = pool.get()?;
        conn.immediate_transaction(f).map_err(AppError::from)
    })
    .await?
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::config::DatabaseConfig;
    use tempfile::TempDir;

    /// Pool over a fresh on-disk database with the full schema in place.
    /// The TempDir must outlive the pool.
    pub(crate) async fn fresh_pool() -> (TempDir, DbPool) {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = DatabaseConfig {
            path: dir
                .path()
                .join("deskbot-test.db")
                .to_string_lossy()
                .into_owned(),
            max_connections: 2,
            busy_timeout: 5,
        };
        let pool = establish_pool(&config).expect("pool");
        bootstrap::ensure_schema(&pool).await.expect("schema");
        (dir, pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::sql_types::Integer;

    #[derive(QueryableByName)]
    struct Answer {
        #[diesel(sql_type = Integer)]
        value: i32,
    }

    #[tokio::test]
    async fn run_commits_on_clean_exit() {
        let (_dir, pool) = test_support::fresh_pool().await;

        run(&pool, |conn| {
            diesel::sql_query("INSERT INTO checkpoints (last_checkpoint) VALUES ('x')")
                .execute(conn)
        })
        .await
        .expect("insert");

        let rows = run(&pool, |conn| {
            diesel::sql_query("SELECT COUNT(*) AS value FROM checkpoints").load::<Answer>(conn)
        })
        .await
        .expect("count");
        assert_eq!(rows[0].value, 1);
    }

    #[tokio::test]
    async fn run_rolls_back_on_error() {
        let (_dir, pool) = test_support::fresh_pool().await;

        let result = run(&pool, |conn| {
            diesel::sql_query("INSERT INTO checkpoints (last_checkpoint) VALUES ('x')")
                .execute(conn)?;
            Err::<usize, _>(diesel::result::Error::RollbackTransaction)
        })
        .await;
        assert!(result.is_err());

        let rows = run(&pool, |conn| {
            diesel::sql_query("SELECT COUNT(*) AS value FROM checkpoints").load::<Answer>(conn)
        })
        .await
        .expect("count");
        assert_eq!(rows[0].value, 0);
    }
}
