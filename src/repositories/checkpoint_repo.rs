//! Last-seen checkpoint marker for the door-event poller.
//!
//! A single logical value: updated in place when present, inserted once
//! when the table is empty.

use diesel::prelude::*;

use crate::db::{self, DbPool};
use crate::error::AppResult;

#[derive(Clone)]
pub struct CheckpointRepository {
    pool: DbPool,
}

impl CheckpointRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn last(&self) -> AppResult<Option<String>> {
        db::run(&self.pool, |conn| {
            use crate::schema::checkpoints::dsl::*;
            checkpoints
                .order(id.asc())
                .select(last_checkpoint)
                .first::<Option<String>>(conn)
                .optional()
                .map(Option::flatten)
        })
        .await
    }

    pub async fn store(&self, value: &str) -> AppResult<()> {
        let value = value.to_string();
        db::run(&self.pool, move |conn| {
            use crate::schema::checkpoints::dsl::*;
            let updated = diesel::update(checkpoints)
                .set(last_checkpoint.eq(&value))
                .execute(conn)?;
            if updated == 0 {
                diesel::insert_into(checkpoints)
                    .values(last_checkpoint.eq(&value))
                    .execute(conn)?;
            }
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fresh_pool;

    #[tokio::test]
    async fn empty_store_has_no_checkpoint() {
        let (_dir, pool) = fresh_pool().await;
        let repo = CheckpointRepository::new(pool);
        assert_eq!(repo.last().await.expect("last"), None);
    }

    #[tokio::test]
    async fn store_overwrites_in_place() {
        let (_dir, pool) = fresh_pool().await;
        let repo = CheckpointRepository::new(pool.clone());

        repo.store("a").await.expect("first");
        repo.store("b").await.expect("second");
        assert_eq!(repo.last().await.expect("last").as_deref(), Some("b"));

        // Still a single row after repeated stores.
        let count = crate::db::run(&pool, |conn| {
            use crate::schema::checkpoints::dsl::*;
            checkpoints.count().get_result::<i64>(conn)
        })
        .await
        .expect("count");
        assert_eq!(count, 1);
    }
}
