//! Usage counters, per user and per menu action.
//!
//! Each row carries three windows (today, month, all time) that are bumped
//! together and reset independently by the periodic jobs.

use diesel::prelude::*;

use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::models::{FunctionUsage, StatWindow};

#[derive(Clone)]
pub struct StatisticsRepository {
    pool: DbPool,
}

impl StatisticsRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Bumps all three windows for the user. Silently does nothing for
    /// unknown users, the statistics row only exists after registration.
    pub async fn record_user_event(&self, external_id: i64) -> AppResult<()> {
        db::run(&self.pool, move |conn| {
            use crate::schema::user_statistics::dsl::*;
            diesel::update(user_statistics.filter(user_id.eq(external_id)))
                .set((
                    today.eq(today + 1),
                    month.eq(month + 1),
                    all_time.eq(all_time + 1),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    /// Bumps the counters for one menu action, creating its row on first
    /// use.
    pub async fn record_function_call(&self, function: &str) -> AppResult<()> {
        let function = function.to_string();
        db::run(&self.pool, move |conn| {
            use crate::schema::function_statistics::dsl::*;
            diesel::insert_into(function_statistics)
                .values((name.eq(&function), today.eq(1), month.eq(1), all_time.eq(1)))
                .on_conflict(name)
                .do_update()
                .set((
                    today.eq(today + 1),
                    month.eq(month + 1),
                    all_time.eq(all_time + 1),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    /// Most-used actions in the window, nonzero counts only, highest
    /// first.
    pub async fn top_functions(
        &self,
        window: StatWindow,
        limit: i64,
    ) -> AppResult<Vec<FunctionUsage>> {
        db::run(&self.pool, move |conn| {
            use crate::schema::function_statistics::dsl::*;
            let rows: Vec<(String, i32)> = match window {
                StatWindow::Today => function_statistics
                    .filter(today.gt(0))
                    .order(today.desc())
                    .limit(limit)
                    .select((name, today))
                    .load(conn)?,
                StatWindow::Month => function_statistics
                    .filter(month.gt(0))
                    .order(month.desc())
                    .limit(limit)
                    .select((name, month))
                    .load(conn)?,
                StatWindow::AllTime => function_statistics
                    .filter(all_time.gt(0))
                    .order(all_time.desc())
                    .limit(limit)
                    .select((name, all_time))
                    .load(conn)?,
            };
            Ok(rows
                .into_iter()
                .map(|(n, count)| FunctionUsage { name: n, count })
                .collect())
        })
        .await
    }

    /// Zeroes one window across all action rows.
    pub async fn reset_functions(&self, window: StatWindow) -> AppResult<()> {
        db::run(&self.pool, move |conn| {
            use crate::schema::function_statistics::dsl::*;
            match window {
                StatWindow::Today => diesel::update(function_statistics)
                    .set(today.eq(0))
                    .execute(conn)?,
                StatWindow::Month => diesel::update(function_statistics)
                    .set(month.eq(0))
                    .execute(conn)?,
                StatWindow::AllTime => diesel::update(function_statistics)
                    .set(all_time.eq(0))
                    .execute(conn)?,
            };
            Ok(())
        })
        .await
    }

    /// Zeroes one window across all user rows.
    pub async fn reset_users(&self, window: StatWindow) -> AppResult<()> {
        db::run(&self.pool, move |conn| {
            use crate::schema::user_statistics::dsl::*;
            match window {
                StatWindow::Today => diesel::update(user_statistics)
                    .set(today.eq(0))
                    .execute(conn)?,
                StatWindow::Month => diesel::update(user_statistics)
                    .set(month.eq(0))
                    .execute(conn)?,
                StatWindow::AllTime => diesel::update(user_statistics)
                    .set(all_time.eq(0))
                    .execute(conn)?,
            };
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
    async fn function_counters_accumulate() {
        let (_dir, pool) = fresh_pool().await;
        let repo = StatisticsRepository::new(pool);

        repo.record_function_call("duty_next").await.expect("1");
        repo.record_function_call("duty_next").await.expect("2");
        repo.record_function_call("register").await.expect("3");

        let top = repo
            .top_functions(StatWindow::Today, 3)
            .await
            .expect("top");
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "duty_next");
        assert_eq!(top[0].count, 2);
    }

    #[tokio::test]
    async fn reset_clears_only_its_window() {
        let (_dir, pool) = fresh_pool().await;
        let repo = StatisticsRepository::new(pool);
        repo.record_function_call("register").await.expect("call");

        repo.reset_functions(StatWindow::Today).await.expect("reset");

        assert!(repo
            .top_functions(StatWindow::Today, 3)
            .await
            .expect("today")
            .is_empty());
        let month = repo
            .top_functions(StatWindow::Month, 3)
            .await
            .expect("month");
        assert_eq!(month[0].count, 1);
    }

    #[tokio::test]
    async fn zero_count_rows_stay_off_the_board() {
        let (_dir, pool) = fresh_pool().await;
        let repo = StatisticsRepository::new(pool);
        repo.record_function_call("register").await.expect("call");
        repo.reset_functions(StatWindow::Today).await.expect("reset");
        repo.record_function_call("duty_next").await.expect("call");

        let top = repo
            .top_functions(StatWindow::Today, 3)
            .await
            .expect("top");
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].name, "duty_next");
    }
}
