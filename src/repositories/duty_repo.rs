//! On-call schedule access.

use chrono::NaiveDate;
use diesel::prelude::*;

use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::models::{DutyWindow, NewDutyWindow};

#[derive(Clone)]
pub struct DutyRepository {
    pool: DbPool,
}

impl DutyRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts a new window. A boundary date already taken by another
    /// window surfaces as [`crate::error::AppError::Duplicate`] and leaves
    /// the table untouched.
    pub async fn insert_window(&self, window: NewDutyWindow) -> AppResult<DutyWindow> {
        db::run(&self.pool, move |conn| {
            use crate::schema::duty_schedule::dsl::*;
            diesel::insert_into(duty_schedule)
                .values(&window)
                .returning(DutyWindow::as_returning())
                .get_result(conn)
        })
        .await
    }

    /// The nearest window starting on or after the given day.
    pub async fn next_window(&self, today: NaiveDate) -> AppResult<Option<DutyWindow>> {
        db::run(&self.pool, move |conn| {
            use crate::schema::duty_schedule::dsl::*;
            duty_schedule
                .filter(first_date.ge(today))
                .order(first_date.asc())
                .select(DutyWindow::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    /// Upcoming windows in start-date order, closest first.
    pub async fn upcoming_windows(
        &self,
        today: NaiveDate,
        limit: i64,
    ) -> AppResult<Vec<DutyWindow>> {
        db::run(&self.pool, move |conn| {
            use crate::schema::duty_schedule::dsl::*;
            duty_schedule
                .filter(first_date.ge(today))
                .order(first_date.asc())
                .limit(limit)
                .select(DutyWindow::as_select())
                .load(conn)
        })
        .await
    }

    /// The window starting exactly on the given day, if any.
    pub async fn window_starting(&self, date: NaiveDate) -> AppResult<Option<DutyWindow>> {
        db::run(&self.pool, move |conn| {
            use crate::schema::duty_schedule::dsl::*;
            duty_schedule
                .filter(first_date.eq(date))
                .select(DutyWindow::as_select())
                .first(conn)
                .optional()
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fresh_pool;
    use crate::error::AppError;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn window(first: NaiveDate, last: NaiveDate, who: &str) -> NewDutyWindow {
        NewDutyWindow {
            first_date: first,
            last_date: last,
            assignee: who.to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_start_date_is_rejected() {
        let (_dir, pool) = fresh_pool().await;
        let repo = DutyRepository::new(pool);

        repo.insert_window(window(d(2025, 7, 7), d(2025, 7, 13), "Pavel"))
            .await
            .expect("first");
        let err = repo
            .insert_window(window(d(2025, 7, 7), d(2025, 7, 20), "Dmitry"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, AppError::Duplicate { .. }));

        // The losing insert must leave exactly one row behind.
        let all = repo.upcoming_windows(d(2025, 1, 1), 10).await.expect("list");
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].assignee, "Pavel");
    }

    #[tokio::test]
    async fn upcoming_windows_sort_by_start_regardless_of_insert_order() {
        let (_dir, pool) = fresh_pool().await;
        let repo = DutyRepository::new(pool);

        repo.insert_window(window(d(2025, 7, 14), d(2025, 7, 20), "B"))
            .await
            .expect("later");
        repo.insert_window(window(d(2025, 7, 7), d(2025, 7, 13), "A"))
            .await
            .expect("sooner");

        let list = repo
            .upcoming_windows(d(2025, 7, 1), 10)
            .await
            .expect("list");
        assert_eq!(
            list.iter().map(|w| w.assignee.as_str()).collect::<Vec<_>>(),
            vec!["A", "B"]
        );
    }

    #[tokio::test]
    async fn next_window_skips_past_windows() {
        let (_dir, pool) = fresh_pool().await;
        let repo = DutyRepository::new(pool);

        repo.insert_window(window(d(2025, 6, 1), d(2025, 6, 7), "Old"))
            .await
            .expect("past");
        repo.insert_window(window(d(2025, 7, 7), d(2025, 7, 13), "Next"))
            .await
            .expect("future");

        let next = repo.next_window(d(2025, 7, 1)).await.expect("next").unwrap();
        assert_eq!(next.assignee, "Next");
        assert!(repo.next_window(d(2025, 8, 1)).await.expect("none").is_none());
    }

    #[tokio::test]
    async fn window_starting_matches_exact_date_only() {
        let (_dir, pool) = fresh_pool().await;
        let repo = DutyRepository::new(pool);
        repo.insert_window(window(d(2025, 7, 7), d(2025, 7, 13), "Pavel"))
            .await
            .expect("insert");

        assert!(repo.window_starting(d(2025, 7, 7)).await.expect("hit").is_some());
        assert!(repo.window_starting(d(2025, 7, 8)).await.expect("miss").is_none());
    }
}
