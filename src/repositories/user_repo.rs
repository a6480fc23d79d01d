//! User and settings access.
//!
//! Registration is idempotent at the store level: the unique constraint on
//! the external user id plus `INSERT OR IGNORE` makes a second registration
//! a visible no-op rather than an error. Settings and statistics rows
//! appear via the insert triggers, never through this repository.

use diesel::prelude::*;

use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::models::{FocusGroup, NewUser, User, UserSettings};

#[derive(Clone)]
pub struct UserRepository {
    pool: DbPool,
}

/// Outcome of a registration attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Created,
    AlreadyRegistered,
}

impl UserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts the user unless one with the same external id already
    /// exists. The cascade triggers create the settings and statistics
    /// rows in the same transaction.
    pub async fn register(&self, new_user: NewUser) -> AppResult<RegistrationOutcome> {
        db::run(&self.pool, move |conn| {
            use crate::schema::users::dsl::*;
            let inserted = diesel::insert_or_ignore_into(users)
                .values(&new_user)
                .execute(conn)?;
            Ok(if inserted > 0 {
                RegistrationOutcome::Created
            } else {
                RegistrationOutcome::AlreadyRegistered
            })
        })
        .await
    }

    pub async fn exists(&self, external_id: i64) -> AppResult<bool> {
        db::run(&self.pool, move |conn| {
            use crate::schema::users::dsl::*;
            diesel::select(diesel::dsl::exists(users.filter(user_id.eq(external_id))))
                .get_result(conn)
        })
        .await
    }

    pub async fn find(&self, external_id: i64) -> AppResult<Option<User>> {
        db::run(&self.pool, move |conn| {
            use crate::schema::users::dsl::*;
            users
                .filter(user_id.eq(external_id))
                .select(User::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    pub async fn list_all(&self) -> AppResult<Vec<User>> {
        db::run(&self.pool, |conn| {
            use crate::schema::users::dsl::*;
            users
                .order(registration_date.asc())
                .select(User::as_select())
                .load(conn)
        })
        .await
    }

    /// Rights string for the user, `None` when no settings row exists
    /// (the user never registered).
    pub async fn rights_of(&self, external_id: i64) -> AppResult<Option<String>> {
        db::run(&self.pool, move |conn| {
            use crate::schema::user_settings::dsl::*;
            user_settings
                .filter(user_id.eq(external_id))
                .select(rights)
                .first::<String>(conn)
                .optional()
        })
        .await
    }

    pub async fn settings_of(&self, external_id: i64) -> AppResult<Option<UserSettings>> {
        db::run(&self.pool, move |conn| {
            use crate::schema::user_settings::dsl::*;
            user_settings
                .filter(user_id.eq(external_id))
                .select(UserSettings::as_select())
                .first(conn)
                .optional()
        })
        .await
    }

    /// Returns the number of affected rows, zero when the user is unknown.
    pub async fn set_rights(&self, external_id: i64, new_rights: &str) -> AppResult<usize> {
        let new_rights = new_rights.to_string();
        db::run(&self.pool, move |conn| {
            use crate::schema::user_settings::dsl::*;
            diesel::update(user_settings.filter(user_id.eq(external_id)))
                .set(rights.eq(new_rights))
                .execute(conn)
        })
        .await
    }

    /// Flips the news subscription and returns the new value.
    pub async fn toggle_news(&self, external_id: i64) -> AppResult<bool> {
        db::run(&self.pool, move |conn| {
            use crate::schema::user_settings::dsl::*;
            diesel::update(user_settings.filter(user_id.eq(external_id)))
                .set(news.eq(diesel::dsl::not(news)))
                .execute(conn)?;
            user_settings
                .filter(user_id.eq(external_id))
                .select(news)
                .first::<bool>(conn)
        })
        .await
    }

    /// Flips the marketplace subscription and returns the new value.
    pub async fn toggle_marketplace(&self, external_id: i64) -> AppResult<bool> {
        db::run(&self.pool, move |conn| {
            use crate::schema::user_settings::dsl::*;
            diesel::update(user_settings.filter(user_id.eq(external_id)))
                .set(marketplace.eq(diesel::dsl::not(marketplace)))
                .execute(conn)?;
            user_settings
                .filter(user_id.eq(external_id))
                .select(marketplace)
                .first::<bool>(conn)
        })
        .await
    }

    /// Marks the user reachable or unreachable for broadcasts.
    pub async fn set_use_bot(&self, external_id: i64, value: bool) -> AppResult<usize> {
        db::run(&self.pool, move |conn| {
            use crate::schema::user_settings::dsl::*;
            diesel::update(user_settings.filter(user_id.eq(external_id)))
                .set(use_bot.eq(value))
                .execute(conn)
        })
        .await
    }

    /// External ids of users in the given focus group who have not blocked
    /// the bot.
    pub async fn recipient_ids(&self, group: FocusGroup) -> AppResult<Vec<i64>> {
        db::run(&self.pool, move |conn| {
            use crate::schema::user_settings::dsl::*;
            let base = user_settings.filter(use_bot.eq(true));
            match group {
                FocusGroup::All => base.select(user_id).load(conn),
                FocusGroup::News => base.filter(news.eq(true)).select(user_id).load(conn),
                FocusGroup::Marketplace => {
                    base.filter(marketplace.eq(true)).select(user_id).load(conn)
                }
            }
        })
        .await
    }
}
