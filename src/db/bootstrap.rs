//! Lazy schema creation.
//!
//! The schema lives in the application, not in a migration tool: at startup
//! every table and trigger is looked up by name in `sqlite_master` and
//! created only when absent. Re-running against an existing file is a
//! no-op. Store initialization failure here is the one condition that is
//! fatal to the process.

use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::sqlite::SqliteConnection;

use crate::db::DbPool;
use crate::error::AppResult;

const TABLES: &[(&str, &str)] = &[
    (
        "users",
        "CREATE TABLE users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id BIGINT NOT NULL UNIQUE,
            first_name TEXT,
            last_name TEXT,
            username TEXT,
            registration_date DATE NOT NULL
        )",
    ),
    (
        "user_settings",
        "CREATE TABLE user_settings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id BIGINT NOT NULL UNIQUE REFERENCES users(user_id),
            news BOOLEAN NOT NULL DEFAULT 0,
            marketplace BOOLEAN NOT NULL DEFAULT 0,
            rights TEXT NOT NULL DEFAULT 'user',
            use_bot BOOLEAN NOT NULL DEFAULT 1
        )",
    ),
    (
        "user_statistics",
        "CREATE TABLE user_statistics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id BIGINT NOT NULL UNIQUE REFERENCES users(user_id),
            today INTEGER NOT NULL DEFAULT 0,
            month INTEGER NOT NULL DEFAULT 0,
            all_time INTEGER NOT NULL DEFAULT 0
        )",
    ),
    (
        "function_statistics",
        "CREATE TABLE function_statistics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            today INTEGER NOT NULL DEFAULT 0,
            month INTEGER NOT NULL DEFAULT 0,
            all_time INTEGER NOT NULL DEFAULT 0
        )",
    ),
    (
        "duty_schedule",
        "CREATE TABLE duty_schedule (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            first_date DATE NOT NULL UNIQUE,
            last_date DATE NOT NULL UNIQUE,
            assignee TEXT NOT NULL
        )",
    ),
    (
        "checkpoints",
        "CREATE TABLE checkpoints (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            last_checkpoint TEXT
        )",
    ),
];

// Every new user gets a settings row and a statistics row in the same
// insert, so the one-settings/one-statistics-per-user invariant holds
// regardless of which code path registers the user.
const TRIGGERS: &[(&str, &str)] = &[
    (
        "users_cascade_settings",
        "CREATE TRIGGER users_cascade_settings AFTER INSERT ON users
         BEGIN
             INSERT INTO user_settings (user_id) VALUES (NEW.user_id);
         END",
    ),
    (
        "users_cascade_statistics",
        "CREATE TRIGGER users_cascade_statistics AFTER INSERT ON users
         BEGIN
             INSERT INTO user_statistics (user_id) VALUES (NEW.user_id);
         END",
    ),
];

#[derive(QueryableByName)]
struct ObjectName {
    #[diesel(sql_type = Text)]
    #[allow(dead_code)]
    name: String,
}

fn object_exists(conn: &mut SqliteConnection, kind: &str, name: &str) -> QueryResult<bool> {
    let rows: Vec<ObjectName> =
        diesel::sql_query("SELECT name FROM sqlite_master WHERE type = ? AND name = ?")
            .bind::<Text, _>(kind)
            .bind::<Text, _>(name)
            .load(conn)?;
    Ok(!rows.is_empty())
}

/// Creates every missing table and trigger. Idempotent.
pub async fn ensure_schema(pool: &DbPool) -> AppResult<()> {
    crate::db::run(pool, |conn| {
        for (name, ddl) in TABLES {
            if !object_exists(conn, "table", name)? {
                tracing::info!(table = name, "Creating missing table");
                diesel::sql_query(*ddl).execute(conn)?;
            }
        }
        for (name, ddl) in TRIGGERS {
            if !object_exists(conn, "trigger", name)? {
                tracing::info!(trigger = name, "Creating missing trigger");
                diesel::sql_query(*ddl).execute(conn)?;
            }
        }
        Ok(())
    })
    .await
}
