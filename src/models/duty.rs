use chrono::NaiveDate;
use diesel::prelude::*;

/// An inclusive on-call window. Both boundary dates carry unique
/// constraints, so overlapping entries with the same boundary are rejected
/// by the store.
#[derive(Debug, Queryable, Selectable, Clone, PartialEq, Eq)]
#[diesel(table_name = crate::schema::duty_schedule)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DutyWindow {
    pub id: i32,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub assignee: String,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::duty_schedule)]
pub struct NewDutyWindow {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub assignee: String,
}
