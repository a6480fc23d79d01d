//! In-memory per-user duty-entry sessions.
//!
//! Deliberately not persisted: a restart loses half-entered windows, the
//! admin simply starts over. Keyed by the external user id.

use chrono::NaiveDate;
use dashmap::DashMap;

/// A duty window under construction. Fields fill in order: start date,
/// then end date, then the assignee pick commits and drops the entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingDuty {
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

#[derive(Default)]
pub struct DutySessions {
    inner: DashMap<i64, PendingDuty>,
}

impl DutySessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh session, discarding any half-finished one.
    pub fn begin(&self, user_id: i64) {
        self.inner.insert(user_id, PendingDuty::default());
    }

    pub fn get(&self, user_id: i64) -> Option<PendingDuty> {
        self.inner.get(&user_id).map(|entry| *entry)
    }

    pub fn set_first_date(&self, user_id: i64, date: NaiveDate) {
        if let Some(mut entry) = self.inner.get_mut(&user_id) {
            entry.first_date = Some(date);
        }
    }

    pub fn set_last_date(&self, user_id: i64, date: NaiveDate) {
        if let Some(mut entry) = self.inner.get_mut(&user_id) {
            entry.last_date = Some(date);
        }
    }

    /// Removes and returns the session, on commit or cancel.
    pub fn take(&self, user_id: i64) -> Option<PendingDuty> {
        self.inner.remove(&user_id).map(|(_, pending)| pending)
    }
}
