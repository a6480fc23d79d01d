use chrono::NaiveDate;
use diesel::prelude::*;

/// User row. Created once on registration, never deleted, no profile edits.
/// Identity key is the external chat-participant id (`user_id`), not the
/// surrogate `id`.
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub registration_date: NaiveDate,
}

impl User {
    /// "First Last (@username)" with missing parts elided.
    pub fn display_name(&self) -> String {
        let mut parts: Vec<String> = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect();
        if let Some(username) = &self.username {
            parts.push(format!("(@{})", username));
        }
        if parts.is_empty() {
            self.user_id.to_string()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser {
    pub user_id: i64,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub registration_date: NaiveDate,
}

/// Per-user flags, one row per user, created by the insert trigger.
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::user_settings)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserSettings {
    pub id: i32,
    pub user_id: i64,
    pub news: bool,
    pub marketplace: bool,
    pub rights: String,
    pub use_bot: bool,
}

/// Permission tier gating menu-entry visibility and action dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Admin,
    User,
    Unregistered,
}

impl Tier {
    /// Maps the stored rights string; a missing settings row means the user
    /// never registered.
    pub fn from_rights(rights: Option<&str>) -> Self {
        match rights {
            Some("admin") => Tier::Admin,
            Some(_) => Tier::User,
            None => Tier::Unregistered,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Tier::Admin)
    }

    pub fn is_registered(&self) -> bool {
        !matches!(self, Tier::Unregistered)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Admin => "admin",
            Tier::User => "user",
            Tier::Unregistered => "unregistered",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Broadcast audience for notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusGroup {
    /// Everyone still reachable
    All,
    /// IT-news subscribers
    News,
    /// Marketplace subscribers
    Marketplace,
}

impl FocusGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusGroup::All => "all",
            FocusGroup::News => "news",
            FocusGroup::Marketplace => "marketplace",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_from_rights() {
        assert_eq!(Tier::from_rights(None), Tier::Unregistered);
        assert_eq!(Tier::from_rights(Some("user")), Tier::User);
        assert_eq!(Tier::from_rights(Some("admin")), Tier::Admin);
        // Unknown rights degrade to plain user rather than failing
        assert_eq!(Tier::from_rights(Some("operator")), Tier::User);
    }

    #[test]
    fn display_name_elides_missing_parts() {
        let user = User {
            id: 1,
            user_id: 100,
            first_name: Some("Ada".to_string()),
            last_name: None,
            username: Some("ada".to_string()),
            registration_date: chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        };
        assert_eq!(user.display_name(), "Ada (@ada)");
    }
}
