//! Permission resolution.

use crate::error::AppResult;
use crate::models::Tier;
use crate::repositories::UserRepository;

/// Resolves the viewer's tier fresh on every event. A rights change takes
/// effect on the next interaction with no cache to invalidate.
#[derive(Clone)]
pub struct AccessService {
    users: UserRepository,
}

impl AccessService {
    pub fn new(users: UserRepository) -> Self {
        Self { users }
    }

    pub async fn resolve_tier(&self, user_id: i64) -> AppResult<Tier> {
        let rights = self.users.rights_of(user_id).await?;
        Ok(Tier::from_rights(rights.as_deref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fresh_pool;
    use crate::models::NewUser;

    #[tokio::test]
    async fn tier_tracks_rights_changes_without_restart() {
        let (_dir, pool) = fresh_pool().await;
        let users = UserRepository::new(pool);
        let access = AccessService::new(users.clone());

        assert_eq!(access.resolve_tier(100).await.expect("t"), Tier::Unregistered);

        users
            .register(NewUser {
                user_id: 100,
                first_name: Some("Ada".into()),
                last_name: None,
                username: None,
                registration_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            })
            .await
            .expect("register");
        assert_eq!(access.resolve_tier(100).await.expect("t"), Tier::User);

        users.set_rights(100, "admin").await.expect("promote");
        assert_eq!(access.resolve_tier(100).await.expect("t"), Tier::Admin);
    }
}
