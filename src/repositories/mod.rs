//! Repository layer over the sqlite store.
//!
//! Every method funnels through [`crate::db::run`], so each call is one
//! transaction on a pooled connection.

mod checkpoint_repo;
mod duty_repo;
mod statistics_repo;
mod user_repo;

pub use checkpoint_repo::CheckpointRepository;
pub use duty_repo::DutyRepository;
pub use statistics_repo::StatisticsRepository;
pub use user_repo::{RegistrationOutcome, UserRepository};

use crate::db::DbPool;

/// Aggregates all repositories for convenient access.
///
/// `DbPool` is `Arc`-backed, so cloning the aggregate is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub users: UserRepository,
    pub statistics: StatisticsRepository,
    pub duty: DutyRepository,
    pub checkpoints: CheckpointRepository,
}

impl Repositories {
    pub fn new(pool: DbPool) -> Self {
        Self {
            users: UserRepository::new(pool.clone()),
            statistics: StatisticsRepository::new(pool.clone()),
            duty: DutyRepository::new(pool.clone()),
            checkpoints: CheckpointRepository::new(pool),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::db::test_support::fresh_pool;
    use crate::models::NewUser;
    // Consumers import the outcome from here, not from the submodule.
    use crate::repositories::{RegistrationOutcome, Repositories};

    #[tokio::test]
    async fn members_share_one_store() {
        let (_dir, pool) = fresh_pool().await;
        let repos = Repositories::new(pool);

        let outcome = repos
            .users
            .register(NewUser {
                user_id: 7,
                first_name: Some("Ada".to_string()),
                last_name: None,
                username: None,
                registration_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            })
            .await
            .expect("register");
        assert_eq!(outcome, RegistrationOutcome::Created);
        assert!(repos.users.exists(7).await.expect("exists"));
    }
}
