//! Business logic layer.
//!
//! Services own the behaviour behind menu actions, jobs, and the run
//! loop; repositories own the store and the gateway owns the transport.

mod access;
mod checkpoint_service;
mod duty_service;
mod event_service;
mod notification_service;
mod stats_service;
mod user_service;

pub use access::AccessService;
pub use checkpoint_service::CheckpointService;
pub use duty_service::{DutyFlowService, DutyService, FlowStep};
pub use event_service::EventAnswerService;
pub use notification_service::{BroadcastReport, DISMISS_DATA, NotificationService};
pub use stats_service::StatsService;
pub use user_service::UserService;

use std::sync::Arc;

use crate::config::Settings;
use crate::external::ErpPort;
use crate::gateway::ChatGateway;
use crate::repositories::Repositories;
use crate::sessions::DutySessions;

/// Aggregates all services for convenient access. Cloning is cheap, every
/// member is either `Arc`-backed or a thin handle over one.
#[derive(Clone)]
pub struct Services {
    pub access: AccessService,
    pub users: UserService,
    pub duty: DutyService,
    pub duty_flow: DutyFlowService,
    pub stats: StatsService,
    pub notifications: NotificationService,
    pub checkpoints: CheckpointService,
    pub events: EventAnswerService,
}

impl Services {
    pub fn new(
        repositories: Repositories,
        gateway: Arc<dyn ChatGateway>,
        erp: Arc<dyn ErpPort>,
        sessions: Arc<DutySessions>,
        settings: &Settings,
    ) -> Self {
        Self {
            access: AccessService::new(repositories.users.clone()),
            users: UserService::new(
                repositories.users.clone(),
                gateway.clone(),
                settings.telegram.dev_chat_id,
            ),
            duty: DutyService::new(repositories.duty.clone()),
            duty_flow: DutyFlowService::new(
                sessions,
                repositories.duty.clone(),
                settings.duty.assignees.clone(),
            ),
            stats: StatsService::new(repositories.statistics.clone()),
            notifications: NotificationService::new(repositories.users.clone(), gateway.clone()),
            checkpoints: CheckpointService::new(
                repositories.checkpoints.clone(),
                erp.clone(),
                gateway,
                settings.erp.watched_doors.clone(),
                settings.erp.watcher_chat_ids.clone(),
            ),
            events: EventAnswerService::new(erp),
        }
    }
}
