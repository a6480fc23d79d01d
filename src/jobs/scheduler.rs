//! Thin wrapper over the cron scheduler.

use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::{AppError, AppResult};
use crate::jobs::JobTask;

pub struct Scheduler {
    inner: JobScheduler,
}

fn scheduler_error(error: impl std::fmt::Display) -> AppError {
    AppError::Internal {
        source: anyhow::anyhow!("scheduler: {error}"),
    }
}

impl Scheduler {
    pub async fn new() -> AppResult<Self> {
        let inner = JobScheduler::new().await.map_err(scheduler_error)?;
        Ok(Self { inner })
    }

    /// Schedules `task` on the given six-field cron expression. A failing
    /// run is logged here; the next tick retries.
    pub async fn register(&self, cron: &str, task: Arc<dyn JobTask>) -> AppResult<()> {
        let name = task.name();
        let job = Job::new_async(cron, move |_id, _scheduler| {
            let task = task.clone();
            Box::pin(async move {
                tracing::debug!(job = task.name(), "Job tick");
                if let Err(error) = task.run().await {
                    tracing::error!(job = task.name(), %error, "Job run failed");
                }
            })
        })
        .map_err(scheduler_error)?;

        self.inner.add(job).await.map_err(scheduler_error)?;
        tracing::info!(job = name, cron, "Job registered");
        Ok(())
    }

    pub async fn start(&self) -> AppResult<()> {
        self.inner.start().await.map_err(scheduler_error)
    }

    pub async fn shutdown(&mut self) -> AppResult<()> {
        self.inner.shutdown().await.map_err(scheduler_error)
    }
}
