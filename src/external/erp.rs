//! ERP integration: the door-passage feed and event submission.
//!
//! Both calls carry basic auth and a hard timeout so a slow ERP can never
//! stall the event loop. Failures map to `Upstream` and are handled by the
//! callers, the poller just skips a tick.

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::ErpConfig;
use crate::error::{AppError, AppResult};

/// Outbound ERP operations used by the core.
#[async_trait]
pub trait ErpPort: Send + Sync {
    /// Submits one event, `true` when the ERP acknowledged handling it.
    async fn submit_event(&self, params: &[(String, String)]) -> AppResult<bool>;

    /// Latest door-passage records, oldest first. Each line reads
    /// `<date> <time> <direction> <door name...>`.
    async fn poll_checkpoints(&self) -> AppResult<Vec<String>>;
}

pub struct ErpClient {
    http: reqwest::Client,
    poll_url: String,
    submit_url: String,
    username: String,
    password: String,
}

#[derive(Deserialize)]
struct PassageFeed {
    #[serde(default)]
    data: Vec<PassageRecord>,
}

#[derive(Deserialize)]
struct PassageRecord {
    time: String,
    event: String,
}

#[derive(Deserialize)]
struct SubmitAck {
    #[serde(default)]
    handled: bool,
}

impl ErpClient {
    pub fn new(config: &ErpConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout))
            .build()
            .map_err(|e| AppError::upstream("erp", e))?;
        Ok(Self {
            http,
            poll_url: config.poll_url.clone(),
            submit_url: config.submit_url.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }
}

#[async_trait]
impl ErpPort for ErpClient {
    async fn submit_event(&self, params: &[(String, String)]) -> AppResult<bool> {
        let response = self
            .http
            .post(&self.submit_url)
            .basic_auth(&self.username, Some(&self.password))
            .query(params)
            .send()
            .await
            .map_err(|e| AppError::upstream("erp submit", e))?
            .error_for_status()
            .map_err(|e| AppError::upstream("erp submit", e))?;

        let ack: SubmitAck = response
            .json()
            .await
            .map_err(|e| AppError::upstream("erp submit decode", e))?;
        Ok(ack.handled)
    }

    async fn poll_checkpoints(&self) -> AppResult<Vec<String>> {
        let response = self
            .http
            .get(&self.poll_url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| AppError::upstream("erp poll", e))?
            .error_for_status()
            .map_err(|e| AppError::upstream("erp poll", e))?;

        let feed: PassageFeed = response
            .json()
            .await
            .map_err(|e| AppError::upstream("erp poll decode", e))?;

        Ok(feed
            .data
            .into_iter()
            .map(|record| format!("{} {}", record.time, record.event))
            .collect())
    }
}
