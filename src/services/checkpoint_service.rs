//! Door-passage watcher.
//!
//! Polls the ERP feed, remembers the latest record by value, and notifies
//! the watcher chats when a watched door changes hands. An unchanged feed
//! produces no store write and no message.

use std::sync::Arc;

use crate::error::AppResult;
use crate::external::ErpPort;
use crate::gateway::{Button, ChatGateway, Keyboard};
use crate::repositories::CheckpointRepository;
use crate::services::notification_service::DISMISS_DATA;

#[derive(Clone)]
pub struct CheckpointService {
    checkpoints: CheckpointRepository,
    erp: Arc<dyn ErpPort>,
    gateway: Arc<dyn ChatGateway>,
    watched_doors: Vec<String>,
    watcher_chat_ids: Vec<i64>,
}

/// A parsed feed line: `<date> <time> <direction> <door name...>`.
struct Passage<'a> {
    direction: &'a str,
    door: String,
}

fn parse_passage(record: &str) -> Option<Passage<'_>> {
    let mut parts = record.split_whitespace();
    let _date = parts.next()?;
    let _time = parts.next()?;
    let direction = parts.next()?;
    let door = parts.collect::<Vec<_>>().join(" ");
    if door.is_empty() {
        return None;
    }
    Some(Passage { direction, door })
}

impl CheckpointService {
    pub fn new(
        checkpoints: CheckpointRepository,
        erp: Arc<dyn ErpPort>,
        gateway: Arc<dyn ChatGateway>,
        watched_doors: Vec<String>,
        watcher_chat_ids: Vec<i64>,
    ) -> Self {
        Self {
            checkpoints,
            erp,
            gateway,
            watched_doors,
            watcher_chat_ids,
        }
    }

    /// One poll cycle. Change detection is plain value equality against
    /// the stored record.
    pub async fn poll_once(&self) -> AppResult<()> {
        let records = self.erp.poll_checkpoints().await?;
        let Some(latest) = records.last() else {
            return Ok(());
        };

        let known = self.checkpoints.last().await?;
        if known.as_deref() == Some(latest.as_str()) {
            return Ok(());
        }

        self.checkpoints.store(latest).await?;
        self.notify_watchers(latest).await;
        Ok(())
    }

    async fn notify_watchers(&self, record: &str) {
        let Some(passage) = parse_passage(record) else {
            tracing::warn!(record, "Unparseable passage record");
            return;
        };
        if !self.watched_doors.iter().any(|door| *door == passage.door) {
            return;
        }

        let text = match passage.direction {
            "entry" => "Someone entered through a watched door.",
            "exit" => "Someone left through a watched door.",
            other => {
                tracing::warn!(direction = other, "Unknown passage direction");
                return;
            }
        };
        let text = format!("{text}\n{record}");

        let mut keyboard = Keyboard::new();
        keyboard.push_row(vec![Button::callback("Ok", DISMISS_DATA)]);

        for chat_id in &self.watcher_chat_ids {
            if let Err(error) = self
                .gateway
                .send_text_with_keyboard(*chat_id, &text, &keyboard)
                .await
            {
                tracing::warn!(chat_id, %error, "Watcher notification failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::fresh_pool;
    use crate::error::AppError;
    use crate::gateway::testing::RecordingGateway;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct ScriptedErp {
        feeds: Mutex<Vec<AppResult<Vec<String>>>>,
    }

    impl ScriptedErp {
        fn new(feeds: Vec<AppResult<Vec<String>>>) -> Self {
            Self {
                feeds: Mutex::new(feeds),
            }
        }
    }

    #[async_trait]
    impl ErpPort for ScriptedErp {
        async fn submit_event(&self, _params: &[(String, String)]) -> AppResult<bool> {
            Ok(true)
        }

        async fn poll_checkpoints(&self) -> AppResult<Vec<String>> {
            let mut feeds = self.feeds.lock().unwrap();
            if feeds.is_empty() {
                return Ok(Vec::new());
            }
            feeds.remove(0)
        }
    }

    fn service(
        pool: crate::db::DbPool,
        erp: ScriptedErp,
        gateway: Arc<RecordingGateway>,
    ) -> CheckpointService {
        CheckpointService::new(
            CheckpointRepository::new(pool),
            Arc::new(erp),
            gateway,
            vec!["Main lobby".to_string()],
            vec![777],
        )
    }

    #[tokio::test]
    async fn change_stores_once_and_notifies_watchers() {
        let (_dir, pool) = fresh_pool().await;
        let gateway = Arc::new(RecordingGateway::new());
        let erp = ScriptedErp::new(vec![Ok(vec![
            "01.07.2025 08:00:00 entry Main lobby".to_string(),
        ])]);
        let service = service(pool.clone(), erp, gateway.clone());

        service.poll_once().await.expect("poll");

        let stored = CheckpointRepository::new(pool).last().await.expect("last");
        assert_eq!(stored.as_deref(), Some("01.07.2025 08:00:00 entry Main lobby"));
        assert_eq!(gateway.outbound().len(), 1);
    }

    #[tokio::test]
    async fn unchanged_feed_writes_and_sends_nothing() {
        let (_dir, pool) = fresh_pool().await;
        let gateway = Arc::new(RecordingGateway::new());
        let record = "01.07.2025 08:00:00 entry Main lobby".to_string();
        let erp = ScriptedErp::new(vec![Ok(vec![record.clone()]), Ok(vec![record])]);
        let service = service(pool, erp, gateway.clone());

        service.poll_once().await.expect("first");
        service.poll_once().await.expect("second");

        // One notification total, the second poll saw no change.
        assert_eq!(gateway.outbound().len(), 1);
    }

    #[tokio::test]
    async fn unwatched_door_changes_quietly() {
        let (_dir, pool) = fresh_pool().await;
        let gateway = Arc::new(RecordingGateway::new());
        let erp = ScriptedErp::new(vec![Ok(vec![
            "01.07.2025 08:00:00 entry Server room".to_string(),
        ])]);
        let service = service(pool.clone(), erp, gateway.clone());

        service.poll_once().await.expect("poll");

        // Stored but not announced.
        assert!(CheckpointRepository::new(pool).last().await.expect("last").is_some());
        assert!(gateway.outbound().is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_surfaces_and_leaves_state_alone() {
        let (_dir, pool) = fresh_pool().await;
        let gateway = Arc::new(RecordingGateway::new());
        let erp = ScriptedErp::new(vec![Err(AppError::upstream(
            "erp poll",
            anyhow::anyhow!("timeout"),
        ))]);
        let service = service(pool.clone(), erp, gateway);

        assert!(service.poll_once().await.is_err());
        assert_eq!(CheckpointRepository::new(pool).last().await.expect("last"), None);
    }
}
