//! Downtime-event answers.
//!
//! The ERP asks a user to classify a downtime event through an inline
//! keyboard; the chosen type is relayed back with the event id. The ERP
//! must acknowledge the submission before the prompt is resolved.

use std::sync::Arc;

use crate::error::AppResult;
use crate::external::ErpPort;

#[derive(Clone)]
pub struct EventAnswerService {
    erp: Arc<dyn ErpPort>,
}

impl EventAnswerService {
    pub fn new(erp: Arc<dyn ErpPort>) -> Self {
        Self { erp }
    }

    /// Submits the chosen downtime type for the event. `Some(confirmation)`
    /// when the ERP acknowledged it, `None` when it refused.
    pub async fn answer(&self, event_id: &str, choice: &str) -> AppResult<Option<String>> {
        let params = vec![
            ("event_id".to_string(), event_id.to_string()),
            ("entered_type".to_string(), choice.to_string()),
        ];
        if self.erp.submit_event(&params).await? {
            Ok(Some(format!("Downtime event recorded: {choice}.")))
        } else {
            Ok(None)
        }
    }
}
