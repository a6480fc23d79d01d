//! Shared application state.

use std::sync::Arc;

use crate::gateway::ChatGateway;

/// What the run loop needs beyond the dispatcher: the outbound gateway
/// and the chat that receives operational notices.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn ChatGateway>,
    pub dev_chat_id: i64,
}

impl AppState {
    pub fn new(gateway: Arc<dyn ChatGateway>, dev_chat_id: i64) -> Self {
        Self {
            gateway,
            dev_chat_id,
        }
    }
}
