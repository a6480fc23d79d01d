//! Long-polling run loop.
//!
//! Pulls updates in order, hands each one to the dispatcher, and keeps
//! going through transport faults with bounded backoff. The dev chat is
//! alerted once when failures persist and again on manual shutdown.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::signal;

use crate::dispatch::Dispatcher;
use crate::error::AppResult;
use crate::gateway::UpdateSource;
use crate::state::AppState;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);
// Alert the dev chat after this many polls in a row have failed.
const ALERT_AFTER_FAILURES: u32 = 5;

pub struct Bot {
    state: AppState,
    dispatcher: Arc<Dispatcher>,
    source: Arc<dyn UpdateSource>,
    poll_timeout: u64,
}

impl Bot {
    pub fn new(
        state: AppState,
        dispatcher: Arc<Dispatcher>,
        source: Arc<dyn UpdateSource>,
        poll_timeout: u64,
    ) -> Self {
        Self {
            state,
            dispatcher,
            source,
            poll_timeout,
        }
    }

    /// Runs until ctrl-c. Dispatch faults are contained per update; only
    /// the transport can stall the loop, and then only for the backoff.
    pub async fn run(&self) -> AppResult<()> {
        let mut offset: i64 = 0;
        let mut backoff = INITIAL_BACKOFF;
        let mut consecutive_failures: u32 = 0;

        tracing::info!(poll_timeout = self.poll_timeout, "Run loop started");

        loop {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    tracing::info!("Received ctrl-c, shutting down");
                    if let Err(error) = self
                        .state
                        .gateway
                        .send_text(self.state.dev_chat_id, "Bot stopped manually.")
                        .await
                    {
                        tracing::warn!(%error, "Shutdown notice to the dev chat failed");
                    }
                    return Ok(());
                }
                polled = self.source.next_updates(offset, self.poll_timeout) => {
                    match polled {
                        Ok(updates) => {
                            backoff = INITIAL_BACKOFF;
                            consecutive_failures = 0;
                            for update in updates {
                                offset = offset.max(update.id + 1);
                                let today = Local::now().date_naive();
                                if let Err(error) =
                                    self.dispatcher.handle_update(update, today).await
                                {
                                    tracing::error!(%error, "Update handling failed");
                                }
                            }
                        }
                        Err(error) => {
                            consecutive_failures += 1;
                            tracing::error!(
                                %error,
                                consecutive_failures,
                                backoff_secs = backoff.as_secs(),
                                "Polling failed"
                            );
                            if consecutive_failures == ALERT_AFTER_FAILURES {
                                let alert = format!(
                                    "Polling has failed {consecutive_failures} times in a row: {error}"
                                );
                                if let Err(alert_error) = self
                                    .state
                                    .gateway
                                    .send_text(self.state.dev_chat_id, &alert)
                                    .await
                                {
                                    tracing::warn!(%alert_error, "Dev alert failed");
                                }
                            }
                            tokio::time::sleep(backoff).await;
                            backoff = (backoff * 2).min(MAX_BACKOFF);
                        }
                    }
                }
            }
        }
    }
}
