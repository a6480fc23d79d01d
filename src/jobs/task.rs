use async_trait::async_trait;

use crate::error::AppResult;

/// One unit of scheduled work.
#[async_trait]
pub trait JobTask: Send + Sync {
    /// Stable name used in logs.
    fn name(&self) -> &'static str;

    async fn run(&self) -> AppResult<()>;
}
