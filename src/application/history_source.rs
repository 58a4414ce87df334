// History source trait - where the one-shot device history comes from
use crate::domain::history::HistoryPayload;
use async_trait::async_trait;

#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Fetch up to `limit` points from the last `hours` for one device.
    async fn fetch_history(
        &self,
        device_id: &str,
        hours: u32,
        limit: u32,
    ) -> anyhow::Result<HistoryPayload>;
}
