// HTTP history source - the per-device history endpoint
use crate::application::history_source::HistorySource;
use crate::domain::history::HistoryPayload;
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CACHE_CONTROL, PRAGMA};

#[derive(Debug, Clone)]
pub struct HttpHistorySource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpHistorySource {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn build_url(&self, device_id: &str, hours: u32, limit: u32) -> String {
        format!(
            "{}/api/device/{}/history?hours={}&limit={}",
            self.base_url,
            urlencoding::encode(device_id),
            hours,
            limit
        )
    }
}

#[async_trait]
impl HistorySource for HttpHistorySource {
    async fn fetch_history(&self, device_id: &str, hours: u32, limit: u32) -> Result<HistoryPayload> {
        let url = self.build_url(device_id, hours, limit);

        let response = self
            .client
            .get(&url)
            .header(CACHE_CONTROL, "no-cache, no-store")
            .header(PRAGMA, "no-cache")
            .header(ACCEPT, "application/json")
            .send()
            .await
            .context("Failed to send history request")?;

        if !response.status().is_success() {
            anyhow::bail!("History request failed with status {}", response.status());
        }

        response
            .json::<HistoryPayload>()
            .await
            .context("Failed to parse history response")
    }
}
