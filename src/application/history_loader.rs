// History loader - exactly one bounded, best-effort history fetch
use crate::application::detail_binder::DeviceDetailBinder;
use crate::application::history_source::HistorySource;
use crate::domain::history::HistoryPayload;
use std::sync::Arc;

pub const HISTORY_HOURS: u32 = 24;
pub const HISTORY_LIMIT: u32 = 50;

pub struct HistoryLoader {
    source: Arc<dyn HistorySource>,
    attempted: bool,
}

impl HistoryLoader {
    pub fn new(source: Arc<dyn HistorySource>) -> Self {
        Self {
            source,
            attempted: false,
        }
    }

    /// Fetch once. Every later call, and every failure, yields `None`.
    pub async fn load(&mut self, device_id: &str) -> Option<HistoryPayload> {
        if self.attempted {
            tracing::debug!("History for {} already requested", device_id);
            return None;
        }
        self.attempted = true;

        match self
            .source
            .fetch_history(device_id, HISTORY_HOURS, HISTORY_LIMIT)
            .await
        {
            Ok(payload) => {
                tracing::debug!("Loaded history for {} ({} keys)", device_id, payload.0.len());
                Some(payload)
            }
            Err(e) => {
                tracing::warn!("History for {} unavailable: {:#}", device_id, e);
                None
            }
        }
    }

    /// Fetch once and hand the result to the binder's history sink.
    pub async fn load_into(&mut self, binder: &mut DeviceDetailBinder) {
        let device_id = binder.device_id().to_string();
        if let Some(payload) = self.load(&device_id).await {
            binder.accept_history(payload);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::detail_binder::HistorySink;
    use async_trait::async_trait;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeSource {
        calls: Mutex<Vec<(String, u32, u32)>>,
        fail: bool,
    }

    #[async_trait]
    impl HistorySource for FakeSource {
        async fn fetch_history(
            &self,
            device_id: &str,
            hours: u32,
            limit: u32,
        ) -> anyhow::Result<HistoryPayload> {
            self.calls
                .lock()
                .unwrap()
                .push((device_id.to_string(), hours, limit));
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok(serde_json::from_str(r#"{"pressure":[{"t":1,"v":3.5}]}"#)?)
        }
    }

    #[derive(Clone, Default)]
    struct Collected(Rc<RefCell<Vec<HistoryPayload>>>);

    impl HistorySink for Collected {
        fn on_history(&mut self, payload: HistoryPayload) {
            self.0.borrow_mut().push(payload);
        }
    }

    #[tokio::test]
    async fn test_loads_once_with_fixed_window() {
        let source = Arc::new(FakeSource::default());
        let mut loader = HistoryLoader::new(source.clone());

        assert!(loader.load("b2").await.is_some());
        assert!(loader.load("b2").await.is_none());

        let calls = source.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[("b2".to_string(), 24, 50)]);
    }

    #[tokio::test]
    async fn test_failure_is_swallowed_without_retry() {
        let source = Arc::new(FakeSource {
            fail: true,
            ..Default::default()
        });
        let mut loader = HistoryLoader::new(source.clone());

        assert!(loader.load("b2").await.is_none());
        assert!(loader.load("b2").await.is_none());
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_into_forwards_to_history_sink() {
        let sink = Collected::default();
        let mut binder = DeviceDetailBinder::new("b2").with_history_sink(sink.clone());
        let mut loader = HistoryLoader::new(Arc::new(FakeSource::default()));

        loader.load_into(&mut binder).await;
        loader.load_into(&mut binder).await;

        let got = sink.0.borrow();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].pressure_points()[0].v, 3.5);
    }
}
