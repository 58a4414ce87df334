// Device detail binder - projects snapshots onto one device and passes
// history through a separate sink
use crate::domain::history::{HistoryPayload, LiveUpdate};
use crate::domain::snapshot::{DeviceSnapshotEntry, FleetSnapshot};

pub trait LiveUpdateSink {
    fn on_live_update(&mut self, update: LiveUpdate);
}

pub trait HistorySink {
    fn on_history(&mut self, payload: HistoryPayload);
}

/// Live and historical data are never merged here. Which one wins is the
/// sink's decision.
pub struct DeviceDetailBinder {
    device_id: String,
    live_sink: Option<Box<dyn LiveUpdateSink>>,
    history_sink: Option<Box<dyn HistorySink>>,
}

impl DeviceDetailBinder {
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            live_sink: None,
            history_sink: None,
        }
    }

    pub fn with_live_sink(mut self, sink: impl LiveUpdateSink + 'static) -> Self {
        self.live_sink = Some(Box::new(sink));
        self
    }

    pub fn with_history_sink(mut self, sink: impl HistorySink + 'static) -> Self {
        self.history_sink = Some(Box::new(sink));
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Push the target device's fields to the live sink. A snapshot that
    /// does not mention the device produces no call.
    pub fn apply_snapshot(&mut self, snapshot: &FleetSnapshot) -> bool {
        let Some(update) = filter_snapshot(snapshot, &self.device_id).and_then(project) else {
            return false;
        };
        match self.live_sink.as_mut() {
            Some(sink) => {
                sink.on_live_update(update);
                true
            }
            None => false,
        }
    }

    pub fn accept_history(&mut self, payload: HistoryPayload) {
        match self.history_sink.as_mut() {
            Some(sink) => sink.on_history(payload),
            None => tracing::debug!("No history sink registered for {}", self.device_id),
        }
    }
}

pub fn filter_snapshot<'a>(
    snapshot: &'a FleetSnapshot,
    target_id: &str,
) -> Option<&'a DeviceSnapshotEntry> {
    snapshot
        .devices
        .iter()
        .find(|d| d.device_id.as_deref() == Some(target_id))
}

pub fn project(entry: &DeviceSnapshotEntry) -> Option<LiveUpdate> {
    LiveUpdate::from_entry(entry)
}
