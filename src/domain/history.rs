// Detail-view domain models: normalized live updates and the one-shot history payload
use super::snapshot::{DeviceSnapshotEntry, Reading};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

/// Normalized per-device fields pushed to the live-update sink.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveUpdate {
    pub uid: String,
    pub ts_ms: Option<i64>,
    pub valve_state: Option<String>,
    pub pressure_prev: Reading,
    pub pressure_now: Reading,
}

impl LiveUpdate {
    /// Returns `None` for an entry without a usable id.
    pub fn from_entry(entry: &DeviceSnapshotEntry) -> Option<Self> {
        Some(Self {
            uid: entry.id()?.to_string(),
            ts_ms: entry.time_ms,
            valve_state: entry.valve_state.clone(),
            pressure_prev: entry.pressure_prev,
            pressure_now: entry.pressure_now,
        })
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.ts_ms.and_then(DateTime::from_timestamp_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PressurePoint {
    pub t: i64,
    pub v: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ValvePoint {
    pub t: i64,
    pub state: String,
}

/// Decoded body of the history endpoint. Forwarded as-is; the accessors
/// only read the series the server is known to emit.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct HistoryPayload(pub Map<String, Value>);

impl HistoryPayload {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn pressure_points(&self) -> Vec<PressurePoint> {
        self.series("pressure")
    }

    pub fn valve_points(&self) -> Vec<ValvePoint> {
        self.series("valve")
    }

    fn series<T: serde::de::DeserializeOwned>(&self, key: &str) -> Vec<T> {
        let Some(Value::Array(items)) = self.0.get(key) else {
            return Vec::new();
        };
        items
            .iter()
            .filter_map(|item| T::deserialize(item).ok())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_update_from_entry() {
        let entry = DeviceSnapshotEntry {
            device_id: Some("b2".to_string()),
            valve_state: Some("OPEN".to_string()),
            pressure_now: Reading::Value(4.999),
            pressure_prev: Reading::Value(4.5),
            time_ms: Some(1_767_268_800_000),
            ..Default::default()
        };

        let update = LiveUpdate::from_entry(&entry).unwrap();
        assert_eq!(update.uid, "b2");
        assert_eq!(update.pressure_now, Reading::Value(4.999));
        assert_eq!(
            update.timestamp().unwrap().to_rfc3339(),
            "2026-01-01T12:00:00+00:00"
        );
    }

    #[test]
    fn test_live_update_requires_id() {
        assert!(LiveUpdate::from_entry(&DeviceSnapshotEntry::default()).is_none());
    }

    #[test]
    fn test_history_series_accessors() {
        let payload: HistoryPayload = serde_json::from_str(
            r#"{"pressure":[{"t":1,"v":4.2},{"t":2,"v":"bad"},{"t":3,"v":5.5}],
                "valve":[{"t":1,"state":"open"}],
                "events":[]}"#,
        )
        .unwrap();

        assert_eq!(
            payload.pressure_points(),
            vec![PressurePoint { t: 1, v: 4.2 }, PressurePoint { t: 3, v: 5.5 }]
        );
        assert_eq!(payload.valve_points()[0].state, "open");
        assert!(payload.get("events").is_some());
    }

    #[test]
    fn test_history_must_be_an_object() {
        assert!(serde_json::from_str::<HistoryPayload>("[1,2]").is_err());
    }
}
