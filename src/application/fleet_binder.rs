// Fleet view binder - reconciles full-replace snapshots into persistent rows
use crate::domain::row::{locale_cmp, RowState};
use crate::domain::snapshot::{DeviceSnapshotEntry, FleetSnapshot};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplyReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Rows in first-seen order plus the snapshot-level indicators.
///
/// Rows keep the position they were created at; later snapshots only
/// rewrite their fields.
#[derive(Debug, Clone, Default)]
pub struct FleetView {
    rows: Vec<RowState>,
    index: HashMap<String, usize>,
    as_of: Option<String>,
    cache_age_ms: Option<i64>,
    cache_error: Option<String>,
}

impl FleetView {
    pub fn rows(&self) -> &[RowState] {
        &self.rows
    }

    pub fn row(&self, device_id: &str) -> Option<&RowState> {
        self.index.get(device_id).map(|&i| &self.rows[i])
    }

    pub fn as_of(&self) -> Option<&str> {
        self.as_of.as_deref()
    }

    pub fn cache_age_ms(&self) -> Option<i64> {
        self.cache_age_ms
    }

    pub fn cache_error(&self) -> Option<&str> {
        self.cache_error.as_deref()
    }
}

#[derive(Debug, Default)]
pub struct FleetViewBinder {
    view: FleetView,
}

impl FleetViewBinder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> &FleetView {
        &self.view
    }

    pub fn apply(&mut self, snapshot: &FleetSnapshot) -> ApplyReport {
        if let Some(ts) = &snapshot.server_time_utc {
            self.view.as_of = Some(ts.clone());
        }
        self.view.cache_age_ms = snapshot.cache_age_ms;
        if let Some(err) = &snapshot.cache_error {
            if self.view.cache_error.as_ref() != Some(err) {
                tracing::warn!("Server snapshot cache error: {}", err);
            }
        }
        self.view.cache_error = snapshot.cache_error.clone();

        let mut ordered: Vec<&DeviceSnapshotEntry> = snapshot.devices.iter().collect();
        ordered.sort_by(|a, b| locale_cmp(a.id().unwrap_or(""), b.id().unwrap_or("")));

        let mut report = ApplyReport::default();
        for entry in ordered {
            let Some(id) = entry.id() else {
                report.skipped += 1;
                continue;
            };
            if self.ensure_row(id) {
                report.created += 1;
            } else {
                report.updated += 1;
            }
            self.update_row(id, entry);
        }

        tracing::debug!(
            "Applied snapshot: {} created, {} updated, {} skipped",
            report.created,
            report.updated,
            report.skipped
        );
        report
    }

    /// Returns true when the row had to be created.
    fn ensure_row(&mut self, device_id: &str) -> bool {
        if self.view.index.contains_key(device_id) {
            return false;
        }
        self.view.index.insert(device_id.to_string(), self.view.rows.len());
        self.view.rows.push(RowState::new(device_id));
        true
    }

    fn update_row(&mut self, device_id: &str, entry: &DeviceSnapshotEntry) {
        if let Some(&i) = self.view.index.get(device_id) {
            self.view.rows[i].update(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(json: &str) -> FleetSnapshot {
        FleetSnapshot::from_json(json).unwrap()
    }

    const B2: &str = r#"{"device_id":"b2","offline":false,"pressure_now":4.999,"pressure_prev":4.5,"valve_state":"OPEN","has_view":true}"#;
    const A1: &str = r#"{"device_id":"a1","offline":true,"pressure_now":7.2,"has_view":false}"#;

    #[test]
    fn test_two_snapshot_scenario() {
        let mut binder = FleetViewBinder::new();
        binder.apply(&snapshot(&format!(
            r#"{{"server_time_utc":"12:00:00Z","devices":[{}]}}"#,
            B2
        )));
        let report = binder.apply(&snapshot(&format!(
            r#"{{"server_time_utc":"12:00:01Z","devices":[{},{}]}}"#,
            B2, A1
        )));

        assert_eq!(report, ApplyReport { created: 1, updated: 1, skipped: 0 });
        let view = binder.view();
        assert_eq!(view.as_of(), Some("12:00:01Z"));

        let a1 = view.row("a1").unwrap();
        assert_eq!(a1.connectivity, "Offline");
        assert!(a1.pressure_alarm);
        assert_eq!(a1.pressure_now, "7.200");
        assert_eq!(a1.link.label(), "No init");
        assert!(!a1.link.enabled);

        let b2 = view.row("b2").unwrap();
        assert_eq!(b2.connectivity, "Online");
        assert!(!b2.pressure_alarm);
        assert_eq!(b2.pressure_now, "4.999");
        assert_eq!(b2.pressure_prev, "4.500");
        assert_eq!(b2.valve, "OPEN");
        assert_eq!(b2.link.label(), "Open");
        assert_eq!(b2.link.href, "/device/b2");

        // first-seen placement is kept
        let ids: Vec<&str> = view.rows().iter().map(|r| r.device_id.as_str()).collect();
        assert_eq!(ids, vec!["b2", "a1"]);
    }

    #[test]
    fn test_new_rows_follow_sort_order() {
        let mut binder = FleetViewBinder::new();
        binder.apply(&snapshot(&format!(r#"{{"devices":[{},{}]}}"#, B2, A1)));

        let ids: Vec<&str> = binder.view().rows().iter().map(|r| r.device_id.as_str()).collect();
        assert_eq!(ids, vec!["a1", "b2"]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let s = snapshot(&format!(r#"{{"server_time_utc":"x","devices":[{},{}]}}"#, A1, B2));
        let mut once = FleetViewBinder::new();
        once.apply(&s);

        let mut twice = FleetViewBinder::new();
        twice.apply(&s);
        let report = twice.apply(&s);

        assert_eq!(report, ApplyReport { created: 0, updated: 2, skipped: 0 });
        assert_eq!(once.view().rows(), twice.view().rows());
        assert_eq!(once.view().as_of(), twice.view().as_of());
    }

    #[test]
    fn test_absent_device_keeps_last_values() {
        let mut binder = FleetViewBinder::new();
        binder.apply(&snapshot(&format!(r#"{{"devices":[{},{}]}}"#, A1, B2)));
        let before = binder.view().row("a1").unwrap().clone();

        binder.apply(&snapshot(&format!(r#"{{"devices":[{}]}}"#, B2)));

        assert_eq!(binder.view().rows().len(), 2);
        assert_eq!(binder.view().row("a1"), Some(&before));
    }

    #[test]
    fn test_missing_server_time_keeps_previous_indicator() {
        let mut binder = FleetViewBinder::new();
        binder.apply(&snapshot(r#"{"server_time_utc":"10:00:00","devices":[]}"#));
        binder.apply(&snapshot(r#"{"devices":[]}"#));
        assert_eq!(binder.view().as_of(), Some("10:00:00"));
    }

    #[test]
    fn test_entries_without_id_are_skipped() {
        let mut binder = FleetViewBinder::new();
        let report = binder.apply(&snapshot(&format!(
            r#"{{"devices":[{{"offline":true}},{},{{"device_id":""}}]}}"#,
            A1
        )));

        assert_eq!(report, ApplyReport { created: 1, updated: 0, skipped: 2 });
        assert_eq!(binder.view().rows().len(), 1);
    }

    #[test]
    fn test_rows_match_pure_formatting() {
        let mut binder = FleetViewBinder::new();
        let s = snapshot(
            r#"{"devices":[{"device_id":"z9","pressure_now":"abc","pressure_prev":null,"delta":-0.25,"time_utc":"2026-01-01 00:00:00"}]}"#,
        );
        binder.apply(&s);

        let mut expected = RowState::new("z9");
        expected.update(&s.devices[0]);
        let row = binder.view().row("z9").unwrap();
        assert_eq!(row, &expected);
        assert_eq!(row.pressure_now, "-");
        assert_eq!(row.pressure_prev, "-");
        assert_eq!(row.delta, "-0.250");
        assert_eq!(row.time, "2026-01-01 00:00:00");
    }

    #[test]
    fn test_cache_indicators_track_latest_snapshot() {
        let mut binder = FleetViewBinder::new();
        binder.apply(&snapshot(r#"{"cache_age_ms":900,"cache_error":"influx down","devices":[]}"#));
        assert_eq!(binder.view().cache_error(), Some("influx down"));
        assert_eq!(binder.view().cache_age_ms(), Some(900));

        binder.apply(&snapshot(r#"{"cache_age_ms":100,"devices":[]}"#));
        assert_eq!(binder.view().cache_error(), None);
        assert_eq!(binder.view().cache_age_ms(), Some(100));
    }

    #[test]
    fn test_mistyped_fields_do_not_drop_entry() {
        let mut binder = FleetViewBinder::new();
        let report = binder.apply(&snapshot(
            r#"{"devices":[{"device_id":"a1","valve_state":1,"pressure_now":7.2},{"device_id":"b2","time_utc":1767268800},42]}"#,
        ));

        assert_eq!(report, ApplyReport { created: 2, updated: 0, skipped: 1 });
        let a1 = binder.view().row("a1").unwrap();
        assert_eq!(a1.valve, "1");
        assert!(a1.pressure_alarm);
        assert_eq!(binder.view().row("b2").unwrap().time, "1767268800");
    }
}
