// Single-device page state - receives live updates and the history payload
use crate::application::detail_binder::{HistorySink, LiveUpdateSink};
use crate::domain::connection::ConnectionState;
use crate::domain::history::{HistoryPayload, LiveUpdate};
use crate::domain::row::{format_reading, is_alarm, PLACEHOLDER};
use crate::domain::snapshot::Reading;
use chrono::{DateTime, SecondsFormat};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Provenance {
    #[default]
    Empty,
    History,
    Live,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    pub uid: String,
    pub ts_ms: Option<i64>,
    pub valve_state: Option<String>,
    pub pressure_prev: Reading,
    pub pressure_now: Reading,
    pub provenance: Provenance,
    pub history: Option<HistoryPayload>,
}

/// Shared handle: the binder owns one clone per sink, the caller keeps one
/// to render. Live data always wins; history only fills the fields until
/// the first live update lands.
#[derive(Debug, Clone, Default)]
pub struct DetailPage {
    state: Rc<RefCell<DetailState>>,
}

impl DetailPage {
    pub fn new(uid: &str) -> Self {
        let page = Self::default();
        page.state.borrow_mut().uid = uid.to_string();
        page
    }

    pub fn state(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub fn render(&self, connection: ConnectionState) -> String {
        let s = self.state.borrow();
        let alarm = if is_alarm(&s.pressure_now) { "!" } else { "" };
        let at = s
            .ts_ms
            .and_then(DateTime::from_timestamp_millis)
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
            .unwrap_or_else(|| PLACEHOLDER.to_string());
        let source = match s.provenance {
            Provenance::Empty => "no data",
            Provenance::History => "history",
            Provenance::Live => "live",
        };

        let mut out = format!(
            "Device {} · {}\nvalve {} · now {}{} · prev {} · at {} ({})",
            s.uid,
            connection,
            s.valve_state.as_deref().filter(|v| !v.is_empty()).unwrap_or(PLACEHOLDER),
            format_reading(&s.pressure_now),
            alarm,
            format_reading(&s.pressure_prev),
            at,
            source
        );
        if let Some(history) = &s.history {
            out.push_str(&format!(
                "\nhistory: {} pressure points, {} valve changes",
                history.pressure_points().len(),
                history.valve_points().len()
            ));
        }
        out
    }
}

impl LiveUpdateSink for DetailPage {
    fn on_live_update(&mut self, update: LiveUpdate) {
        let mut s = self.state.borrow_mut();
        s.uid = update.uid;
        s.ts_ms = update.ts_ms;
        s.valve_state = update.valve_state;
        s.pressure_prev = update.pressure_prev;
        s.pressure_now = update.pressure_now;
        s.provenance = Provenance::Live;
    }
}

impl HistorySink for DetailPage {
    fn on_history(&mut self, payload: HistoryPayload) {
        let mut s = self.state.borrow_mut();
        if s.provenance != Provenance::Live {
            let points = payload.pressure_points();
            if let Some(last) = points.last() {
                s.ts_ms = Some(last.t);
                s.pressure_now = Reading::from(last.v);
                s.pressure_prev = points
                    .len()
                    .checked_sub(2)
                    .map(|i| Reading::from(points[i].v))
                    .unwrap_or_default();
            }
            if let Some(valve) = payload.valve_points().last() {
                s.valve_state = Some(valve.state.clone());
            }
            s.provenance = Provenance::History;
        }
        s.history = Some(payload);
    }
}
