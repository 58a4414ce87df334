// Row domain model - the persistent per-device view record and its formatting rules
use super::snapshot::{DeviceSnapshotEntry, Reading};
use std::cmp::Ordering;

/// Pressure strictly above this raises the alarm flag. Units are whatever
/// the sensor reports.
pub const PRESSURE_ALARM_THRESHOLD: f64 = 5.0;

pub const PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewLink {
    pub href: String,
    pub enabled: bool,
}

impl ViewLink {
    pub fn for_device(device_id: &str, enabled: bool) -> Self {
        Self {
            href: detail_path(device_id),
            enabled,
        }
    }

    pub fn label(&self) -> &'static str {
        if self.enabled { "Open" } else { "No init" }
    }
}

/// Displayed state for one device. Created on first sight, overwritten on
/// every later snapshot that carries the device, never dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowState {
    pub device_id: String,
    pub connectivity: String,
    pub valve: String,
    pub pressure_now: String,
    pub pressure_alarm: bool,
    pub pressure_prev: String,
    pub delta: String,
    pub time: String,
    pub link: ViewLink,
}

impl RowState {
    pub fn new(device_id: &str) -> Self {
        Self {
            device_id: device_id.to_string(),
            connectivity: PLACEHOLDER.to_string(),
            valve: PLACEHOLDER.to_string(),
            pressure_now: PLACEHOLDER.to_string(),
            pressure_alarm: false,
            pressure_prev: PLACEHOLDER.to_string(),
            delta: PLACEHOLDER.to_string(),
            time: PLACEHOLDER.to_string(),
            link: ViewLink::for_device(device_id, false),
        }
    }

    /// Overwrite every displayed field from `entry`. Nothing accumulates.
    pub fn update(&mut self, entry: &DeviceSnapshotEntry) {
        if let Some(id) = entry.id() {
            self.device_id = id.to_string();
        }
        self.connectivity = connectivity_label(entry.offline).to_string();
        self.valve = non_empty_or_placeholder(entry.valve_state.as_deref());
        self.pressure_now = format_reading(&entry.pressure_now);
        self.pressure_alarm = is_alarm(&entry.pressure_now);
        self.pressure_prev = format_reading(&entry.pressure_prev);
        self.delta = format_reading(&entry.delta);
        self.time = non_empty_or_placeholder(entry.time_utc.as_deref());
        self.link = ViewLink::for_device(&self.device_id, entry.has_view);
    }
}

pub fn connectivity_label(offline: bool) -> &'static str {
    if offline { "Offline" } else { "Online" }
}

/// Three decimals for a present value, the placeholder otherwise.
pub fn format_reading(reading: &Reading) -> String {
    match reading.value() {
        Some(v) => fixed3(v),
        None => PLACEHOLDER.to_string(),
    }
}

// `{:.3}` rounds exact binary ties to even. Display ties round away from
// zero instead, so 1.0625 reads "1.063". Negative zero prints unsigned.
fn fixed3(v: f64) -> String {
    if v == 0.0 {
        return "0.000".to_string();
    }
    let sign = if v < 0.0 { "-" } else { "" };
    let x = v.abs();
    let doubled = x * 2000.0;
    let exact = x.mul_add(2000.0, -doubled) == 0.0;

    if exact && doubled < 9_007_199_254_740_992.0 && doubled.fract() == 0.0 {
        let halves = doubled as u64;
        if halves % 2 == 1 {
            let n = (halves + 1) / 2;
            return format!("{}{}.{:03}", sign, n / 1000, n % 1000);
        }
    }
    format!("{}{:.3}", sign, x)
}

pub fn is_alarm(reading: &Reading) -> bool {
    reading
        .value()
        .is_some_and(|v| v > PRESSURE_ALARM_THRESHOLD)
}

/// `/device/{id}` with the id escaped as a single path segment.
pub fn detail_path(device_id: &str) -> String {
    format!("/device/{}", urlencoding::encode(device_id))
}

fn non_empty_or_placeholder(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}

/// Locale-style ordering for device ids. Characters compare case-insensitively
/// with punctuation before digits before letters, and on a case-only
/// difference lowercase sorts before uppercase.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    let folded = primary_keys(a).cmp(primary_keys(b));

    folded.then_with(|| {
        a.chars()
            .zip(b.chars())
            .map(|(x, y)| case_rank(x).cmp(&case_rank(y)))
            .find(|o| o.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

fn primary_keys(s: &str) -> impl Iterator<Item = (u8, char)> + '_ {
    s.chars().flat_map(char::to_lowercase).map(|c| (char_class(c), c))
}

fn char_class(c: char) -> u8 {
    if c.is_alphabetic() {
        2
    } else if c.is_numeric() {
        1
    } else {
        0
    }
}

fn case_rank(c: char) -> u8 {
    if c.is_uppercase() { 1 } else { 0 }
}
