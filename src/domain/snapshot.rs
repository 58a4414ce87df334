// Fleet snapshot domain models - what the devices stream delivers
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed {event} payload: {source}")]
    Json {
        event: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// A nullable sensor reading.
///
/// The server sends numbers, but older listeners wrote numeric strings and
/// occasional garbage, so anything that is not a finite number is kept as
/// `Invalid` rather than failing the whole entry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum Reading {
    #[default]
    Absent,
    Invalid,
    Value(f64),
}

impl Reading {
    pub fn value(&self) -> Option<f64> {
        match self {
            Reading::Value(v) => Some(*v),
            _ => None,
        }
    }

    fn from_json(value: Option<Value>) -> Self {
        let parsed = match value {
            None | Some(Value::Null) => return Reading::Absent,
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            Some(_) => None,
        };

        match parsed {
            Some(v) if v.is_finite() => Reading::Value(v),
            _ => Reading::Invalid,
        }
    }
}

impl From<f64> for Reading {
    fn from(v: f64) -> Self {
        if v.is_finite() {
            Reading::Value(v)
        } else {
            Reading::Invalid
        }
    }
}

impl<'de> Deserialize<'de> for Reading {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Reading::from_json(Option::<Value>::deserialize(deserializer)?))
    }
}

/// One device's reported state at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DeviceSnapshotEntry {
    #[serde(default, deserialize_with = "lenient_text")]
    pub device_id: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub offline: bool,
    #[serde(default, deserialize_with = "lenient_text")]
    pub valve_state: Option<String>,
    #[serde(default)]
    pub pressure_now: Reading,
    #[serde(default)]
    pub pressure_prev: Reading,
    #[serde(default)]
    pub delta: Reading,
    #[serde(default, deserialize_with = "epoch_millis")]
    pub time_ms: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub time_utc: Option<String>,
    #[serde(default, deserialize_with = "truthy")]
    pub has_view: bool,
}

impl DeviceSnapshotEntry {
    /// The identity key, if the entry carries a usable one.
    pub fn id(&self) -> Option<&str> {
        self.device_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// The unit the stream delivers: a full replacement of fleet state.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FleetSnapshot {
    #[serde(default, deserialize_with = "lenient_text")]
    pub server_time_utc: Option<String>,
    #[serde(default, deserialize_with = "epoch_millis")]
    pub cache_age_ms: Option<i64>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cache_error: Option<String>,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub devices: Vec<DeviceSnapshotEntry>,
}

impl FleetSnapshot {
    pub fn from_json(data: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(data).map_err(|source| DecodeError::Json {
            event: "devices",
            source,
        })
    }
}

/// Server-pushed diagnostic carried by a named `error` event. Opaque beyond
/// being loggable.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerDiagnostic(pub Value);

impl ServerDiagnostic {
    pub fn from_json(data: &str) -> Result<Self, DecodeError> {
        serde_json::from_str(data)
            .map(ServerDiagnostic)
            .map_err(|source| DecodeError::Json {
                event: "error",
                source,
            })
    }

    pub fn message(&self) -> Option<&str> {
        self.0.get("error").and_then(Value::as_str)
    }
}

impl std::fmt::Display for ServerDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// Every field decodes leniently, so only a non-object entry can fail. It
// becomes an entry without an id, which the binder counts as skipped.
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<DeviceSnapshotEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .map(|value| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::debug!("Undecodable device entry: {}", e);
                DeviceSnapshotEntry::default()
            })
        })
        .collect())
}

/// Display text from any JSON scalar. Falsy scalars and containers are absent.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => Some(n.to_string()),
        Some(Value::Bool(true)) => Some("true".to_string()),
        _ => None,
    })
}

fn truthy<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0 && !v.is_nan()),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    })
}

fn epoch_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite()).map(|v| v as i64)),
        _ => None,
    })
}
