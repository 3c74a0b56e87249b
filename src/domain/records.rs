// Pipeline record models
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Milliseconds since the Unix epoch (UTC).
pub type Timestamp = i64;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum RecordError {
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("missing field: {0}")]
    MissingField(&'static str),
}

/// One observation tied to a participant, e.g. a hypoglycemia event count.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EventRecord {
    #[serde(alias = "pid")]
    pub key: String,
    #[serde(alias = "events")]
    pub count: u64,
    #[serde(default)]
    pub percentage: Option<f64>,
}

impl EventRecord {
    pub fn new(key: impl Into<String>, count: u64, percentage: Option<f64>) -> Self {
        Self {
            key: key.into(),
            count,
            percentage,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedBucket {
    pub key: String,
    pub total: u64,
    pub percentage: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeSeriesPoint {
    pub timestamp: Timestamp,
    pub value: Option<f64>,
}

impl TimeSeriesPoint {
    pub fn new(timestamp: Timestamp, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Number(f64),
    Text(String),
}

/// A meal (or any interval-opening event) covering `[start, start + duration]`.
#[derive(Debug, Clone, PartialEq)]
pub struct MealEvent {
    pub start: Timestamp,
    pub duration_minutes: f64,
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl MealEvent {
    pub fn new(start: Timestamp, duration_minutes: f64) -> Self {
        Self {
            start,
            duration_minutes,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: AttributeValue) -> Self {
        self.attributes.insert(name.to_string(), value);
        self
    }

    pub fn end(&self) -> Timestamp {
        add_minutes(self.start, self.duration_minutes)
    }
}

pub fn minutes_to_millis(minutes: f64) -> i64 {
    (minutes * 60_000.0).round() as i64
}

/// `ts + minutes`, saturating at the ends of the timestamp range.
pub fn add_minutes(ts: Timestamp, minutes: f64) -> Timestamp {
    ts.saturating_add(minutes_to_millis(minutes))
}

/// Deserialize each record on its own, skipping the ones that don't fit `T`.
pub fn parse_records<T: DeserializeOwned>(kind: &str, values: Vec<serde_json::Value>) -> Vec<T> {
    let total = values.len();
    let records: Vec<T> = values
        .into_iter()
        .enumerate()
        .filter_map(|(idx, value)| match serde_json::from_value(value) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("Skipping malformed {} record #{}: {}", kind, idx, e);
                None
            }
        })
        .collect();

    if records.len() < total {
        tracing::debug!("Parsed {}/{} {} records", records.len(), total, kind);
    }
    records
}
