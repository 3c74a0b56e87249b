// Timestamp parsing and label formatting
use super::records::{RecordError, Timestamp};
use super::statistics::WindowStats;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

pub const NO_DATA: &str = "no data";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an RFC 3339 or naive (assumed UTC) timestamp into epoch milliseconds.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, RecordError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp_millis());
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        if let Some(dt) = date.and_hms_opt(0, 0, 0) {
            return Ok(dt.and_utc().timestamp_millis());
        }
    }
    Err(RecordError::InvalidTimestamp(raw.to_string()))
}

fn to_datetime(ts: Timestamp) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(ts)
}

pub fn format_date(ts: Timestamp) -> String {
    to_datetime(ts)
        .map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn format_clock(ts: Timestamp) -> String {
    to_datetime(ts)
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_default()
}

/// Normalise a calendar date (or datetime) to `YYYY-MM-DD`; unparseable
/// input is returned as-is.
pub fn format_calendar_date(raw: &str) -> String {
    match parse_timestamp(raw) {
        Ok(ts) => format_date(ts),
        Err(_) => raw.to_string(),
    }
}

/// `MMM DD, YYYY`, e.g. "May 01, 2024".
pub fn format_long_date(raw: &str) -> String {
    match parse_timestamp(raw).ok().and_then(to_datetime) {
        Some(dt) => dt.format("%b %d, %Y").to_string(),
        None => raw.to_string(),
    }
}

/// `HH:MM[:SS]` as fractional hours.
pub fn clock_to_hours(raw: &str) -> Option<f64> {
    let mut parts = raw.trim().split(':');
    let hours: u32 = parts.next()?.trim().parse().ok()?;
    let minutes: u32 = parts.next()?.trim().parse().ok()?;
    let seconds: f64 = match parts.next() {
        Some(s) => s.trim().parse().ok()?,
        None => 0.0,
    };
    if parts.next().is_some() || minutes >= 60 || !(0.0..60.0).contains(&seconds) {
        return None;
    }
    Some(hours as f64 + minutes as f64 / 60.0 + seconds / 3600.0)
}

pub fn minutes_to_hours(minutes: f64) -> f64 {
    minutes / 60.0
}

pub fn fraction_to_percent(fraction: f64) -> f64 {
    fraction * 100.0
}

pub fn one_decimal(value: f64) -> String {
    format!("{:.1}", value)
}

pub fn postprandial_label(stats: &WindowStats) -> String {
    let peak = match stats.peak() {
        Some(p) => format!("{} mg/dL", p),
        None => NO_DATA.to_string(),
    };
    let avg = match stats.avg() {
        Some(avg) => format!("{} mg/dL", one_decimal(avg)),
        None => NO_DATA.to_string(),
    };
    format!("Postprandial Period\nAvg: {}, Peak: {}", avg, peak)
}
