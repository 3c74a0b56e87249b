// Study backend record shapes and their conversion into pipeline inputs
use super::annotation::{ActivityMarks, GlucoseBand};
use super::format::parse_timestamp;
use super::records::{AttributeValue, MealEvent, RecordError, TimeSeriesPoint};
use super::statistics::LabeledValue;
use serde::{Deserialize, Deserializer};

/// Daily accelerometer summary (minutes per intensity band).
#[derive(Debug, Clone, Deserialize)]
pub struct DayActivity {
    pub calendar_date: String,
    #[serde(rename = "dur_day_total_IN_min")]
    pub inactive_min: f64,
    #[serde(rename = "dur_day_total_LIG_min")]
    pub light_min: f64,
    #[serde(rename = "dur_day_total_MOD_min")]
    pub moderate_min: f64,
    #[serde(rename = "dur_day_total_VIG_min")]
    pub vigorous_min: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SleepDay {
    pub calendar_date: String,
    #[serde(default)]
    pub sleeponset_ts: Option<String>,
    #[serde(default)]
    pub wakeup_ts: Option<String>,
    #[serde(default)]
    pub sleep_efficiency_after_onset: Option<f64>,
    #[serde(default)]
    pub sleep_hours: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WearTimeDay {
    pub calendar_date: String,
    pub recorded_wear_time_hrs: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyGlucose {
    pub date: String,
    pub avg_glucose: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DailyPeak {
    pub pid: String,
    pub date: String,
    pub avg_glucose: f64,
    pub peak_glucose: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CgmReading {
    pub timestamp: String,
    #[serde(default)]
    pub glucose_level: Option<f64>,
}

impl CgmReading {
    pub fn to_point(&self) -> Result<TimeSeriesPoint, RecordError> {
        Ok(TimeSeriesPoint::new(
            parse_timestamp(&self.timestamp)?,
            self.glucose_level,
        ))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoodLogEntry {
    pub meal_timestamp: String,
    #[serde(default)]
    pub raw_data: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub total_carbs_g: Option<f64>,
    #[serde(default)]
    pub total_fat_g: Option<f64>,
    #[serde(default)]
    pub protein_g: Option<f64>,
    #[serde(default)]
    pub glycemic_load: Option<f64>,
}

impl FoodLogEntry {
    pub fn to_meal(&self, window_minutes: f64) -> Result<MealEvent, RecordError> {
        let mut meal = MealEvent::new(parse_timestamp(&self.meal_timestamp)?, window_minutes);

        if let Some(text) = &self.raw_data {
            meal = meal.with_attribute("meal", AttributeValue::Text(text.clone()));
        }
        let numbers = [
            ("calories", self.calories),
            ("carbs_g", self.total_carbs_g),
            ("fat_g", self.total_fat_g),
            ("protein_g", self.protein_g),
            ("glycemic_load", self.glycemic_load),
        ];
        for (name, value) in numbers {
            if let Some(v) = value {
                meal = meal.with_attribute(name, AttributeValue::Number(v));
            }
        }

        Ok(meal)
    }
}

/// `/hourly-glucose` envelope: CGM readings plus the day's food log.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GlucoseDay {
    #[serde(default)]
    pub cgm_data: Vec<serde_json::Value>,
    #[serde(default)]
    pub food_log_data: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActivitySample {
    pub timestamp: String,
    #[serde(default, deserialize_with = "flag")]
    pub sedentary: bool,
    #[serde(default, deserialize_with = "flag")]
    pub light: bool,
    #[serde(default, deserialize_with = "flag")]
    pub moderate_vigorous: bool,
    #[serde(default, deserialize_with = "flag")]
    pub sleep: bool,
}

impl ActivitySample {
    pub fn to_marks(&self) -> Result<ActivityMarks, RecordError> {
        Ok(ActivityMarks {
            timestamp: parse_timestamp(&self.timestamp)?,
            sleep: self.sleep,
            sedentary: self.sedentary,
            light: self.light,
            moderate_vigorous: self.moderate_vigorous,
        })
    }
}

// Flags arrive as booleans, 0/1 integers or null.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => b,
        Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        _ => false,
    })
}

/// Distinct days with CGM data per participant.
#[derive(Debug, Clone, Deserialize)]
pub struct DaysWorn {
    pub pid: String,
    #[serde(deserialize_with = "number")]
    pub days_worn: f64,
}

/// Share of CGM readings (percent) per glucose band for one participant.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeInRanges {
    pub pid: String,
    #[serde(default, deserialize_with = "optional_number")]
    pub very_high: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub high: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub target: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub low: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub very_low: Option<f64>,
}

impl TimeInRanges {
    pub fn share(&self, band: GlucoseBand) -> Option<f64> {
        match band {
            GlucoseBand::VeryHigh => self.very_high,
            GlucoseBand::High => self.high,
            GlucoseBand::Target => self.target,
            GlucoseBand::Low => self.low,
            GlucoseBand::VeryLow => self.very_low,
        }
    }
}

/// Accelerometer wear and non-wear days per participant.
#[derive(Debug, Clone, Deserialize)]
pub struct WearNonWear {
    #[serde(alias = "pid")]
    pub participant_id: String,
    #[serde(default, deserialize_with = "optional_number")]
    pub wear_time_days: Option<f64>,
    #[serde(default, deserialize_with = "optional_number")]
    pub non_wear_time_days: Option<f64>,
}

// SQL aggregates may arrive as decimal strings.
fn optional_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    match value {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::Number(n)) => Ok(n.as_f64()),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("not a number: {}", s))),
        Some(other) => Err(serde::de::Error::custom(format!("not a number: {}", other))),
    }
}

fn number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    optional_number(deserializer)?.ok_or_else(|| serde::de::Error::custom("missing number"))
}

/// Glycemic event lists from `/cgm-metrics`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CgmMetrics {
    #[serde(default)]
    pub hypoglycemia_events: Vec<serde_json::Value>,
    #[serde(default)]
    pub hyperglycemia_events: Vec<serde_json::Value>,
    #[serde(default)]
    pub total_participants: Option<u64>,
}

/// Cohort-wide metrics served as `{ "boxplot": .., "individuals": [..] }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CohortMetric {
    WearTime,
    AverageSleep,
    FileSize,
}

impl CohortMetric {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "wear-time" => Some(CohortMetric::WearTime),
            "avg-sleep" => Some(CohortMetric::AverageSleep),
            "file-size" => Some(CohortMetric::FileSize),
            _ => None,
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            CohortMetric::WearTime => "wear-time-boxplot",
            CohortMetric::AverageSleep => "avg-sleep-boxplot",
            CohortMetric::FileSize => "file-size-boxplot",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            CohortMetric::WearTime => "wearTime_overall",
            CohortMetric::AverageSleep => "avg_sleep_hours",
            CohortMetric::FileSize => "file_size_mb",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            CohortMetric::WearTime => "Wear Time",
            CohortMetric::AverageSleep => "Average Sleep",
            CohortMetric::FileSize => "File Size",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            CohortMetric::WearTime => "days",
            CohortMetric::AverageSleep => "hours",
            CohortMetric::FileSize => "MB",
        }
    }

    /// Pull `(pid, value)` out of one individual record.
    pub fn extract(&self, record: &serde_json::Value) -> Result<LabeledValue, RecordError> {
        let pid = record
            .get("pid")
            .and_then(|v| v.as_str())
            .ok_or(RecordError::MissingField("pid"))?;
        let value = record
            .get(self.field())
            .and_then(|v| v.as_f64())
            .ok_or(RecordError::MissingField(self.field()))?;
        Ok(LabeledValue::new(pid, value))
    }
}
