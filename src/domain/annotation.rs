//! Annotation descriptors: postprandial windows, clinical threshold lines,
//! activity/sleep background boxes and sleep-window lines.
//!
//! Descriptors are renderer-neutral. `range` is the extent along `axis`;
//! `cross_range`, when present, bounds the other axis.

use super::color::Color;
use super::format::{format_clock, postprandial_label};
use super::records::{add_minutes, AttributeValue, MealEvent, Timestamp, TimeSeriesPoint};
use super::statistics::{series_stats, window_average};
use serde::{Deserialize, Serialize};

const ACTIVITY_TAIL_MINUTES: f64 = 15.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationKind {
    Line,
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    X,
    Y,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationRange {
    At(f64),
    Between(f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDescriptor {
    pub border_color: Color,
    pub background_color: Option<Color>,
    pub border_width: f64,
    pub dashed: bool,
    pub behind_datasets: bool,
    pub label_color: Option<Color>,
}

impl StyleDescriptor {
    fn stroke(color: &str, width: f64) -> Self {
        Self {
            border_color: Color::new(color),
            background_color: None,
            border_width: width,
            dashed: false,
            behind_datasets: false,
            label_color: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub kind: AnnotationKind,
    pub axis: Axis,
    pub range: AnnotationRange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_range: Option<AnnotationRange>,
    pub label: String,
    pub style: StyleDescriptor,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GlucoseThresholds {
    pub very_low: f64,
    pub hypoglycemia: f64,
    pub hyperglycemia: f64,
    pub very_high: f64,
}

impl Default for GlucoseThresholds {
    fn default() -> Self {
        Self {
            very_low: 54.0,
            hypoglycemia: 70.0,
            hyperglycemia: 180.0,
            very_high: 250.0,
        }
    }
}

/// Time-in-range bands, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlucoseBand {
    VeryHigh,
    High,
    Target,
    Low,
    VeryLow,
}

impl GlucoseBand {
    pub const ALL: [GlucoseBand; 5] = [
        GlucoseBand::VeryHigh,
        GlucoseBand::High,
        GlucoseBand::Target,
        GlucoseBand::Low,
        GlucoseBand::VeryLow,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            GlucoseBand::VeryHigh => "very_high",
            GlucoseBand::High => "high",
            GlucoseBand::Target => "target",
            GlucoseBand::Low => "low",
            GlucoseBand::VeryLow => "very_low",
        }
    }

    /// Legend text with the band's bounds, e.g. `Target (70-180 mg/dL)`.
    pub fn label(&self, t: &GlucoseThresholds) -> String {
        match self {
            GlucoseBand::VeryHigh => format!("Very High (>{} mg/dL)", t.very_high),
            GlucoseBand::High => format!("High ({}-{} mg/dL)", t.hyperglycemia, t.very_high),
            GlucoseBand::Target => format!("Target ({}-{} mg/dL)", t.hypoglycemia, t.hyperglycemia),
            GlucoseBand::Low => format!("Low ({}-{} mg/dL)", t.very_low, t.hypoglycemia),
            GlucoseBand::VeryLow => format!("Very Low (<{} mg/dL)", t.very_low),
        }
    }

    pub fn color(&self) -> Color {
        Color::new(match self {
            GlucoseBand::VeryHigh => "#ff6b6b",
            GlucoseBand::High => "#ffa502",
            GlucoseBand::Target => "#2ed573",
            GlucoseBand::Low => "#1e90ff",
            GlucoseBand::VeryLow => "#ff4757",
        })
    }
}

/// Horizontal hypo/hyperglycemia lines; independent of any data.
pub fn threshold_lines(thresholds: &GlucoseThresholds) -> Vec<Annotation> {
    let line = |value: f64, label: &str| {
        let mut style = StyleDescriptor::stroke("red", 2.0);
        style.background_color = Some(Color::new("red"));
        style.label_color = Some(Color::new("#ffffff"));
        Annotation {
            kind: AnnotationKind::Line,
            axis: Axis::Y,
            range: AnnotationRange::At(value),
            cross_range: None,
            label: label.to_string(),
            style,
        }
    };

    vec![
        line(thresholds.hypoglycemia, "Hypoglycemia Threshold"),
        line(thresholds.hyperglycemia, "Hyperglycemia Threshold"),
    ]
}

/// One box per meal over `[start, start + window_minutes]`, labelled with the
/// window's glucose average and peak, followed by the threshold lines.
///
/// Overlapping windows are not merged.
pub fn build_postprandial_annotations(
    meals: &[MealEvent],
    series: &[TimeSeriesPoint],
    window_minutes: f64,
    thresholds: &GlucoseThresholds,
) -> Vec<Annotation> {
    let mut annotations: Vec<Annotation> = meals
        .iter()
        .map(|meal| {
            let end = add_minutes(meal.start, window_minutes);
            let stats = window_average(series, meal.start, end);

            Annotation {
                kind: AnnotationKind::Box,
                axis: Axis::X,
                range: AnnotationRange::Between(meal.start as f64, end as f64),
                cross_range: None,
                label: postprandial_label(&stats),
                style: StyleDescriptor {
                    border_color: Color::new("rgba(50, 150, 250, 0.5)"),
                    background_color: Some(Color::new("rgba(50, 150, 250, 0.2)")),
                    border_width: 2.0,
                    dashed: false,
                    behind_datasets: false,
                    label_color: Some(Color::new("#ffffff")),
                },
            }
        })
        .collect();

    annotations.extend(threshold_lines(thresholds));
    annotations
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityState {
    Sleep,
    Sedentary,
    Light,
    ModerateVigorous,
}

impl ActivityState {
    pub const ALL: [ActivityState; 4] = [
        ActivityState::Sleep,
        ActivityState::Sedentary,
        ActivityState::Light,
        ActivityState::ModerateVigorous,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ActivityState::Sleep => "Sleep",
            ActivityState::Sedentary => "Sedentary",
            ActivityState::Light => "Light Activity",
            ActivityState::ModerateVigorous => "MVPA",
        }
    }

    pub fn fill(&self) -> Color {
        Color::new(match self {
            ActivityState::Sleep => "rgba(116, 185, 255, 0.4)",
            ActivityState::Sedentary => "rgba(255, 128, 128, 0.4)",
            ActivityState::Light => "rgba(255, 206, 86, 0.4)",
            ActivityState::ModerateVigorous => "rgba(75, 192, 112, 0.4)",
        })
    }
}

/// Activity/sleep flags for one accelerometer epoch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActivityMarks {
    pub timestamp: Timestamp,
    pub sleep: bool,
    pub sedentary: bool,
    pub light: bool,
    pub moderate_vigorous: bool,
}

impl ActivityMarks {
    pub fn is_active(&self, state: ActivityState) -> bool {
        match state {
            ActivityState::Sleep => self.sleep,
            ActivityState::Sedentary => self.sedentary,
            ActivityState::Light => self.light,
            ActivityState::ModerateVigorous => self.moderate_vigorous,
        }
    }
}

/// Background boxes behind the datasets, one per active state per epoch.
/// An epoch spans to the next sample, the last one for 15 minutes.
pub fn activity_background(samples: &[ActivityMarks]) -> Vec<Annotation> {
    let mut annotations = Vec::new();

    for (i, sample) in samples.iter().enumerate() {
        let start = sample.timestamp;
        let end = samples
            .get(i + 1)
            .map(|next| next.timestamp)
            .unwrap_or_else(|| add_minutes(start, ACTIVITY_TAIL_MINUTES));

        for state in ActivityState::ALL {
            if !sample.is_active(state) {
                continue;
            }
            annotations.push(Annotation {
                kind: AnnotationKind::Box,
                axis: Axis::X,
                range: AnnotationRange::Between(start as f64, end as f64),
                cross_range: None,
                label: state.label().to_string(),
                style: StyleDescriptor {
                    border_color: Color::new("transparent"),
                    background_color: Some(state.fill()),
                    border_width: 0.0,
                    dashed: false,
                    behind_datasets: true,
                    label_color: None,
                },
            });
        }
    }

    annotations
}

/// Dashed vertical line per day index from sleep onset to wake-up, both in
/// fractional hours. Days missing either end are skipped.
pub fn sleep_duration_lines(days: &[(Option<f64>, Option<f64>)]) -> Vec<Annotation> {
    days.iter()
        .enumerate()
        .filter_map(|(index, day)| {
            let (onset, wake) = (day.0?, day.1?);
            let mut style = StyleDescriptor::stroke("#ffffff", 1.0);
            style.dashed = true;
            Some(Annotation {
                kind: AnnotationKind::Line,
                axis: Axis::X,
                range: AnnotationRange::At(index as f64),
                cross_range: Some(AnnotationRange::Between(onset, wake)),
                label: String::new(),
                style,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerPoint {
    pub x: Timestamp,
    /// End of the meal's interval.
    pub until: Timestamp,
    pub y: Option<f64>,
    pub label: String,
}

/// Meal markers drawn at the day's mean glucose level.
pub fn meal_markers(meals: &[MealEvent], series: &[TimeSeriesPoint]) -> Vec<MarkerPoint> {
    let level = series_stats(series).avg();

    meals
        .iter()
        .map(|meal| MarkerPoint {
            x: meal.start,
            until: meal.end(),
            y: level,
            label: meal_label(meal),
        })
        .collect()
}

fn meal_label(meal: &MealEvent) -> String {
    let attr = |name: &str| match meal.attributes.get(name) {
        Some(AttributeValue::Number(n)) => n.to_string(),
        Some(AttributeValue::Text(t)) => t.clone(),
        None => "N/A".to_string(),
    };

    format!(
        "Meal Time: {}\nMeal: {}\nCalories: {}\nCarbs: {}g\nFat: {}g\nProtein: {}g\n\
         Glycemic Load: {}",
        format_clock(meal.start),
        attr("meal"),
        attr("calories"),
        attr("carbs_g"),
        attr("fat_g"),
        attr("protein_g"),
        attr("glycemic_load"),
    )
}
