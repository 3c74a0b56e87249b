// Chart payload models handed to the rendering layer
use super::annotation::{Annotation, MarkerPoint};
use super::color::Color;
use super::records::{AggregatedBucket, TimeSeriesPoint};
use super::statistics::{BoxPlotStats, LabeledValue};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChartKind {
    Line,
    MultiLine,
    Bar,
    Combined,
    BoxPlot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SeriesKind {
    Line,
    Bar,
    Points,
    Bubble,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesValues {
    /// One value per x label, `None` for a gap.
    Aligned(Vec<Option<f64>>),
    Timed(Vec<TimeSeriesPoint>),
    Markers(Vec<MarkerPoint>),
}

impl SeriesValues {
    pub fn len(&self) -> usize {
        match self {
            SeriesValues::Aligned(v) => v.len(),
            SeriesValues::Timed(v) => v.len(),
            SeriesValues::Markers(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesData {
    pub id: String,
    pub name: String,
    pub kind: SeriesKind,
    pub color: Option<Color>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    pub span_gaps: bool,
    pub values: SeriesValues,
}

impl SeriesData {
    pub fn new(
        id: &str,
        name: &str,
        kind: SeriesKind,
        color: Option<Color>,
        values: SeriesValues,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            color,
            y_axis: None,
            span_gaps: false,
            values,
        }
    }

    pub fn on_axis(mut self, axis: &str) -> Self {
        self.y_axis = Some(axis.to_string());
        self
    }

    pub fn spanning_gaps(mut self) -> Self {
        self.span_gaps = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotSeries {
    pub name: String,
    pub color: Color,
    pub stats: BoxPlotStats,
    pub points: Vec<LabeledValue>,
}

/// Legend-only entry, e.g. for background annotation colors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub kind: ChartKind,
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_labels: Option<Vec<String>>,
    pub series: Vec<SeriesData>,
    /// Bar series drawn on top of each other instead of side by side.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub stacked: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub box_plots: Vec<BoxPlotSeries>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub legend: Vec<LegendEntry>,
}

impl ChartData {
    pub fn new(id: &str, title: impl Into<String>, kind: ChartKind, unit: Option<&str>) -> Self {
        Self {
            id: id.to_string(),
            title: title.into(),
            kind,
            unit: unit.map(str::to_string),
            x_labels: None,
            series: Vec::new(),
            stacked: false,
            box_plots: Vec::new(),
            annotations: Vec::new(),
            legend: Vec::new(),
        }
    }

    pub fn with_labels(mut self, labels: Vec<String>) -> Self {
        self.x_labels = Some(labels);
        self
    }

    pub fn with_series(mut self, series: SeriesData) -> Self {
        self.series.push(series);
        self
    }

    pub fn stacked(mut self) -> Self {
        self.stacked = true;
        self
    }

    /// Total values across all series, gaps included.
    pub fn point_count(&self) -> usize {
        self.series.iter().map(|s| s.values.len()).sum()
    }

    pub fn with_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.annotations.extend(annotations);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlycemicEventsSummary {
    pub hypoglycemia: Vec<AggregatedBucket>,
    pub hyperglycemia: Vec<AggregatedBucket>,
    pub total_hypoglycemia_events: u64,
    pub total_hyperglycemia_events: u64,
    pub total_participants: Option<u64>,
    pub chart: ChartData,
}
