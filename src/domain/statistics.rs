//! Statistics over time-stamped series and participant distributions.
//!
//! Values stay at full `f64` precision here; rounding happens only when a
//! number is formatted into a label.

use super::records::{Timestamp, TimeSeriesPoint};
use serde::Serialize;

/// Result of summarising a time window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WindowStats {
    Observed { avg: f64, peak: f64, samples: usize },
    NoData,
}

impl WindowStats {
    pub fn avg(&self) -> Option<f64> {
        match self {
            WindowStats::Observed { avg, .. } => Some(*avg),
            WindowStats::NoData => None,
        }
    }

    pub fn peak(&self) -> Option<f64> {
        match self {
            WindowStats::Observed { peak, .. } => Some(*peak),
            WindowStats::NoData => None,
        }
    }
}

/// Mean and peak of the non-null values with `start <= t <= end`.
pub fn window_average(series: &[TimeSeriesPoint], start: Timestamp, end: Timestamp) -> WindowStats {
    let values = series
        .iter()
        .filter(|p| p.timestamp >= start && p.timestamp <= end)
        .filter_map(|p| p.value)
        .filter(|v| v.is_finite());

    summarize(values)
}

/// Mean and peak over every non-null value of a series.
pub fn series_stats(series: &[TimeSeriesPoint]) -> WindowStats {
    summarize(series.iter().filter_map(|p| p.value).filter(|v| v.is_finite()))
}

fn summarize(values: impl Iterator<Item = f64>) -> WindowStats {
    let mut sum = 0.0;
    let mut peak = f64::NEG_INFINITY;
    let mut samples = 0usize;

    for value in values {
        sum += value;
        peak = peak.max(value);
        samples += 1;
    }

    if samples == 0 {
        return WindowStats::NoData;
    }

    WindowStats::Observed {
        avg: sum / samples as f64,
        peak,
        samples,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabeledValue {
    pub label: String,
    pub value: f64,
}

impl LabeledValue {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxPlotStats {
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub outliers: Vec<LabeledValue>,
}

/// Five-number summary with 1.5 IQR fences.
///
/// Quartiles use nearest rank: the p-quantile is the sorted element at
/// 1-based rank `floor(n * p)`, clamped to `[1, n]`.
pub fn box_plot(values: &[LabeledValue]) -> Option<BoxPlotStats> {
    let mut sorted: Vec<&LabeledValue> = values.iter().filter(|v| v.value.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.value.total_cmp(&b.value));

    let n = sorted.len();
    let rank = |p: f64| -> f64 {
        let r = ((n as f64) * p).floor() as usize;
        sorted[r.clamp(1, n) - 1].value
    };

    let q1 = rank(0.25);
    let median = rank(0.5);
    let q3 = rank(0.75);
    let iqr = q3 - q1;
    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let outliers = sorted
        .iter()
        .filter(|v| v.value < lower_fence || v.value > upper_fence)
        .map(|v| (*v).clone())
        .collect();

    Some(BoxPlotStats {
        count: n,
        min: sorted[0].value,
        q1,
        median,
        q3,
        max: sorted[n - 1].value,
        lower_fence,
        upper_fence,
        outliers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(t: i64, v: f64) -> TimeSeriesPoint {
        TimeSeriesPoint::new(t, Some(v))
    }

    #[test]
    fn test_window_average_inclusive_bounds() {
        let series = vec![point(0, 10.0), point(1, 20.0)];
        assert_eq!(
            window_average(&series, 0, 1),
            WindowStats::Observed {
                avg: 15.0,
                peak: 20.0,
                samples: 2
            }
        );
    }

    #[test]
    fn test_window_average_no_points_in_range() {
        let series = vec![point(0, 10.0), point(100, 20.0)];
        let stats = window_average(&series, 10, 50);
        assert_eq!(stats, WindowStats::NoData);
        assert_eq!(stats.avg(), None);
    }

    #[test]
    fn test_window_average_skips_nulls() {
        let series = vec![
            point(0, 90.0),
            TimeSeriesPoint::new(5, None),
            point(10, 150.0),
            TimeSeriesPoint::new(15, None),
        ];

        let stats = window_average(&series, 0, 20);
        assert_eq!(stats.avg(), Some(120.0));
        assert_eq!(stats.peak(), Some(150.0));

        let only_nulls = window_average(&series, 4, 6);
        assert_eq!(only_nulls, WindowStats::NoData);
    }

    #[test]
    fn test_series_stats_empty() {
        assert_eq!(series_stats(&[]), WindowStats::NoData);
    }

    #[test]
    fn test_box_plot_nearest_rank() {
        let values: Vec<LabeledValue> = (1..=8)
            .map(|i| LabeledValue::new(format!("WW{:03}", i), i as f64))
            .collect();

        let stats = box_plot(&values).unwrap();
        assert_eq!(stats.count, 8);
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.median, 4.0);
        assert_eq!(stats.q3, 6.0);
        assert_eq!(stats.max, 8.0);
        assert!(stats.outliers.is_empty());
    }

    #[test]
    fn test_box_plot_outliers_keep_labels() {
        let mut values: Vec<LabeledValue> = (0..10)
            .map(|i| LabeledValue::new(format!("P{}", i), 20.0 + (i % 3) as f64))
            .collect();
        values.push(LabeledValue::new("LOW", 1.0));

        let stats = box_plot(&values).unwrap();
        assert_eq!(stats.outliers, vec![LabeledValue::new("LOW", 1.0)]);
    }

    #[test]
    fn test_box_plot_single_and_empty() {
        let stats = box_plot(&[LabeledValue::new("A", 5.0)]).unwrap();
        assert_eq!((stats.q1, stats.median, stats.q3), (5.0, 5.0, 5.0));

        assert!(box_plot(&[]).is_none());
        assert!(box_plot(&[LabeledValue::new("A", f64::NAN)]).is_none());
    }
}
