// Chart service - Fetch study records and shape them into chart payloads
use crate::application::chart_registry::ChartRegistry;
use crate::application::error::ChartError;
use crate::application::study_repository::StudyRepository;
use crate::domain::aggregation::{aggregate, grand_total, group_by_key};
use crate::domain::annotation::{
    activity_background, build_postprandial_annotations, meal_markers, sleep_duration_lines,
    threshold_lines, ActivityMarks, ActivityState, GlucoseBand,
};
use crate::domain::chart::{
    BoxPlotSeries, ChartData, ChartKind, GlycemicEventsSummary, LegendEntry, SeriesData, SeriesKind,
    SeriesValues,
};
use crate::domain::color::{Color, ColorAssigner, ColorPolicy};
use crate::domain::format::{
    clock_to_hours, format_calendar_date, format_long_date, fraction_to_percent, minutes_to_hours,
};
use crate::domain::normalize::merge_series;
use crate::domain::records::{
    parse_records, AggregatedBucket, EventRecord, RecordError, TimeSeriesPoint,
};
use crate::domain::sampling::{
    normal_samples, placeholder_participant_ids, PLACEHOLDER_COHORT_SIZE, PLACEHOLDER_METRICS,
};
use crate::domain::statistics::{box_plot, LabeledValue};
use crate::domain::study::{
    ActivitySample, CgmReading, CohortMetric, DailyGlucose, DailyPeak, DayActivity, DaysWorn,
    FoodLogEntry, SleepDay, TimeInRanges, WearNonWear, WearTimeDay,
};
use crate::infrastructure::config::ChartsConfig;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;
use std::sync::Arc;

const GLUCOSE_UNIT: &str = "mg/dL";
const GLUCOSE_COLOR: &str = "#1e90ff";

#[derive(Clone)]
pub struct ChartService {
    repository: Arc<dyn StudyRepository>,
    registry: Arc<ChartRegistry>,
    charts_config: ChartsConfig,
}

impl ChartService {
    pub fn new(
        repository: Arc<dyn StudyRepository>,
        registry: Arc<ChartRegistry>,
        charts_config: ChartsConfig,
    ) -> Self {
        Self {
            repository,
            registry,
            charts_config,
        }
    }

    pub async fn list_pids(&self) -> Result<Vec<String>, ChartError> {
        Ok(self.repository.list_pids().await?)
    }

    /// Daily sedentary/light/moderate/vigorous hours.
    pub async fn activity_chart(&self, pid: &str) -> Result<ChartData, ChartError> {
        let days: Vec<DayActivity> =
            parse_records("day activity", self.repository.daily_activity(pid).await?);

        let labels = days.iter().map(|d| format_calendar_date(&d.calendar_date)).collect();
        let mut colors = self.palette_colors();

        let bands: [(&str, &str, fn(&DayActivity) -> f64); 4] = [
            ("sedentary", "Sedentary Time (Hours)", |d| d.inactive_min),
            ("light", "Light Activity (Hours)", |d| d.light_min),
            ("moderate", "Moderate Activity (Hours)", |d| d.moderate_min),
            ("vigorous", "Vigorous Activity (Hours)", |d| d.vigorous_min),
        ];

        let mut chart = ChartData::new(
            "activity",
            format!("Daily Activity - {}", pid),
            ChartKind::Bar,
            Some("hours"),
        )
        .with_labels(labels);

        for (index, (id, name, minutes)) in bands.iter().enumerate() {
            let values = days.iter().map(|d| Some(minutes_to_hours(minutes(d)))).collect();
            chart = chart.with_series(SeriesData::new(
                id,
                name,
                SeriesKind::Bar,
                Some(colors.color_for(id, index)),
                SeriesValues::Aligned(values),
            ));
        }

        self.finish(chart)
    }

    /// Sleep onset and wake-up clock times with efficiency on a second axis.
    pub async fn sleep_chart(&self, pid: &str) -> Result<ChartData, ChartError> {
        let days: Vec<SleepDay> =
            parse_records("sleep day", self.repository.sleep_days(pid).await?);

        let clock = |raw: &Option<String>| raw.as_deref().and_then(clock_to_hours);
        let onset: Vec<Option<f64>> = days.iter().map(|d| clock(&d.sleeponset_ts)).collect();
        let wake: Vec<Option<f64>> = days.iter().map(|d| clock(&d.wakeup_ts)).collect();
        let efficiency = days
            .iter()
            .map(|d| d.sleep_efficiency_after_onset.map(fraction_to_percent))
            .collect();

        let windows: Vec<(Option<f64>, Option<f64>)> =
            onset.iter().copied().zip(wake.iter().copied()).collect();

        let title = format!("Sleep - {}", pid);
        let chart = ChartData::new("sleep", title, ChartKind::Line, Some("hours"))
            .with_labels(days.iter().map(|d| format_long_date(&d.calendar_date)).collect())
            .with_series(
                SeriesData::new(
                    "sleep_onset",
                    "Sleep Onset Time",
                    SeriesKind::Line,
                    Some(Color::new("#4caf50")),
                    SeriesValues::Aligned(onset),
                )
                .on_axis("y"),
            )
            .with_series(
                SeriesData::new(
                    "wakeup",
                    "Wakeup Time",
                    SeriesKind::Line,
                    Some(Color::new("#f44336")),
                    SeriesValues::Aligned(wake),
                )
                .on_axis("y"),
            )
            .with_series(
                SeriesData::new(
                    "sleep_efficiency",
                    "Sleep Efficiency (%)",
                    SeriesKind::Points,
                    Some(Color::new("#2196f3")),
                    SeriesValues::Aligned(efficiency),
                )
                .on_axis("y1"),
            )
            .with_annotations(sleep_duration_lines(&windows));

        self.finish(chart)
    }

    pub async fn wear_time_chart(&self, pid: &str) -> Result<ChartData, ChartError> {
        let days: Vec<WearTimeDay> =
            parse_records("wear time day", self.repository.wear_time(pid).await?);

        let chart = ChartData::new(
            "wear_time",
            format!("Recorded Wear Time - {}", pid),
            ChartKind::Bar,
            Some("hours"),
        )
        .with_labels(days.iter().map(|d| format_calendar_date(&d.calendar_date)).collect())
        .with_series(SeriesData::new(
            "wear_time",
            "Recorded Wear Time (Hours)",
            SeriesKind::Bar,
            Some(Color::new("#4caf50")),
            SeriesValues::Aligned(days.iter().map(|d| Some(d.recorded_wear_time_hrs)).collect()),
        ));

        self.finish(chart)
    }

    /// Sleep hours as bars with sleep efficiency as a line.
    pub async fn sleep_efficiency_chart(&self, pid: &str) -> Result<ChartData, ChartError> {
        let days: Vec<SleepDay> =
            parse_records("sleep hours day", self.repository.sleep_hours_efficiency(pid).await?);

        let chart = ChartData::new(
            "sleep_efficiency",
            format!("Sleep Hours and Efficiency - {}", pid),
            ChartKind::Combined,
            None,
        )
        .with_labels(days.iter().map(|d| format_calendar_date(&d.calendar_date)).collect())
        .with_series(
            SeriesData::new(
                "sleep_hours",
                "Sleep Hours",
                SeriesKind::Bar,
                Some(Color::new("#4caf50")),
                SeriesValues::Aligned(days.iter().map(|d| d.sleep_hours).collect()),
            )
            .on_axis("y1"),
        )
        .with_series(
            SeriesData::new(
                "sleep_efficiency",
                "Sleep Efficiency (%)",
                SeriesKind::Line,
                Some(Color::new("#2196f3")),
                SeriesValues::Aligned(
                    days.iter()
                        .map(|d| d.sleep_efficiency_after_onset.map(fraction_to_percent))
                        .collect(),
                ),
            )
            .on_axis("y2"),
        );

        self.finish(chart)
    }

    pub async fn daily_glucose_chart(&self, pid: &str) -> Result<ChartData, ChartError> {
        let days: Vec<DailyGlucose> =
            parse_records("daily glucose", self.repository.daily_avg_glucose(pid).await?);

        let chart = ChartData::new(
            "daily_glucose",
            format!("Daily Average Glucose - {}", pid),
            ChartKind::Line,
            Some(GLUCOSE_UNIT),
        )
        .with_labels(days.iter().map(|d| format_calendar_date(&d.date)).collect())
        .with_series(SeriesData::new(
            "avg_glucose",
            "Avg Glucose",
            SeriesKind::Line,
            Some(Color::new(GLUCOSE_COLOR)),
            SeriesValues::Aligned(days.iter().map(|d| Some(d.avg_glucose)).collect()),
        ))
        .with_annotations(threshold_lines(&self.charts_config.thresholds()));

        self.finish(chart)
    }

    /// One day of CGM readings with meal markers, postprandial windows and
    /// threshold lines.
    pub async fn glucose_day_chart(&self, pid: &str, date: &str) -> Result<ChartData, ChartError> {
        let day = self.repository.glucose_day(pid, date).await?;
        let window = self.charts_config.postprandial_window_minutes;

        let readings: Vec<CgmReading> = parse_records("cgm reading", day.cgm_data);
        let mut series = convert_each("cgm reading", &readings, CgmReading::to_point);
        if series.is_empty() {
            return Err(ChartError::NoData(format!("{} on {}", pid, date)));
        }
        series.sort_by_key(|p| p.timestamp);

        let food_log: Vec<FoodLogEntry> = parse_records("food log entry", day.food_log_data);
        let meals = convert_each("food log entry", &food_log, |entry| entry.to_meal(window));

        tracing::debug!(
            "Glucose day {} {}: {} readings, {} meals",
            pid,
            date,
            series.len(),
            meals.len()
        );

        let markers = meal_markers(&meals, &series);
        let thresholds = self.charts_config.thresholds();
        let annotations = build_postprandial_annotations(&meals, &series, window, &thresholds);

        let chart = ChartData::new(
            "glucose_day",
            format!("Hourly Glucose Trend - {}", date),
            ChartKind::Line,
            Some(GLUCOSE_UNIT),
        )
        .with_series(SeriesData::new(
            "glucose",
            "Glucose Level",
            SeriesKind::Line,
            Some(Color::new(GLUCOSE_COLOR)),
            SeriesValues::Timed(series),
        ))
        .with_series(SeriesData::new(
            "meals",
            "Meal Markers",
            SeriesKind::Bubble,
            Some(Color::new("rgba(255,99,132,0.7)")),
            SeriesValues::Markers(markers),
        ))
        .with_annotations(annotations);

        self.finish(chart)
    }

    /// Glucose on the union of CGM and accelerometer timestamps, over
    /// activity/sleep background boxes.
    pub async fn reconciliation_chart(
        &self,
        pid: &str,
        date: &str,
    ) -> Result<ChartData, ChartError> {
        let (day, trace) = tokio::try_join!(
            self.repository.glucose_day(pid, date),
            self.repository.activity_sleep_trace(pid, date),
        )?;

        let readings: Vec<CgmReading> = parse_records("cgm reading", day.cgm_data);
        let glucose = convert_each("cgm reading", &readings, CgmReading::to_point);

        let samples: Vec<ActivitySample> = parse_records("activity sample", trace);
        let mut marks: Vec<ActivityMarks> =
            convert_each("activity sample", &samples, ActivitySample::to_marks);
        marks.sort_by_key(|m| m.timestamp);

        let activity_axis: Vec<TimeSeriesPoint> = marks
            .iter()
            .map(|m| TimeSeriesPoint::new(m.timestamp, None))
            .collect();
        let merged: Vec<TimeSeriesPoint> = merge_series(&glucose, &activity_axis)
            .into_iter()
            .map(|p| TimeSeriesPoint::new(p.timestamp, p.value_a))
            .collect();

        let mut chart = ChartData::new(
            "reconciliation",
            format!("Glucose and Activity - {} {}", pid, date),
            ChartKind::Line,
            Some(GLUCOSE_UNIT),
        )
        .with_series(
            SeriesData::new(
                "glucose",
                "Glucose Level",
                SeriesKind::Line,
                Some(Color::new(GLUCOSE_COLOR)),
                SeriesValues::Timed(merged),
            )
            .on_axis("yGlucose")
            .spanning_gaps(),
        )
        .with_annotations(activity_background(&marks));

        chart.legend = ActivityState::ALL
            .iter()
            .map(|state| LegendEntry {
                label: state.label().to_string(),
                color: state.fill(),
            })
            .collect();

        self.finish(chart)
    }

    /// Hypo/hyperglycemia events summed per participant.
    pub async fn glycemic_events(&self) -> Result<GlycemicEventsSummary, ChartError> {
        let metrics = self.repository.cgm_metrics().await?;

        let hypo: Vec<EventRecord> =
            parse_records("hypoglycemia event", metrics.hypoglycemia_events);
        let hyper: Vec<EventRecord> =
            parse_records("hyperglycemia event", metrics.hyperglycemia_events);
        let hypo = aggregate(&hypo);
        let hyper = aggregate(&hyper);

        let mut pids: Vec<String> = hypo.iter().map(|b| b.key.clone()).collect();
        for bucket in &hyper {
            if !pids.contains(&bucket.key) {
                pids.push(bucket.key.clone());
            }
        }

        let align = |buckets: &[AggregatedBucket]| -> Vec<Option<f64>> {
            let totals: HashMap<&str, u64> =
                buckets.iter().map(|b| (b.key.as_str(), b.total)).collect();
            pids.iter()
                .map(|pid| totals.get(pid.as_str()).map(|t| *t as f64))
                .collect()
        };

        let mut colors = self.palette_colors();
        let chart = ChartData::new(
            "glycemic_events",
            "Glycemic Events by Participant",
            ChartKind::Bar,
            Some("events"),
        )
        .with_labels(pids.clone())
            .with_series(SeriesData::new(
                "hypoglycemia",
                "Hypoglycemia Events",
                SeriesKind::Bar,
                Some(colors.color_for("hypoglycemia", 0)),
                SeriesValues::Aligned(align(&hypo)),
            ))
            .with_series(SeriesData::new(
                "hyperglycemia",
                "Hyperglycemia Events",
                SeriesKind::Bar,
                Some(colors.color_for("hyperglycemia", 1)),
                SeriesValues::Aligned(align(&hyper)),
            ));
        let chart = self.finish(chart)?;

        Ok(GlycemicEventsSummary {
            total_hypoglycemia_events: grand_total(&hypo),
            total_hyperglycemia_events: grand_total(&hyper),
            hypoglycemia: hypo,
            hyperglycemia: hyper,
            total_participants: metrics.total_participants,
            chart,
        })
    }

    /// Average and peak glucose lines per participant and day. Series colors
    /// come from the random policy.
    pub async fn daily_peaks_chart(&self) -> Result<ChartData, ChartError> {
        let rows: Vec<DailyPeak> =
            parse_records("daily peak", self.repository.daily_avg_peaks().await?);

        let mut dates: Vec<String> = Vec::new();
        for row in &rows {
            if !dates.contains(&row.date) {
                dates.push(row.date.clone());
            }
        }

        let groups = group_by_key(&rows, |r| r.pid.as_str());
        let mut colors = ColorAssigner::new(
            Vec::new(),
            ColorPolicy::Random,
            self.charts_config.color_seed,
        );

        let aligned = |group: &[&DailyPeak], value: fn(&DailyPeak) -> f64| -> Vec<Option<f64>> {
            dates
                .iter()
                .map(|date| group.iter().find(|r| &r.date == date).map(|r| value(r)))
                .collect()
        };

        let mut chart = ChartData::new(
            "daily_peaks",
            "Daily Glucose Averages and Peaks",
            ChartKind::MultiLine,
            Some(GLUCOSE_UNIT),
        )
        .with_labels(dates.iter().map(|d| format_calendar_date(d)).collect());

        let lines: [(&str, &str, fn(&DailyPeak) -> f64); 2] = [
            ("avg", "Avg Glucose", |r| r.avg_glucose),
            ("peak", "Peak Glucose", |r| r.peak_glucose),
        ];
        let mut index = 0;
        for (prefix, name, value) in lines {
            for (pid, group) in &groups {
                let id = format!("{}_{}", prefix, pid);
                let color = colors.color_for(&id, index);
                index += 1;
                chart = chart.with_series(SeriesData::new(
                    &id,
                    &format!("{} ({})", name, pid),
                    SeriesKind::Line,
                    Some(color),
                    SeriesValues::Aligned(aligned(group, value)),
                ));
            }
        }

        self.finish(chart)
    }

    /// Days with CGM data per participant.
    pub async fn days_worn_chart(&self) -> Result<ChartData, ChartError> {
        let rows: Vec<DaysWorn> = parse_records("days worn", self.repository.days_worn().await?);

        let chart = ChartData::new("days_worn", "Days Worn", ChartKind::Bar, Some("days"))
            .with_labels(rows.iter().map(|r| r.pid.clone()).collect())
            .with_series(SeriesData::new(
                "days_worn",
                "Days Worn",
                SeriesKind::Bar,
                Some(Color::new(GLUCOSE_COLOR)),
                SeriesValues::Aligned(rows.iter().map(|r| Some(r.days_worn)).collect()),
            ));

        self.finish(chart)
    }

    /// Stacked share of readings per glucose band, one bar per participant.
    pub async fn time_in_ranges_chart(&self) -> Result<ChartData, ChartError> {
        let rows: Vec<TimeInRanges> =
            parse_records("time in ranges", self.repository.time_in_ranges().await?);
        let thresholds = self.charts_config.thresholds();

        let mut chart = ChartData::new(
            "time_in_ranges",
            "Time in Ranges by Participant",
            ChartKind::Bar,
            Some("%"),
        )
        .with_labels(rows.iter().map(|r| r.pid.clone()).collect())
        .stacked();

        for band in GlucoseBand::ALL {
            chart = chart.with_series(SeriesData::new(
                band.id(),
                &band.label(&thresholds),
                SeriesKind::Bar,
                Some(band.color()),
                SeriesValues::Aligned(rows.iter().map(|r| r.share(band)).collect()),
            ));
        }

        self.finish(chart)
    }

    /// Accelerometer wear against non-wear days per participant.
    pub async fn wear_vs_nonwear_chart(&self) -> Result<ChartData, ChartError> {
        let rows: Vec<WearNonWear> =
            parse_records("wear/non-wear", self.repository.wear_vs_nonwear().await?);

        let chart = ChartData::new(
            "wear_vs_nonwear",
            "Wear vs Non-Wear Time",
            ChartKind::Bar,
            Some("days"),
        )
        .with_labels(rows.iter().map(|r| r.participant_id.clone()).collect())
        .with_series(SeriesData::new(
            "wear_time",
            "Wear Time (Days)",
            SeriesKind::Bar,
            Some(Color::new("#4caf50")),
            SeriesValues::Aligned(rows.iter().map(|r| r.wear_time_days).collect()),
        ))
        .with_series(SeriesData::new(
            "non_wear_time",
            "Non-Wear Time (Days)",
            SeriesKind::Bar,
            Some(Color::new("#f44336")),
            SeriesValues::Aligned(rows.iter().map(|r| r.non_wear_time_days).collect()),
        ));

        self.finish(chart)
    }

    pub async fn cohort_box_plot(&self, metric: &str) -> Result<ChartData, ChartError> {
        let metric = CohortMetric::parse(metric)
            .ok_or_else(|| ChartError::UnknownMetric(metric.to_string()))?;
        let individuals = self.repository.cohort_individuals(metric).await?;

        let values: Vec<LabeledValue> = individuals
            .iter()
            .enumerate()
            .filter_map(|(idx, record)| match metric.extract(record) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!("Skipping {} individual #{}: {}", metric.endpoint(), idx, e);
                    None
                }
            })
            .collect();

        let stats =
            box_plot(&values).ok_or_else(|| ChartError::NoData(metric.title().to_string()))?;

        let mut chart = ChartData::new(
            metric.endpoint(),
            format!("{} Box Plot with Individual Data Points", metric.title()),
            ChartKind::BoxPlot,
            Some(metric.unit()),
        );
        chart.box_plots.push(BoxPlotSeries {
            name: format!("{} Distribution", metric.title()),
            color: Color::new("rgba(7,40,89,0.5)"),
            stats,
            points: values,
        });

        self.finish(chart)
    }

    /// Box plots of sampled placeholder data; a seed makes samples and the
    /// colors past the end of the palette reproducible.
    pub fn placeholder_box_plots(&self, seed: Option<u64>) -> Result<Vec<ChartData>, ChartError> {
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let ids = placeholder_participant_ids(PLACEHOLDER_COHORT_SIZE);
        let mut colors = ColorAssigner::new(
            self.charts_config.palette.clone(),
            ColorPolicy::PaletteThenRandom,
            seed.or(self.charts_config.color_seed),
        );

        PLACEHOLDER_METRICS
            .iter()
            .enumerate()
            .map(|(index, metric)| {
                let samples = normal_samples(&mut rng, metric.mean, metric.std_dev, ids.len());
                let points: Vec<LabeledValue> = ids
                    .iter()
                    .zip(samples)
                    .map(|(id, value)| LabeledValue::new(id.as_str(), value))
                    .collect();
                let stats =
                    box_plot(&points).ok_or_else(|| ChartError::NoData(metric.id.to_string()))?;

                let mut chart =
                    ChartData::new(metric.id, metric.title, ChartKind::BoxPlot, Some(metric.unit));
                chart.box_plots.push(BoxPlotSeries {
                    name: format!("{} Distribution", metric.title),
                    color: colors.color_for(metric.id, index),
                    stats,
                    points,
                });
                self.finish(chart)
            })
            .collect()
    }

    /// Fixed series colors; deterministic palette policy.
    fn palette_colors(&self) -> ColorAssigner {
        ColorAssigner::new(
            self.charts_config.palette.clone(),
            ColorPolicy::Palette,
            self.charts_config.color_seed,
        )
    }

    fn finish(&self, chart: ChartData) -> Result<ChartData, ChartError> {
        self.registry.ensure(&chart)?;

        let empty = chart.series.iter().filter(|s| s.values.is_empty()).count();
        tracing::debug!(
            "Built {} chart: {} series ({} empty), {} points",
            chart.id,
            chart.series.len(),
            empty,
            chart.point_count()
        );
        Ok(chart)
    }
}

/// Convert parsed records, skipping (and logging) the ones that fail.
fn convert_each<R, T>(
    kind: &str,
    records: &[R],
    convert: impl Fn(&R) -> Result<T, RecordError>,
) -> Vec<T> {
    records
        .iter()
        .enumerate()
        .filter_map(|(idx, record)| match convert(record) {
            Ok(item) => Some(item),
            Err(e) => {
                tracing::warn!("Skipping {} #{}: {}", kind, idx, e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::study_repository::fake::InMemoryStudyRepository;
    use crate::domain::annotation::{AnnotationKind, AnnotationRange};
    use crate::domain::study::{CgmMetrics, GlucoseDay};
    use serde_json::json;

    fn service(repo: InMemoryStudyRepository) -> ChartService {
        let config = ChartsConfig {
            color_seed: Some(9),
            ..ChartsConfig::default()
        };
        ChartService::new(Arc::new(repo), Arc::new(ChartRegistry::standard()), config)
    }

    fn glucose_day() -> GlucoseDay {
        GlucoseDay {
            cgm_data: vec![
                json!({"timestamp": "2024-05-01T08:00:00", "glucose_level": 95.0}),
                json!({"timestamp": "2024-05-01T08:30:00", "glucose_level": 150.0}),
                json!({"timestamp": "not-a-time", "glucose_level": 400.0}),
                json!({"timestamp": "2024-05-01T09:15:00", "glucose_level": 130.0}),
                json!({"timestamp": "2024-05-01T12:00:00", "glucose_level": 100.0}),
            ],
            food_log_data: vec![
                json!({
                    "meal_timestamp": "2024-05-01T08:00:00",
                    "raw_data": "toast",
                    "calories": 250
                }),
                json!({"meal_timestamp": "2024-05-01T08:30:00", "raw_data": "coffee"}),
                json!({"raw_data": "no time"}),
            ],
        }
    }

    #[tokio::test]
    async fn test_glucose_day_chart() {
        let mut repo = InMemoryStudyRepository::default();
        repo.glucose_days.insert("WW001/2024-05-01".to_string(), glucose_day());

        let chart = service(repo).glucose_day_chart("WW001", "2024-05-01").await.unwrap();

        assert_eq!(chart.title, "Hourly Glucose Trend - 2024-05-01");
        assert_eq!(chart.series[0].values.len(), 4);
        assert_eq!(chart.series[1].values.len(), 2);

        let boxes: Vec<_> = chart
            .annotations
            .iter()
            .filter(|a| a.kind == AnnotationKind::Box)
            .collect();
        assert_eq!(boxes.len(), 2);
        assert_eq!(
            boxes[0].label,
            "Postprandial Period\nAvg: 125.0 mg/dL, Peak: 150 mg/dL"
        );
        assert_eq!(chart.annotations.len(), 4);
        assert_eq!(chart.annotations[3].range, AnnotationRange::At(180.0));
    }

    #[tokio::test]
    async fn test_glucose_day_without_readings_is_no_data() {
        let result = service(InMemoryStudyRepository::default())
            .glucose_day_chart("WW001", "2024-05-02")
            .await;
        assert!(matches!(result, Err(ChartError::NoData(_))));
    }

    #[tokio::test]
    async fn test_reconciliation_chart_merges_timestamps() {
        let mut repo = InMemoryStudyRepository::default().with_records(
            "trace/WW001/2024-05-01",
            vec![
                json!({"timestamp": "2024-05-01T08:00:00", "sleep": 0, "sedentary": 1}),
                json!({"timestamp": "2024-05-01T08:15:00", "light": 1}),
                json!({"timestamp": "bad"}),
            ],
        );
        repo.glucose_days.insert("WW001/2024-05-01".to_string(), glucose_day());

        let chart = service(repo).reconciliation_chart("WW001", "2024-05-01").await.unwrap();

        // 08:00, 08:15, 08:30, 09:15, 12:00
        match &chart.series[0].values {
            SeriesValues::Timed(points) => {
                assert_eq!(points.len(), 5);
                assert_eq!(points[1].value, None);
                assert_eq!(points[2].value, Some(150.0));
            }
            other => panic!("unexpected values: {:?}", other),
        }
        assert!(chart.series[0].span_gaps);
        assert_eq!(chart.annotations.len(), 2);
        assert_eq!(chart.legend.len(), 4);
    }

    #[tokio::test]
    async fn test_glycemic_events_aggregates_per_pid() {
        let repo = InMemoryStudyRepository {
            cgm_metrics: CgmMetrics {
                hypoglycemia_events: vec![
                    json!({"pid": "WW002", "events": 3, "percentage": 10.0}),
                    json!({"pid": "WW001", "events": 1}),
                    json!({"pid": "WW002", "events": 2, "percentage": 5.0}),
                    json!({"pid": "WW003", "events": "many"}),
                ],
                hyperglycemia_events: vec![json!({"pid": "WW004", "events": 7})],
                total_participants: Some(4),
            },
            ..Default::default()
        };

        let summary = service(repo).glycemic_events().await.unwrap();

        assert_eq!(summary.hypoglycemia.len(), 2);
        assert_eq!(summary.hypoglycemia[0].key, "WW002");
        assert_eq!(summary.hypoglycemia[0].total, 5);
        assert_eq!(summary.hypoglycemia[0].percentage, Some(5.0));
        assert_eq!(summary.total_hypoglycemia_events, 6);
        assert_eq!(summary.total_hyperglycemia_events, 7);
        assert_eq!(
            summary.chart.x_labels,
            Some(vec!["WW002".to_string(), "WW001".to_string(), "WW004".to_string()])
        );
        assert_eq!(
            summary.chart.series[1].values,
            SeriesValues::Aligned(vec![None, None, Some(7.0)])
        );
    }

    #[tokio::test]
    async fn test_activity_chart_converts_minutes() {
        let repo = InMemoryStudyRepository::default().with_records(
            "activity/WW001",
            vec![json!({
                "calendar_date": "2024-05-01",
                "dur_day_total_IN_min": 600.0,
                "dur_day_total_LIG_min": 90.0,
                "dur_day_total_MOD_min": 30.0,
                "dur_day_total_VIG_min": 0.0
            })],
        );

        let chart = service(repo).activity_chart("WW001").await.unwrap();

        assert_eq!(chart.x_labels, Some(vec!["2024-05-01".to_string()]));
        assert_eq!(chart.series.len(), 4);
        assert_eq!(chart.series[0].values, SeriesValues::Aligned(vec![Some(10.0)]));
        assert_eq!(chart.series[1].values, SeriesValues::Aligned(vec![Some(1.5)]));
        assert_eq!(chart.series[0].color, Some(Color::new("#ff6384")));
        assert_eq!(chart.series[3].color, Some(Color::new("#4bc0c0")));
    }

    #[tokio::test]
    async fn test_sleep_chart_lines_and_efficiency() {
        let repo = InMemoryStudyRepository::default().with_records(
            "sleep/WW001",
            vec![
                json!({"calendar_date": "2024-05-01", "sleeponset_ts": "22:30:00",
                       "wakeup_ts": "06:15:00", "sleep_efficiency_after_onset": 0.5}),
                json!({"calendar_date": "2024-05-02", "sleeponset_ts": null,
                       "wakeup_ts": "07:00:00"}),
            ],
        );

        let chart = service(repo).sleep_chart("WW001").await.unwrap();

        assert_eq!(
            chart.x_labels,
            Some(vec!["May 01, 2024".to_string(), "May 02, 2024".to_string()])
        );
        assert_eq!(chart.series[2].values, SeriesValues::Aligned(vec![Some(50.0), None]));
        assert_eq!(chart.annotations.len(), 1);
    }

    #[tokio::test]
    async fn test_daily_peaks_chart_groups_by_pid() {
        let repo = InMemoryStudyRepository::default().with_records(
            "daily-peaks",
            vec![
                json!({
                    "pid": "WW001",
                    "date": "2024-05-01",
                    "avg_glucose": 110.0,
                    "peak_glucose": 160.0
                }),
                json!({
                    "pid": "WW002",
                    "date": "2024-05-02",
                    "avg_glucose": 120.0,
                    "peak_glucose": 170.0
                }),
                json!({
                    "pid": "WW001",
                    "date": "2024-05-02",
                    "avg_glucose": 105.0,
                    "peak_glucose": 150.0
                }),
            ],
        );

        let first = service(repo).daily_peaks_chart().await.unwrap();

        let names: Vec<&str> = first.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Avg Glucose (WW001)",
                "Avg Glucose (WW002)",
                "Peak Glucose (WW001)",
                "Peak Glucose (WW002)"
            ]
        );
        assert_eq!(
            first.series[1].values,
            SeriesValues::Aligned(vec![None, Some(120.0)])
        );
        assert!(first.series.iter().all(|s| s.color.is_some()));
    }

    #[tokio::test]
    async fn test_cohort_box_plot() {
        let repo = InMemoryStudyRepository::default().with_records(
            "wear-time-boxplot",
            vec![
                json!({"pid": "WW001", "wearTime_overall": 6.0}),
                json!({"pid": "WW002", "wearTime_overall": 7.0}),
                json!({"pid": "WW003"}),
                json!({"pid": "WW004", "wearTime_overall": 5.0}),
            ],
        );
        let service = service(repo);

        let chart = service.cohort_box_plot("wear-time").await.unwrap();
        let plot = &chart.box_plots[0];
        assert_eq!(plot.stats.count, 3);
        assert_eq!(plot.stats.median, 5.0);
        assert_eq!(plot.points.len(), 3);

        assert!(matches!(
            service.cohort_box_plot("steps").await,
            Err(ChartError::UnknownMetric(_))
        ));
        assert!(matches!(
            service.cohort_box_plot("file-size").await,
            Err(ChartError::NoData(_))
        ));
    }

    #[test]
    fn test_placeholder_box_plots_seeded() {
        let service = service(InMemoryStudyRepository::default());

        let first = service.placeholder_box_plots(Some(5)).unwrap();
        let second = service.placeholder_box_plots(Some(5)).unwrap();

        assert_eq!(first.len(), 6);
        assert_eq!(first, second);
        assert_eq!(first[0].box_plots[0].points[0].label, "WW001");
        assert_eq!(first[0].box_plots[0].stats.count, 100);
    }

    #[test]
    fn test_placeholder_colors_fall_back_to_random_past_palette() {
        let config = ChartsConfig {
            palette: vec![Color::new("#111111"), Color::new("#222222")],
            ..ChartsConfig::default()
        };
        let service = ChartService::new(
            Arc::new(InMemoryStudyRepository::default()),
            Arc::new(ChartRegistry::standard()),
            config,
        );

        let first = service.placeholder_box_plots(Some(3)).unwrap();
        let second = service.placeholder_box_plots(Some(3)).unwrap();
        let colors: Vec<&str> = first.iter().map(|c| c.box_plots[0].color.as_str()).collect();

        assert_eq!(colors[0], "#111111");
        assert_eq!(colors[1], "#222222");
        for color in &colors[2..] {
            assert_eq!(color.len(), 7);
            assert!(color.starts_with('#'));
            assert!(color[1..].chars().all(|c| c.is_ascii_hexdigit()));
        }
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_glucose_day_chart_orders_readings_by_time() {
        let mut repo = InMemoryStudyRepository::default();
        repo.glucose_days.insert(
            "WW001/2024-05-01".to_string(),
            GlucoseDay {
                cgm_data: vec![
                    json!({"timestamp": "2024-05-01T12:00:00", "glucose_level": 100.0}),
                    json!({"timestamp": "2024-05-01T08:00:00", "glucose_level": 95.0}),
                    json!({"timestamp": "2024-05-01T09:15:00", "glucose_level": 130.0}),
                ],
                food_log_data: Vec::new(),
            },
        );

        let chart = service(repo).glucose_day_chart("WW001", "2024-05-01").await.unwrap();

        match &chart.series[0].values {
            SeriesValues::Timed(points) => {
                let values: Vec<_> = points.iter().map(|p| p.value).collect();
                assert_eq!(values, vec![Some(95.0), Some(130.0), Some(100.0)]);
                assert!(points.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
            }
            other => panic!("unexpected values: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_days_worn_chart() {
        let repo = InMemoryStudyRepository::default().with_records(
            "days-worn",
            vec![
                json!({"pid": "WW001", "days_worn": 14}),
                json!({"pid": "WW002", "days_worn": "9"}),
                json!({"days_worn": 3}),
            ],
        );

        let chart = service(repo).days_worn_chart().await.unwrap();

        assert_eq!(chart.kind, ChartKind::Bar);
        assert_eq!(chart.x_labels, Some(vec!["WW001".to_string(), "WW002".to_string()]));
        assert_eq!(chart.series[0].values, SeriesValues::Aligned(vec![Some(14.0), Some(9.0)]));
        assert!(!chart.stacked);
    }

    #[tokio::test]
    async fn test_time_in_ranges_chart_stacks_bands() {
        let repo = InMemoryStudyRepository::default().with_records(
            "time-in-ranges",
            vec![
                json!({
                    "pid": "WW001",
                    "very_high": "1.5",
                    "high": "18.25",
                    "target": "75.0",
                    "low": "4.0",
                    "very_low": "1.25"
                }),
                json!({"pid": "WW002", "target": 100}),
            ],
        );

        let chart = service(repo).time_in_ranges_chart().await.unwrap();

        assert!(chart.stacked);
        assert_eq!(chart.unit.as_deref(), Some("%"));
        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Very High (>250 mg/dL)",
                "High (180-250 mg/dL)",
                "Target (70-180 mg/dL)",
                "Low (54-70 mg/dL)",
                "Very Low (<54 mg/dL)",
            ]
        );
        assert_eq!(chart.series[1].values, SeriesValues::Aligned(vec![Some(18.25), None]));
        assert_eq!(chart.series[2].values, SeriesValues::Aligned(vec![Some(75.0), Some(100.0)]));
    }

    #[tokio::test]
    async fn test_wear_vs_nonwear_chart() {
        let repo = InMemoryStudyRepository::default().with_records(
            "wear-vs-nonwear",
            vec![
                json!({
                    "participant_id": "WW001",
                    "wear_time_days": 12.5,
                    "non_wear_time_days": 1.5
                }),
                json!({"pid": "WW002", "wear_time_days": "10"}),
            ],
        );

        let chart = service(repo).wear_vs_nonwear_chart().await.unwrap();

        assert_eq!(chart.x_labels, Some(vec!["WW001".to_string(), "WW002".to_string()]));
        assert_eq!(chart.series[0].color, Some(Color::new("#4caf50")));
        assert_eq!(chart.series[0].values, SeriesValues::Aligned(vec![Some(12.5), Some(10.0)]));
        assert_eq!(chart.series[1].values, SeriesValues::Aligned(vec![Some(1.5), None]));
    }

    #[tokio::test]
    async fn test_upstream_failure() {
        let repo = InMemoryStudyRepository {
            fail: true,
            ..Default::default()
        };
        let result = service(repo).wear_time_chart("WW001").await;
        assert!(matches!(result, Err(ChartError::Upstream(_))));
    }

    #[tokio::test]
    async fn test_empty_records_yield_empty_chart() {
        let chart = service(InMemoryStudyRepository::default())
            .daily_glucose_chart("WW001")
            .await
            .unwrap();
        assert_eq!(chart.x_labels, Some(Vec::new()));
        assert!(chart.series[0].values.is_empty());
        assert_eq!(chart.annotations.len(), 2);
    }
}
