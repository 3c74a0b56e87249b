// Repository trait for study backend access
use crate::domain::study::{CgmMetrics, CohortMetric, GlucoseDay};
use async_trait::async_trait;
use serde_json::Value;

/// Upstream study data. Record lists are returned unparsed so callers can
/// skip malformed entries one by one.
#[async_trait]
pub trait StudyRepository: Send + Sync {
    /// List all participant identifiers
    async fn list_pids(&self) -> anyhow::Result<Vec<String>>;

    /// Daily activity summary rows for a participant
    async fn daily_activity(&self, pid: &str) -> anyhow::Result<Vec<Value>>;

    async fn sleep_days(&self, pid: &str) -> anyhow::Result<Vec<Value>>;

    async fn wear_time(&self, pid: &str) -> anyhow::Result<Vec<Value>>;

    /// Sleep hours and efficiency per night
    async fn sleep_hours_efficiency(&self, pid: &str) -> anyhow::Result<Vec<Value>>;

    async fn daily_avg_glucose(&self, pid: &str) -> anyhow::Result<Vec<Value>>;

    /// CGM readings and food log for one calendar day
    async fn glucose_day(&self, pid: &str, date: &str) -> anyhow::Result<GlucoseDay>;

    /// Accelerometer activity/sleep epochs for one calendar day
    async fn activity_sleep_trace(&self, pid: &str, date: &str) -> anyhow::Result<Vec<Value>>;

    async fn cgm_metrics(&self) -> anyhow::Result<CgmMetrics>;

    /// Per-participant daily glucose averages and peaks
    async fn daily_avg_peaks(&self) -> anyhow::Result<Vec<Value>>;

    /// Per-participant values behind a cohort box plot
    async fn cohort_individuals(&self, metric: CohortMetric) -> anyhow::Result<Vec<Value>>;

    /// Distinct CGM days per participant
    async fn days_worn(&self) -> anyhow::Result<Vec<Value>>;

    /// Percent of CGM readings per glucose band, per participant
    async fn time_in_ranges(&self) -> anyhow::Result<Vec<Value>>;

    async fn wear_vs_nonwear(&self) -> anyhow::Result<Vec<Value>>;
}

#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::HashMap;

    /// Canned responses keyed by `"<endpoint>"` or `"<endpoint>/<pid>"`.
    #[derive(Default)]
    pub struct InMemoryStudyRepository {
        pub pids: Vec<String>,
        pub records: HashMap<String, Vec<Value>>,
        pub glucose_days: HashMap<String, GlucoseDay>,
        pub cgm_metrics: CgmMetrics,
        pub fail: bool,
    }

    impl InMemoryStudyRepository {
        pub fn with_records(mut self, key: &str, records: Vec<Value>) -> Self {
            self.records.insert(key.to_string(), records);
            self
        }

        fn lookup(&self, key: String) -> anyhow::Result<Vec<Value>> {
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(self.records.get(&key).cloned().unwrap_or_default())
        }
    }

    #[async_trait]
    impl StudyRepository for InMemoryStudyRepository {
        async fn list_pids(&self) -> anyhow::Result<Vec<String>> {
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(self.pids.clone())
        }

        async fn daily_activity(&self, pid: &str) -> anyhow::Result<Vec<Value>> {
            self.lookup(format!("activity/{}", pid))
        }

        async fn sleep_days(&self, pid: &str) -> anyhow::Result<Vec<Value>> {
            self.lookup(format!("sleep/{}", pid))
        }

        async fn wear_time(&self, pid: &str) -> anyhow::Result<Vec<Value>> {
            self.lookup(format!("wear-time/{}", pid))
        }

        async fn sleep_hours_efficiency(&self, pid: &str) -> anyhow::Result<Vec<Value>> {
            self.lookup(format!("sleep-hours/{}", pid))
        }

        async fn daily_avg_glucose(&self, pid: &str) -> anyhow::Result<Vec<Value>> {
            self.lookup(format!("daily-glucose/{}", pid))
        }

        async fn glucose_day(&self, pid: &str, date: &str) -> anyhow::Result<GlucoseDay> {
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(self
                .glucose_days
                .get(&format!("{}/{}", pid, date))
                .cloned()
                .unwrap_or_default())
        }

        async fn activity_sleep_trace(&self, pid: &str, date: &str) -> anyhow::Result<Vec<Value>> {
            self.lookup(format!("trace/{}/{}", pid, date))
        }

        async fn cgm_metrics(&self) -> anyhow::Result<CgmMetrics> {
            if self.fail {
                anyhow::bail!("backend unavailable");
            }
            Ok(self.cgm_metrics.clone())
        }

        async fn daily_avg_peaks(&self) -> anyhow::Result<Vec<Value>> {
            self.lookup("daily-peaks".to_string())
        }

        async fn cohort_individuals(&self, metric: CohortMetric) -> anyhow::Result<Vec<Value>> {
            self.lookup(metric.endpoint().to_string())
        }

        async fn days_worn(&self) -> anyhow::Result<Vec<Value>> {
            self.lookup("days-worn".to_string())
        }

        async fn time_in_ranges(&self) -> anyhow::Result<Vec<Value>> {
            self.lookup("time-in-ranges".to_string())
        }

        async fn wear_vs_nonwear(&self) -> anyhow::Result<Vec<Value>> {
            self.lookup("wear-vs-nonwear".to_string())
        }
    }
}
