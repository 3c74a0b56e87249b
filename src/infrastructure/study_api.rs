// Study backend HTTP repository implementation
use crate::application::study_repository::StudyRepository;
use crate::domain::study::{CgmMetrics, CohortMetric, GlucoseDay};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpStudyRepository {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct QaDashboard {
    #[serde(default)]
    daily_avg_peaks: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct BoxPlotEnvelope {
    #[serde(default)]
    individuals: Vec<Value>,
}

impl HttpStudyRepository {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Join percent-encoded path segments onto the base URL.
    fn build_url(&self, segments: &[&str]) -> String {
        let path: Vec<String> = segments
            .iter()
            .map(|s| urlencoding::encode(s).into_owned())
            .collect();
        format!("{}/{}", self.base_url, path.join("/"))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Study backend returned {} for {}: {}", status, url, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url))
    }

    async fn get_data<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.build_url(segments);
        let envelope: DataEnvelope<T> = self.get_json(&url).await?;
        Ok(envelope.data)
    }
}

#[async_trait]
impl StudyRepository for HttpStudyRepository {
    async fn list_pids(&self) -> Result<Vec<String>> {
        self.get_data(&["pids"]).await
    }

    async fn daily_activity(&self, pid: &str) -> Result<Vec<Value>> {
        self.get_data(&["participant", pid]).await
    }

    async fn sleep_days(&self, pid: &str) -> Result<Vec<Value>> {
        self.get_data(&["participant", pid, "sleep-data"]).await
    }

    async fn wear_time(&self, pid: &str) -> Result<Vec<Value>> {
        self.get_data(&["participant", pid, "wear-time"]).await
    }

    async fn sleep_hours_efficiency(&self, pid: &str) -> Result<Vec<Value>> {
        self.get_data(&["participant", pid, "sleep-hours-efficiency"]).await
    }

    async fn daily_avg_glucose(&self, pid: &str) -> Result<Vec<Value>> {
        self.get_data(&["participant", pid, "daily-avg-glucose"]).await
    }

    async fn glucose_day(&self, pid: &str, date: &str) -> Result<GlucoseDay> {
        let url = self.build_url(&["participant", pid, "hourly-glucose", date]);
        self.get_json(&url).await
    }

    async fn activity_sleep_trace(&self, pid: &str, date: &str) -> Result<Vec<Value>> {
        let url = format!(
            "{}?date={}",
            self.build_url(&["participant", pid, "activity-sleep-trace"]),
            urlencoding::encode(date)
        );
        let envelope: DataEnvelope<Vec<Value>> = self.get_json(&url).await?;
        Ok(envelope.data)
    }

    async fn cgm_metrics(&self) -> Result<CgmMetrics> {
        self.get_data(&["cgm-metrics"]).await
    }

    async fn daily_avg_peaks(&self) -> Result<Vec<Value>> {
        let dashboard: QaDashboard = self.get_data(&["qa-dashboard"]).await?;
        Ok(dashboard.daily_avg_peaks)
    }

    async fn cohort_individuals(&self, metric: CohortMetric) -> Result<Vec<Value>> {
        let url = self.build_url(&[metric.endpoint()]);
        let envelope: BoxPlotEnvelope = self.get_json(&url).await?;

        tracing::debug!(
            "Fetched {} individuals for {}",
            envelope.individuals.len(),
            metric.endpoint()
        );
        Ok(envelope.individuals)
    }

    async fn days_worn(&self) -> Result<Vec<Value>> {
        self.get_data(&["days-worn"]).await
    }

    async fn time_in_ranges(&self) -> Result<Vec<Value>> {
        self.get_data(&["participant-time-in-ranges"]).await
    }

    async fn wear_vs_nonwear(&self) -> Result<Vec<Value>> {
        self.get_data(&["wear-vs-nonwear"]).await
    }
}
