// HTTP request handlers
use crate::application::error::ChartError;
use crate::domain::chart::{ChartData, GlycemicEventsSummary};
use crate::presentation::app_state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

type ChartResult<T> = Result<Json<T>, ChartError>;

#[derive(Deserialize)]
pub struct SeedQuery {
    pub seed: Option<u64>,
}

impl IntoResponse for ChartError {
    fn into_response(self) -> Response {
        let status = match &self {
            ChartError::NoData(_) | ChartError::UnknownMetric(_) => StatusCode::NOT_FOUND,
            ChartError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ChartError::UnsupportedChart(_) | ChartError::AnnotationsDisabled => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("Chart request failed: {}", self);
        } else {
            tracing::debug!("Chart request rejected: {}", self);
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// List all participant ids
pub async fn list_pids(State(state): State<Arc<AppState>>) -> ChartResult<Vec<String>> {
    state.chart_service.list_pids().await.map(Json)
}

pub async fn activity_chart(
    Path(pid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ChartResult<ChartData> {
    state.chart_service.activity_chart(&pid).await.map(Json)
}

pub async fn sleep_chart(
    Path(pid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ChartResult<ChartData> {
    state.chart_service.sleep_chart(&pid).await.map(Json)
}

pub async fn wear_time_chart(
    Path(pid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ChartResult<ChartData> {
    state.chart_service.wear_time_chart(&pid).await.map(Json)
}

pub async fn sleep_efficiency_chart(
    Path(pid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ChartResult<ChartData> {
    state.chart_service.sleep_efficiency_chart(&pid).await.map(Json)
}

pub async fn daily_glucose_chart(
    Path(pid): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ChartResult<ChartData> {
    state.chart_service.daily_glucose_chart(&pid).await.map(Json)
}

/// One day of CGM data with postprandial windows
pub async fn glucose_day_chart(
    Path((pid, date)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ChartResult<ChartData> {
    state.chart_service.glucose_day_chart(&pid, &date).await.map(Json)
}

pub async fn reconciliation_chart(
    Path((pid, date)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> ChartResult<ChartData> {
    state.chart_service.reconciliation_chart(&pid, &date).await.map(Json)
}

pub async fn glycemic_events(
    State(state): State<Arc<AppState>>,
) -> ChartResult<GlycemicEventsSummary> {
    state.chart_service.glycemic_events().await.map(Json)
}

pub async fn daily_peaks_chart(State(state): State<Arc<AppState>>) -> ChartResult<ChartData> {
    state.chart_service.daily_peaks_chart().await.map(Json)
}

pub async fn days_worn_chart(State(state): State<Arc<AppState>>) -> ChartResult<ChartData> {
    state.chart_service.days_worn_chart().await.map(Json)
}

pub async fn time_in_ranges_chart(State(state): State<Arc<AppState>>) -> ChartResult<ChartData> {
    state.chart_service.time_in_ranges_chart().await.map(Json)
}

pub async fn wear_vs_nonwear_chart(State(state): State<Arc<AppState>>) -> ChartResult<ChartData> {
    state.chart_service.wear_vs_nonwear_chart().await.map(Json)
}

pub async fn cohort_box_plot(
    Path(metric): Path<String>,
    State(state): State<Arc<AppState>>,
) -> ChartResult<ChartData> {
    state.chart_service.cohort_box_plot(&metric).await.map(Json)
}

/// Sampled placeholder distributions; `?seed=` makes them reproducible
pub async fn placeholder_box_plots(
    Query(query): Query<SeedQuery>,
    State(state): State<Arc<AppState>>,
) -> ChartResult<Vec<ChartData>> {
    state.chart_service.placeholder_box_plots(query.seed).map(Json)
}
