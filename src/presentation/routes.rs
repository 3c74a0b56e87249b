// Router assembly
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::*;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/pids", get(list_pids))
        .route("/participants/:pid/activity", get(activity_chart))
        .route("/participants/:pid/sleep", get(sleep_chart))
        .route("/participants/:pid/wear-time", get(wear_time_chart))
        .route("/participants/:pid/sleep-efficiency", get(sleep_efficiency_chart))
        .route("/participants/:pid/daily-glucose", get(daily_glucose_chart))
        .route("/participants/:pid/glucose/:date", get(glucose_day_chart))
        .route("/participants/:pid/reconciliation/:date", get(reconciliation_chart))
        .route("/cohort/glycemic-events", get(glycemic_events))
        .route("/cohort/daily-peaks", get(daily_peaks_chart))
        .route("/cohort/days-worn", get(days_worn_chart))
        .route("/cohort/time-in-ranges", get(time_in_ranges_chart))
        .route("/cohort/wear-vs-nonwear", get(wear_vs_nonwear_chart))
        .route("/cohort/boxplots/:metric", get(cohort_box_plot))
        .route("/cohort/placeholder-boxplots", get(placeholder_box_plots))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
