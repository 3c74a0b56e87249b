use crate::domain::chart::ChartKind;

#[derive(Debug, thiserror::Error)]
pub enum ChartError {
    #[error("no data available for {0}")]
    NoData(String),

    #[error("chart kind {0:?} is not registered")]
    UnsupportedChart(ChartKind),

    #[error("annotation layer is not registered")]
    AnnotationsDisabled,

    #[error("unknown metric: {0}")]
    UnknownMetric(String),

    #[error("study backend request failed: {0:#}")]
    Upstream(#[from] anyhow::Error),
}
