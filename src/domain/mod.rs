// Domain layer - Study records and the chart-data transformation pipeline
pub mod aggregation;
pub mod annotation;
pub mod chart;
pub mod color;
pub mod format;
pub mod normalize;
pub mod records;
pub mod sampling;
pub mod statistics;
pub mod study;
