//! Chart capabilities and chart-instance lifetimes.
//!
//! The host registers the chart kinds (and the annotation layer) it can draw
//! once at startup and passes the registry to the services that build chart
//! payloads. Rendered instances live in a [`ChartSlot`], which disposes the
//! previous instance before storing a replacement.

use super::error::ChartError;
use crate::domain::chart::{ChartData, ChartKind};
use std::collections::HashSet;

#[derive(Debug, Clone, Default)]
pub struct ChartRegistry {
    kinds: HashSet<ChartKind>,
    annotations: bool,
}

impl ChartRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every chart kind plus annotations.
    pub fn standard() -> Self {
        [
            ChartKind::Line,
            ChartKind::MultiLine,
            ChartKind::Bar,
            ChartKind::Combined,
            ChartKind::BoxPlot,
        ]
        .into_iter()
        .fold(Self::new(), Self::register)
        .with_annotations()
    }

    pub fn register(mut self, kind: ChartKind) -> Self {
        self.kinds.insert(kind);
        self
    }

    pub fn with_annotations(mut self) -> Self {
        self.annotations = true;
        self
    }

    pub fn supports(&self, kind: ChartKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn ensure(&self, chart: &ChartData) -> Result<(), ChartError> {
        if !self.supports(chart.kind) {
            return Err(ChartError::UnsupportedChart(chart.kind));
        }
        if !chart.annotations.is_empty() && !self.annotations {
            return Err(ChartError::AnnotationsDisabled);
        }
        Ok(())
    }
}

/// A rendered chart instance owned by the host.
pub trait ChartHandle {
    fn close(&mut self);
}

/// Holds at most one open chart; the previous one is closed before a
/// replacement is stored, and the last one is closed on drop.
pub struct ChartSlot<H: ChartHandle> {
    current: Option<H>,
}

impl<H: ChartHandle> ChartSlot<H> {
    pub fn new() -> Self {
        Self { current: None }
    }

    pub fn replace(&mut self, handle: H) {
        self.close();
        self.current = Some(handle);
    }

    pub fn close(&mut self) {
        if let Some(mut handle) = self.current.take() {
            handle.close();
        }
    }

    pub fn get(&self) -> Option<&H> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }
}

impl<H: ChartHandle> Default for ChartSlot<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: ChartHandle> Drop for ChartSlot<H> {
    fn drop(&mut self) {
        self.close();
    }
}
