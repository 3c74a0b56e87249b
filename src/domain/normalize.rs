// Merge irregular series onto a shared timestamp axis
use super::records::{Timestamp, TimeSeriesPoint};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MergedPoint {
    pub timestamp: Timestamp,
    pub value_a: Option<f64>,
    pub value_b: Option<f64>,
}

/// Union of both timestamp sets, ascending; a value is `None` wherever its
/// series has no sample at exactly that timestamp. No interpolation.
pub fn merge_series(
    series_a: &[TimeSeriesPoint],
    series_b: &[TimeSeriesPoint],
) -> Vec<MergedPoint> {
    let lookup_a = index_by_timestamp(series_a);
    let lookup_b = index_by_timestamp(series_b);

    let axis: BTreeSet<Timestamp> = lookup_a.keys().chain(lookup_b.keys()).copied().collect();

    axis.into_iter()
        .map(|timestamp| MergedPoint {
            timestamp,
            value_a: lookup_a.get(&timestamp).copied().flatten(),
            value_b: lookup_b.get(&timestamp).copied().flatten(),
        })
        .collect()
}

// First sample wins when a series repeats a timestamp.
fn index_by_timestamp(series: &[TimeSeriesPoint]) -> BTreeMap<Timestamp, Option<f64>> {
    let mut lookup = BTreeMap::new();
    for point in series {
        lookup.entry(point.timestamp).or_insert(point.value);
    }
    lookup
}
