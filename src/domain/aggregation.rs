// Event aggregation keyed by participant
use super::records::{AggregatedBucket, EventRecord};
use std::collections::HashMap;

/// Sum event counts per key, keeping buckets in first-seen key order.
///
/// A repeated key adds to `total` but its percentage is replaced by the
/// latest record's, even when that record has none; percentages are never
/// summed.
pub fn aggregate(events: &[EventRecord]) -> Vec<AggregatedBucket> {
    let mut buckets: Vec<AggregatedBucket> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for event in events {
        match positions.get(event.key.as_str()) {
            Some(&pos) => {
                let bucket = &mut buckets[pos];
                bucket.total += event.count;
                bucket.percentage = event.percentage;
            }
            None => {
                positions.insert(event.key.as_str(), buckets.len());
                buckets.push(AggregatedBucket {
                    key: event.key.clone(),
                    total: event.count,
                    percentage: event.percentage,
                });
            }
        }
    }

    buckets
}

pub fn grand_total(buckets: &[AggregatedBucket]) -> u64 {
    buckets.iter().map(|b| b.total).sum()
}

/// Group records by a string key, preserving first-seen key order.
pub fn group_by_key<'a, T, F>(records: &'a [T], key_fn: F) -> Vec<(String, Vec<&'a T>)>
where
    F: Fn(&T) -> &str,
{
    let mut groups: Vec<(String, Vec<&'a T>)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for record in records {
        let key = key_fn(record);
        match positions.get(key) {
            Some(&pos) => groups[pos].1.push(record),
            None => {
                positions.insert(key.to_string(), groups.len());
                groups.push((key.to_string(), vec![record]));
            }
        }
    }

    groups
}
