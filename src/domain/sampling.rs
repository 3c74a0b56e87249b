// Placeholder distributions for cohort views without backing data
use rand::Rng;
use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaceholderMetric {
    pub id: &'static str,
    pub title: &'static str,
    pub unit: &'static str,
    pub mean: f64,
    pub std_dev: f64,
}

pub const PLACEHOLDER_METRICS: [PlaceholderMetric; 6] = [
    metric("sleep", "Sleep Duration", "hours/day", 7.2, 1.2),
    metric("glucose", "Blood Glucose", "mg/dL", 110.0, 15.0),
    metric("sedentary", "Sedentary Activity", "hours/day", 9.5, 2.0),
    metric("mvpa", "Moderate to Vigorous Physical Activity", "hours/day", 0.8, 0.4),
    metric("wear_time", "Wear Time", "hours/day", 22.0, 3.0),
    metric("calories", "Daily Calories Burned", "cal/day", 2200.0, 300.0),
];

const fn metric(
    id: &'static str,
    title: &'static str,
    unit: &'static str,
    mean: f64,
    std_dev: f64,
) -> PlaceholderMetric {
    PlaceholderMetric {
        id,
        title,
        unit,
        mean,
        std_dev,
    }
}

pub const PLACEHOLDER_COHORT_SIZE: usize = 100;

/// Box–Muller samples from N(mean, std_dev), clamped at zero.
pub fn normal_samples<R: Rng + ?Sized>(
    rng: &mut R,
    mean: f64,
    std_dev: f64,
    count: usize,
) -> Vec<f64> {
    (0..count)
        .map(|_| {
            // gen() is in [0, 1); ln(0) must be avoided
            let u1: f64 = 1.0 - rng.r#gen::<f64>();
            let u2: f64 = rng.r#gen::<f64>();
            let z0 = (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos();
            (mean + std_dev * z0).max(0.0)
        })
        .collect()
}

/// `WW001`, `WW002`, ...
pub fn placeholder_participant_ids(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("WW{:03}", i)).collect()
}
