//! Summary statistics shared by windowing, ingest and the classifier.

use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Arithmetic mean. An empty slice has mean 0.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.mean()
}

/// Sample standard deviation (n - 1 denominator).
///
/// Fewer than two values, or a constant series, yields exactly 0 rather
/// than NaN or a rounding residue.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let Some((&first, rest)) = values.split_first() else {
        return 0.0;
    };
    if rest.is_empty() || rest.iter().all(|&v| v == first) {
        return 0.0;
    }
    values.std_dev()
}

/// Smallest value, or NaN for an empty slice.
pub fn min(values: &[f64]) -> f64 {
    Statistics::min(values)
}

/// Largest value, or NaN for an empty slice.
pub fn max(values: &[f64]) -> f64 {
    Statistics::max(values)
}

/// Most frequent class index. Ties go to the smallest index.
///
/// Returns `None` only for an empty input.
pub fn majority<I>(labels: I) -> Option<i64>
where
    I: IntoIterator<Item = i64>,
{
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }

    // BTreeMap iterates in ascending key order, so a strict comparison
    // keeps the smallest label among equal counts.
    let mut best: Option<(i64, usize)> = None;
    for (label, count) in counts {
        match best {
            Some((_, best_count)) if count <= best_count => {}
            _ => best = Some((label, count)),
        }
    }
    best.map(|(label, _)| label)
}
