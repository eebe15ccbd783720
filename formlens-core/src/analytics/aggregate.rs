//! Aggregation of numeric groups.
//!
//! ## Percentile index
//!
//! `p90` returns the element at index `ceil(n * 0.9) - 1` of the ascending
//! sort, clamped to `[0, n - 1]`. The ceiling is computed in integer
//! arithmetic so that sizes like `n = 10` land on index 8 exactly.

use crate::types::{Aggregation, Strength};

/// Spread above this share of the overall average is a strong pattern.
const STRONG_PATTERN_RATIO: f64 = 0.3;
/// Spread above this share of the overall average is some pattern.
const SOME_PATTERN_RATIO: f64 = 0.1;

/// Aggregate a list of values. Returns `None` for an empty list.
pub fn aggregate(values: &[f64], mode: Aggregation) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let result = match mode {
        Aggregation::Mean => mean(values),
        Aggregation::Median => median(values),
        Aggregation::P90 => p90(values),
    };
    Some(result)
}

/// Arithmetic mean. Callers guarantee a non-empty slice.
pub fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    sorted
}

fn median(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    let n = sorted.len();
    if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    }
}

/// Index of the 90th percentile element in a sorted list of length `n`.
pub fn p90_index(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let ceil = (n * 9 + 9) / 10;
    ceil.saturating_sub(1).min(n - 1)
}

fn p90(values: &[f64]) -> f64 {
    let sorted = sorted(values);
    sorted[p90_index(sorted.len())]
}

/// Rate how pronounced the differences between chart values are.
///
/// The spread is `max - min` over `values`, compared against `overall_avg`.
pub fn rate_strength(values: &[f64], overall_avg: f64) -> Strength {
    if values.is_empty() {
        return Strength::NoClearPattern;
    }
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let spread = max - min;

    if spread > STRONG_PATTERN_RATIO * overall_avg {
        Strength::Strong
    } else if spread > SOME_PATTERN_RATIO * overall_avg {
        Strength::SomePattern
    } else {
        Strength::NoClearPattern
    }
}
