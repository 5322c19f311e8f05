//! Column statistics
//!
//! Read-only reductions over one event column of a finished matrix:
//! descriptive summary, mode, and how many users share each count.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::table::EventMatrix;

/// Descriptive statistics for one column.
///
/// Quartiles use linear interpolation between closest ranks; `std` is the
/// sample standard deviation and is absent for fewer than two values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<u64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub median: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<u64>,
}

/// Summarize a column of counts
pub fn describe(values: &[u64]) -> ColumnSummary {
    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let count = sorted.len();
    let mean = (count > 0).then(|| sorted.iter().map(|&v| v as f64).sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|m| {
        let ss: f64 = sorted.iter().map(|&v| (v as f64 - m).powi(2)).sum();
        (ss / (count - 1) as f64).sqrt()
    });

    ColumnSummary {
        count,
        mean,
        std,
        min: sorted.first().copied(),
        q25: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Summarize every event column, in column order
pub fn describe_matrix(matrix: &EventMatrix) -> IndexMap<String, ColumnSummary> {
    matrix
        .events()
        .iter()
        .filter_map(|event| {
            matrix
                .column(event)
                .map(|column| (event.clone(), describe(&column.counts())))
        })
        .collect()
}

/// Quantile `q` (0..=1) of an ascending slice, linearly interpolated
pub fn quantile(sorted: &[u64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    let (a, b) = (sorted[lo] as f64, sorted[hi] as f64);
    Some(a + (b - a) * frac)
}

/// Most frequent values, ascending; empty input has no mode
pub fn mode(values: &[u64]) -> Vec<u64> {
    let counts = value_counts(values);
    let Some(&top) = counts.values().max() else {
        return Vec::new();
    };
    counts
        .into_iter()
        .filter(|(_, n)| *n == top)
        .map(|(v, _)| v)
        .collect()
}

/// Number of users per distinct count value
pub fn value_counts(values: &[u64]) -> BTreeMap<u64, usize> {
    let mut counts = BTreeMap::new();
    for &v in values {
        *counts.entry(v).or_insert(0) += 1;
    }
    counts
}
