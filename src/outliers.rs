//! IQR outlier detection over numeric samples gathered during the pass.

use std::collections::BTreeMap;

use serde::Serialize;

/// Columns with fewer values than this are not analyzed.
pub const MIN_SAMPLES: usize = 10;
const IQR_FACTOR: f64 = 1.5;

/// Parsed numeric values keyed by raw column index.
pub type NumericSamples = BTreeMap<usize, Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlierReport {
    pub column: String,
    pub count: usize,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub samples: usize,
}

/// Quartiles by plain index into the sorted values, no interpolation.
fn quartiles(sorted: &[f64]) -> (f64, f64) {
    let n = sorted.len();
    (sorted[n / 4], sorted[(3 * n) / 4])
}

/// Reports each column holding values outside `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]`.
///
/// Column names come from `raw_headers` using the sample's raw index.
/// Columns without outliers are left out.
pub fn detect_outliers(samples: &NumericSamples, raw_headers: &[String]) -> Vec<OutlierReport> {
    let mut reports = Vec::new();
    for (&raw_idx, values) in samples {
        if values.len() < MIN_SAMPLES {
            continue;
        }
        let Some(column) = raw_headers.get(raw_idx) else {
            continue;
        };
        let mut sorted = values.clone();
        sorted.sort_by(f64::total_cmp);
        let (q1, q3) = quartiles(&sorted);
        let iqr = q3 - q1;
        let lower_bound = q1 - IQR_FACTOR * iqr;
        let upper_bound = q3 + IQR_FACTOR * iqr;
        let count = sorted
            .iter()
            .filter(|value| **value < lower_bound || **value > upper_bound)
            .count();
        if count > 0 {
            reports.push(OutlierReport {
                column: column.clone(),
                count,
                lower_bound,
                upper_bound,
                samples: sorted.len(),
            });
        }
    }
    reports
}
