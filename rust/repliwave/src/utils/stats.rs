use serde::Serialize;

/// Mean and population standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct MeanStdev {
    pub mean: f64,
    pub stdev: f64,
    pub n: usize,
}

impl MeanStdev {
    pub fn from_values(values: &[f64]) -> Self {
        let n = values.len();
        if n == 0 {
            return Self::default();
        }
        let mean = values.iter().sum::<f64>() / n as f64;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
        Self {
            mean,
            stdev: variance.sqrt(),
            n,
        }
    }
}

/// Value at `percentile` of `values` after an ascending sort, picking index
/// `floor((n - 1) * percentile / 100)`.
pub fn percentile_floor(values: &[f64], percentile: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let index = ((sorted.len() - 1) as f64 * percentile / 100.0).floor();
    let index = (index.max(0.0) as usize).min(sorted.len() - 1);
    Some(sorted[index])
}
