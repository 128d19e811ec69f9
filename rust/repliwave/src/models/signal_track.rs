use serde::Serialize;

use crate::errors::DataProcessingError;
use crate::models::RegionStats;

/// Relative tolerance used when checking that bins are evenly spaced.
const BIN_SPACING_TOLERANCE: f64 = 1e-6;

/// One dataset's signal along one chromosome, in equally sized bins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalTrack {
    chromosome: String,
    dataset_name: String,
    midpoints_kb: Vec<f64>,
    values: Vec<f64>,
    bin_size_kb: f64,
}

impl SignalTrack {
    pub fn new(
        chromosome: impl Into<String>,
        dataset_name: impl Into<String>,
        midpoints_kb: Vec<f64>,
        values: Vec<f64>,
    ) -> Result<Self, DataProcessingError> {
        if midpoints_kb.len() != values.len() {
            return Err(DataProcessingError::TrackLengthMismatch {
                midpoints: midpoints_kb.len(),
                values: values.len(),
            });
        }
        if midpoints_kb.len() < 2 {
            return Err(DataProcessingError::TooFewBins {
                found: midpoints_kb.len(),
            });
        }

        let bin_size_kb = midpoints_kb[1] - midpoints_kb[0];
        let tolerance = bin_size_kb.abs() * BIN_SPACING_TOLERANCE;
        for (index, pair) in midpoints_kb.windows(2).enumerate() {
            let spacing = pair[1] - pair[0];
            if spacing <= 0.0 || (spacing - bin_size_kb).abs() > tolerance {
                return Err(DataProcessingError::NonUniformBinSpacing {
                    index: index + 1,
                    expected_kb: bin_size_kb,
                    found_kb: spacing,
                });
            }
        }

        Ok(Self {
            chromosome: chromosome.into(),
            dataset_name: dataset_name.into(),
            midpoints_kb,
            values,
            bin_size_kb,
        })
    }

    pub fn chromosome(&self) -> &str {
        &self.chromosome
    }

    pub fn dataset_name(&self) -> &str {
        &self.dataset_name
    }

    pub fn midpoints_kb(&self) -> &[f64] {
        &self.midpoints_kb
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn bin_size_kb(&self) -> f64 {
        self.bin_size_kb
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Inclusive bin slice covering `[start_kb, end_kb]`.
    ///
    /// The start bin is truncated and the end bin rounded up, then both are
    /// clamped to the track. A range that still ends before it starts gives
    /// an empty slice.
    pub fn region_values(&self, start_kb: f64, end_kb: f64) -> &[f64] {
        let last = (self.values.len() - 1) as f64;
        let start_bin = (start_kb / self.bin_size_kb).trunc().max(0.0);
        let end_bin = (end_kb / self.bin_size_kb).ceil().min(last);
        if !(start_bin <= end_bin) {
            return &[];
        }
        &self.values[start_bin as usize..=end_bin as usize]
    }

    pub fn region_stats(&self, start_kb: f64, end_kb: f64) -> RegionStats {
        RegionStats::from_values(self.region_values(start_kb, end_kb))
    }
}
