use serde::Serialize;
use tracing::{
    debug,
    info,
};

use crate::config::AnalysisConfig;
use crate::data_centre::DataCentre;
use crate::errors::Result;
use crate::models::{
    Peak,
    Valley,
};
use crate::utils::MeanStdev;

/// Signal inside each persistent valley at one time point, as a percentage
/// of the mean maximum signal of its two flanking peaks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValleySignals {
    pub dataset: String,
    pub mean_percent_of_flanks: Vec<f64>,
    pub min_percent_of_flanks: Vec<f64>,
}

impl ValleySignals {
    pub fn mean_summary(&self) -> MeanStdev {
        MeanStdev::from_values(&self.mean_percent_of_flanks)
    }

    pub fn min_summary(&self) -> MeanStdev {
        MeanStdev::from_values(&self.min_percent_of_flanks)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValleySignalSeries {
    pub valleys_at_first_time_point: usize,
    /// Valleys whose flanking peaks are found at every time point.
    pub persistent_valleys: Vec<Valley>,
    pub time_points: Vec<ValleySignals>,
}

impl DataCentre {
    /// First peak within `position_error_kb` of `position_kb` in each named
    /// dataset. Unknown datasets are skipped.
    pub fn all_peaks_at_position(
        &mut self,
        datasets: &[String],
        chromosome: &str,
        position_kb: f64,
        position_error_kb: f64,
        peak_width_kb: f64,
    ) -> Result<Vec<Option<Peak>>> {
        let width_bins = self.kernel_width_bins(peak_width_kb);
        let mut found = Vec::with_capacity(datasets.len());
        for name in datasets {
            let Ok(dataset) = self.dataset_mut(name) else {
                debug!("Skipping unknown dataset {}", name);
                continue;
            };
            let peak = dataset.peak_at_position(chromosome, position_kb, position_error_kb, width_bins)?;
            found.push(peak.cloned());
        }
        Ok(found)
    }

    /// Neighbouring peak pairs of every early domain that still leave a gap
    /// once both flanks grow by `edge_offset_kb`.
    pub fn all_valleys(&mut self, dataset: &str, peak_width_kb: f64, edge_offset_kb: f64) -> Result<Vec<Valley>> {
        let early = self.timing_domains().early_domains();
        let mut valleys = Vec::new();
        for domain in &early {
            let peaks = self.peaks_in_region(
                dataset,
                &domain.chromosome,
                domain.start_kb(),
                domain.end_kb(),
                peak_width_kb,
            )?;
            for pair in peaks.windows(2) {
                let valley = Valley {
                    left: pair[0].clone(),
                    right: pair[1].clone(),
                };
                let (left_edge, right_edge) = valley.edges_kb(edge_offset_kb);
                if left_edge < right_edge {
                    valleys.push(valley);
                }
            }
        }
        Ok(valleys)
    }

    /// Follows the valleys of the first time point through the whole time
    /// series. Valley edges are fixed at the first time point.
    pub fn valley_signal_series(&mut self, config: &AnalysisConfig) -> Result<ValleySignalSeries> {
        let time_series = &config.time_series;
        for name in time_series {
            self.dataset(name)?;
        }
        let Some(first) = time_series.first() else {
            return Ok(ValleySignalSeries {
                valleys_at_first_time_point: 0,
                persistent_valleys: Vec::new(),
                time_points: Vec::new(),
            });
        };

        let width = config.wavelet_peak_width_kb;
        let offset = config.fork_elongation_offset_kb;
        let error = config.peak_position_error_kb;
        let candidates = self.all_valleys(first, width, offset)?;

        let mut time_points: Vec<ValleySignals> = time_series
            .iter()
            .map(|name| ValleySignals {
                dataset: name.clone(),
                mean_percent_of_flanks: Vec::new(),
                min_percent_of_flanks: Vec::new(),
            })
            .collect();
        let mut persistent = Vec::new();

        for valley in &candidates {
            let chromosome = &valley.left.chromosome;
            let lefts: Option<Vec<Peak>> = self
                .all_peaks_at_position(time_series, chromosome, valley.left.peak_position_kb, error, width)?
                .into_iter()
                .collect();
            let rights: Option<Vec<Peak>> = self
                .all_peaks_at_position(time_series, chromosome, valley.right.peak_position_kb, error, width)?
                .into_iter()
                .collect();
            let (Some(lefts), Some(rights)) = (lefts, rights) else {
                continue;
            };

            let (start_kb, end_kb) = valley.edges_kb(offset);
            for ((signals, left), right) in time_points.iter_mut().zip(&lefts).zip(&rights) {
                let stats = self.region_stats(&signals.dataset, chromosome, start_kb, end_kb)?;
                let flank_max = (left.max_signal + right.max_signal) / 2.0;
                signals.mean_percent_of_flanks.push(stats.mean * 100.0 / flank_max);
                signals.min_percent_of_flanks.push(stats.min * 100.0 / flank_max);
            }
            persistent.push(valley.clone());
        }

        info!(
            "{} of {} valleys persist across {} time points",
            persistent.len(),
            candidates.len(),
            time_series.len()
        );
        Ok(ValleySignalSeries {
            valleys_at_first_time_point: candidates.len(),
            persistent_valleys: persistent,
            time_points,
        })
    }
}
