use rayon::prelude::*;
use std::collections::{
    BTreeMap,
    HashMap,
};
use tracing::{
    debug,
    info,
};

use crate::errors::DataProcessingError;
use crate::models::{
    Peak,
    RegionStats,
    SignalTrack,
};
use crate::peak_detection::detect_peaks;
use crate::wavelet::{
    convolve_same,
    dataset_kernel,
};

/// Relative tolerance when comparing bin sizes of different tracks.
pub(crate) const BIN_SIZE_TOLERANCE: f64 = 1e-6;

pub(crate) fn same_bin_size(a: f64, b: f64) -> bool {
    (a - b).abs() <= a.abs().max(b.abs()) * BIN_SIZE_TOLERANCE
}

/// A named set of signal tracks, one per chromosome, plus memoized
/// convolution responses and peaks keyed by kernel width in bins.
///
/// A width is always filled for every chromosome at once. Cached entries are
/// never invalidated since tracks are immutable.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    bin_size_kb: f64,
    tracks: BTreeMap<String, SignalTrack>,
    convolution_cache: HashMap<usize, BTreeMap<String, Vec<f64>>>,
    peak_cache: HashMap<usize, Vec<Peak>>,
}

impl Dataset {
    pub fn new(
        name: impl Into<String>,
        tracks: Vec<SignalTrack>,
    ) -> Result<Self, DataProcessingError> {
        let name = name.into();
        let bin_size_kb = tracks
            .first()
            .map(|t| t.bin_size_kb())
            .ok_or(DataProcessingError::ExpectedNonEmptyData)?;

        let mut by_chromosome = BTreeMap::new();
        for track in tracks {
            if !same_bin_size(bin_size_kb, track.bin_size_kb()) {
                return Err(DataProcessingError::InconsistentBinSize {
                    dataset: name,
                    expected_kb: bin_size_kb,
                    found_kb: track.bin_size_kb(),
                });
            }
            let chromosome = track.chromosome().to_string();
            if by_chromosome.insert(chromosome.clone(), track).is_some() {
                return Err(DataProcessingError::DuplicateTrack {
                    dataset: name,
                    chromosome,
                });
            }
        }

        Ok(Self {
            name,
            bin_size_kb,
            tracks: by_chromosome,
            convolution_cache: HashMap::new(),
            peak_cache: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bin_size_kb(&self) -> f64 {
        self.bin_size_kb
    }

    pub fn track(&self, chromosome: &str) -> Option<&SignalTrack> {
        self.tracks.get(chromosome)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &SignalTrack> {
        self.tracks.values()
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.tracks.keys().map(|k| k.as_str())
    }

    /// Signal bins covering the region, empty for an unknown chromosome.
    pub fn region_values(&self, chromosome: &str, start_kb: f64, end_kb: f64) -> &[f64] {
        match self.tracks.get(chromosome) {
            Some(track) => track.region_values(start_kb, end_kb),
            None => &[],
        }
    }

    pub fn region_stats(&self, chromosome: &str, start_kb: f64, end_kb: f64) -> RegionStats {
        RegionStats::from_values(self.region_values(chromosome, start_kb, end_kb))
    }

    pub fn is_cached(&self, kernel_width_bins: usize) -> bool {
        self.convolution_cache.contains_key(&kernel_width_bins)
            && self.peak_cache.contains_key(&kernel_width_bins)
    }

    /// Convolves every chromosome with the kernel for `kernel_width_bins` and
    /// detects peaks on the results, unless that width is already cached.
    pub fn ensure_width(&mut self, kernel_width_bins: usize) -> Result<(), DataProcessingError> {
        if !self.convolution_cache.contains_key(&kernel_width_bins) {
            let kernel = dataset_kernel(kernel_width_bins);
            let responses = self
                .tracks
                .par_iter()
                .map(|(chromosome, track)| {
                    convolve_same(track.values(), &kernel.y_values)
                        .map(|response| (chromosome.clone(), response))
                })
                .collect::<Result<BTreeMap<String, Vec<f64>>, _>>()?;
            debug!(
                "Dataset {}: convolved {} chromosomes at kernel width {}",
                self.name,
                responses.len(),
                kernel_width_bins
            );
            self.convolution_cache.insert(kernel_width_bins, responses);
        }

        if !self.peak_cache.contains_key(&kernel_width_bins) {
            let responses = &self.convolution_cache[&kernel_width_bins];
            let peaks: Vec<Peak> = self
                .tracks
                .iter()
                .filter_map(|(chromosome, track)| {
                    responses
                        .get(chromosome)
                        .map(|response| detect_peaks(track, response, kernel_width_bins))
                })
                .flatten()
                .collect();
            info!(
                "Dataset {}: {} peaks at kernel width {}",
                self.name,
                peaks.len(),
                kernel_width_bins
            );
            self.peak_cache.insert(kernel_width_bins, peaks);
        }
        Ok(())
    }

    /// Response of one chromosome, computing the width first if needed.
    /// `None` for an unknown chromosome.
    pub fn convolution_response(
        &mut self,
        kernel_width_bins: usize,
        chromosome: &str,
    ) -> Result<Option<&[f64]>, DataProcessingError> {
        self.ensure_width(kernel_width_bins)?;
        Ok(self.cached_response(kernel_width_bins, chromosome))
    }

    pub fn cached_response(&self, kernel_width_bins: usize, chromosome: &str) -> Option<&[f64]> {
        self.convolution_cache
            .get(&kernel_width_bins)
            .and_then(|responses| responses.get(chromosome))
            .map(|r| r.as_slice())
    }

    /// Every peak at `kernel_width_bins`, ordered by chromosome then position.
    pub fn peaks_for_width(
        &mut self,
        kernel_width_bins: usize,
    ) -> Result<&[Peak], DataProcessingError> {
        self.ensure_width(kernel_width_bins)?;
        Ok(self.cached_peaks(kernel_width_bins).unwrap_or(&[]))
    }

    pub fn cached_peaks(&self, kernel_width_bins: usize) -> Option<&[Peak]> {
        self.peak_cache
            .get(&kernel_width_bins)
            .map(|peaks| peaks.as_slice())
    }

    /// First peak on `chromosome` whose position lies within
    /// `max_position_error_kb` of `position_kb`.
    pub fn peak_at_position(
        &mut self,
        chromosome: &str,
        position_kb: f64,
        max_position_error_kb: f64,
        kernel_width_bins: usize,
    ) -> Result<Option<&Peak>, DataProcessingError> {
        let min_kb = position_kb - max_position_error_kb;
        let max_kb = position_kb + max_position_error_kb;
        Ok(self.peaks_for_width(kernel_width_bins)?.iter().find(|p| {
            p.chromosome == chromosome && p.peak_position_kb >= min_kb && p.peak_position_kb <= max_kb
        }))
    }
}
