use serde::Serialize;
use tracing::{
    info,
    instrument,
    warn,
};

use crate::config::AnalysisConfig;
use crate::data_centre::DataCentre;
use crate::errors::Result;
use crate::models::{
    Peak,
    TimingDomain,
};
use crate::utils::{
    MeanStdev,
    percentile_floor,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DomainPeakCount {
    pub peak_count: usize,
    pub domain_size_kb: f64,
}

/// Early peak heights left over when the cutoff is taken at one percentile
/// of late-domain peak heights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeightSweepPoint {
    pub percentile: u32,
    pub cutoff: f64,
    pub peak_count: usize,
    pub mean_height: Option<f64>,
    pub median_height: Option<f64>,
}

/// True when the flanking signal is below `flank_percent` of the peak's own.
pub fn is_isolated(total_signal: f64, flanking_signal: f64, flank_percent: f64) -> bool {
    total_signal * flank_percent > flanking_signal * 100.0
}

impl DataCentre {
    /// Peaks at least `min_height` high whose flanks, one peak width on
    /// either side, carry less than `flank_percent` of the peak's own signal.
    pub fn isolated_peaks_in_timing_domains(
        &mut self,
        dataset: &str,
        domains: &[TimingDomain],
        min_height: f64,
        peak_width_kb: f64,
        flank_percent: f64,
    ) -> Result<Vec<Peak>> {
        let peaks = self.peaks_in_timing_domains(dataset, domains, peak_width_kb)?;
        let dataset = self.dataset(dataset)?;
        Ok(peaks
            .into_iter()
            .filter(|p| p.peak_height >= min_height)
            .filter(|p| {
                let with_flanks: f64 = dataset
                    .region_values(
                        &p.chromosome,
                        p.start_kb - peak_width_kb,
                        p.end_kb + peak_width_kb,
                    )
                    .iter()
                    .sum();
                is_isolated(p.total_signal, with_flanks - p.total_signal, flank_percent)
            })
            .collect())
    }

    pub fn peaks_per_timing_domain(
        &mut self,
        dataset: &str,
        domains: &[TimingDomain],
        min_height: f64,
        peak_width_kb: f64,
    ) -> Result<Vec<DomainPeakCount>> {
        let mut counts = Vec::with_capacity(domains.len());
        for domain in domains {
            let peak_count = self
                .peaks_in_region(
                    dataset,
                    &domain.chromosome,
                    domain.start_kb(),
                    domain.end_kb(),
                    peak_width_kb,
                )?
                .iter()
                .filter(|p| p.peak_height >= min_height)
                .count();
            counts.push(DomainPeakCount {
                peak_count,
                domain_size_kb: domain.size_kb(),
            });
        }
        Ok(counts)
    }

    pub fn total_signal_per_timing_domain(&self, dataset: &str, domains: &[TimingDomain]) -> Result<Vec<f64>> {
        let dataset = self.dataset(dataset)?;
        Ok(domains
            .iter()
            .map(|d| dataset.region_stats(&d.chromosome, d.start_kb(), d.end_kb()).total)
            .collect())
    }

    /// Distances between consecutive peaks above `min_height`, never across
    /// domain boundaries.
    pub fn peak_separations(
        &mut self,
        dataset: &str,
        domains: &[TimingDomain],
        min_height: f64,
        peak_width_kb: f64,
    ) -> Result<Vec<f64>> {
        let mut separations = Vec::new();
        for domain in domains {
            let mut positions: Vec<f64> = self
                .peaks_in_region(
                    dataset,
                    &domain.chromosome,
                    domain.start_kb(),
                    domain.end_kb(),
                    peak_width_kb,
                )?
                .iter()
                .filter(|p| p.peak_height >= min_height)
                .map(|p| p.peak_position_kb)
                .collect();
            positions.sort_by(|a, b| a.total_cmp(b));
            separations.extend(positions.windows(2).map(|w| w[1] - w[0]));
        }
        Ok(separations)
    }

    /// Peak height at `percentile` of every peak found in late domains.
    /// `None` when late domains hold no peaks.
    pub fn late_domain_height_cutoff(
        &mut self,
        dataset: &str,
        peak_width_kb: f64,
        percentile: f64,
    ) -> Result<Option<f64>> {
        let late = self.timing_domains().late_domains();
        let heights = self.peak_heights_in_timing_domains(dataset, &late, peak_width_kb)?;
        Ok(percentile_floor(&heights, percentile))
    }

    /// Isolated early-domain peaks using the late-domain cutoff, sorted by
    /// chromosome then position.
    #[instrument(skip(self, config))]
    pub fn auto_isolated_peaks(&mut self, dataset: &str, config: &AnalysisConfig) -> Result<Vec<Peak>> {
        let width = config.wavelet_peak_width_kb;
        let cutoff = match self.late_domain_height_cutoff(dataset, width, config.late_peak_percentile)? {
            Some(cutoff) => cutoff,
            None => {
                warn!("No peaks in late domains, isolated peaks are not filtered by height");
                f64::NEG_INFINITY
            }
        };
        let early = self.timing_domains().early_domains();
        let mut peaks = self.isolated_peaks_in_timing_domains(
            dataset,
            &early,
            cutoff,
            width,
            config.isolation_flank_percent,
        )?;
        peaks.sort_by(|a, b| {
            a.chromosome
                .cmp(&b.chromosome)
                .then(a.peak_position_kb.total_cmp(&b.peak_position_kb))
        });
        info!("{} isolated peaks above height {}", peaks.len(), cutoff);
        Ok(peaks)
    }

    /// Early peak counts and heights remaining for every whole percentile of
    /// late-domain heights used as the cutoff.
    pub fn height_cutoff_sweep(&mut self, dataset: &str, peak_width_kb: f64) -> Result<Vec<HeightSweepPoint>> {
        let (early, late) = self.timing_domains().all_domains();
        let mut early_heights = self.peak_heights_in_timing_domains(dataset, &early, peak_width_kb)?;
        early_heights.sort_by(|a, b| a.total_cmp(b));
        let late_heights = self.peak_heights_in_timing_domains(dataset, &late, peak_width_kb)?;

        let mut sweep = Vec::with_capacity(101);
        for percentile in 0..=100u32 {
            let Some(cutoff) = percentile_floor(&late_heights, percentile as f64) else {
                break;
            };
            let kept: Vec<f64> = early_heights
                .iter()
                .copied()
                .filter(|h| *h > cutoff)
                .collect();
            let stats = MeanStdev::from_values(&kept);
            sweep.push(HeightSweepPoint {
                percentile,
                cutoff,
                peak_count: kept.len(),
                mean_height: (!kept.is_empty()).then_some(stats.mean),
                median_height: kept.get(kept.len() / 2).copied(),
            });
        }
        Ok(sweep)
    }
}
