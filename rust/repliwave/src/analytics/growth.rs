use rayon::prelude::*;
use serde::Serialize;
use tabled::Tabled;
use tracing::{
    debug,
    info,
    instrument,
};

use crate::config::{
    AnalysisConfig,
    WidthSearch,
};
use crate::data_centre::DataCentre;
use crate::errors::{
    DataProcessingError,
    Result,
};
use crate::models::{
    PeakPosition,
    PeakRegion,
};
use crate::utils::MeanStdev;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GrowthMethod {
    /// Wavelet width with the strongest response.
    Wavelet,
    /// FWHM of a fitted Gaussian.
    Gaussian,
}

/// Widths of one peak across the time series, `None` when any time point
/// fell outside the accepted width range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSeries {
    pub region: PeakRegion,
    pub widths_kb: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct GrowthSummaryRow {
    pub label: String,
    pub mean_kb: f64,
    pub stdev_kb: f64,
    pub n: usize,
}

/// Mean widths per time point and mean increases between time points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthSummary {
    pub widths: Vec<MeanStdev>,
    /// Increase from time point `i` to `i + 1`.
    pub successive_increases: Vec<MeanStdev>,
    /// Increase from the first to the last time point.
    pub overall_increase: MeanStdev,
}

impl GrowthSummary {
    pub fn from_series(series: &[GrowthSeries]) -> Self {
        let complete: Vec<&Vec<f64>> = series.iter().filter_map(|s| s.widths_kb.as_ref()).collect();
        let time_points = complete.iter().map(|w| w.len()).max().unwrap_or(0);

        let widths = (0..time_points)
            .map(|i| column_stats(&complete, |w| w.get(i).copied()))
            .collect();
        let successive_increases = (1..time_points)
            .map(|i| column_stats(&complete, |w| Some(w.get(i)? - w.get(i - 1)?)))
            .collect();
        let overall_increase = column_stats(&complete, |w| Some(w.last()? - w.first()?));

        Self {
            widths,
            successive_increases,
            overall_increase,
        }
    }

    pub fn rows(&self, labels: &[String]) -> Vec<GrowthSummaryRow> {
        let label = |i: usize| labels.get(i).cloned().unwrap_or_else(|| format!("t{}", i));
        let mut rows: Vec<GrowthSummaryRow> = self
            .widths
            .iter()
            .enumerate()
            .map(|(i, s)| GrowthSummaryRow {
                label: label(i),
                mean_kb: s.mean,
                stdev_kb: s.stdev,
                n: s.n,
            })
            .collect();
        rows.extend(self.successive_increases.iter().enumerate().map(|(i, s)| {
            GrowthSummaryRow {
                label: format!("{} -> {}", label(i), label(i + 1)),
                mean_kb: s.mean,
                stdev_kb: s.stdev,
                n: s.n,
            }
        }));
        rows.push(GrowthSummaryRow {
            label: "overall".to_string(),
            mean_kb: self.overall_increase.mean,
            stdev_kb: self.overall_increase.stdev,
            n: self.overall_increase.n,
        });
        rows
    }
}

fn column_stats<F>(series: &[&Vec<f64>], value: F) -> MeanStdev
where
    F: Fn(&[f64]) -> Option<f64>,
{
    let values: Vec<f64> = series.iter().filter_map(|w| value(w.as_slice())).collect();
    MeanStdev::from_values(&values)
}

impl DataCentre {
    /// Peak width in the search range whose response over the region is
    /// strongest, with the position of that response. `(0, 0)` when the
    /// region is invalid.
    pub fn optimal_width(
        &mut self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        search: &WidthSearch,
    ) -> Result<(f64, f64)> {
        for width_kb in search.widths_kb() {
            self.ensure_peak_width(dataset, width_kb)?;
        }
        self.cached_optimal_width(dataset, chromosome, start_kb, end_kb, search)
    }

    /// [`Self::optimal_width`] over already cached widths only. Fails when a
    /// search width was never cached for `dataset`.
    pub fn cached_optimal_width(
        &self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        search: &WidthSearch,
    ) -> Result<(f64, f64)> {
        let mut best: Option<(f64, f64, f64)> = None;
        for width_kb in search.widths_kb() {
            let width_bins = self.kernel_width_bins(width_kb);
            if !self.dataset(dataset)?.is_cached(width_bins) {
                return Err(DataProcessingError::UncachedWidth {
                    dataset: dataset.to_string(),
                    kernel_width_bins: width_bins,
                }
                .into());
            }
            let Some(region) = self.cached_region_response(dataset, chromosome, start_kb, end_kb, width_bins)? else {
                return Ok((0.0, 0.0));
            };
            let Some((value, position_kb)) = region.max_with_position() else {
                return Ok((0.0, 0.0));
            };
            if best.is_none_or(|(best_value, _, _)| value > best_value) {
                best = Some((value, width_kb, position_kb));
            }
        }
        Ok(best.map_or((0.0, 0.0), |(_, width_kb, position_kb)| (width_kb, position_kb)))
    }

    /// Caches every width the searches of [`GrowthMethod::Wavelet`] need on
    /// every time-series dataset, so that per-peak work only reads.
    #[instrument(skip(self, config))]
    pub fn prepare_growth(&mut self, method: GrowthMethod, config: &AnalysisConfig) -> Result<()> {
        for dataset in &config.time_series {
            self.dataset(dataset)?;
            if method == GrowthMethod::Wavelet {
                for width_kb in config.width_search.widths_kb() {
                    self.ensure_peak_width(dataset, width_kb)?;
                }
            }
        }
        info!(
            "Prepared {:?} growth over {} time points",
            method,
            config.time_series.len()
        );
        Ok(())
    }

    /// Widths of one peak at every time point. Needs [`Self::prepare_growth`]
    /// for the wavelet method.
    pub fn peak_growth<P: PeakPosition>(
        &self,
        peak: &P,
        method: GrowthMethod,
        config: &AnalysisConfig,
    ) -> Result<GrowthSeries> {
        let search = &config.width_search;
        let chromosome_end = self.chromosome_size_kb(peak.chromosome()).unwrap_or(f64::INFINITY);
        let search_kb = config.wavelet_peak_width_kb;
        let start_kb = (peak.start_kb() - search_kb).max(0.0);
        let end_kb = (peak.end_kb() + search_kb).min(chromosome_end);

        let mut widths = Vec::with_capacity(config.time_series.len());
        for dataset in &config.time_series {
            let width_kb = match method {
                GrowthMethod::Wavelet => {
                    self.cached_optimal_width(dataset, peak.chromosome(), start_kb, end_kb, search)?
                        .0
                }
                GrowthMethod::Gaussian => self
                    .fit_gaussian(dataset, peak.chromosome(), start_kb, end_kb, &config.gaussian_fit)?
                    .map_or(0.0, |fit| fit.full_width_at_half_max_kb()),
            };
            if !search.accepts(width_kb) {
                debug!(
                    "{}:{}-{} rejected at {} with width {}",
                    peak.chromosome(),
                    peak.start_kb(),
                    peak.end_kb(),
                    dataset,
                    width_kb
                );
                return Ok(GrowthSeries {
                    region: region_of(peak),
                    widths_kb: None,
                });
            }
            widths.push(width_kb);
        }
        Ok(GrowthSeries {
            region: region_of(peak),
            widths_kb: Some(widths),
        })
    }

    /// Growth of every peak across the configured time series, in input
    /// order.
    pub fn peak_growth_series<P: PeakPosition + Sync>(
        &mut self,
        peaks: &[P],
        method: GrowthMethod,
        config: &AnalysisConfig,
    ) -> Result<Vec<GrowthSeries>> {
        self.prepare_growth(method, config)?;
        let centre = &*self;
        let series = peaks
            .par_iter()
            .map(|peak| centre.peak_growth(peak, method, config))
            .collect::<Result<Vec<_>>>()?;
        info!(
            "{} of {} peaks measured at every time point",
            series.iter().filter(|s| s.widths_kb.is_some()).count(),
            series.len()
        );
        Ok(series)
    }

    pub fn peak_growth_wavelet<P: PeakPosition + Sync>(
        &mut self,
        peaks: &[P],
        config: &AnalysisConfig,
    ) -> Result<Vec<GrowthSeries>> {
        self.peak_growth_series(peaks, GrowthMethod::Wavelet, config)
    }

    pub fn peak_growth_gaussian<P: PeakPosition + Sync>(
        &mut self,
        peaks: &[P],
        config: &AnalysisConfig,
    ) -> Result<Vec<GrowthSeries>> {
        self.peak_growth_series(peaks, GrowthMethod::Gaussian, config)
    }
}

fn region_of<P: PeakPosition>(peak: &P) -> PeakRegion {
    PeakRegion {
        chromosome: peak.chromosome().to_string(),
        start_kb: peak.start_kb(),
        end_kb: peak.end_kb(),
    }
}
