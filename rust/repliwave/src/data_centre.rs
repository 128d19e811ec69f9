use std::collections::BTreeMap;
use tracing::{
    info,
    instrument,
};

use crate::dataset::{
    Dataset,
    same_bin_size,
};
use crate::errors::{
    DataProcessingError,
    Result,
};
use crate::models::{
    Peak,
    RegionResponse,
    RegionStats,
    TimingDomain,
};
use crate::timing_domains::TimingDomainStore;
use crate::wavelet::kernel_width_bins;

/// Every loaded dataset, the chromosome size table and the timing domains.
///
/// Queries name their dataset explicitly. The active dataset is only a
/// convenience default for front ends.
#[derive(Debug, Clone)]
pub struct DataCentre {
    datasets: BTreeMap<String, Dataset>,
    dataset_names: Vec<String>,
    bin_size_kb: f64,
    chromosome_sizes_kb: BTreeMap<String, f64>,
    active_dataset: String,
    timing: TimingDomainStore,
}

impl DataCentre {
    /// Datasets keep their given order. The first one becomes active and
    /// fixes the bin size all others must share.
    pub fn new(
        datasets: Vec<Dataset>,
        chromosome_sizes_kb: BTreeMap<String, f64>,
        timing: TimingDomainStore,
    ) -> Result<Self> {
        let first = datasets
            .first()
            .ok_or(DataProcessingError::ExpectedNonEmptyData)?;
        let bin_size_kb = first.bin_size_kb();
        let active_dataset = first.name().to_string();

        let mut dataset_names = Vec::with_capacity(datasets.len());
        let mut by_name = BTreeMap::new();
        for dataset in datasets {
            if !same_bin_size(bin_size_kb, dataset.bin_size_kb()) {
                return Err(DataProcessingError::InconsistentBinSize {
                    dataset: dataset.name().to_string(),
                    expected_kb: bin_size_kb,
                    found_kb: dataset.bin_size_kb(),
                }
                .into());
            }
            let name = dataset.name().to_string();
            if by_name.insert(name.clone(), dataset).is_some() {
                return Err(DataProcessingError::DuplicateDataset(name).into());
            }
            dataset_names.push(name);
        }

        info!(
            "Data centre holds {} datasets over {} chromosomes, bin size {} kb",
            dataset_names.len(),
            chromosome_sizes_kb.len(),
            bin_size_kb
        );

        Ok(Self {
            datasets: by_name,
            dataset_names,
            bin_size_kb,
            chromosome_sizes_kb,
            active_dataset,
            timing,
        })
    }

    pub fn with_timing_domains(mut self, timing: TimingDomainStore) -> Self {
        self.timing = timing;
        self
    }

    pub fn dataset_names(&self) -> &[String] {
        &self.dataset_names
    }

    pub fn dataset(&self, name: &str) -> Result<&Dataset> {
        self.datasets
            .get(name)
            .ok_or_else(|| DataProcessingError::UnknownDataset(name.to_string()).into())
    }

    pub fn dataset_mut(&mut self, name: &str) -> Result<&mut Dataset> {
        self.datasets
            .get_mut(name)
            .ok_or_else(|| DataProcessingError::UnknownDataset(name.to_string()).into())
    }

    pub fn active_dataset_name(&self) -> &str {
        &self.active_dataset
    }

    pub fn set_active_dataset(&mut self, name: &str) -> Result<()> {
        self.dataset(name)?;
        self.active_dataset = name.to_string();
        Ok(())
    }

    pub fn bin_size_kb(&self) -> f64 {
        self.bin_size_kb
    }

    pub fn chromosome_size_kb(&self, chromosome: &str) -> Option<f64> {
        self.chromosome_sizes_kb.get(chromosome).copied()
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.chromosome_sizes_kb.keys().map(|k| k.as_str())
    }

    pub fn timing_domains(&self) -> &TimingDomainStore {
        &self.timing
    }

    pub fn kernel_width_bins(&self, peak_width_kb: f64) -> usize {
        kernel_width_bins(peak_width_kb, self.bin_size_kb)
    }

    /// Fills the caches of `dataset` for a wavelet peak width.
    pub fn ensure_peak_width(&mut self, dataset: &str, peak_width_kb: f64) -> Result<usize> {
        let width_bins = self.kernel_width_bins(peak_width_kb);
        self.dataset_mut(dataset)?.ensure_width(width_bins)?;
        Ok(width_bins)
    }

    pub fn region_values(&self, dataset: &str, chromosome: &str, start_kb: f64, end_kb: f64) -> Result<&[f64]> {
        Ok(self.dataset(dataset)?.region_values(chromosome, start_kb, end_kb))
    }

    pub fn region_stats(
        &self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
    ) -> Result<RegionStats> {
        Ok(self.dataset(dataset)?.region_stats(chromosome, start_kb, end_kb))
    }

    /// Convolution response over a region for one wavelet peak width.
    ///
    /// `None` when the region does not map onto at least two bins of the
    /// chromosome.
    #[instrument(skip(self))]
    pub fn analyse_region(
        &mut self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        peak_width_kb: f64,
    ) -> Result<Option<RegionResponse>> {
        let width_bins = self.ensure_peak_width(dataset, peak_width_kb)?;
        self.cached_region_response(dataset, chromosome, start_kb, end_kb, width_bins)
    }

    /// Like [`Self::analyse_region`] but never computes, `None` when the width
    /// is not cached yet.
    pub fn cached_region_response(
        &self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        kernel_width_bins: usize,
    ) -> Result<Option<RegionResponse>> {
        let dataset = self.dataset(dataset)?;
        let (Some(response), Some(track)) = (
            dataset.cached_response(kernel_width_bins, chromosome),
            dataset.track(chromosome),
        ) else {
            return Ok(None);
        };

        let len = response.len() as f64;
        let start_bin = (start_kb / self.bin_size_kb).trunc();
        if !(start_bin >= 0.0 && start_bin < len - 1.0) {
            return Ok(None);
        }
        let end_bin = (end_kb / self.bin_size_kb).trunc();
        if !(end_bin > start_bin && end_bin < len) {
            return Ok(None);
        }
        let range = start_bin as usize..=end_bin as usize;
        Ok(Some(RegionResponse {
            positions_kb: track.midpoints_kb()[range.clone()].to_vec(),
            response: response[range].to_vec(),
        }))
    }

    /// Peaks of `chromosome` positioned inside `[start_kb, end_kb]`, empty
    /// for a chromosome outside the size table.
    pub fn peaks_in_region(
        &mut self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        peak_width_kb: f64,
    ) -> Result<Vec<Peak>> {
        let width_bins = self.ensure_peak_width(dataset, peak_width_kb)?;
        self.cached_peaks_in_region(dataset, chromosome, start_kb, end_kb, width_bins)
    }

    pub fn cached_peaks_in_region(
        &self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        kernel_width_bins: usize,
    ) -> Result<Vec<Peak>> {
        if !self.chromosome_sizes_kb.contains_key(chromosome) {
            return Ok(Vec::new());
        }
        let peaks = self
            .dataset(dataset)?
            .cached_peaks(kernel_width_bins)
            .unwrap_or(&[]);
        Ok(peaks
            .iter()
            .filter(|p| {
                p.chromosome == chromosome
                    && p.peak_position_kb >= start_kb
                    && p.peak_position_kb <= end_kb
            })
            .cloned()
            .collect())
    }

    pub fn peaks_in_timing_domains(
        &mut self,
        dataset: &str,
        domains: &[TimingDomain],
        peak_width_kb: f64,
    ) -> Result<Vec<Peak>> {
        let width_bins = self.ensure_peak_width(dataset, peak_width_kb)?;
        let mut peaks = Vec::new();
        for domain in domains {
            peaks.extend(self.cached_peaks_in_region(
                dataset,
                &domain.chromosome,
                domain.start_kb(),
                domain.end_kb(),
                width_bins,
            )?);
        }
        Ok(peaks)
    }

    pub fn peak_heights_in_region(
        &mut self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        peak_width_kb: f64,
    ) -> Result<Vec<f64>> {
        Ok(self
            .peaks_in_region(dataset, chromosome, start_kb, end_kb, peak_width_kb)?
            .iter()
            .map(|p| p.peak_height)
            .collect())
    }

    pub fn peak_heights_in_timing_domains(
        &mut self,
        dataset: &str,
        domains: &[TimingDomain],
        peak_width_kb: f64,
    ) -> Result<Vec<f64>> {
        Ok(self
            .peaks_in_timing_domains(dataset, domains, peak_width_kb)?
            .iter()
            .map(|p| p.peak_height)
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{
        DomainType,
        SignalTrack,
    };
    use crate::timing_domains::ChromosomeDomains;

    pub(crate) const BIN_KB: f64 = 10.0;

    /// Sum of Gaussian bumps `(centre_bin, height, sigma_bins)` on a flat
    /// background.
    pub(crate) fn bumps(len: usize, background: f64, bumps: &[(f64, f64, f64)]) -> Vec<f64> {
        (0..len)
            .map(|i| {
                let x = i as f64;
                background
                    + bumps
                        .iter()
                        .map(|(c, h, s)| h * (-(x - c) * (x - c) / (2.0 * s * s)).exp())
                        .sum::<f64>()
            })
            .collect()
    }

    pub(crate) fn track(dataset: &str, chromosome: &str, values: Vec<f64>) -> SignalTrack {
        let midpoints = (0..values.len())
            .map(|i| BIN_KB / 2.0 + BIN_KB * i as f64)
            .collect();
        SignalTrack::new(chromosome, dataset, midpoints, values).unwrap()
    }

    pub(crate) fn early_domain(chromosome: &str, len_bins: usize) -> TimingDomain {
        TimingDomain {
            chromosome: chromosome.to_string(),
            start_bp: 0,
            end_bp: (len_bins as f64 * BIN_KB * 1000.0) as u64,
            domain_type: DomainType::Early,
        }
    }

    pub(crate) fn timing_store(domains: Vec<TimingDomain>) -> TimingDomainStore {
        let mut by_chromosome: BTreeMap<String, ChromosomeDomains> = BTreeMap::new();
        for d in domains {
            by_chromosome.entry(d.chromosome.clone()).or_default().push(d);
        }
        TimingDomainStore::new(by_chromosome, BTreeMap::new(), (BIN_KB * 1000.0) as u64)
    }

    /// One dataset per `(name, chromosome tracks)`, every chromosome covered by
    /// a single early domain.
    pub(crate) fn centre(datasets: Vec<(&str, Vec<(&str, Vec<f64>)>)>) -> DataCentre {
        let mut sizes = BTreeMap::new();
        let mut domains = Vec::new();
        let mut built = Vec::new();
        for (name, chromosomes) in datasets {
            let mut tracks = Vec::new();
            for (chromosome, values) in chromosomes {
                if !sizes.contains_key(chromosome) {
                    sizes.insert(chromosome.to_string(), values.len() as f64 * BIN_KB);
                    domains.push(early_domain(chromosome, values.len()));
                }
                tracks.push(track(name, chromosome, values));
            }
            built.push(Dataset::new(name, tracks).unwrap());
        }
        DataCentre::new(built, sizes, timing_store(domains)).unwrap()
    }

    #[test]
    fn test_new_validates_datasets() {
        let a = Dataset::new("a", vec![track("a", "chr1", vec![0.0; 10])]).unwrap();
        let b = Dataset::new(
            "b",
            vec![SignalTrack::new("chr1", "b", vec![0.0, 50.0], vec![0.0, 0.0]).unwrap()],
        )
        .unwrap();
        assert!(DataCentre::new(vec![a.clone(), b], BTreeMap::new(), TimingDomainStore::default()).is_err());
        assert!(DataCentre::new(vec![a.clone(), a], BTreeMap::new(), TimingDomainStore::default()).is_err());
        assert!(DataCentre::new(vec![], BTreeMap::new(), TimingDomainStore::default()).is_err());
    }

    #[test]
    fn test_active_dataset() {
        let mut dc = centre(vec![
            ("a", vec![("chr1", vec![0.0; 10])]),
            ("b", vec![("chr1", vec![1.0; 10])]),
        ]);
        assert_eq!(dc.active_dataset_name(), "a");
        dc.set_active_dataset("b").unwrap();
        assert_eq!(dc.active_dataset_name(), "b");
        assert!(dc.set_active_dataset("zzz").is_err());
        assert_eq!(dc.active_dataset_name(), "b");
        assert_eq!(dc.dataset_names(), &["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_analyse_region_bounds() {
        let mut dc = centre(vec![("a", vec![("chr1", bumps(100, 0.0, &[(50.0, 5.0, 4.0)]))])]);
        let width = 100.0;

        let r = dc.analyse_region("a", "chr1", 200.0, 400.0, width).unwrap().unwrap();
        assert_eq!(r.response.len(), 21);
        assert_eq!(r.positions_kb[0], 205.0);

        assert!(dc.analyse_region("a", "chr1", -10.0, 400.0, width).unwrap().is_none());
        assert!(dc.analyse_region("a", "chr1", 990.0, 999.0, width).unwrap().is_none());
        assert!(dc.analyse_region("a", "chr1", 400.0, 400.0, width).unwrap().is_none());
        assert!(dc.analyse_region("a", "chr1", 400.0, 1000.0, width).unwrap().is_none());
        assert!(dc.analyse_region("a", "chr1", 400.0, 995.0, width).unwrap().is_some());
        assert!(dc.analyse_region("a", "chr9", 0.0, 100.0, width).unwrap().is_none());
        assert!(dc.analyse_region("nope", "chr1", 0.0, 100.0, width).is_err());
    }

    #[test]
    fn test_peaks_in_region_and_domains() {
        let mut dc = centre(vec![(
            "a",
            vec![
                ("chr1", bumps(200, 0.0, &[(60.0, 5.0, 4.0), (140.0, 5.0, 4.0)])),
                ("chr2", bumps(200, 0.0, &[(100.0, 5.0, 4.0)])),
            ],
        )]);
        let width = 100.0;
        let chr1 = dc.peaks_in_region("a", "chr1", 500.0, 700.0, width).unwrap();
        assert_eq!(chr1.len(), 1);
        assert_eq!(chr1[0].peak_position_kb, 600.0);

        assert!(dc.peaks_in_region("a", "chr3", 0.0, 2000.0, width).unwrap().is_empty());

        let (early, _) = dc.timing_domains().all_domains();
        let heights = dc.peak_heights_in_timing_domains("a", &early, width).unwrap();
        let strong = heights.iter().filter(|h| **h > 0.1).count();
        assert_eq!(strong, 3);
    }
}
