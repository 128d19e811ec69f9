use std::collections::BTreeMap;

use crate::models::{
    DomainType,
    TimingDomain,
};

/// Early and late domains of one chromosome, each in genomic order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChromosomeDomains {
    pub early: Vec<TimingDomain>,
    pub late: Vec<TimingDomain>,
}

impl ChromosomeDomains {
    pub fn is_empty(&self) -> bool {
        self.early.is_empty() && self.late.is_empty()
    }

    pub fn push(&mut self, domain: TimingDomain) {
        match domain.domain_type {
            DomainType::Early => self.early.push(domain),
            DomainType::Late => self.late.push(domain),
            DomainType::Ambiguous => {}
        }
    }
}

/// Early/late timing domains and the per-bin timing values they were
/// built from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimingDomainStore {
    domains: BTreeMap<String, ChromosomeDomains>,
    levels: BTreeMap<String, Vec<f64>>,
    bin_size_bp: u64,
}

impl TimingDomainStore {
    pub fn new(
        domains: BTreeMap<String, ChromosomeDomains>,
        levels: BTreeMap<String, Vec<f64>>,
        bin_size_bp: u64,
    ) -> Self {
        Self {
            domains,
            levels,
            bin_size_bp,
        }
    }

    pub fn bin_size_bp(&self) -> u64 {
        self.bin_size_bp
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    pub fn chromosomes(&self) -> impl Iterator<Item = &str> {
        self.domains.keys().map(|k| k.as_str())
    }

    pub fn chromosome_domains(&self, chromosome: &str) -> Option<&ChromosomeDomains> {
        self.domains.get(chromosome)
    }

    pub fn early_domains(&self) -> Vec<TimingDomain> {
        self.domains
            .values()
            .flat_map(|d| d.early.iter().cloned())
            .collect()
    }

    pub fn late_domains(&self) -> Vec<TimingDomain> {
        self.domains
            .values()
            .flat_map(|d| d.late.iter().cloned())
            .collect()
    }

    /// (early, late)
    pub fn all_domains(&self) -> (Vec<TimingDomain>, Vec<TimingDomain>) {
        (self.early_domains(), self.late_domains())
    }

    /// Domains of `domain_type` at least `minimum_size_kb` long. There are no
    /// stored ambiguous domains.
    pub fn domains_matching(&self, domain_type: DomainType, minimum_size_kb: u64) -> Vec<TimingDomain> {
        let minimum_bp = minimum_size_kb * 1000;
        let candidates = match domain_type {
            DomainType::Early => self.early_domains(),
            DomainType::Late => self.late_domains(),
            DomainType::Ambiguous => return Vec::new(),
        };
        candidates
            .into_iter()
            .filter(|d| d.end_bp.saturating_sub(d.start_bp) >= minimum_bp)
            .collect()
    }

    /// Timing values of the bins covering `[start_kb, end_kb]`, zero-padded
    /// past the end of the stored track.
    pub fn timing_levels_in_region(&self, chromosome: &str, start_kb: f64, end_kb: f64) -> Vec<f64> {
        let Some(levels) = self.levels.get(chromosome) else {
            return Vec::new();
        };
        if self.bin_size_bp == 0 || end_kb < start_kb || end_kb < 0.0 {
            return Vec::new();
        }
        let start_bin = (start_kb.max(0.0) * 1000.0) as u64 / self.bin_size_bp;
        let end_bin = (end_kb * 1000.0) as u64 / self.bin_size_bp;
        (start_bin..=end_bin)
            .map(|bin| levels.get(bin as usize).copied().unwrap_or(0.0))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domain(chromosome: &str, start_bp: u64, end_bp: u64, domain_type: DomainType) -> TimingDomain {
        TimingDomain {
            chromosome: chromosome.to_string(),
            start_bp,
            end_bp,
            domain_type,
        }
    }

    fn store() -> TimingDomainStore {
        let mut chr1 = ChromosomeDomains::default();
        chr1.push(domain("chr1", 0, 300_000, DomainType::Early));
        chr1.push(domain("chr1", 300_000, 400_000, DomainType::Late));
        chr1.push(domain("chr1", 400_000, 1_400_000, DomainType::Early));
        let mut domains = BTreeMap::new();
        domains.insert("chr1".to_string(), chr1);
        let mut levels = BTreeMap::new();
        levels.insert("chr1".to_string(), vec![1.0, 2.0, 3.0, -1.0, 0.5]);
        TimingDomainStore::new(domains, levels, 100_000)
    }

    #[test]
    fn test_domains_matching() {
        let s = store();
        assert_eq!(s.domains_matching(DomainType::Early, 0).len(), 2);
        let big = s.domains_matching(DomainType::Early, 500);
        assert_eq!(big.len(), 1);
        assert_eq!(big[0].start_bp, 400_000);
        assert_eq!(s.domains_matching(DomainType::Late, 100).len(), 1);
        assert!(s.domains_matching(DomainType::Ambiguous, 0).is_empty());

        let (early, late) = s.all_domains();
        assert_eq!((early.len(), late.len()), (2, 1));
    }

    #[test]
    fn test_timing_levels_in_region() {
        let s = store();
        assert_eq!(s.timing_levels_in_region("chr1", 100.0, 300.0), vec![2.0, 3.0, -1.0]);
        // Past the end is padded with zeros
        assert_eq!(
            s.timing_levels_in_region("chr1", 300.0, 650.0),
            vec![-1.0, 0.5, 0.0, 0.0]
        );
        assert!(s.timing_levels_in_region("chr2", 0.0, 100.0).is_empty());
        assert!(s.timing_levels_in_region("chr1", 300.0, 100.0).is_empty());
    }
}
