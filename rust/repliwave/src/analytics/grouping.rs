use serde::Serialize;
use tabled::Tabled;

use crate::data_centre::DataCentre;
use crate::dataset::Dataset;
use crate::errors::Result;
use crate::models::{
    Peak,
    TimingDomain,
};
use crate::utils::adjacent_value_similarity;

/// Rank orders counted for groups of three, largest peak = 1.
pub const TRIPLET_PATTERNS: [[usize; 3]; 4] = [[1, 2, 3], [1, 3, 2], [2, 1, 3], [3, 1, 2]];

/// Rank orders counted for groups of four.
pub const QUAD_PATTERNS: [[usize; 4]; 12] = [
    [1, 2, 3, 4],
    [1, 2, 4, 3],
    [1, 3, 2, 4],
    [1, 3, 4, 2],
    [1, 4, 2, 3],
    [1, 4, 3, 2],
    [2, 1, 3, 4],
    [2, 1, 4, 3],
    [3, 1, 2, 4],
    [3, 1, 4, 2],
    [4, 1, 2, 3],
    [4, 1, 3, 2],
];

/// How often each rank order and group size occurs among adjacent peak
/// groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RankTally {
    pub triplets: [usize; 4],
    pub quads: [usize; 12],
    /// Entry `i` counts groups of `i + 1` peaks.
    pub group_size_counts: Vec<usize>,
}

impl RankTally {
    pub fn from_sequences(sequences: &[Vec<usize>]) -> Self {
        let mut tally = Self::default();
        let largest = sequences.iter().map(|s| s.len()).max().unwrap_or(0);
        tally.group_size_counts = vec![0; largest];
        for sequence in sequences {
            if let Some(count) = sequence.len().checked_sub(1).and_then(|i| tally.group_size_counts.get_mut(i)) {
                *count += 1;
            }
            match sequence.len() {
                3 => {
                    if let Some(i) = TRIPLET_PATTERNS.iter().position(|p| p[..] == sequence[..]) {
                        tally.triplets[i] += 1;
                    }
                }
                4 => {
                    if let Some(i) = QUAD_PATTERNS.iter().position(|p| p[..] == sequence[..]) {
                        tally.quads[i] += 1;
                    }
                }
                _ => {}
            }
        }
        tally
    }

    pub fn rows(&self) -> Vec<RankPatternRow> {
        let triplets = TRIPLET_PATTERNS
            .iter()
            .zip(self.triplets.iter())
            .map(|(p, c)| (format!("{:?}", p), *c));
        let quads = QUAD_PATTERNS
            .iter()
            .zip(self.quads.iter())
            .map(|(p, c)| (format!("{:?}", p), *c));
        triplets
            .chain(quads)
            .map(|(pattern, count)| RankPatternRow { pattern, count })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct RankPatternRow {
    pub pattern: String,
    pub count: usize,
}

/// Similarity of the local maxima along one group of adjacent peaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupSimilarity {
    pub peak_count: usize,
    pub similarity: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Tabled)]
pub struct SimilaritySummary {
    pub groups: usize,
    pub mean: f64,
    pub median: f64,
}

/// Keeps similarity estimates off the +-1 poles.
const SIMILARITY_CLAMP: f64 = 0.99999;

impl SimilaritySummary {
    /// Summarizes groups with more than `min_peaks_exclusive` peaks. `None`
    /// when no group qualifies.
    pub fn from_groups(groups: &[GroupSimilarity], min_peaks_exclusive: usize) -> Option<Self> {
        let mut values: Vec<f64> = groups
            .iter()
            .filter(|g| g.peak_count > min_peaks_exclusive)
            .map(|g| g.similarity.clamp(-SIMILARITY_CLAMP, SIMILARITY_CLAMP))
            .collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| a.total_cmp(b));
        Some(Self {
            groups: values.len(),
            mean: values.iter().sum::<f64>() / values.len() as f64,
            median: values[values.len() / 2],
        })
    }
}

/// Highest signal within an eighth of the kernel width of the peak position,
/// i.e. half of the peak's positive lobe.
fn local_max_signal(dataset: &Dataset, peak: &Peak) -> f64 {
    let half_width_kb = peak.kernel_width_bins as f64 * peak.bin_size_kb / 8.0;
    dataset
        .region_stats(
            &peak.chromosome,
            peak.peak_position_kb - half_width_kb,
            peak.peak_position_kb + half_width_kb,
        )
        .max
}

impl DataCentre {
    /// Splits the peaks of each domain into runs whose consecutive positions
    /// are at most `max_separation_kb` apart. Groups never cross domains.
    pub fn adjacent_peak_groups(
        &mut self,
        dataset: &str,
        domains: &[TimingDomain],
        peak_width_kb: f64,
        max_separation_kb: f64,
    ) -> Result<Vec<Vec<Peak>>> {
        let mut groups = Vec::new();
        for domain in domains {
            let peaks = self.peaks_in_region(
                dataset,
                &domain.chromosome,
                domain.start_kb(),
                domain.end_kb(),
                peak_width_kb,
            )?;
            let mut group = Vec::new();
            let mut previous_kb = -2.0 * max_separation_kb;
            for peak in peaks {
                if peak.peak_position_kb > previous_kb + max_separation_kb {
                    groups.push(std::mem::take(&mut group));
                }
                previous_kb = peak.peak_position_kb;
                group.push(peak);
            }
            groups.push(group);
        }
        groups.retain(|g| !g.is_empty());
        Ok(groups)
    }

    /// `(left, right)` local maxima of every neighbouring pair in groups of at
    /// least two peaks.
    pub fn neighbouring_peak_heights(&self, dataset: &str, groups: &[Vec<Peak>]) -> Result<Vec<(f64, f64)>> {
        let dataset = self.dataset(dataset)?;
        let mut pairs = Vec::new();
        for group in groups.iter().filter(|g| g.len() >= 2) {
            let maxima: Vec<f64> = group.iter().map(|p| local_max_signal(dataset, p)).collect();
            pairs.extend(maxima.windows(2).map(|w| (w[0], w[1])));
        }
        Ok(pairs)
    }

    /// Size rank of every peak in its group (1 = largest local maximum). A
    /// sequence is reversed when its largest peak lies in the second half, so
    /// groups read from their largest end.
    pub fn size_sequences_of_adjacent_peaks(&self, dataset: &str, groups: &[Vec<Peak>]) -> Result<Vec<Vec<usize>>> {
        let dataset = self.dataset(dataset)?;
        let mut sequences = Vec::with_capacity(groups.len());
        for group in groups {
            let maxima: Vec<f64> = group.iter().map(|p| local_max_signal(dataset, p)).collect();
            let mut order: Vec<usize> = (0..group.len()).collect();
            // Stable, so equal maxima keep their group order
            order.sort_by(|a, b| maxima[*b].total_cmp(&maxima[*a]));

            let mut ranks = vec![0; group.len()];
            for (rank, index) in order.iter().enumerate() {
                ranks[*index] = rank + 1;
            }
            if order.first().is_some_and(|largest| *largest >= group.len() / 2) {
                ranks.reverse();
            }
            sequences.push(ranks);
        }
        Ok(sequences)
    }

    /// One similarity per group of at least three peaks. Groups where the
    /// metric is undefined are skipped.
    pub fn group_similarities(&self, dataset: &str, groups: &[Vec<Peak>]) -> Result<Vec<GroupSimilarity>> {
        let dataset = self.dataset(dataset)?;
        Ok(groups
            .iter()
            .filter(|g| g.len() >= 3)
            .filter_map(|group| {
                let maxima: Vec<f64> = group.iter().map(|p| local_max_signal(dataset, p)).collect();
                let similarity = adjacent_value_similarity(&maxima);
                (!similarity.is_nan()).then_some(GroupSimilarity {
                    peak_count: group.len(),
                    similarity,
                })
            })
            .collect())
    }

    /// Group similarities weighted by group size: each is repeated once per
    /// neighbouring pair.
    pub fn similarity_between_adjacent_peaks(&self, dataset: &str, groups: &[Vec<Peak>]) -> Result<Vec<f64>> {
        Ok(self
            .group_similarities(dataset, groups)?
            .iter()
            .flat_map(|g| std::iter::repeat(g.similarity).take(g.peak_count - 1))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_centre::tests::{
        bumps,
        centre,
    };

    const WIDTH_KB: f64 = 100.0;

    /// Bumps every 20 bins (200 kb) from bin 40, with the given heights.
    fn row(heights: &[f64]) -> Vec<(f64, f64, f64)> {
        heights
            .iter()
            .enumerate()
            .map(|(i, h)| (40.0 + 20.0 * i as f64, *h, 3.0))
            .collect()
    }

    #[test]
    fn test_groups_split_on_large_gaps() {
        let mut shapes = row(&[5.0, 5.0, 5.0]);
        shapes.push((200.0, 5.0, 3.0));
        let mut dc = centre(vec![("a", vec![("chr1", bumps(260, 0.0, &shapes))])]);
        let early = dc.timing_domains().early_domains();

        let groups = dc.adjacent_peak_groups("a", &early, WIDTH_KB, 300.0).unwrap();
        let strong: Vec<Vec<f64>> = groups
            .iter()
            .map(|g| {
                g.iter()
                    .filter(|p| p.peak_height > 0.1)
                    .map(|p| p.peak_position_kb)
                    .collect::<Vec<_>>()
            })
            .filter(|g: &Vec<f64>| !g.is_empty())
            .collect();
        assert_eq!(strong, vec![vec![400.0, 600.0, 800.0], vec![2000.0]]);
    }

    #[test]
    fn test_size_sequences_read_from_largest_end() {
        let dc = centre(vec![(
            "a",
            vec![("chr1", bumps(200, 0.0, &row(&[2.0, 3.0, 9.0, 5.0])))],
        )]);
        let peaks: Vec<Peak> = [400.0, 600.0, 800.0, 1000.0]
            .iter()
            .map(|pos| Peak {
                chromosome: "chr1".to_string(),
                kernel_width_bins: 16,
                bin_size_kb: 10.0,
                peak_position_kb: *pos,
                peak_height: 1.0,
                start_kb: pos - 50.0,
                end_kb: pos + 50.0,
                total_signal: 0.0,
                max_signal: 0.0,
                min_signal: 0.0,
                mean_signal: 0.0,
            })
            .collect();

        let sequences = dc
            .size_sequences_of_adjacent_peaks("a", &[peaks.clone(), peaks[..3].to_vec()])
            .unwrap();
        // Ranks [4, 3, 1, 2], largest at index 2 of 4 -> reversed
        assert_eq!(sequences[0], vec![2, 1, 3, 4]);
        // Ranks [3, 2, 1], largest at index 2 of 3 -> reversed
        assert_eq!(sequences[1], vec![1, 2, 3]);

        let pairs = dc.neighbouring_peak_heights("a", &[peaks.clone()]).unwrap();
        assert_eq!(pairs.len(), 3);
        assert!((pairs[1].0 - 3.0).abs() < 0.01);
        assert!((pairs[1].1 - 9.0).abs() < 0.01);

        let similarities = dc.similarity_between_adjacent_peaks("a", &[peaks]).unwrap();
        assert_eq!(similarities.len(), 3);
        assert!(similarities.iter().all(|s| *s == similarities[0]));
    }

    #[test]
    fn test_rank_tally() {
        let tally = RankTally::from_sequences(&[
            vec![1],
            vec![1, 3, 2],
            vec![1, 3, 2],
            vec![2, 3, 1],
            vec![3, 1, 4, 2],
        ]);
        assert_eq!(tally.group_size_counts, vec![1, 0, 3, 1]);
        assert_eq!(tally.triplets, [0, 2, 0, 0]);
        assert_eq!(tally.quads[9], 1);
        assert_eq!(tally.rows().len(), 16);
    }

    #[test]
    fn test_similarity_summary() {
        let groups = [
            GroupSimilarity {
                peak_count: 3,
                similarity: 0.9,
            },
            GroupSimilarity {
                peak_count: 4,
                similarity: 1.0,
            },
            GroupSimilarity {
                peak_count: 5,
                similarity: -0.5,
            },
            GroupSimilarity {
                peak_count: 6,
                similarity: 0.2,
            },
        ];
        let summary = SimilaritySummary::from_groups(&groups, 3).unwrap();
        assert_eq!(summary.groups, 3);
        assert_eq!(summary.median, 0.2);
        assert!((summary.mean - (0.99999 - 0.5 + 0.2) / 3.0).abs() < 1e-12);
        assert!(SimilaritySummary::from_groups(&groups[..1], 3).is_none());
    }
}
