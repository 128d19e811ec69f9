use crate::models::{
    Peak,
    SignalTrack,
};

#[derive(Debug, Clone, Copy)]
enum ScanState {
    OutsidePeak,
    InsidePeak {
        start_index: usize,
        max_index: usize,
        max_value: f64,
    },
}

/// Extracts peaks from a convolution response of `track`.
///
/// A peak is a maximal run of strictly positive response. The run's first
/// bin and the first non-positive bin after it give the peak's extent, and
/// its first highest bin gives the position. Signal statistics come from the
/// track itself, not from the response. A run still open at the end of the
/// response is dropped.
pub fn detect_peaks(track: &SignalTrack, response: &[f64], kernel_width_bins: usize) -> Vec<Peak> {
    let bin_size_kb = track.bin_size_kb();
    let mut peaks = Vec::new();
    let mut state = ScanState::OutsidePeak;

    for (index, &value) in response.iter().enumerate() {
        state = match (state, value > 0.0) {
            (ScanState::OutsidePeak, true) => ScanState::InsidePeak {
                start_index: index,
                max_index: index,
                max_value: value,
            },
            (
                ScanState::InsidePeak {
                    start_index,
                    max_index,
                    max_value,
                },
                true,
            ) => {
                if value > max_value {
                    ScanState::InsidePeak {
                        start_index,
                        max_index: index,
                        max_value: value,
                    }
                } else {
                    ScanState::InsidePeak {
                        start_index,
                        max_index,
                        max_value,
                    }
                }
            }
            (
                ScanState::InsidePeak {
                    start_index,
                    max_index,
                    max_value,
                },
                false,
            ) => {
                let start_kb = start_index as f64 * bin_size_kb;
                let end_kb = index as f64 * bin_size_kb;
                let stats = track.region_stats(start_kb, end_kb);
                peaks.push(Peak {
                    chromosome: track.chromosome().to_string(),
                    kernel_width_bins,
                    bin_size_kb,
                    peak_position_kb: max_index as f64 * bin_size_kb,
                    peak_height: max_value,
                    start_kb,
                    end_kb,
                    total_signal: stats.total,
                    max_signal: stats.max,
                    min_signal: stats.min,
                    mean_signal: stats.mean,
                });
                ScanState::OutsidePeak
            }
            (ScanState::OutsidePeak, false) => ScanState::OutsidePeak,
        };
    }

    peaks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_track(values: Vec<f64>) -> SignalTrack {
        let midpoints = (0..values.len()).map(|i| i as f64 + 0.5).collect();
        SignalTrack::new("chr1", "ds", midpoints, values).unwrap()
    }

    #[test]
    fn test_single_peak() {
        let track = unit_track(vec![0.0, 1.0, 5.0, 6.0, 7.0, 1.0, 0.0]);
        let response = [-1.0, -1.0, 2.0, 3.0, 2.0, -1.0, -1.0];
        let peaks = detect_peaks(&track, &response, 4);

        assert_eq!(peaks.len(), 1);
        let peak = &peaks[0];
        assert_eq!(peak.peak_position_kb, 3.0);
        assert_eq!(peak.peak_height, 3.0);
        assert_eq!(peak.start_kb, 2.0);
        assert_eq!(peak.end_kb, 5.0);
        assert_eq!(peak.kernel_width_bins, 4);
        // Signal bins 2..=5
        assert_eq!(peak.total_signal, 19.0);
        assert_eq!(peak.max_signal, 7.0);
        assert_eq!(peak.min_signal, 1.0);
        assert_eq!(peak.mean_signal, 4.75);
    }

    #[test]
    fn test_open_run_is_discarded() {
        let track = unit_track(vec![1.0, 1.0, 1.0]);
        assert!(detect_peaks(&track, &[-1.0, 2.0, 3.0], 4).is_empty());
    }

    #[test]
    fn test_first_maximum_wins_and_zero_closes() {
        let track = unit_track(vec![1.0; 8]);
        let response = [1.0, 4.0, 4.0, 0.0, 2.0, -3.0, 0.5, 0.0];
        let peaks = detect_peaks(&track, &response, 2);

        assert_eq!(peaks.len(), 3);
        assert_eq!(peaks[0].peak_position_kb, 1.0);
        assert_eq!(peaks[0].start_kb, 0.0);
        assert_eq!(peaks[0].end_kb, 3.0);
        assert_eq!(peaks[1].peak_position_kb, 4.0);
        assert_eq!(peaks[2].start_kb, 6.0);
        assert_eq!(peaks[2].end_kb, 7.0);
    }
}
