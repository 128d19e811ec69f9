use serde::{
    Deserialize,
    Serialize,
};

/// Nelder-Mead settings for one curve model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitSettings {
    /// Fit stops once the squared error drops below `(tolerance * signal_sum)^2`.
    pub tolerance: f64,
    pub steps_per_restart: usize,
    pub restarts: usize,
}

impl FitSettings {
    pub fn gaussian() -> Self {
        Self {
            tolerance: 0.001,
            steps_per_restart: 200,
            restarts: 20,
        }
    }

    pub fn flat_topped_gaussian() -> Self {
        Self {
            tolerance: 0.0001,
            steps_per_restart: 200,
            restarts: 10,
        }
    }
}

/// Range of wavelet peak widths searched when measuring a single peak.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WidthSearch {
    pub min_width_kb: f64,
    pub max_width_kb: f64,
    pub step_kb: f64,
}

impl Default for WidthSearch {
    fn default() -> Self {
        Self {
            min_width_kb: 200.0,
            max_width_kb: 1200.0,
            step_kb: 25.0,
        }
    }
}

impl WidthSearch {
    /// Candidate widths from min to max inclusive.
    pub fn widths_kb(&self) -> Vec<f64> {
        if self.step_kb <= 0.0 || self.max_width_kb < self.min_width_kb {
            return vec![self.min_width_kb];
        }
        let steps = ((self.max_width_kb - self.min_width_kb) / self.step_kb + 1e-9).floor() as usize;
        (0..=steps)
            .map(|i| self.min_width_kb + i as f64 * self.step_kb)
            .collect()
    }

    /// Widths on the search boundary are rejected.
    pub fn accepts(&self, width_kb: f64) -> bool {
        width_kb > self.min_width_kb && width_kb < self.max_width_kb
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Positive-lobe width of the wavelet used for peak calling.
    pub wavelet_peak_width_kb: f64,
    /// Percentile of late-domain peak heights used as the minimum height of
    /// early peaks.
    pub late_peak_percentile: f64,
    /// Datasets forming the time course, earliest first.
    pub time_series: Vec<String>,
    pub width_search: WidthSearch,
    pub max_peak_separation_kb: f64,
    /// Distance a fork travels between time points.
    pub fork_elongation_offset_kb: f64,
    /// How far a peak may move and still count as the same peak.
    pub peak_position_error_kb: f64,
    pub isolation_flank_percent: f64,
    pub gaussian_fit: FitSettings,
    pub flat_topped_fit: FitSettings,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            wavelet_peak_width_kb: 400.0,
            late_peak_percentile: 90.0,
            time_series: vec![
                "TM_10-40".to_string(),
                "TM_40-70".to_string(),
                "TM_70-100".to_string(),
                "TM_100-130".to_string(),
            ],
            width_search: WidthSearch::default(),
            max_peak_separation_kb: 1600.0,
            fork_elongation_offset_kb: 120.0 * 1.5,
            peak_position_error_kb: 100.0,
            isolation_flank_percent: 25.0,
            gaussian_fit: FitSettings::gaussian(),
            flat_topped_fit: FitSettings::flat_topped_gaussian(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width_search_grid() {
        let widths = WidthSearch::default().widths_kb();
        assert_eq!(widths.len(), 41);
        assert_eq!(widths[0], 200.0);
        assert_eq!(widths[40], 1200.0);
        assert!(!WidthSearch::default().accepts(200.0));
        assert!(!WidthSearch::default().accepts(1200.0));
        assert!(WidthSearch::default().accepts(225.0));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"wavelet_peak_width_kb": 250.0}"#).unwrap();
        assert_eq!(config.wavelet_peak_width_kb, 250.0);
        assert_eq!(config.time_series.len(), 4);
        assert_eq!(config.gaussian_fit, FitSettings::gaussian());
    }
}
