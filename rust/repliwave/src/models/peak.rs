use serde::{
    Deserialize,
    Serialize,
};

/// Anything that occupies a span of a chromosome.
pub trait PeakPosition {
    fn chromosome(&self) -> &str;
    fn start_kb(&self) -> f64;
    fn end_kb(&self) -> f64;

    fn width_kb(&self) -> f64 {
        self.end_kb() - self.start_kb()
    }
}

/// A positive run of a convolution response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Peak {
    pub chromosome: String,
    pub kernel_width_bins: usize,
    pub bin_size_kb: f64,
    /// Location of the highest response in the run.
    pub peak_position_kb: f64,
    /// Highest response in the run.
    pub peak_height: f64,
    pub start_kb: f64,
    pub end_kb: f64,
    // Statistics of the underlying signal over [start_kb, end_kb]
    pub total_signal: f64,
    pub max_signal: f64,
    pub min_signal: f64,
    pub mean_signal: f64,
}

impl PeakPosition for Peak {
    fn chromosome(&self) -> &str {
        &self.chromosome
    }

    fn start_kb(&self) -> f64 {
        self.start_kb
    }

    fn end_kb(&self) -> f64 {
        self.end_kb
    }
}

/// A manually specified peak span.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeakRegion {
    pub chromosome: String,
    pub start_kb: f64,
    pub end_kb: f64,
}

impl PeakPosition for PeakRegion {
    fn chromosome(&self) -> &str {
        &self.chromosome
    }

    fn start_kb(&self) -> f64 {
        self.start_kb
    }

    fn end_kb(&self) -> f64 {
        self.end_kb
    }
}

impl From<&Peak> for PeakRegion {
    fn from(peak: &Peak) -> Self {
        Self {
            chromosome: peak.chromosome.clone(),
            start_kb: peak.start_kb,
            end_kb: peak.end_kb,
        }
    }
}

/// Two consecutive peaks of an early domain with a gap between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Valley {
    pub left: Peak,
    pub right: Peak,
}

impl Valley {
    /// Edges of the valley once each flank is pushed inwards by `offset_kb`.
    pub fn edges_kb(&self, offset_kb: f64) -> (f64, f64) {
        (self.left.end_kb + offset_kb, self.right.start_kb - offset_kb)
    }
}
