use serde::{
    Deserialize,
    Serialize,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainType {
    Early,
    Late,
    Ambiguous,
}

impl DomainType {
    /// Positive timing values are early, everything else late.
    pub fn from_timing_value(value: f64) -> Self {
        if value > 0.0 {
            DomainType::Early
        } else {
            DomainType::Late
        }
    }
}

/// Maximal run of one sign in the timing track. Coordinates in bp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingDomain {
    pub chromosome: String,
    pub start_bp: u64,
    pub end_bp: u64,
    pub domain_type: DomainType,
}

impl TimingDomain {
    pub fn start_kb(&self) -> f64 {
        self.start_bp as f64 / 1000.0
    }

    pub fn end_kb(&self) -> f64 {
        self.end_bp as f64 / 1000.0
    }

    pub fn size_kb(&self) -> f64 {
        self.end_bp.saturating_sub(self.start_bp) as f64 / 1000.0
    }
}
