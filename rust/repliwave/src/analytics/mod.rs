mod domains;
mod fitting;
mod grouping;
mod growth;
mod heatmap;
mod valleys;

pub use domains::{
    DomainPeakCount,
    HeightSweepPoint,
    is_isolated,
};
pub use fitting::CurveFit;
pub use grouping::{
    GroupSimilarity,
    QUAD_PATTERNS,
    RankPatternRow,
    RankTally,
    SimilaritySummary,
    TRIPLET_PATTERNS,
};
pub use growth::{
    GrowthMethod,
    GrowthSeries,
    GrowthSummary,
    GrowthSummaryRow,
};
pub use heatmap::{
    HEATMAP_PEAK_WIDTHS_KB,
    ResponseHeatmap,
};
pub use valleys::{
    ValleySignalSeries,
    ValleySignals,
};
