#![doc = include_str!("../README.md")]

// Re-export main structures
pub use crate::config::{
    AnalysisConfig,
    FitSettings,
    WidthSearch,
};
pub use crate::data_centre::DataCentre;
pub use crate::dataset::Dataset;
pub use crate::models::{
    DomainType,
    FlatToppedGaussian,
    Gaussian,
    Peak,
    PeakCurve,
    PeakPosition,
    PeakRegion,
    RegionResponse,
    RegionStats,
    SignalTrack,
    TimingDomain,
    Valley,
};
pub use crate::timing_domains::TimingDomainStore;

// Declare modules
pub mod analytics;
pub mod config;
pub mod data_centre;
pub mod dataset;
pub mod errors;
pub mod models;
pub mod peak_detection;
pub mod serde;
pub mod timing_domains;
pub mod utils;
pub mod wavelet;

// Re-export errors
pub use crate::errors::{
    CurveModelError,
    DataProcessingError,
    DataReadingError,
    RepliwaveError,
    Result,
};
