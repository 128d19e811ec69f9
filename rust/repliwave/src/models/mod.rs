pub mod curves;
pub mod peak;
pub mod region;
pub mod signal_track;
pub mod timing_domain;

pub use curves::{
    FlatToppedGaussian,
    Gaussian,
    PeakCurve,
};
pub use peak::{
    Peak,
    PeakPosition,
    PeakRegion,
    Valley,
};
pub use region::{
    RegionResponse,
    RegionStats,
};
pub use signal_track::SignalTrack;
pub use timing_domain::{
    DomainType,
    TimingDomain,
};
