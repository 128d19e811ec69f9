pub mod similarity;
pub mod stats;

pub use similarity::adjacent_value_similarity;
pub use stats::{
    MeanStdev,
    percentile_floor,
};
