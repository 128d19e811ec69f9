mod growth_report;
mod peak_list;
mod signal_matrix;
mod timing_track;

pub use growth_report::{
    write_growth_report,
    write_growth_table,
};
pub use peak_list::{
    parse_peak_list,
    read_peak_list,
};
pub use signal_matrix::{
    SignalMatrix,
    parse_signal_matrix,
    read_signal_matrix,
};
pub use timing_track::{
    parse_timing_track,
    read_timing_track,
};
