use clap::{
    Parser,
    Subcommand,
};
use repliwave::analytics::GrowthMethod;
use repliwave::DomainType;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Signal, statistics, wavelet response and timing levels of one region.
    Region(RegionArgs),
    /// Wavelet responses of one region over a ladder of peak widths.
    Heatmap(RegionArgs),
    /// Peaks detected inside timing domains.
    Peaks(PeaksArgs),
    /// Peak counts, total signal and peak separations per timing domain.
    Domains(PeaksArgs),
    /// Isolated peaks of early domains above the late-domain height cutoff.
    IsolatedPeaks(DataArgs),
    /// Width of peaks at every time point of the time series.
    PeakGrowth(PeakGrowthArgs),
    /// Fit a peak curve to the signal of one region.
    Fit(FitArgs),
    /// Signal left in the valleys between neighbouring peaks over time.
    Valleys(DataArgs),
    /// Rank order, heights and similarity of groups of adjacent peaks.
    AdjacentPeaks(DataArgs),
    /// Early peaks remaining at every percentile of late peak heights.
    HeightSweep(DataArgs),
    /// Write the default analysis configuration.
    WriteTemplate(WriteTemplateArgs),
}

/// Inputs and settings shared by every analysis.
#[derive(clap::Args, Debug, Clone)]
pub struct DataArgs {
    /// Tab separated replication signal, one column per dataset.
    #[arg(short, long)]
    pub signal_matrix: PathBuf,

    /// Tab separated signed timing track.
    #[arg(short, long)]
    pub timing_track: PathBuf,

    /// Json file with the analysis configuration.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Dataset to analyse, the first one of the matrix by default.
    #[arg(short, long)]
    pub dataset: Option<String>,

    /// Overrides the wavelet peak width of the configuration.
    #[arg(long)]
    pub peak_width_kb: Option<f64>,

    /// Overrides the time series of the configuration, earliest first.
    #[arg(long, value_delimiter = ',')]
    pub time_series: Option<Vec<String>>,

    /// The directory results are written to.
    #[arg(short, long)]
    pub output_path: PathBuf,
}

#[derive(clap::Args, Debug, Clone)]
pub struct RegionCoordinates {
    #[arg(long)]
    pub chromosome: String,

    #[arg(long)]
    pub start_kb: f64,

    #[arg(long)]
    pub end_kb: f64,
}

#[derive(Parser, Debug, Clone)]
pub struct RegionArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub region: RegionCoordinates,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DomainSelection {
    #[default]
    Early,
    Late,
    All,
}

impl DomainSelection {
    pub fn domain_types(self) -> Vec<DomainType> {
        match self {
            DomainSelection::Early => vec![DomainType::Early],
            DomainSelection::Late => vec![DomainType::Late],
            DomainSelection::All => vec![DomainType::Early, DomainType::Late],
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct PeaksArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// The timing domains to look in.
    #[arg(long, default_value_t, value_enum)]
    pub domains: DomainSelection,

    /// Minimum domain size in kb.
    #[arg(long, default_value_t = 0)]
    pub min_domain_kb: u64,

    /// Minimum peak height, no minimum when missing.
    #[arg(long)]
    pub min_height: Option<f64>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum GrowthMethodArg {
    #[default]
    Wavelet,
    Gaussian,
}

impl From<GrowthMethodArg> for GrowthMethod {
    fn from(value: GrowthMethodArg) -> Self {
        match value {
            GrowthMethodArg::Wavelet => GrowthMethod::Wavelet,
            GrowthMethodArg::Gaussian => GrowthMethod::Gaussian,
        }
    }
}

#[derive(Parser, Debug, Clone)]
pub struct PeakGrowthArgs {
    #[command(flatten)]
    pub data: DataArgs,

    /// How peak width is measured.
    #[arg(long, default_value_t, value_enum)]
    pub method: GrowthMethodArg,

    /// Peaks to follow, the automatic isolated peaks when missing.
    #[arg(long)]
    pub peak_list: Option<PathBuf>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CurveModel {
    #[default]
    Gaussian,
    FlatTopped,
}

#[derive(Parser, Debug, Clone)]
pub struct FitArgs {
    #[command(flatten)]
    pub data: DataArgs,

    #[command(flatten)]
    pub region: RegionCoordinates,

    #[arg(long, default_value_t, value_enum)]
    pub model: CurveModel,
}

#[derive(Parser, Debug)]
pub struct WriteTemplateArgs {
    /// The path to the output files.
    #[arg(short, long)]
    pub output_path: PathBuf,
}
