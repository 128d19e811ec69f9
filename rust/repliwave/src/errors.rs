use simplexfit::NelderMeadError;
use std::fmt::Display;

pub type Result<T> = std::result::Result<T, RepliwaveError>;

#[derive(Debug)]
pub enum RepliwaveError {
    DataReadingError(DataReadingError),
    DataProcessingError(DataProcessingError),
    CurveModelError(CurveModelError),
    FitError(NelderMeadError),
}

impl Display for RepliwaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DataReadingError(e) => write!(f, "Data reading error: {}", e),
            Self::DataProcessingError(e) => write!(f, "Data processing error: {}", e),
            Self::CurveModelError(e) => write!(f, "Curve model error: {}", e),
            Self::FitError(e) => write!(f, "Fit error: {}", e),
        }
    }
}

impl std::error::Error for RepliwaveError {}

#[derive(Debug)]
pub enum DataReadingError {
    Io(std::io::Error),
    Csv(csv::Error),
    MissingHeader,
    NoDatasets,
    NoDataRows,
    MissingColumns {
        line: usize,
        expected: usize,
        found: usize,
    },
    InvalidNumber {
        line: usize,
        column: usize,
        value: String,
    },
    ChromosomeDoesNotStartAtZero {
        chromosome: String,
        start_bp: f64,
    },
    GapInChromosome {
        chromosome: String,
        expected_start_bp: f64,
        found_start_bp: f64,
    },
    DuplicateChromosome(String),
    InvalidBinWidth(i64),
    ZeroLengthDomain {
        chromosome: String,
        start_bp: u64,
        end_bp: u64,
    },
}

impl Display for DataReadingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "{}", e),
            Self::Csv(e) => write!(f, "{}", e),
            Self::MissingColumns {
                line,
                expected,
                found,
            } => write!(
                f,
                "Line {}: expected at least {} columns, found {}",
                line, expected, found
            ),
            Self::InvalidNumber {
                line,
                column,
                value,
            } => write!(
                f,
                "Line {}, column {}: cannot parse {:?} as a number",
                line, column, value
            ),
            Self::ChromosomeDoesNotStartAtZero {
                chromosome,
                start_bp,
            } => write!(
                f,
                "Chromosome {} starts at {} instead of 0",
                chromosome, start_bp
            ),
            Self::GapInChromosome {
                chromosome,
                expected_start_bp,
                found_start_bp,
            } => write!(
                f,
                "Gap in chromosome {}: expected a bin at {}, found {}",
                chromosome, expected_start_bp, found_start_bp
            ),
            Self::DuplicateChromosome(name) => {
                write!(f, "Chromosome {} appears in more than one block", name)
            }
            Self::InvalidBinWidth(width) => write!(f, "Bin width must be positive, got {}", width),
            Self::ZeroLengthDomain {
                chromosome,
                start_bp,
                end_bp,
            } => write!(
                f,
                "Timing domain on {} would end at {} but starts at {}",
                chromosome, end_bp, start_bp
            ),
            other => write!(f, "{:?}", other),
        }
    }
}

impl From<std::io::Error> for DataReadingError {
    fn from(e: std::io::Error) -> Self {
        DataReadingError::Io(e)
    }
}

impl From<csv::Error> for DataReadingError {
    fn from(e: csv::Error) -> Self {
        DataReadingError::Csv(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataProcessingError {
    MisalignedKernel { kernel_len: usize },
    TrackLengthMismatch { midpoints: usize, values: usize },
    TooFewBins { found: usize },
    NonUniformBinSpacing { index: usize, expected_kb: f64, found_kb: f64 },
    InconsistentBinSize { dataset: String, expected_kb: f64, found_kb: f64 },
    UnknownDataset(String),
    DuplicateDataset(String),
    DuplicateTrack { dataset: String, chromosome: String },
    UncachedWidth { dataset: String, kernel_width_bins: usize },
    ExpectedNonEmptyData,
}

impl Display for DataProcessingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MisalignedKernel { kernel_len } => write!(
                f,
                "Kernel of length {} cannot be centred, an odd length is required",
                kernel_len
            ),
            Self::UnknownDataset(name) => write!(f, "No dataset named {:?}", name),
            Self::DuplicateDataset(name) => write!(f, "Dataset {:?} is loaded twice", name),
            Self::UncachedWidth {
                dataset,
                kernel_width_bins,
            } => write!(
                f,
                "Kernel width {} is not cached for dataset {:?}",
                kernel_width_bins, dataset
            ),
            other => write!(f, "{:?}", other),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurveModelError {
    WrongParameterCount { expected: usize, found: usize },
}

impl Display for CurveModelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WrongParameterCount { expected, found } => write!(
                f,
                "Curve needs {} parameters, {} were given",
                expected, found
            ),
        }
    }
}

impl From<DataReadingError> for RepliwaveError {
    fn from(e: DataReadingError) -> Self {
        RepliwaveError::DataReadingError(e)
    }
}

impl From<DataProcessingError> for RepliwaveError {
    fn from(e: DataProcessingError) -> Self {
        RepliwaveError::DataProcessingError(e)
    }
}

impl From<CurveModelError> for RepliwaveError {
    fn from(e: CurveModelError) -> Self {
        RepliwaveError::CurveModelError(e)
    }
}

impl From<NelderMeadError> for RepliwaveError {
    fn from(e: NelderMeadError) -> Self {
        RepliwaveError::FitError(e)
    }
}

impl From<std::io::Error> for RepliwaveError {
    fn from(e: std::io::Error) -> Self {
        RepliwaveError::DataReadingError(e.into())
    }
}

impl From<csv::Error> for RepliwaveError {
    fn from(e: csv::Error) -> Self {
        RepliwaveError::DataReadingError(e.into())
    }
}
