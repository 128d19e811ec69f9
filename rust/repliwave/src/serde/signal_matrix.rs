use csv::StringRecord;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{
    debug,
    info,
};

use crate::data_centre::DataCentre;
use crate::dataset::Dataset;
use crate::errors::{
    DataReadingError,
    Result,
};
use crate::models::SignalTrack;
use crate::timing_domains::TimingDomainStore;

/// chrom, start, end, midpointMb
const FIXED_COLUMNS: usize = 4;

/// Every dataset of a signal matrix file plus the chromosome size table
/// derived from it.
#[derive(Debug, Clone)]
pub struct SignalMatrix {
    pub datasets: Vec<Dataset>,
    pub chromosome_sizes_kb: BTreeMap<String, f64>,
    pub bin_size_kb: f64,
}

impl SignalMatrix {
    pub fn dataset_names(&self) -> Vec<&str> {
        self.datasets.iter().map(|d| d.name()).collect()
    }

    pub fn into_data_centre(self, timing: TimingDomainStore) -> Result<DataCentre> {
        DataCentre::new(self.datasets, self.chromosome_sizes_kb, timing)
    }
}

struct ChromosomeBlock {
    name: String,
    midpoints_kb: Vec<f64>,
    /// One column per dataset.
    values: Vec<Vec<f64>>,
    last_end_bp: f64,
}

impl ChromosomeBlock {
    fn new(name: String, num_datasets: usize) -> Self {
        Self {
            name,
            midpoints_kb: Vec::new(),
            values: vec![Vec::new(); num_datasets],
            last_end_bp: 0.0,
        }
    }
}

pub fn read_signal_matrix<T: AsRef<Path>>(path: T) -> Result<SignalMatrix> {
    info!("Reading signal matrix from {}", path.as_ref().display());
    let file = std::fs::File::open(path.as_ref()).map_err(DataReadingError::from)?;
    parse_signal_matrix(file)
}

/// Parses a tab separated matrix with columns `chrom start end midpointMb`
/// followed by one column per dataset.
///
/// Chromosome names gain a `chr` prefix when missing and Y rows are skipped.
/// Rows of a chromosome must be contiguous, start at 0 and leave no gaps.
pub fn parse_signal_matrix<R: Read>(reader: R) -> Result<SignalMatrix> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers().map_err(DataReadingError::from)?.clone();
    if headers.len() < FIXED_COLUMNS {
        return Err(DataReadingError::MissingHeader.into());
    }
    let dataset_names: Vec<String> = headers
        .iter()
        .skip(FIXED_COLUMNS)
        .map(|s| s.to_string())
        .collect();
    if dataset_names.is_empty() {
        return Err(DataReadingError::NoDatasets.into());
    }
    let expected_columns = FIXED_COLUMNS + dataset_names.len();

    let mut finished: Vec<ChromosomeBlock> = Vec::new();
    let mut current: Option<ChromosomeBlock> = None;
    let mut bin_size_kb = None;
    let mut record = StringRecord::new();

    while rdr.read_record(&mut record).map_err(DataReadingError::from)? {
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.len() < expected_columns {
            return Err(DataReadingError::MissingColumns {
                line,
                expected: expected_columns,
                found: record.len(),
            }
            .into());
        }

        let raw_chromosome = &record[0];
        if raw_chromosome.is_empty() || raw_chromosome == "Y" || raw_chromosome == "chrY" {
            continue;
        }
        let chromosome = if raw_chromosome.starts_with("chr") {
            raw_chromosome.to_string()
        } else {
            format!("chr{}", raw_chromosome)
        };

        let start_bp = parse_field(&record, 1, line)?;
        let end_bp = parse_field(&record, 2, line)?;
        let midpoint_mb = parse_field(&record, 3, line)?;

        if bin_size_kb.is_none() {
            bin_size_kb = Some((end_bp - start_bp) / 1000.0);
        }

        let continues_block = current
            .as_ref()
            .is_some_and(|block| block.name == chromosome);
        if !continues_block {
            if let Some(block) = current.take() {
                finished.push(block);
            }
            if finished.iter().any(|b| b.name == chromosome) {
                return Err(DataReadingError::DuplicateChromosome(chromosome).into());
            }
            if start_bp != 0.0 {
                return Err(DataReadingError::ChromosomeDoesNotStartAtZero {
                    chromosome,
                    start_bp,
                }
                .into());
            }
            debug!("Reading chromosome {}", chromosome);
            current = Some(ChromosomeBlock::new(chromosome, dataset_names.len()));
        }

        let Some(block) = current.as_mut() else {
            continue;
        };
        if !block.midpoints_kb.is_empty() && start_bp != block.last_end_bp {
            return Err(DataReadingError::GapInChromosome {
                chromosome: block.name.clone(),
                expected_start_bp: block.last_end_bp,
                found_start_bp: start_bp,
            }
            .into());
        }
        block.midpoints_kb.push(midpoint_mb * 1000.0);
        for (column, values) in block.values.iter_mut().enumerate() {
            values.push(parse_field(&record, FIXED_COLUMNS + column, line)?);
        }
        block.last_end_bp = end_bp;
    }
    if let Some(block) = current.take() {
        finished.push(block);
    }

    let bin_size_kb = bin_size_kb.ok_or(DataReadingError::NoDataRows)?;
    if finished.is_empty() {
        return Err(DataReadingError::NoDataRows.into());
    }

    let chromosome_sizes_kb: BTreeMap<String, f64> = finished
        .iter()
        .map(|b| (b.name.clone(), b.last_end_bp / 1000.0))
        .collect();

    let mut datasets = Vec::with_capacity(dataset_names.len());
    for (index, name) in dataset_names.iter().enumerate() {
        let mut tracks = Vec::with_capacity(finished.len());
        for block in &finished {
            tracks.push(SignalTrack::new(
                block.name.clone(),
                name.clone(),
                block.midpoints_kb.clone(),
                block.values[index].clone(),
            )?);
        }
        datasets.push(Dataset::new(name.clone(), tracks)?);
    }

    info!(
        "Read {} datasets over {} chromosomes, bin size {} kb",
        datasets.len(),
        chromosome_sizes_kb.len(),
        bin_size_kb
    );

    Ok(SignalMatrix {
        datasets,
        chromosome_sizes_kb,
        bin_size_kb,
    })
}

fn parse_field(record: &StringRecord, column: usize, line: usize) -> Result<f64> {
    let value = record.get(column).unwrap_or("");
    value.parse::<f64>().map_err(|_| {
        DataReadingError::InvalidNumber {
            line,
            column,
            value: value.to_string(),
        }
        .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RepliwaveError;

    const HEADER: &str = "chrom\tstart\tend\tmidpointMb\tearly\tlate\n";

    fn rows(chromosome: &str, bins: usize) -> String {
        (0..bins)
            .map(|i| {
                format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\n",
                    chromosome,
                    i * 50_000,
                    (i + 1) * 50_000,
                    (i as f64 * 50.0 + 25.0) / 1000.0,
                    i,
                    2 * i
                )
            })
            .collect()
    }

    #[test]
    fn test_parse_two_chromosomes() {
        let text = format!("{}{}{}{}", HEADER, rows("1", 4), rows("Y", 3), rows("chr2", 3));
        let matrix = parse_signal_matrix(text.as_bytes()).unwrap();

        assert_eq!(matrix.dataset_names(), vec!["early", "late"]);
        assert_eq!(matrix.bin_size_kb, 50.0);
        assert_eq!(matrix.chromosome_sizes_kb.len(), 2);
        assert_eq!(matrix.chromosome_sizes_kb["chr1"], 200.0);
        assert_eq!(matrix.chromosome_sizes_kb["chr2"], 150.0);

        let late = &matrix.datasets[1];
        let chr1 = late.track("chr1").unwrap();
        assert_eq!(chr1.values(), &[0.0, 2.0, 4.0, 6.0]);
        assert!((chr1.midpoints_kb()[1] - 75.0).abs() < 1e-9);
        assert!(late.track("chrY").is_none());
    }

    #[test]
    fn test_chromosome_must_start_at_zero() {
        let text = format!(
            "{}1\t50000\t100000\t0.075\t1\t1\n1\t100000\t150000\t0.125\t1\t1\n",
            HEADER
        );
        let err = parse_signal_matrix(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RepliwaveError::DataReadingError(DataReadingError::ChromosomeDoesNotStartAtZero { .. })
        ));
    }

    #[test]
    fn test_gap_is_rejected() {
        let text = format!(
            "{}1\t0\t50000\t0.025\t1\t1\n1\t100000\t150000\t0.125\t1\t1\n",
            HEADER
        );
        let err = parse_signal_matrix(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RepliwaveError::DataReadingError(DataReadingError::GapInChromosome { .. })
        ));
    }

    #[test]
    fn test_split_chromosome_is_a_duplicate() {
        let text = format!("{}{}{}{}", HEADER, rows("1", 2), rows("2", 2), rows("1", 2));
        let err = parse_signal_matrix(text.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RepliwaveError::DataReadingError(DataReadingError::DuplicateChromosome(ref c)) if c == "chr1"
        ));
    }

    #[test]
    fn test_malformed_rows() {
        let short = format!("{}1\t0\t50000\t0.025\t1\n", HEADER);
        assert!(matches!(
            parse_signal_matrix(short.as_bytes()).unwrap_err(),
            RepliwaveError::DataReadingError(DataReadingError::MissingColumns { expected: 6, .. })
        ));

        let bad_number = format!("{}1\t0\t50000\t0.025\tx\t1\n", HEADER);
        assert!(matches!(
            parse_signal_matrix(bad_number.as_bytes()).unwrap_err(),
            RepliwaveError::DataReadingError(DataReadingError::InvalidNumber { column: 4, .. })
        ));

        let no_datasets = "chrom\tstart\tend\tmidpointMb\n1\t0\t50000\t0.025\n";
        assert!(matches!(
            parse_signal_matrix(no_datasets.as_bytes()).unwrap_err(),
            RepliwaveError::DataReadingError(DataReadingError::NoDatasets)
        ));

        assert!(matches!(
            parse_signal_matrix(HEADER.as_bytes()).unwrap_err(),
            RepliwaveError::DataReadingError(DataReadingError::NoDataRows)
        ));
    }
}
