use csv::StringRecord;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::errors::{
    DataReadingError,
    Result,
};
use crate::models::PeakRegion;

pub fn read_peak_list<T: AsRef<Path>>(path: T) -> Result<Vec<PeakRegion>> {
    info!("Reading peak list from {}", path.as_ref().display());
    let file = std::fs::File::open(path.as_ref()).map_err(DataReadingError::from)?;
    parse_peak_list(file)
}

/// Parses manually curated peaks, one `chrom startMb endMb` line each.
///
/// Lines starting with `//` are comments. Chromosome names are kept as
/// written. The result is sorted by chromosome then start.
pub fn parse_peak_list<R: Read>(reader: R) -> Result<Vec<PeakRegion>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .comment(Some(b'/'))
        .from_reader(reader);

    let mut peaks = Vec::new();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record).map_err(DataReadingError::from)? {
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() < 3 {
            return Err(DataReadingError::MissingColumns {
                line,
                expected: 3,
                found: record.len(),
            }
            .into());
        }
        peaks.push(PeakRegion {
            chromosome: record[0].to_string(),
            start_kb: parse_mb(&record, 1, line)? * 1000.0,
            end_kb: parse_mb(&record, 2, line)? * 1000.0,
        });
    }

    peaks.sort_by(|a, b| {
        a.chromosome
            .cmp(&b.chromosome)
            .then(a.start_kb.total_cmp(&b.start_kb))
    });
    info!("Read {} manual peaks", peaks.len());
    Ok(peaks)
}

fn parse_mb(record: &StringRecord, column: usize, line: usize) -> Result<f64> {
    let value = &record[column];
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

    #[test]
    fn test_parse_sorts_and_converts() {
        let text = "// curated peaks\nchr2\t1.5\t2.0\nchr1\t3.25\t3.5\n\nchr1\t1.0\t1.25\n";
        let peaks = parse_peak_list(text.as_bytes()).unwrap();
        assert_eq!(
            peaks,
            vec![
                PeakRegion {
                    chromosome: "chr1".to_string(),
                    start_kb: 1000.0,
                    end_kb: 1250.0,
                },
                PeakRegion {
                    chromosome: "chr1".to_string(),
                    start_kb: 3250.0,
                    end_kb: 3500.0,
                },
                PeakRegion {
                    chromosome: "chr2".to_string(),
                    start_kb: 1500.0,
                    end_kb: 2000.0,
                },
            ]
        );
    }

    #[test]
    fn test_bad_lines() {
        assert!(parse_peak_list("chr1\t1.0\n".as_bytes()).is_err());
        assert!(parse_peak_list("chr1\tone\t2.0\n".as_bytes()).is_err());
        assert!(parse_peak_list("".as_bytes()).unwrap().is_empty());
    }
}
