use csv::StringRecord;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::{
    debug,
    info,
};

use crate::errors::{
    DataReadingError,
    Result,
};
use crate::models::{
    DomainType,
    TimingDomain,
};
use crate::timing_domains::{
    ChromosomeDomains,
    TimingDomainStore,
};

/// Chromosome names longer than this (unplaced contigs and the like) are
/// dropped.
const MAX_CHROMOSOME_NAME_LEN: usize = 5;

#[derive(Debug, Clone)]
struct TimingRow {
    chromosome: String,
    start_bp: i64,
    end_bp: i64,
    value: f64,
}

/// Domain currently being extended while walking one chromosome.
struct ChromosomeWalk {
    chromosome: String,
    domains: ChromosomeDomains,
    levels: Vec<f64>,
    domain_type: DomainType,
    domain_start_bp: i64,
    domain_end_bp: i64,
    next_bin_start_bp: i64,
    current_value: f64,
}

impl ChromosomeWalk {
    fn new(chromosome: String, start_bp: i64) -> Self {
        Self {
            chromosome,
            domains: ChromosomeDomains::default(),
            levels: Vec::new(),
            domain_type: DomainType::Ambiguous,
            domain_start_bp: start_bp,
            domain_end_bp: start_bp,
            next_bin_start_bp: 0,
            current_value: 0.0,
        }
    }

    fn push_row(&mut self, row: &TimingRow, bin_width_bp: i64) -> Result<()> {
        // Bins missing from the file repeat the last seen value
        while self.next_bin_start_bp < row.start_bp {
            self.levels.push(self.current_value);
            self.next_bin_start_bp += bin_width_bp;
        }
        self.next_bin_start_bp += bin_width_bp;
        self.current_value = row.value;
        self.levels.push(row.value);

        let row_type = DomainType::from_timing_value(row.value);
        if row_type != self.domain_type {
            self.close_domain()?;
            self.domain_start_bp = row.start_bp;
            self.domain_type = row_type;
        }
        self.domain_end_bp = row.end_bp;
        Ok(())
    }

    fn close_domain(&mut self) -> Result<()> {
        if self.domain_type == DomainType::Ambiguous {
            return Ok(());
        }
        if self.domain_end_bp <= self.domain_start_bp {
            return Err(DataReadingError::ZeroLengthDomain {
                chromosome: self.chromosome.clone(),
                start_bp: self.domain_start_bp.max(0) as u64,
                end_bp: self.domain_end_bp.max(0) as u64,
            }
            .into());
        }
        self.domains.push(TimingDomain {
            chromosome: self.chromosome.clone(),
            start_bp: self.domain_start_bp.max(0) as u64,
            end_bp: self.domain_end_bp as u64,
            domain_type: self.domain_type,
        });
        Ok(())
    }
}

pub fn read_timing_track<T: AsRef<Path>>(path: T) -> Result<TimingDomainStore> {
    info!("Reading timing track from {}", path.as_ref().display());
    let file = std::fs::File::open(path.as_ref()).map_err(DataReadingError::from)?;
    parse_timing_track(file)
}

/// Parses a bedGraph style timing track (`chrom start end value`, bp) into
/// early and late domains.
///
/// Positive values are early, the rest late. Each maximal run of one type
/// becomes a domain. Lines starting with `#` or a space are ignored.
pub fn parse_timing_track<R: Read>(reader: R) -> Result<TimingDomainStore> {
    let rows = read_rows(reader)?;
    if rows.is_empty() {
        return Err(DataReadingError::NoDataRows.into());
    }

    let bin_width_bp = match (&rows[0], rows.get(1)) {
        (first, Some(second)) if first.chromosome == second.chromosome => {
            second.start_bp - first.start_bp
        }
        (first, _) => first.end_bp - first.start_bp,
    };
    if bin_width_bp <= 0 {
        return Err(DataReadingError::InvalidBinWidth(bin_width_bp).into());
    }

    let mut domains: BTreeMap<String, ChromosomeDomains> = BTreeMap::new();
    let mut levels: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut walk: Option<ChromosomeWalk> = None;

    for row in &rows {
        let same_chromosome = walk
            .as_ref()
            .is_some_and(|w| w.chromosome == row.chromosome);
        if !same_chromosome {
            if let Some(done) = walk.take() {
                store_chromosome(done, &mut domains, &mut levels)?;
            }
            walk = Some(ChromosomeWalk::new(row.chromosome.clone(), row.start_bp));
        }
        if let Some(current) = walk.as_mut() {
            current.push_row(row, bin_width_bp)?;
        }
    }
    if let Some(done) = walk.take() {
        store_chromosome(done, &mut domains, &mut levels)?;
    }

    let (early, late) = domains.values().fold((0, 0), |(e, l), d| {
        (e + d.early.len(), l + d.late.len())
    });
    info!(
        "Read {} early and {} late domains over {} chromosomes, bin width {} bp",
        early,
        late,
        domains.len(),
        bin_width_bp
    );

    Ok(TimingDomainStore::new(domains, levels, bin_width_bp as u64))
}

fn store_chromosome(
    mut walk: ChromosomeWalk,
    domains: &mut BTreeMap<String, ChromosomeDomains>,
    levels: &mut BTreeMap<String, Vec<f64>>,
) -> Result<()> {
    walk.close_domain()?;
    if walk.chromosome.len() > MAX_CHROMOSOME_NAME_LEN || walk.chromosome == "chrY" {
        debug!("Dropping timing track of {}", walk.chromosome);
        return Ok(());
    }
    if domains.contains_key(&walk.chromosome) || levels.contains_key(&walk.chromosome) {
        return Err(DataReadingError::DuplicateChromosome(walk.chromosome).into());
    }
    levels.insert(walk.chromosome.clone(), walk.levels);
    if !walk.domains.is_empty() {
        domains.insert(walk.chromosome, walk.domains);
    }
    Ok(())
}

fn read_rows<R: Read>(reader: R) -> Result<Vec<TimingRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .comment(Some(b'#'))
        .from_reader(reader);

    let mut rows = Vec::new();
    let mut record = StringRecord::new();
    while rdr.read_record(&mut record).map_err(DataReadingError::from)? {
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        let first = record.get(0).unwrap_or("");
        if first.is_empty() || first.starts_with(' ') {
            continue;
        }
        if record.len() < 4 {
            return Err(DataReadingError::MissingColumns {
                line,
                expected: 4,
                found: record.len(),
            }
            .into());
        }
        rows.push(TimingRow {
            chromosome: first.to_string(),
            start_bp: parse_integer(&record, 1, line)?,
            end_bp: parse_integer(&record, 2, line)?,
            value: parse_value(&record, 3, line)?,
        });
    }
    Ok(rows)
}

fn invalid_number(record: &StringRecord, column: usize, line: usize) -> DataReadingError {
    DataReadingError::InvalidNumber {
        line,
        column,
        value: record.get(column).unwrap_or("").to_string(),
    }
}

fn parse_integer(record: &StringRecord, column: usize, line: usize) -> Result<i64> {
    record
        .get(column)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .ok_or_else(|| invalid_number(record, column, line).into())
}

fn parse_value(record: &StringRecord, column: usize, line: usize) -> Result<f64> {
    record
        .get(column)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .ok_or_else(|| invalid_number(record, column, line).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RepliwaveError;

    const TRACK: &str = "\
# comment
chr1\t0\t100\t0.5
chr1\t100\t200\t0.7
chr1\t200\t300\t-0.2
chr1\t500\t600\t-0.4
chr1\t600\t700\t0.1
chr2\t0\t100\t-1.0
chr2\t100\t200\t-1.0
chrUn_gl000220\t0\t100\t1.0
chrY\t0\t100\t1.0
";

    fn store() -> TimingDomainStore {
        parse_timing_track(TRACK.as_bytes()).unwrap()
    }

    #[test]
    fn test_domains_follow_sign_runs() {
        let s = store();
        assert_eq!(s.bin_size_bp(), 100);

        let chr1 = s.chromosome_domains("chr1").unwrap();
        let early: Vec<(u64, u64)> = chr1.early.iter().map(|d| (d.start_bp, d.end_bp)).collect();
        let late: Vec<(u64, u64)> = chr1.late.iter().map(|d| (d.start_bp, d.end_bp)).collect();
        assert_eq!(early, vec![(0, 200), (600, 700)]);
        assert_eq!(late, vec![(200, 600)]);

        let chr2 = s.chromosome_domains("chr2").unwrap();
        assert!(chr2.early.is_empty());
        assert_eq!(chr2.late[0].end_bp, 200);
    }

    #[test]
    fn test_gaps_repeat_last_value() {
        let s = store();
        assert_eq!(
            s.timing_levels_in_region("chr1", 0.0, 0.65),
            vec![0.5, 0.7, -0.2, -0.2, -0.2, -0.4, 0.1]
        );
    }

    #[test]
    fn test_odd_chromosomes_are_dropped() {
        let s = store();
        let names: Vec<&str> = s.chromosomes().collect();
        assert_eq!(names, vec!["chr1", "chr2"]);
    }

    #[test]
    fn test_bin_width_from_single_row() {
        let s = parse_timing_track("chr3\t1000\t1250\t1.0\n".as_bytes()).unwrap();
        assert_eq!(s.bin_size_bp(), 250);
        assert_eq!(s.early_domains().len(), 1);
    }

    #[test]
    fn test_invalid_tracks() {
        let err = parse_timing_track("chr1\t100\t100\t1.0\n".as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RepliwaveError::DataReadingError(DataReadingError::InvalidBinWidth(0))
        ));

        let split = "chr1\t0\t100\t1.0\nchr2\t0\t100\t1.0\nchr1\t100\t200\t1.0\n";
        let err = parse_timing_track(split.as_bytes()).unwrap_err();
        assert!(matches!(
            err,
            RepliwaveError::DataReadingError(DataReadingError::DuplicateChromosome(_))
        ));

        assert!(parse_timing_track("# nothing\n".as_bytes()).is_err());
    }
}
