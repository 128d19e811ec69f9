use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::analytics::GrowthSeries;
use crate::errors::{
    DataReadingError,
    Result,
};

/// Writes one row per peak, start and end in Mb, then the width at every
/// time point in kb. Peaks without a complete series keep only their
/// coordinates.
pub fn write_growth_report<T: AsRef<Path>>(path: T, labels: &[String], series: &[GrowthSeries]) -> Result<()> {
    info!("Writing growth report to {}", path.as_ref().display());
    let file = std::fs::File::create(path.as_ref()).map_err(DataReadingError::from)?;
    write_growth_table(file, labels, series)
}

pub fn write_growth_table<W: Write>(writer: W, labels: &[String], series: &[GrowthSeries]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    let mut header = vec!["chromo".to_string(), "start".to_string(), "end".to_string()];
    header.extend(labels.iter().cloned());
    header.push(String::new());
    wtr.write_record(&header).map_err(DataReadingError::from)?;

    for growth in series {
        let mut row = vec![
            growth.region.chromosome.clone(),
            format!("{:.2}", growth.region.start_kb / 1000.0),
            format!("{:.2}", growth.region.end_kb / 1000.0),
        ];
        if let Some(widths) = &growth.widths_kb {
            row.extend(widths.iter().map(|w| format!("{:.0}", w)));
        }
        row.push(String::new());
        wtr.write_record(&row).map_err(DataReadingError::from)?;
    }
    wtr.flush().map_err(DataReadingError::from)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PeakRegion;

    #[test]
    fn test_report_layout() {
        let labels = vec!["t1".to_string(), "t2".to_string()];
        let series = vec![
            GrowthSeries {
                region: PeakRegion {
                    chromosome: "chr1".to_string(),
                    start_kb: 1250.0,
                    end_kb: 1730.0,
                },
                widths_kb: Some(vec![240.4, 381.6]),
            },
            GrowthSeries {
                region: PeakRegion {
                    chromosome: "chr2".to_string(),
                    start_kb: 500.0,
                    end_kb: 900.0,
                },
                widths_kb: None,
            },
        ];

        let mut out = Vec::new();
        write_growth_table(&mut out, &labels, &series).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "chromo\tstart\tend\tt1\tt2\t\nchr1\t1.25\t1.73\t240\t382\t\nchr2\t0.50\t0.90\t\n"
        );
    }
}
