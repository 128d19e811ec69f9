use serde::Serialize;
use tracing::instrument;

use crate::data_centre::DataCentre;
use crate::errors::Result;

/// Peak widths of the heatmap rows, doubling every two rows.
pub const HEATMAP_PEAK_WIDTHS_KB: [f64; 21] = [
    50.0, 70.7, 100.0, 141.0, 200.0, 283.0, 400.0, 566.0, 800.0, 1131.0, 1600.0, 2263.0, 3200.0, 4525.0,
    6400.0, 9051.0, 12800.0, 18102.0, 25600.0, 36204.0, 51200.0,
];

/// Responses of one region across increasing wavelet peak widths, negative
/// responses clipped to zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseHeatmap {
    pub peak_widths_kb: Vec<f64>,
    pub positions_kb: Vec<f64>,
    pub rows: Vec<Vec<f64>>,
}

impl DataCentre {
    /// Stops at the first width wider than the region itself.
    #[instrument(skip(self))]
    pub fn response_heatmap(
        &mut self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
    ) -> Result<Option<ResponseHeatmap>> {
        let mut heatmap = ResponseHeatmap {
            peak_widths_kb: Vec::new(),
            positions_kb: Vec::new(),
            rows: Vec::new(),
        };
        for width_kb in HEATMAP_PEAK_WIDTHS_KB {
            if width_kb > end_kb - start_kb {
                break;
            }
            let Some(region) = self.analyse_region(dataset, chromosome, start_kb, end_kb, width_kb)? else {
                return Ok(None);
            };
            if heatmap.positions_kb.is_empty() {
                heatmap.positions_kb = region.positions_kb;
            }
            heatmap
                .rows
                .push(region.response.into_iter().map(|r| r.max(0.0)).collect());
            heatmap.peak_widths_kb.push(width_kb);
        }
        Ok(Some(heatmap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_centre::tests::{
        bumps,
        centre,
    };

    #[test]
    fn test_rows_stop_at_region_width() {
        let mut dc = centre(vec![("a", vec![("chr1", bumps(200, 0.0, &[(100.0, 5.0, 4.0)]))])]);
        let heatmap = dc.response_heatmap("a", "chr1", 800.0, 1200.0).unwrap().unwrap();

        assert_eq!(heatmap.peak_widths_kb, vec![50.0, 70.7, 100.0, 141.0, 200.0, 283.0, 400.0]);
        assert_eq!(heatmap.rows.len(), 7);
        assert_eq!(heatmap.positions_kb.len(), 41);
        assert_eq!(heatmap.positions_kb[0], 805.0);
        for row in &heatmap.rows {
            assert_eq!(row.len(), heatmap.positions_kb.len());
            assert!(row.iter().all(|v| *v >= 0.0));
        }
        // The bump centre lights up at the narrow widths
        assert!(heatmap.rows[2][20] > 0.0);
    }

    #[test]
    fn test_region_off_the_chromosome() {
        let mut dc = centre(vec![("a", vec![("chr1", bumps(50, 0.0, &[(25.0, 5.0, 4.0)]))])]);
        assert_eq!(dc.response_heatmap("a", "chr1", 600.0, 900.0).unwrap(), None);
        assert_eq!(dc.response_heatmap("a", "chr9", 0.0, 300.0).unwrap(), None);
    }
}
