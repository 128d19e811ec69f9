use serde::Serialize;

/// Summary of the signal inside a region. All zero for an empty region.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct RegionStats {
    pub total: f64,
    pub max: f64,
    pub min: f64,
    pub mean: f64,
}

impl RegionStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let total: f64 = values.iter().sum();
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        Self {
            total,
            max,
            min,
            mean: total / values.len() as f64,
        }
    }
}

/// Slice of a convolution response together with the bin midpoints it
/// belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionResponse {
    pub positions_kb: Vec<f64>,
    pub response: Vec<f64>,
}

impl RegionResponse {
    /// Largest response and the position it sits at. First maximum wins.
    pub fn max_with_position(&self) -> Option<(f64, f64)> {
        let mut best: Option<(f64, f64)> = None;
        for (value, position) in self.response.iter().zip(&self.positions_kb) {
            match best {
                Some((current, _)) if *value <= current => {}
                _ => best = Some((*value, *position)),
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_with_position_keeps_first() {
        let r = RegionResponse {
            positions_kb: vec![10.0, 20.0, 30.0, 40.0],
            response: vec![1.0, 3.0, 3.0, 2.0],
        };
        assert_eq!(r.max_with_position(), Some((3.0, 20.0)));

        let empty = RegionResponse {
            positions_kb: vec![],
            response: vec![],
        };
        assert_eq!(empty.max_with_position(), None);
    }
}
