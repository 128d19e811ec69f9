/// What an objective reports back for one parameter set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    /// Error of the parameter set (lower is better).
    Error(f64),
    /// The parameter set is good enough, the optimizer stops right away and
    /// returns it.
    Converged,
}

/// Function minimized by [`crate::NelderMead`].
///
/// Implementations bundle whatever observed data they compare against, so the
/// optimizer itself stays generic and never needs to know about the model.
pub trait Objective {
    fn evaluate(&self, parameters: &[f64]) -> Evaluation;
}

impl<F> Objective for F
where
    F: Fn(&[f64]) -> Evaluation,
{
    fn evaluate(&self, parameters: &[f64]) -> Evaluation {
        self(parameters)
    }
}

/// Sum-of-squared-error objective with an early-exit threshold.
///
/// `model` maps a parameter set and an x value (the index into `observed`)
/// to the predicted y. The objective reports [`Evaluation::Converged`] once
/// the summed squared error drops below `tolerated_error`.
pub struct SquaredErrorObjective<'a, M> {
    observed: &'a [f64],
    tolerated_error: f64,
    model: M,
}

impl<'a, M> SquaredErrorObjective<'a, M>
where
    M: Fn(&[f64], f64) -> f64,
{
    pub fn new(observed: &'a [f64], tolerated_error: f64, model: M) -> Self {
        Self {
            observed,
            tolerated_error,
            model,
        }
    }

    pub fn sum_squared_error(&self, parameters: &[f64]) -> f64 {
        self.observed
            .iter()
            .enumerate()
            .map(|(i, y)| {
                let diff = (self.model)(parameters, i as f64) - y;
                diff * diff
            })
            .sum()
    }
}

impl<M> Objective for SquaredErrorObjective<'_, M>
where
    M: Fn(&[f64], f64) -> f64,
{
    fn evaluate(&self, parameters: &[f64]) -> Evaluation {
        let error = self.sum_squared_error(parameters);
        if error < self.tolerated_error {
            Evaluation::Converged
        } else {
            Evaluation::Error(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_error_objective() {
        let observed = vec![1.0, 2.0, 3.0];
        let objective = SquaredErrorObjective::new(&observed, 0.5, |p: &[f64], x: f64| p[0] * x);
        // slope 1 predicts 0,1,2 -> every point off by one
        assert_eq!(objective.evaluate(&[1.0]), Evaluation::Error(3.0));
        assert_eq!(objective.sum_squared_error(&[1.0]), 3.0);
    }

    #[test]
    fn test_squared_error_objective_converges_below_tolerance() {
        let observed = vec![0.0, 2.0, 4.0];
        let objective = SquaredErrorObjective::new(&observed, 1e-9, |p: &[f64], x: f64| p[0] * x);
        assert_eq!(objective.evaluate(&[2.0]), Evaluation::Converged);
    }

    #[test]
    fn test_closure_objective() {
        let objective = |p: &[f64]| Evaluation::Error(p.iter().map(|x| x * x).sum());
        assert_eq!(objective.evaluate(&[3.0, 4.0]), Evaluation::Error(25.0));
    }
}
