//! Bounded Nelder-Mead downhill simplex minimization with random restarts.
//!
//! Every restart scatters a fresh simplex around the initial guess (each
//! parameter gets the values `initial + k * perturbation` for `k = 0..=n`,
//! shuffled independently), then runs a fixed number of reflect / expand /
//! contract / shrink steps. The best vertex over all restarts is returned.
//!
//! Lower bounds are honoured by shortening the reflection and expansion moves
//! so that they never step below the bound.

mod objective;

pub use objective::{
    Evaluation,
    Objective,
    SquaredErrorObjective,
};
use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{
    debug,
    trace,
};

/// Default number of simplex steps run per restart.
pub const DEFAULT_STEPS_PER_RESTART: usize = 200;

/// Default number of restarts.
pub const DEFAULT_RESTARTS: usize = 20;

/// Fraction of the reflection vector used by both contractions.
const CONTRACTION_FACTOR: f64 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum NelderMeadError {
    /// No parameters were given.
    NoParameters,
    /// Perturbation vector length does not match the initial guess.
    PerturbationLengthMismatch { expected: usize, found: usize },
    /// Lower bound vector length does not match the initial guess.
    BoundsLengthMismatch { expected: usize, found: usize },
}

impl std::fmt::Display for NelderMeadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoParameters => write!(f, "Cannot optimize an empty parameter vector"),
            Self::PerturbationLengthMismatch { expected, found } => write!(
                f,
                "Expected {} perturbation values, found {}",
                expected, found
            ),
            Self::BoundsLengthMismatch { expected, found } => {
                write!(f, "Expected {} lower bounds, found {}", expected, found)
            }
        }
    }
}

impl std::error::Error for NelderMeadError {}

/// A scored parameter set.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Vertex {
    pub parameters: Vec<f64>,
    pub error: f64,
}

/// Result of a minimization.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum SimplexFit {
    /// The objective reported [`Evaluation::Converged`] for these parameters.
    Converged(Vec<f64>),
    /// Best vertex found after all restarts.
    Best(Vertex),
}

impl SimplexFit {
    pub fn parameters(&self) -> &[f64] {
        match self {
            Self::Converged(p) => p,
            Self::Best(v) => &v.parameters,
        }
    }

    pub fn into_parameters(self) -> Vec<f64> {
        match self {
            Self::Converged(p) => p,
            Self::Best(v) => v.parameters,
        }
    }

    /// Error of the returned parameters, `None` when the objective converged.
    pub fn error(&self) -> Option<f64> {
        match self {
            Self::Converged(_) => None,
            Self::Best(v) => Some(v.error),
        }
    }
}

enum RestartOutcome {
    Converged(Vec<f64>),
    Finished(Vertex),
}

/// Evaluates the parameters and bails out of the enclosing restart when the
/// objective reports convergence.
macro_rules! score_or_return {
    ($objective:expr, $params:expr) => {
        match $objective.evaluate(&$params) {
            Evaluation::Error(e) => e,
            Evaluation::Converged => return RestartOutcome::Converged($params),
        }
    };
}

/// Optimizer settings.
#[derive(Debug, Clone)]
pub struct NelderMead {
    initial: Vec<f64>,
    perturbation: Vec<f64>,
    lower_bounds: Vec<Option<f64>>,
    steps_per_restart: usize,
    restarts: usize,
}

impl NelderMead {
    pub fn new(initial: Vec<f64>, perturbation: Vec<f64>) -> Result<Self, NelderMeadError> {
        if initial.is_empty() {
            return Err(NelderMeadError::NoParameters);
        }
        if perturbation.len() != initial.len() {
            return Err(NelderMeadError::PerturbationLengthMismatch {
                expected: initial.len(),
                found: perturbation.len(),
            });
        }
        let lower_bounds = vec![None; initial.len()];
        Ok(Self {
            initial,
            perturbation,
            lower_bounds,
            steps_per_restart: DEFAULT_STEPS_PER_RESTART,
            restarts: DEFAULT_RESTARTS,
        })
    }

    /// Sets per-parameter lower bounds, `None` leaves a parameter unbounded.
    pub fn with_lower_bounds(
        mut self,
        lower_bounds: Vec<Option<f64>>,
    ) -> Result<Self, NelderMeadError> {
        if lower_bounds.len() != self.initial.len() {
            return Err(NelderMeadError::BoundsLengthMismatch {
                expected: self.initial.len(),
                found: lower_bounds.len(),
            });
        }
        self.lower_bounds = lower_bounds;
        Ok(self)
    }

    pub fn with_steps_per_restart(mut self, steps: usize) -> Self {
        self.steps_per_restart = steps;
        self
    }

    pub fn with_restarts(mut self, restarts: usize) -> Self {
        self.restarts = restarts;
        self
    }

    pub fn num_parameters(&self) -> usize {
        self.initial.len()
    }

    /// Minimizes using the thread-local rng.
    pub fn minimize<O: Objective + ?Sized>(&self, objective: &O) -> Option<SimplexFit> {
        self.minimize_with_rng(objective, &mut rand::thread_rng())
    }

    /// Minimizes `objective`, returns `None` if no restart produced a finite
    /// error (or if zero restarts were requested).
    pub fn minimize_with_rng<O, R>(&self, objective: &O, rng: &mut R) -> Option<SimplexFit>
    where
        O: Objective + ?Sized,
        R: Rng + ?Sized,
    {
        let mut best: Option<Vertex> = None;
        for restart in 0..self.restarts {
            match self.run_restart(objective, rng) {
                RestartOutcome::Converged(parameters) => {
                    debug!("Objective converged on restart {}", restart);
                    return Some(SimplexFit::Converged(parameters));
                }
                RestartOutcome::Finished(vertex) => {
                    trace!("Restart {} finished with error {}", restart, vertex.error);
                    let best_error = best.as_ref().map_or(f64::INFINITY, |b| b.error);
                    if vertex.error < best_error {
                        best = Some(vertex);
                    }
                }
            }
        }
        best.map(SimplexFit::Best)
    }

    fn initial_simplex<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Vec<f64>> {
        let n = self.initial.len();
        let mut vertices = vec![vec![0.0; n]; n + 1];
        for (param_idx, (start, step)) in self.initial.iter().zip(&self.perturbation).enumerate() {
            let mut values: Vec<f64> = (0..=n).map(|k| start + k as f64 * step).collect();
            values.shuffle(rng);
            for (vertex, value) in vertices.iter_mut().zip(values) {
                vertex[param_idx] = value;
            }
        }
        vertices
    }

    /// Shortens `delta` so that `centroid + delta` respects the lower bounds.
    fn bound_move(&self, centroid: &[f64], delta: &mut [f64]) {
        for ((d, c), bound) in delta.iter_mut().zip(centroid).zip(&self.lower_bounds) {
            if let Some(min) = bound {
                if c + *d < *min {
                    *d = min - c;
                }
            }
        }
    }

    fn run_restart<O, R>(&self, objective: &O, rng: &mut R) -> RestartOutcome
    where
        O: Objective + ?Sized,
        R: Rng + ?Sized,
    {
        let n = self.initial.len();
        let mut simplex: Vec<Vertex> = Vec::with_capacity(n + 1);
        for parameters in self.initial_simplex(rng) {
            let error = score_or_return!(objective, parameters);
            simplex.push(Vertex { parameters, error });
        }

        for _ in 0..self.steps_per_restart {
            simplex.sort_by(|a, b| a.error.total_cmp(&b.error));

            let mut centroid = vec![0.0; n];
            for vertex in &simplex[..n] {
                for (c, p) in centroid.iter_mut().zip(&vertex.parameters) {
                    *c += p;
                }
            }
            centroid.iter_mut().for_each(|c| *c /= n as f64);

            let best_error = simplex[0].error;
            let worst_error = simplex[n].error;
            let second_worst_error = simplex[n - 1].error;

            let mut delta: Vec<f64> = centroid
                .iter()
                .zip(&simplex[n].parameters)
                .map(|(c, w)| c - w)
                .collect();
            self.bound_move(&centroid, &mut delta);

            let reflected: Vec<f64> = centroid.iter().zip(&delta).map(|(c, d)| c + d).collect();
            let reflected_error = score_or_return!(objective, reflected.clone());

            if reflected_error < second_worst_error && reflected_error >= best_error {
                simplex[n] = Vertex {
                    parameters: reflected,
                    error: reflected_error,
                };
            } else if reflected_error < best_error {
                let mut expansion = delta.clone();
                self.bound_move(&reflected, &mut expansion);
                let expanded: Vec<f64> =
                    reflected.iter().zip(&expansion).map(|(r, d)| r + d).collect();
                let expanded_error = score_or_return!(objective, expanded.clone());
                simplex[n] = if expanded_error < reflected_error {
                    Vertex {
                        parameters: expanded,
                        error: expanded_error,
                    }
                } else {
                    Vertex {
                        parameters: reflected,
                        error: reflected_error,
                    }
                };
            } else {
                let mut outward: Vec<f64> = delta.iter().map(|d| d * CONTRACTION_FACTOR).collect();
                self.bound_move(&centroid, &mut outward);
                let outside: Vec<f64> =
                    centroid.iter().zip(&outward).map(|(c, d)| c + d).collect();
                let inside: Vec<f64> = centroid
                    .iter()
                    .zip(&delta)
                    .map(|(c, d)| c - d * CONTRACTION_FACTOR)
                    .collect();
                let outside_error = score_or_return!(objective, outside.clone());
                let inside_error = score_or_return!(objective, inside.clone());

                if outside_error < inside_error && outside_error < worst_error {
                    simplex[n] = Vertex {
                        parameters: outside,
                        error: outside_error,
                    };
                } else if inside_error < worst_error {
                    simplex[n] = Vertex {
                        parameters: inside,
                        error: inside_error,
                    };
                } else {
                    let anchor = simplex[0].parameters.clone();
                    for vertex in simplex.iter_mut().skip(1) {
                        let shrunk: Vec<f64> = vertex
                            .parameters
                            .iter()
                            .zip(&anchor)
                            .map(|(v, b)| (v + b) / 2.0)
                            .collect();
                        vertex.error = score_or_return!(objective, shrunk.clone());
                        vertex.parameters = shrunk;
                    }
                }
            }
        }

        simplex.sort_by(|a, b| a.error.total_cmp(&b.error));
        RestartOutcome::Finished(simplex.swap_remove(0))
    }
}
