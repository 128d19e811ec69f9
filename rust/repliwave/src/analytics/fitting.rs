use rand::Rng;
use serde::Serialize;
use simplexfit::{
    NelderMead,
    SquaredErrorObjective,
};
use tracing::{
    debug,
    instrument,
};

use crate::config::FitSettings;
use crate::data_centre::DataCentre;
use crate::errors::Result;
use crate::models::{
    FlatToppedGaussian,
    Gaussian,
    PeakCurve,
};

/// Typical standard deviation of a single replication peak.
const STDEV_GUESS_KB: f64 = 50.0;
/// Allowed drift of the centre guess when building the simplex.
const CENTER_PERTURBATION_KB: f64 = 20.0;
/// Relative perturbation of height, stdev and plateau guesses.
const RELATIVE_PERTURBATION: f64 = 0.3;

/// A curve fitted to a region. Its x axis is the bin index within the region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurveFit<C> {
    pub curve: C,
    /// Squared error of the fit, `None` when the fit hit the tolerance.
    pub error: Option<f64>,
    pub bin_size_kb: f64,
}

impl<C: PeakCurve> CurveFit<C> {
    pub fn full_width_at_half_max_kb(&self) -> f64 {
        self.curve.full_width_at_half_max() * self.bin_size_kb
    }
}

struct FitProblem {
    initial: Vec<f64>,
    perturbation: Vec<f64>,
    lower_bounds: Vec<Option<f64>>,
}

fn fit_curve<C, R>(
    observed: &[f64],
    problem: FitProblem,
    settings: &FitSettings,
    bin_size_kb: f64,
    rng: &mut R,
) -> Result<Option<CurveFit<C>>>
where
    C: PeakCurve,
    R: Rng + ?Sized,
{
    let signal_sum: f64 = observed.iter().sum();
    let tolerated = (signal_sum * settings.tolerance).powi(2);
    let objective = SquaredErrorObjective::new(observed, tolerated, |parameters: &[f64], x: f64| {
        C::from_parameters(parameters).map_or(f64::NAN, |curve| curve.value(x))
    });

    let optimizer = NelderMead::new(problem.initial, problem.perturbation)?
        .with_lower_bounds(problem.lower_bounds)?
        .with_steps_per_restart(settings.steps_per_restart)
        .with_restarts(settings.restarts);

    let Some(fit) = optimizer.minimize_with_rng(&objective, rng) else {
        debug!("No restart produced a finite error");
        return Ok(None);
    };
    let error = fit.error();
    let curve = C::from_parameters(&fit.into_parameters())?;
    Ok(Some(CurveFit {
        curve,
        error,
        bin_size_kb,
    }))
}

impl DataCentre {
    /// Signal of the region, `None` when no bin of it lies on the chromosome.
    fn observed_region(
        &self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
    ) -> Result<Option<&[f64]>> {
        let observed = self.region_values(dataset, chromosome, start_kb, end_kb)?;
        if observed.is_empty() {
            debug!("No signal in {}:{}-{}", chromosome, start_kb, end_kb);
            return Ok(None);
        }
        Ok(Some(observed))
    }

    /// Fits a Gaussian to the signal of a region, which should hold a single
    /// peak surrounded by roughly a megabase of signal. `None` for a region
    /// off the chromosome.
    pub fn fit_gaussian(
        &self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        settings: &FitSettings,
    ) -> Result<Option<CurveFit<Gaussian>>> {
        self.fit_gaussian_with_rng(
            dataset,
            chromosome,
            start_kb,
            end_kb,
            settings,
            &mut rand::thread_rng(),
        )
    }

    #[instrument(skip(self, settings, rng))]
    pub fn fit_gaussian_with_rng<R: Rng + ?Sized>(
        &self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        settings: &FitSettings,
        rng: &mut R,
    ) -> Result<Option<CurveFit<Gaussian>>> {
        let Some(observed) = self.observed_region(dataset, chromosome, start_kb, end_kb)? else {
            return Ok(None);
        };
        let bin = self.bin_size_kb();
        let height = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let stdev = STDEV_GUESS_KB / bin;
        let problem = FitProblem {
            initial: vec![height, observed.len() as f64 / 2.0, stdev],
            perturbation: vec![
                height * RELATIVE_PERTURBATION,
                CENTER_PERTURBATION_KB / bin,
                stdev * RELATIVE_PERTURBATION,
            ],
            lower_bounds: vec![Some(0.0), None, Some(0.0)],
        };
        fit_curve(observed, problem, settings, bin, rng)
    }

    pub fn fit_flat_topped_gaussian(
        &self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        settings: &FitSettings,
    ) -> Result<Option<CurveFit<FlatToppedGaussian>>> {
        self.fit_flat_topped_gaussian_with_rng(
            dataset,
            chromosome,
            start_kb,
            end_kb,
            settings,
            &mut rand::thread_rng(),
        )
    }

    #[instrument(skip(self, settings, rng))]
    pub fn fit_flat_topped_gaussian_with_rng<R: Rng + ?Sized>(
        &self,
        dataset: &str,
        chromosome: &str,
        start_kb: f64,
        end_kb: f64,
        settings: &FitSettings,
        rng: &mut R,
    ) -> Result<Option<CurveFit<FlatToppedGaussian>>> {
        let Some(observed) = self.observed_region(dataset, chromosome, start_kb, end_kb)? else {
            return Ok(None);
        };
        let bin = self.bin_size_kb();
        let height = observed.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let stdev = STDEV_GUESS_KB / bin;
        let top_width = STDEV_GUESS_KB / bin;
        let problem = FitProblem {
            initial: vec![height, observed.len() as f64 / 2.0, stdev, top_width],
            perturbation: vec![
                height * RELATIVE_PERTURBATION,
                CENTER_PERTURBATION_KB / bin,
                stdev * RELATIVE_PERTURBATION,
                top_width * RELATIVE_PERTURBATION,
            ],
            lower_bounds: vec![Some(0.0), None, Some(0.0), Some(0.0)],
        };
        fit_curve(observed, problem, settings, bin, rng)
    }
}
