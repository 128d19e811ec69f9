use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use simplexfit::{
    Evaluation,
    NelderMead,
    NelderMeadError,
    SimplexFit,
    SquaredErrorObjective,
};
use std::cell::Cell;

fn gaussian(p: &[f64], x: f64) -> f64 {
    let z = (x - p[1]) / p[2];
    p[0] * (-0.5 * z * z).exp()
}

#[test]
fn test_recovers_gaussian_parameters() {
    let observed: Vec<f64> = (0..60).map(|i| gaussian(&[10.0, 28.0, 6.0], i as f64)).collect();
    let objective = SquaredErrorObjective::new(&observed, 1e-6, gaussian);

    for seed in [1_u64, 7, 42] {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let fit = NelderMead::new(vec![8.0, 30.0, 4.0], vec![2.4, 2.0, 1.0])
            .unwrap()
            .with_lower_bounds(vec![Some(0.0), None, Some(0.0)])
            .unwrap()
            .with_restarts(20)
            .with_steps_per_restart(400)
            .minimize_with_rng(&objective, &mut rng)
            .expect("fit should produce a result");

        let p = fit.parameters();
        assert!((p[0] - 10.0).abs() < 0.1, "seed {}: height {}", seed, p[0]);
        assert!((p[1] - 28.0).abs() < 0.1, "seed {}: centre {}", seed, p[1]);
        assert!((p[2].abs() - 6.0).abs() < 0.1, "seed {}: sigma {}", seed, p[2]);
    }
}

#[test]
fn test_minimizes_quadratic() {
    let objective = |p: &[f64]| Evaluation::Error((p[0] - 3.0).powi(2) + (p[1] + 1.0).powi(2));
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let fit = NelderMead::new(vec![0.0, 0.0], vec![1.0, 1.0])
        .unwrap()
        .minimize_with_rng(&objective, &mut rng)
        .unwrap();

    let p = fit.parameters();
    assert!((p[0] - 3.0).abs() < 1e-4);
    assert!((p[1] + 1.0).abs() < 1e-4);
    assert!(fit.error().unwrap() < 1e-8);
}

#[test]
fn test_lower_bound_is_respected() {
    // Unconstrained minimum sits at -5, bounded at 0
    let objective = |p: &[f64]| Evaluation::Error((p[0] + 5.0).powi(2));
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let fit = NelderMead::new(vec![4.0], vec![1.0])
        .unwrap()
        .with_lower_bounds(vec![Some(0.0)])
        .unwrap()
        .with_restarts(3)
        .minimize_with_rng(&objective, &mut rng)
        .unwrap();

    let p = fit.parameters();
    assert!(p[0] >= 0.0, "parameter went below bound: {}", p[0]);
    assert!(p[0] < 1e-3, "parameter did not reach bound: {}", p[0]);
}

#[test]
fn test_converged_objective_returns_immediately() {
    let calls = Cell::new(0_usize);
    let objective = |_: &[f64]| {
        calls.set(calls.get() + 1);
        Evaluation::Converged
    };
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let fit = NelderMead::new(vec![1.0, 2.0], vec![0.5, 0.5])
        .unwrap()
        .minimize_with_rng(&objective, &mut rng)
        .unwrap();

    assert!(matches!(fit, SimplexFit::Converged(_)));
    assert_eq!(fit.error(), None);
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_converged_during_shrink_stops_the_fit() {
    // A flat objective never beats the worst vertex, so every step shrinks.
    // Calls: 3 initial vertices, 1 reflection, 2 contractions, then the shrink.
    let calls = Cell::new(0_usize);
    let objective = |_: &[f64]| {
        calls.set(calls.get() + 1);
        if calls.get() == 7 {
            Evaluation::Converged
        } else {
            Evaluation::Error(1.0)
        }
    };
    let mut rng = ChaCha8Rng::seed_from_u64(2);
    let fit = NelderMead::new(vec![1.0, 2.0], vec![0.5, 0.5])
        .unwrap()
        .with_restarts(5)
        .minimize_with_rng(&objective, &mut rng)
        .unwrap();

    assert!(matches!(fit, SimplexFit::Converged(_)));
    assert_eq!(calls.get(), 7);
}

#[test]
fn test_zero_restarts_gives_no_result() {
    let objective = |p: &[f64]| Evaluation::Error(p[0] * p[0]);
    let fit = NelderMead::new(vec![1.0], vec![1.0])
        .unwrap()
        .with_restarts(0)
        .minimize(&objective);
    assert!(fit.is_none());
}

#[test]
fn test_nan_objective_gives_no_result() {
    let objective = |_: &[f64]| Evaluation::Error(f64::NAN);
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let fit = NelderMead::new(vec![1.0], vec![1.0])
        .unwrap()
        .with_restarts(2)
        .with_steps_per_restart(5)
        .minimize_with_rng(&objective, &mut rng);
    assert!(fit.is_none());
}

#[test]
fn test_length_mismatch_is_an_error() {
    let err = NelderMead::new(vec![1.0, 2.0], vec![1.0]).unwrap_err();
    assert_eq!(
        err,
        NelderMeadError::PerturbationLengthMismatch {
            expected: 2,
            found: 1
        }
    );

    let err = NelderMead::new(vec![1.0, 2.0], vec![1.0, 1.0])
        .unwrap()
        .with_lower_bounds(vec![None])
        .unwrap_err();
    assert_eq!(
        err,
        NelderMeadError::BoundsLengthMismatch {
            expected: 2,
            found: 1
        }
    );

    assert_eq!(
        NelderMead::new(vec![], vec![]).unwrap_err(),
        NelderMeadError::NoParameters
    );
}
