//! Integration tests for the joint period search.
//!
//! Purpose
//! -------
//! - Validate the end-to-end pipeline: from raw light curves with segment
//!   offsets and external-parameter trends, through the periodogram scan and
//!   refinement, to the per-dataset amplitude and T0 reconstruction.
//! - Exercise the public crate surface only, the way a downstream caller
//!   would.
//!
//! Coverage
//! --------
//! - `models::PeriodSearch` on two datasets with different systematics.
//! - `regression::{null, single}` statistical and structural properties.
//! - `search::{search, refine}` window-function and permutation behavior.
//!
//! Exclusions
//! ----------
//! - Python bindings; those are exercised from the Python package.
//! - Low-level solver numerics; covered by unit tests in `regression::normal`.
use ndarray::{Array1, Array2};
use periodfit::{
    FaultKind, LightCurve, PeriodSearch, SearchOptions, build_designs, null,
    lightcurve::longest_baseline,
    search::{FrequencyGrid, RefineScale, search_with},
    single,
};
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal, Uniform};
use std::f64::consts::PI;

const PERIOD: f64 = 3.0;
const AMPLITUDE: f64 = 0.05;
const PHASE: f64 = 0.25;

/// Route `tracing` output through the test harness (`RUST_LOG` filters it).
fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Purpose
/// -------
/// Simulate one dataset of `n` samples with a sinusoid of period
/// [`PERIOD`], amplitude `amplitude` and phase [`PHASE`] on top of
/// per-segment offsets and one external-parameter trend.
///
/// Parameters
/// ----------
/// - `amplitude`: sinusoid semi-amplitude in magnitudes (0 for pure noise).
/// - `start`, `span`: sampling window `[start, start + span)` in days.
/// - `offsets`: one offset per segment; segments split the window evenly.
/// - `ep_sigma`, `ep_slope`: noise level and slope of the external parameter.
/// - `noise`: photometric noise (also the reported uncertainty).
fn simulate(
    rng: &mut StdRng, amplitude: f64, n: usize, start: f64, span: f64, offsets: &[f64],
    ep_sigma: f64, ep_slope: f64, noise: f64,
) -> LightCurve<String> {
    let when = Uniform::new(start, start + span);
    let mut t: Vec<f64> = (0..n).map(|_| when.sample(rng)).collect();
    t.sort_by(f64::total_cmp);

    let ep_noise = Normal::new(0.0, ep_sigma).unwrap();
    let phot = Normal::new(0.0, noise).unwrap();
    let n_seg = offsets.len();

    let segment_of = |t: f64| (((t - start) / span * n_seg as f64) as usize).min(n_seg - 1);
    let segments: Vec<String> = t.iter().map(|&t| format!("night-{}", segment_of(t))).collect();
    let ep = Array2::from_shape_fn((1, n), |_| 1.0 + ep_noise.sample(rng));
    let y = Array1::from_iter((0..n).map(|j| {
        offsets[segment_of(t[j])]
            + ep_slope * ep[(0, j)]
            + amplitude * (2.0 * PI * (t[j] / PERIOD - PHASE)).sin()
            + phot.sample(rng)
    }));

    LightCurve::new(Array1::from(t), y, Array1::from_elem(n, noise), segments, ep).unwrap()
}

fn two_datasets(seed: u64) -> Vec<LightCurve<String>> {
    let mut rng = StdRng::seed_from_u64(seed);
    vec![
        simulate(&mut rng, AMPLITUDE, 50, 0.0, 21.0, &[12.30, 12.42], 0.02, 0.6, 0.004),
        simulate(&mut rng, AMPLITUDE, 50, 4.0, 24.0, &[14.05, 13.98, 14.11], 0.05, -0.4, 0.006),
    ]
}

#[test]
// Purpose
// -------
// End-to-end recovery of a shared period and per-dataset amplitudes.
//
// Given
// -----
// - Two datasets of 50 points, P = 3.0 d, 2 and 3 segments, different
//   external-parameter noise, A = 0.05 mag, phase 0.25.
// - Period range [2.5, 3.5] d at 10× oversampling.
//
// Expect
// ------
// - Refined period within 1% of 3.0 d, interior minimum.
// - Reconstructed amplitudes within 10% of 0.05 for both datasets.
// - A clear detection (tiny single-trial false-alarm probability).
fn joint_search_recovers_period_and_amplitudes() {
    init_logging();
    let curves = two_datasets(42);
    let outcome = PeriodSearch::default().run(&curves, 2.5, 3.5).unwrap();

    let period = outcome.best_period();
    assert!((period - PERIOD).abs() / PERIOD < 0.01, "period = {period}");
    assert_eq!(outcome.refinement().boundary, None);

    let recs = outcome.reconstructions();
    assert_eq!(recs.len(), 2);
    for rec in recs {
        let amp = rec.amplitude();
        assert!((amp - AMPLITUDE).abs() / AMPLITUDE < 0.10, "dataset {}: A = {amp}", rec.dataset);
        assert_eq!(rec.corrected.len(), 50);
    }
    assert!(outcome.false_alarm_probability() < 1e-6);
    assert!(outcome.periodogram().window().iter().all(|&w| (0.0..=1.0 + 1e-12).contains(&w)));
}

#[test]
// Purpose
// -------
// Both refinement scales agree on the detected period.
fn refinement_scales_agree_on_period() {
    let curves = two_datasets(7);
    let chi = PeriodSearch::default().run(&curves, 2.5, 3.5).unwrap();
    let opts = SearchOptions { refine_scale: RefineScale::SqrtChiSquare, ..Default::default() };
    let sqrt = PeriodSearch::new(opts).run(&curves, 2.5, 3.5).unwrap();

    assert_eq!(chi.refinement().min_index, sqrt.refinement().min_index);
    assert!((chi.best_period() - sqrt.best_period()).abs() / PERIOD < 0.01);
}

#[test]
// Purpose
// -------
// The null fit on pure noise has reduced chi-square ≈ 1 across datasets.
//
// Given
// -----
// - Three datasets (600 samples each) of Gaussian noise around segment
//   offsets and an external-parameter trend, with correct uncertainties.
//
// Expect
// ------
// - `|χ²/(n − p) − 1| < 0.15`.
fn null_on_noise_has_unit_reduced_chi2() {
    let mut rng = StdRng::seed_from_u64(99);
    let curves: Vec<LightCurve<String>> = (0..3)
        .map(|k| simulate(&mut rng, 0.0, 600, k as f64, 30.0, &[10.0, 10.2, 9.9], 0.03, 0.2, 0.01))
        .collect();
    let designs = build_designs(&curves).unwrap();
    let fit = null(&designs).unwrap();

    assert_eq!(fit.n_samples(), 1800);
    assert_eq!(fit.layout().len(), 3 * (3 + 1));
    let reduced = fit.chi2() / (1800 - 12) as f64;
    assert!((reduced - 1.0).abs() < 0.15, "reduced chi2 = {reduced}");
}

#[test]
// Purpose
// -------
// Shuffling samples within each dataset changes neither the periodogram
// nor the fitted offsets.
//
// Expect
// ------
// - Identical chi-square sequences (to rounding) and identical coefficients.
fn sample_order_does_not_matter() {
    let curves = two_datasets(3);
    let shuffled: Vec<LightCurve<String>> = curves
        .iter()
        .map(|lc| {
            let n = lc.len();
            let order: Vec<usize> = (0..n).map(|i| (i * 17 + 5) % n).collect();
            LightCurve::new(
                Array1::from_iter(order.iter().map(|&j| lc.time()[j])),
                Array1::from_iter(order.iter().map(|&j| lc.mag()[j])),
                Array1::from_iter(order.iter().map(|&j| lc.mag_err()[j])),
                order.iter().map(|&j| lc.segments()[j].clone()).collect(),
                Array2::from_shape_fn((1, n), |(_, k)| lc.external()[(0, order[k])]),
            )
            .unwrap()
        })
        .collect();

    let a = build_designs(&curves).unwrap();
    let b = build_designs(&shuffled).unwrap();
    let grid = FrequencyGrid::from_period_range(longest_baseline(&a), 2.5, 3.5, 10.0).unwrap();
    let pa = search_with(&a, &grid, &SearchOptions::default()).unwrap();
    let pb = search_with(&b, &grid, &SearchOptions::default()).unwrap();
    for (x, y) in pa.chi2().iter().zip(pb.chi2().iter()) {
        assert!((x - y).abs() <= 1e-8 * x.abs().max(1.0));
    }

    let fa = single(&a, 1.0 / PERIOD).unwrap();
    let fb = single(&b, 1.0 / PERIOD).unwrap();
    for (x, y) in fa.coefficients().iter().zip(fb.coefficients().iter()) {
        assert!((x - y).abs() < 1e-9, "{x} vs {y}");
    }
}

#[test]
// Purpose
// -------
// Window function depends on sampling only.
//
// Expect
// ------
// - Replacing every magnitude leaves the window sequence unchanged.
fn window_ignores_magnitudes() {
    let curves = two_datasets(11);
    let mut rng = StdRng::seed_from_u64(1);
    let other = Normal::new(20.0, 1.0).unwrap();
    let altered: Vec<LightCurve<String>> = curves
        .iter()
        .map(|lc| {
            LightCurve::new(
                lc.time().clone(),
                lc.mag().mapv(|_| other.sample(&mut rng)),
                lc.mag_err().clone(),
                lc.segments().to_vec(),
                lc.external().clone(),
            )
            .unwrap()
        })
        .collect();

    let a = build_designs(&curves).unwrap();
    let b = build_designs(&altered).unwrap();
    let pa = periodfit::search(&a, 30, 120, 0.004).unwrap();
    let pb = periodfit::search(&b, 30, 120, 0.004).unwrap();
    assert_eq!(pa.window(), pb.window());
}

#[test]
// Purpose
// -------
// Range faults are raised before any fitting work.
//
// Expect
// ------
// - Inverted period range and zero frequency index are `FaultKind::Range`.
fn range_faults_are_classified() {
    let curves = two_datasets(5);
    let err = PeriodSearch::default().run(&curves, 3.5, 2.5).unwrap_err();
    assert_eq!(err.fault_kind(), FaultKind::Range);

    let designs = build_designs(&curves).unwrap();
    let err = periodfit::search(&designs, 0, 10, 0.01).unwrap_err();
    assert_eq!(err.fault_kind(), FaultKind::Range);
}
