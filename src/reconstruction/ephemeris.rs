//! reconstruction::ephemeris — per-dataset corrected series, amplitude and T0.
//!
//! Purpose
//! -------
//! Turn the coefficient vector of a single-frequency fit back into quantities
//! a reader can plot or tabulate: the systematics-corrected magnitudes, the
//! sinusoid amplitude and phase of each amplitude group, and a reference
//! epoch T0 near the middle of each dataset.
//!
//! Conventions
//! -----------
//! - With sine/cosine coefficients `s`, `c` the fitted sinusoid is
//!   `s·sin(2πft) + c·cos(2πft) = A·sin(2πf t + 2π·φ)` with
//!   `A = hypot(s, c)` and `φ = atan2(c, s) / 2π` wrapped into `[0, 1)`.
//! - `T0 = zero_point + (n − φ) / f` with `n = round(median(t_rel) · f)`
//!   where halves round to the even cycle (banker's rounding), so the sinusoid crosses zero upward at
//!   `T0` and `T0` lies within half a cycle of the median time.
//! - Amplitude and phase uncertainties use first-order propagation of the
//!   2×2 covariance of `(s, c)`; the T0 uncertainty ignores the frequency
//!   uncertainty.
use crate::{
    lightcurve::design::DesignMatrix,
    regression::{
        errors::{FitError, FitResult},
        layout::BlockLayout,
        solver::FitOutcome,
    },
};
use ndarray::{Array1, ArrayView1, ArrayView2};
use std::f64::consts::PI;

/// Sinusoid parameters of one amplitude group.
#[derive(Debug, Clone, PartialEq)]
pub struct SinusoidComponent {
    pub group: usize,
    pub sine: f64,
    pub cosine: f64,
    pub amplitude: f64,
    pub amplitude_sigma: f64,
    /// Phase in cycles, `[0, 1)`.
    pub phase: f64,
    /// Phase uncertainty in cycles.
    pub phase_sigma: f64,
    /// Reference epoch on the caller's time axis.
    pub t0: f64,
    pub t0_sigma: f64,
}

/// Reconstructed view of one dataset at the fitted frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetReconstruction {
    pub dataset: usize,
    pub frequency: f64,
    /// Sample times on the caller's time axis.
    pub time: Array1<f64>,
    /// Fitted offsets + external-parameter contribution.
    pub systematics: Array1<f64>,
    /// Observations minus `systematics` (sinusoid + residual).
    pub corrected: Array1<f64>,
    /// Fitted sinusoid at each sample.
    pub model: Array1<f64>,
    /// `corrected − model`.
    pub residuals: Array1<f64>,
    /// `frac(f · t_rel)` in `[0, 1)`.
    pub folded_phase: Array1<f64>,
    /// One entry per amplitude group, in group order.
    pub components: Vec<SinusoidComponent>,
}

impl DatasetReconstruction {
    /// Amplitude of the first amplitude group.
    pub fn amplitude(&self) -> f64 {
        self.components.first().map_or(f64::NAN, |c| c.amplitude)
    }

    /// T0 of the first amplitude group.
    pub fn t0(&self) -> f64 {
        self.components.first().map_or(f64::NAN, |c| c.t0)
    }
}

/// Reconstruct every dataset from a single-frequency fit.
///
/// Errors
/// ------
/// - `FitError::MissingSinusoid` if `fit` is a null fit.
/// - `FitError::DatasetCountMismatch` if `designs` and `fit` disagree on the
///   number of datasets.
pub fn reconstruct(
    designs: &[DesignMatrix], fit: &FitOutcome,
) -> FitResult<Vec<DatasetReconstruction>> {
    let frequency = fit.frequency().ok_or(FitError::MissingSinusoid)?;
    let layout = fit.layout();
    if layout.n_datasets() != designs.len() {
        return Err(FitError::DatasetCountMismatch {
            expected: layout.n_datasets(),
            actual: designs.len(),
        });
    }

    Ok(designs
        .iter()
        .enumerate()
        .map(|(i, design)| {
            reconstruct_dataset(
                design,
                layout.block(i),
                fit.block_coefficients(i),
                fit.block_covariance(i),
                frequency,
            )
        })
        .collect())
}

fn reconstruct_dataset(
    design: &DesignMatrix, block: &BlockLayout, beta: ArrayView1<'_, f64>,
    cov: ArrayView2<'_, f64>, frequency: f64,
) -> DatasetReconstruction {
    let n = design.len();
    let omega = 2.0 * PI * frequency;

    let systematics = Array1::from_iter((0..n).map(|j| {
        let offset = beta[design.offset_index()[j]];
        let ep: f64 = design
            .external_at(j)
            .iter()
            .enumerate()
            .map(|(k, x)| beta[block.n_offsets + k] * x)
            .sum();
        offset + ep
    }));
    let corrected = design.obs() - &systematics;
    let model = Array1::from_iter((0..n).map(|j| {
        let g = design.amplitude_index()[j];
        let (s, c) = (omega * design.time()[j]).sin_cos();
        beta[block.sine(g)] * s + beta[block.cosine(g)] * c
    }));
    let residuals = &corrected - &model;
    let folded_phase = design.time().mapv(|t| (frequency * t).rem_euclid(1.0));

    let cycle = (design.median_time() * frequency).round_ties_even();
    let components = (0..block.n_amplitudes)
        .map(|g| {
            let (is, ic) = (block.sine(g), block.cosine(g));
            component(
                g,
                beta[is],
                beta[ic],
                [cov[(is, is)], cov[(is, ic)], cov[(ic, ic)]],
                cycle,
                frequency,
                design.zero_point(),
            )
        })
        .collect();

    DatasetReconstruction {
        dataset: design.dataset(),
        frequency,
        time: design.time().mapv(|t| t + design.zero_point()),
        systematics,
        corrected,
        model,
        residuals,
        folded_phase,
        components,
    }
}

/// `var = [Var(s), Cov(s, c), Var(c)]`.
fn component(
    group: usize, sine: f64, cosine: f64, var: [f64; 3], cycle: f64, frequency: f64,
    zero_point: f64,
) -> SinusoidComponent {
    let [vss, vsc, vcc] = var;
    let amplitude = sine.hypot(cosine);
    let phase = (cosine.atan2(sine) / (2.0 * PI)).rem_euclid(1.0);

    let (amplitude_sigma, phase_sigma) = if amplitude > 0.0 {
        let a2 = amplitude * amplitude;
        let va = (sine * sine * vss + 2.0 * sine * cosine * vsc + cosine * cosine * vcc) / a2;
        let vp = (cosine * cosine * vss - 2.0 * sine * cosine * vsc + sine * sine * vcc) / (a2 * a2);
        (va.max(0.0).sqrt(), vp.max(0.0).sqrt() / (2.0 * PI))
    } else {
        // Phase is undefined for a zero amplitude.
        ((0.5 * (vss + vcc)).max(0.0).sqrt(), f64::NAN)
    };

    SinusoidComponent {
        group,
        sine,
        cosine,
        amplitude,
        amplitude_sigma,
        phase,
        phase_sigma,
        t0: zero_point + (cycle - phase) / frequency,
        t0_sigma: phase_sigma / frequency,
    }
}
