//! regression::solver — joint null and single-frequency least-squares fits.
//!
//! Purpose
//! -------
//! Fit, by weighted linear least squares, the model
//!
//! ```text
//! y(i,j) = offset[i, seg(i,j)] + Σ_k ep_slope[i,k]·ep[i,k,j]
//!        + sinA[i,g]·sin(2πf·t(i,j)) + cosA[i,g]·cos(2πf·t(i,j))
//! ```
//!
//! jointly over all datasets `i`, minimizing the pooled weighted sum of
//! squares. Only the trial frequency `f` is shared; every offset, slope and
//! amplitude belongs to exactly one dataset.
//!
//! Key behaviors
//! -------------
//! - [`null`] fits offsets + external parameters only (no sinusoid).
//! - [`single`] adds one sine/cosine pair per amplitude group at frequency `f`.
//! - Because no coefficient is shared, the joint normal matrix is
//!   block-diagonal; each block is solved independently and the results are
//!   concatenated. The pooled chi-square is the sum of block chi-squares and
//!   the joint covariance is block-diagonal.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every dataset must have at least as many samples as coefficients;
//!   otherwise [`FitError::InsufficientSamples`] is returned before solving.
//! - A singular block is reported as [`FitError::SingularSystem`] with the
//!   dataset index and the [`CoefficientRole`](crate::regression::layout::CoefficientRole)
//!   of the first unresolvable column, plus the labels of the segments
//!   whose offsets that column is collinear with.
//! - Chi-square is computed from explicit residuals, not from the normal
//!   equations, to avoid cancellation with large magnitudes.
//!
//! Conventions
//! -----------
//! - Coefficients are packed per [`CoefficientLayout`].
//! - Sinusoid phases use times relative to the shared zero point.
use crate::{
    lightcurve::{design::DesignMatrix, errors::DataError},
    regression::{
        errors::{FitError, FitResult},
        layout::{BlockLayout, CoefficientLayout},
        normal::{BlockSolution, NormalSystem, to_array1, to_array2},
    },
};
use nalgebra::DVector;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};
use std::f64::consts::PI;

/// `FitOutcome` — result of a joint null or single-frequency solve.
///
/// Fields
/// ------
/// - `chi2`: pooled weighted sum of squared residuals.
/// - `coefficients`: packed joint coefficient vector.
/// - `covariance`: joint covariance, block-diagonal across datasets.
/// - `layout`: block layout used to pack `coefficients`.
/// - `frequency`: trial frequency, `None` for the null fit.
/// - `dataset_chi2`: chi-square contribution of each dataset.
/// - `n_samples`: total number of samples across datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    chi2: f64,
    coefficients: Array1<f64>,
    covariance: Array2<f64>,
    layout: CoefficientLayout,
    frequency: Option<f64>,
    dataset_chi2: Vec<f64>,
    n_samples: usize,
}

impl FitOutcome {
    pub fn chi2(&self) -> f64 {
        self.chi2
    }

    pub fn coefficients(&self) -> &Array1<f64> {
        &self.coefficients
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    pub fn layout(&self) -> &CoefficientLayout {
        &self.layout
    }

    pub fn frequency(&self) -> Option<f64> {
        self.frequency
    }

    pub fn dataset_chi2(&self) -> &[f64] {
        &self.dataset_chi2
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Degrees of freedom: samples minus free coefficients.
    pub fn dof(&self) -> usize {
        self.n_samples.saturating_sub(self.layout.len())
    }

    /// `chi2 / dof`, or `NaN` when there are no degrees of freedom left.
    pub fn reduced_chi2(&self) -> f64 {
        match self.dof() {
            0 => f64::NAN,
            dof => self.chi2 / dof as f64,
        }
    }

    /// Coefficient block of dataset `dataset`.
    pub fn block_coefficients(&self, dataset: usize) -> ArrayView1<'_, f64> {
        let r = self.layout.range(dataset);
        self.coefficients.slice(s![r.start..r.end])
    }

    /// Covariance block of dataset `dataset`.
    pub fn block_covariance(&self, dataset: usize) -> ArrayView2<'_, f64> {
        let r = self.layout.range(dataset);
        self.covariance.slice(s![r.start..r.end, r.start..r.end])
    }
}

/// Null-hypothesis fit: offsets and external parameters only.
///
/// Errors
/// ------
/// - `FitError::Data(DataError::NoDatasets)` for an empty slice.
/// - `FitError::InsufficientSamples` if any dataset has fewer samples than
///   offsets + external parameters.
/// - `FitError::SingularSystem` if a block cannot be solved.
pub fn null(designs: &[DesignMatrix]) -> FitResult<FitOutcome> {
    fit(designs, None)
}

/// Single-frequency fit at trial frequency `frequency`.
///
/// Errors
/// ------
/// - `FitError::InvalidFrequency` unless `frequency` is finite and > 0.
/// - Every error of [`null`], counting the sinusoid coefficients.
///
/// Examples
/// --------
/// ```rust
/// # use ndarray::Array1;
/// # use periodfit::lightcurve::{LightCurve, build_designs};
/// # use periodfit::regression::solver::single;
/// let t = Array1::linspace(0.0, 10.0, 40);
/// let y = t.mapv(|t| 5.0 + 0.2 * (2.0 * std::f64::consts::PI * 0.7 * t).sin());
/// let err = Array1::from_elem(40, 0.01);
/// let lc = LightCurve::without_systematics(t, y, err, 0).unwrap();
/// let designs = build_designs(&[lc]).unwrap();
///
/// let fit = single(&designs, 0.7).unwrap();
/// let b = fit.block_coefficients(0);
/// assert!((b[0] - 5.0).abs() < 1e-9);
/// assert!((b[1] - 0.2).abs() < 1e-9);
/// assert!(fit.chi2() < 1e-12);
/// ```
pub fn single(designs: &[DesignMatrix], frequency: f64) -> FitResult<FitOutcome> {
    if !(frequency.is_finite() && frequency > 0.0) {
        return Err(FitError::InvalidFrequency { value: frequency });
    }
    fit(designs, Some(frequency))
}

fn fit(designs: &[DesignMatrix], frequency: Option<f64>) -> FitResult<FitOutcome> {
    if designs.is_empty() {
        return Err(DataError::NoDatasets.into());
    }
    check_sample_counts(designs, frequency.is_some())?;

    let layout = CoefficientLayout::for_designs(designs, frequency.is_some());
    let p = layout.len();
    let mut coefficients = Array1::zeros(p);
    let mut covariance = Array2::zeros((p, p));
    let mut dataset_chi2 = Vec::with_capacity(designs.len());

    for (i, design) in designs.iter().enumerate() {
        let block = layout.block(i);
        let system = assemble(design, block, frequency);
        let solution = solve_block(design, block, &system)?;
        dataset_chi2.push(chi_square(design, block, frequency, &solution.coefficients));

        let r = layout.range(i);
        coefficients.slice_mut(s![r.start..r.end]).assign(&to_array1(&solution.coefficients));
        covariance
            .slice_mut(s![r.start..r.end, r.start..r.end])
            .assign(&to_array2(&solution.covariance));
    }

    Ok(FitOutcome {
        chi2: dataset_chi2.iter().sum(),
        coefficients,
        covariance,
        layout,
        frequency,
        dataset_chi2,
        n_samples: designs.iter().map(DesignMatrix::len).sum(),
    })
}

// ---- Block helpers (shared with the periodogram fast path) ----

/// Reject datasets with fewer samples than free coefficients.
pub(crate) fn check_sample_counts(designs: &[DesignMatrix], with_sinusoid: bool) -> FitResult<()> {
    for design in designs {
        let coefficients = BlockLayout::for_design(design, with_sinusoid).len();
        if design.len() < coefficients {
            return Err(FitError::InsufficientSamples {
                dataset: design.dataset(),
                samples: design.len(),
                coefficients,
            });
        }
    }
    Ok(())
}

/// Fill `row` with the design row of sample `j` for `block`.
///
/// The sinusoid columns are written only when `frequency` is `Some` and the
/// block has amplitude groups.
pub(crate) fn design_row(
    design: &DesignMatrix, block: &BlockLayout, j: usize, frequency: Option<f64>,
    row: &mut [f64],
) {
    row.fill(0.0);
    row[design.offset_index()[j]] = 1.0;
    for (k, &v) in design.external_at(j).iter().enumerate() {
        row[block.n_offsets + k] = v;
    }
    if let (Some(f), true) = (frequency, block.n_amplitudes > 0) {
        let (sin, cos) = (2.0 * PI * f * design.time()[j]).sin_cos();
        let g = design.amplitude_index()[j];
        row[block.sine(g)] = sin;
        row[block.cosine(g)] = cos;
    }
}

/// Accumulate the normal equations of one dataset block.
pub(crate) fn assemble(
    design: &DesignMatrix, block: &BlockLayout, frequency: Option<f64>,
) -> NormalSystem {
    let mut system = NormalSystem::zeros(block.len());
    let mut row = vec![0.0; block.len()];
    for j in 0..design.len() {
        design_row(design, block, j, frequency, &mut row);
        system.accumulate(&row, design.weight()[j], design.obs()[j]);
    }
    system.symmetrize();
    system
}

/// Solve a block, translating a degenerate column into a `SingularSystem`.
pub(crate) fn solve_block(
    design: &DesignMatrix, block: &BlockLayout, system: &NormalSystem,
) -> FitResult<BlockSolution> {
    system.solve().map_err(|degenerate| {
        let labels = design.segment_labels();
        let mut segments: Vec<String> = degenerate
            .collinear_with
            .iter()
            .filter(|&&col| col < block.n_offsets)
            .filter_map(|&col| labels.get(col).cloned())
            .collect();
        if degenerate.column < block.n_offsets {
            segments.extend(labels.get(degenerate.column).cloned());
        }
        FitError::SingularSystem {
            dataset: design.dataset(),
            role: block.role(degenerate.column, design),
            segments,
        }
    })
}

/// Weighted sum of squared residuals of one block.
pub(crate) fn chi_square(
    design: &DesignMatrix, block: &BlockLayout, frequency: Option<f64>, beta: &DVector<f64>,
) -> f64 {
    let mut row = vec![0.0; block.len()];
    let mut chi2 = 0.0;
    for j in 0..design.len() {
        design_row(design, block, j, frequency, &mut row);
        let model: f64 = row.iter().zip(beta.iter()).map(|(x, b)| x * b).sum();
        let r = design.obs()[j] - model;
        chi2 += design.weight()[j] * r * r;
    }
    chi2
}
