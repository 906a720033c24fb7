//! search::periodogram — chi-square periodogram over a uniform frequency grid.
//!
//! Purpose
//! -------
//! Evaluate, at every trial frequency of a [`FrequencyGrid`], the pooled
//! chi-square of the joint single-frequency fit, together with the spectral
//! window of the combined sampling.
//!
//! Key behaviors
//! -------------
//! - The systematics part (offsets + external parameters) of each dataset's
//!   normal matrix does not depend on frequency. It is accumulated once per
//!   dataset; each trial frequency only adds the sine/cosine rows and
//!   columns before solving. The result equals an independent call to
//!   [`single`](crate::regression::solver::single) at that frequency.
//! - Frequencies are independent and evaluated in parallel with rayon when
//!   the `parallel` feature is enabled. Results are written into
//!   preallocated slots, so ordering never depends on scheduling.
//! - The window function is
//!   `W(f) = |Σ w·exp(2πi f t)|² / (Σ w)²`, summed over every sample of every
//!   dataset on the shared zero point. It depends only on times and weights
//!   and lies in `[0, 1]`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Frequency index 0 is rejected by [`FrequencyGrid`].
//! - Every dataset must have at least as many samples as single-fit
//!   coefficients; checked once before the scan.
//! - A singular system at any trial frequency aborts the scan with the
//!   corresponding [`FitError`](crate::regression::errors::FitError).
use crate::{
    lightcurve::{design::DesignMatrix, errors::DataError},
    regression::{
        errors::FitResult,
        layout::BlockLayout,
        normal::NormalSystem,
        solver::{assemble, check_sample_counts, chi_square, solve_block},
    },
    search::{
        errors::{SearchError, SearchResult},
        grid::FrequencyGrid,
        options::SearchOptions,
    },
};
use nalgebra::{DMatrix, DVector};
use ndarray::Array1;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use std::f64::consts::PI;
use tracing::{debug, info};

/// Chi-square periodogram and window function on a frequency grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Periodogram {
    grid: FrequencyGrid,
    chi2: Array1<f64>,
    window: Array1<f64>,
}

impl Periodogram {
    pub fn grid(&self) -> &FrequencyGrid {
        &self.grid
    }

    /// Pooled chi-square of the single-frequency fit at each grid point.
    pub fn chi2(&self) -> &Array1<f64> {
        &self.chi2
    }

    /// Window function at each grid point.
    pub fn window(&self) -> &Array1<f64> {
        &self.window
    }

    pub fn len(&self) -> usize {
        self.chi2.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chi2.is_empty()
    }

    pub fn frequencies(&self) -> Array1<f64> {
        self.grid.frequencies().collect()
    }

    pub fn periods(&self) -> Array1<f64> {
        self.grid.frequencies().map(|f| 1.0 / f).collect()
    }

    /// Position of the smallest chi-square; ties resolve to the first.
    pub fn best_index(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &v) in self.chi2.iter().enumerate() {
            match best {
                Some((_, b)) if !(v < b) => {}
                _ => best = Some((i, v)),
            }
        }
        best.map(|(i, _)| i)
    }
}

/// Scan grid indices `low..=high` with spacing `step` using default options.
///
/// Errors
/// ------
/// - Range faults from [`FrequencyGrid::new`].
/// - Data faults from the fits (see [`search_with`]).
pub fn search(
    designs: &[DesignMatrix], low: usize, high: usize, step: f64,
) -> SearchResult<Periodogram> {
    let grid = FrequencyGrid::new(low, high, step)?;
    search_with(designs, &grid, &SearchOptions::default())
}

/// Scan `grid`, honoring the worker-thread setting in `opts`.
///
/// Errors
/// ------
/// - `DataError::NoDatasets` for an empty slice.
/// - `FitError::InsufficientSamples` before the scan starts.
/// - `FitError::SingularSystem` from any trial frequency.
/// - `SearchError::ThreadPool` if a dedicated pool cannot be built.
pub fn search_with(
    designs: &[DesignMatrix], grid: &FrequencyGrid, opts: &SearchOptions,
) -> SearchResult<Periodogram> {
    if designs.is_empty() {
        return Err(DataError::NoDatasets.into());
    }
    check_sample_counts(designs, true)?;

    info!(
        datasets = designs.len(),
        frequencies = grid.len(),
        low = grid.low(),
        high = grid.high(),
        step = grid.step(),
        "starting periodogram search"
    );

    let bases: Vec<BaseSystem> = designs.iter().map(BaseSystem::new).collect();
    let total_weight: f64 = designs.iter().map(|d| d.weight().sum()).sum();

    let mut chi2 = vec![0.0; grid.len()];
    let mut window = vec![0.0; grid.len()];
    scan(designs, &bases, total_weight, grid, opts, &mut chi2, &mut window)?;

    Ok(Periodogram { grid: *grid, chi2: Array1::from(chi2), window: Array1::from(window) })
}

/// Window function of the pooled sampling at frequency `f`.
pub fn window_function(designs: &[DesignMatrix], f: f64) -> f64 {
    let total_weight: f64 = designs.iter().map(|d| d.weight().sum()).sum();
    window_at(designs, total_weight, f)
}

fn window_at(designs: &[DesignMatrix], total_weight: f64, f: f64) -> f64 {
    if !(total_weight > 0.0) {
        return 0.0;
    }
    let (mut re, mut im) = (0.0, 0.0);
    for design in designs {
        for (&t, &w) in design.time().iter().zip(design.weight().iter()) {
            let (s, c) = (2.0 * PI * f * t).sin_cos();
            re += w * c;
            im += w * s;
        }
    }
    (re * re + im * im) / (total_weight * total_weight)
}

#[cfg(feature = "parallel")]
fn scan(
    designs: &[DesignMatrix], bases: &[BaseSystem], total_weight: f64, grid: &FrequencyGrid,
    opts: &SearchOptions, chi2: &mut [f64], window: &mut [f64],
) -> SearchResult<()> {
    let mut work = || {
        chi2.par_iter_mut().zip(window.par_iter_mut()).enumerate().try_for_each(
            |(i, (c, w))| {
                let f = grid.frequency(i);
                *c = evaluate(designs, bases, f)?;
                *w = window_at(designs, total_weight, f);
                FitResult::Ok(())
            },
        )
    };

    match opts.threads {
        Some(threads) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| SearchError::ThreadPool { reason: e.to_string() })?;
            debug!(threads, "using dedicated search pool");
            pool.install(work)?;
        }
        None => work()?,
    }
    Ok(())
}

#[cfg(not(feature = "parallel"))]
fn scan(
    designs: &[DesignMatrix], bases: &[BaseSystem], total_weight: f64, grid: &FrequencyGrid,
    opts: &SearchOptions, chi2: &mut [f64], window: &mut [f64],
) -> SearchResult<()> {
    if let Some(threads) = opts.threads {
        debug!(threads, "parallel feature disabled; ignoring thread count");
    }
    for (i, (c, w)) in chi2.iter_mut().zip(window.iter_mut()).enumerate() {
        let f = grid.frequency(i);
        *c = evaluate(designs, bases, f)?;
        *w = window_at(designs, total_weight, f);
    }
    Ok(())
}

/// Pooled chi-square of the single-frequency fit at `f`.
fn evaluate(designs: &[DesignMatrix], bases: &[BaseSystem], f: f64) -> FitResult<f64> {
    let mut total = 0.0;
    for (design, base) in designs.iter().zip(bases) {
        let system = base.at_frequency(design, f);
        let solution = solve_block(design, &base.block, &system)?;
        total += chi_square(design, &base.block, Some(f), &solution.coefficients);
    }
    Ok(total)
}

/// Frequency-independent part of one dataset's single-fit normal equations.
struct BaseSystem {
    block: BlockLayout,
    gram: DMatrix<f64>,
    rhs: DVector<f64>,
}

impl BaseSystem {
    fn new(design: &DesignMatrix) -> BaseSystem {
        let null_block = BlockLayout::for_design(design, false);
        let base = assemble(design, &null_block, None);
        BaseSystem {
            block: BlockLayout::for_design(design, true),
            gram: base.gram().clone(),
            rhs: base.rhs().clone(),
        }
    }

    /// Full single-fit system at `f`: the cached systematics block plus the
    /// sinusoid rows.
    fn at_frequency(&self, design: &DesignMatrix, f: f64) -> NormalSystem {
        let block = &self.block;
        let p = block.len();
        let p0 = block.n_systematics();

        let mut gram = DMatrix::zeros(p, p);
        gram.view_mut((0, 0), (p0, p0)).copy_from(&self.gram);
        let mut rhs = DVector::zeros(p);
        rhs.rows_mut(0, p0).copy_from(&self.rhs);

        for j in 0..design.len() {
            let w = design.weight()[j];
            let y = design.obs()[j];
            let (s, c) = (2.0 * PI * f * design.time()[j]).sin_cos();
            let (ws, wc) = (w * s, w * c);
            let g = design.amplitude_index()[j];
            let (cs, cc) = (block.sine(g), block.cosine(g));
            let o = design.offset_index()[j];

            gram[(cs, o)] += ws;
            gram[(cc, o)] += wc;
            for (k, &x) in design.external_at(j).iter().enumerate() {
                let col = block.n_offsets + k;
                gram[(cs, col)] += ws * x;
                gram[(cc, col)] += wc * x;
            }
            gram[(cs, cs)] += ws * s;
            gram[(cc, cs)] += wc * s;
            gram[(cc, cc)] += wc * c;
            rhs[cs] += ws * y;
            rhs[cc] += wc * y;
        }

        for a in p0..p {
            for b in 0..a {
                gram[(b, a)] = gram[(a, b)];
            }
        }
        NormalSystem::from_parts(gram, rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lightcurve::{LightCurve, build_designs};
    use crate::regression::errors::FitError;
    use crate::regression::solver::single;
    use crate::search::errors::FaultKind;
    use approx::assert_relative_eq;
    use ndarray::{Array1, Array2};
    use rand::{SeedableRng, rngs::StdRng};
    use rand_distr::{Distribution, Normal, Uniform};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Equality of the cached fast path with independent `single` fits.
    // - Window function bounds, magnitude independence, and its value on a
    //   perfectly aliased frequency.
    // - Thread-count independence of the results.
    // - Error paths (empty input, short datasets, zero frequency index).
    // -------------------------------------------------------------------------

    fn curves(seed: u64, level: f64) -> Vec<LightCurve<u32>> {
        let mut rng = StdRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, 0.01).unwrap();
        let when = Uniform::new(0.0, 30.0);
        let mut out = Vec::new();
        for (d, n) in [(0usize, 45usize), (1, 38)] {
            let mut t: Vec<f64> = (0..n).map(|_| when.sample(&mut rng) + d as f64).collect();
            t.sort_by(f64::total_cmp);
            let t = Array1::from(t);
            let seg: Vec<u32> = t.iter().map(|&t| (t / 10.0) as u32).collect();
            let ep = Array2::from_shape_fn((1, n), |(_, j)| 0.5 + 0.01 * ((j * 13) % 7) as f64);
            let y = Array1::from_iter((0..n).map(|j| {
                level
                    + 0.02 * seg[j] as f64
                    + 0.3 * ep[(0, j)]
                    + 0.04 * (2.0 * PI * t[j] / 2.7).sin()
                    + noise.sample(&mut rng)
            }));
            let err = Array1::from_elem(n, 0.01);
            out.push(LightCurve::new(t, y, err, seg, ep).unwrap());
        }
        out
    }

    #[test]
    // Purpose
    // -------
    // The cached search must agree with an independent joint fit at every
    // trial frequency.
    //
    // Given
    // -----
    // - Two datasets with multiple segments and one external parameter.
    // - Grid indices 10..=60 with step 0.01 (f ∈ [0.1, 0.6]).
    //
    // Expect
    // ------
    // - `chi2[i] == single(f_i).chi2()` to 1e-8 relative.
    fn search_matches_independent_single_fits() {
        let designs = build_designs(&curves(3, 14.0)).unwrap();
        let pg = search(&designs, 10, 60, 0.01).unwrap();

        assert_eq!(pg.len(), 51);
        for (i, f) in pg.frequencies().iter().enumerate() {
            let naive = single(&designs, *f).unwrap().chi2();
            assert_relative_eq!(pg.chi2()[i], naive, max_relative = 1e-8);
        }
        let best = pg.best_index().unwrap();
        assert_relative_eq!(pg.periods()[best], 2.7, max_relative = 0.05);
    }

    #[test]
    // Purpose
    // -------
    // Verify the window function is bounded, ignores magnitudes, and reaches
    // one where every sample shares the same phase.
    //
    // Given
    // -----
    // - Integer sample times, so integer frequencies alias every sample onto
    //   phase 0.
    //
    // Expect
    // ------
    // - `0 ≤ W ≤ 1` on the grid, `W(1) = W(2) = 1`, and identical windows for
    //   two data sets that differ only in magnitudes.
    fn window_is_bounded_and_independent_of_magnitudes() {
        let t = Array1::from_iter((0..20).map(|i| (i * 3 % 17) as f64 + (i / 17) as f64 * 20.0));
        let err = Array1::from_iter((0..20).map(|i| 0.01 + 0.001 * i as f64));
        let y1 = t.mapv(|t| 10.0 + 0.1 * (0.37 * t).sin());
        let y2 = t.mapv(|t| -3.0 + 2.0 * (1.9 * t).cos());
        let a = build_designs(&[
            LightCurve::without_systematics(t.clone(), y1, err.clone(), 0).unwrap()
        ])
        .unwrap();
        let b =
            build_designs(&[LightCurve::without_systematics(t, y2, err, 0).unwrap()]).unwrap();

        let pa = search(&a, 1, 30, 0.013).unwrap();
        let pb = search(&b, 1, 30, 0.013).unwrap();
        assert_eq!(pa.window(), pb.window());
        assert_ne!(pa.chi2(), pb.chi2());
        assert!(pa.window().iter().all(|&w| (0.0..=1.0 + 1e-12).contains(&w)));
        assert_relative_eq!(pa.window()[4], window_function(&a, 5.0 * 0.013), epsilon = 1e-15);
        assert_relative_eq!(window_function(&a, 1.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(window_function(&b, 2.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // A dedicated pool must not change any value.
    fn dedicated_pool_gives_identical_results() {
        let designs = build_designs(&curves(9, 7.0)).unwrap();
        let grid = FrequencyGrid::new(20, 40, 0.01).unwrap();
        let shared = search_with(&designs, &grid, &SearchOptions::default()).unwrap();
        let opts = SearchOptions { threads: Some(2), ..SearchOptions::default() };
        let pooled = search_with(&designs, &grid, &opts).unwrap();
        assert_eq!(shared, pooled);
    }

    #[test]
    // Purpose
    // -------
    // Ensure invalid inputs are rejected before any work is done.
    //
    // Expect
    // ------
    // - Empty slice → Data fault; low index 0 → Range fault; a dataset with
    //   fewer samples than coefficients → `InsufficientSamples`.
    fn invalid_inputs_are_rejected() {
        let err = search(&[], 1, 5, 0.1).unwrap_err();
        assert_eq!(err, SearchError::Fit(FitError::Data(DataError::NoDatasets)));
        assert_eq!(err.fault_kind(), FaultKind::Data);

        let designs = build_designs(&curves(1, 5.0)).unwrap();
        let err = search(&designs, 0, 5, 0.1).unwrap_err();
        assert_eq!(err, SearchError::ZeroFrequencyIndex);
        assert_eq!(err.fault_kind(), FaultKind::Range);

        let tiny = LightCurve::without_systematics(
            Array1::from(vec![0.0, 1.0]),
            Array1::from(vec![1.0, 2.0]),
            Array1::from(vec![0.1, 0.1]),
            0,
        )
        .unwrap();
        let designs = build_designs(&[tiny]).unwrap();
        match search(&designs, 1, 5, 0.1).unwrap_err() {
            SearchError::Fit(FitError::InsufficientSamples { samples: 2, coefficients: 3, .. }) => {}
            other => panic!("unexpected error {other:?}"),
        }
    }
}
