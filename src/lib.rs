//! periodfit — joint sinusoid period search across multiple light curves.
//!
//! Purpose
//! -------
//! Search for a single periodic signal shared by several photometric time
//! series, each carrying its own systematics (per-segment zero-point offsets
//! and linear trends against external parameters). Serve as the crate root
//! for Rust callers and, with the `python-bindings` feature, as the PyO3
//! bridge exposing the `_periodfit` extension module.
//!
//! Key behaviors
//! -------------
//! - `lightcurve`: raw light curves and their validated design structures.
//! - `regression`: joint null and single-frequency weighted least squares.
//! - `search`: frequency grids, chi-square periodograms, minimum refinement.
//! - `reconstruction`: corrected series, amplitude, phase and T0 per dataset.
//! - `models`: the end-to-end [`PeriodSearch`] pipeline.
//! - With `python-bindings`, the functions `search`, `null`, `single` and
//!   `frequency_grid` are registered in `_periodfit`.
//!
//! Invariants & assumptions
//! ------------------------
//! - All heavy numerical work lives in the inner modules; the PyO3 functions
//!   here only convert inputs, release the GIL, and map errors.
//! - Every fault is a typed error (`DataError`, `FitError`, `SearchError`)
//!   classified by [`FaultKind`]; at the Python boundary they become
//!   `ValueError` with the Rust message preserved.
//!
//! Conventions
//! -----------
//! - Python datasets are tuples `(t, y, wt[, ep[, idc[, iamp]]])`; see
//!   [`utils`]. Times are used as given on the Python side.
//! - Coefficients are packed per dataset as
//!   `[offsets..., ep_slopes..., sin, cos]` and concatenated in dataset order.
//!
//! Downstream usage
//! ----------------
//! - Native Rust code builds [`LightCurve`] values and either calls
//!   [`PeriodSearch::run`] or composes [`build_designs`], [`null`],
//!   [`single`], [`search`] and [`refine`] directly.
//! - The library installs no `tracing` subscriber; applications choose one.

pub mod lightcurve;
pub mod models;
pub mod reconstruction;
pub mod regression;
pub mod search;
#[cfg(feature = "python-bindings")]
pub mod utils;

// ---- Re-exports (primary surface) -----------------------------------------

pub use crate::lightcurve::{DataError, DesignMatrix, FaultKind, LightCurve, build_designs};
pub use crate::models::{PeriodSearch, PeriodSearchOutcome};
pub use crate::reconstruction::{DatasetReconstruction, SinusoidComponent, reconstruct};
pub use crate::regression::{FitError, FitOutcome, null, single};
pub use crate::search::{
    FrequencyGrid, Periodogram, RefineScale, SearchError, SearchOptions, refine, search,
};

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray1, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyList};

#[cfg(feature = "python-bindings")]
use crate::{
    search::periodogram::search_with,
    utils::{extract_designs, thread_count},
};

#[cfg(feature = "python-bindings")]
type PyFit<'py> = (f64, Bound<'py, PyArray1<f64>>, Bound<'py, PyArray2<f64>>);

#[cfg(feature = "python-bindings")]
fn fit_to_py<'py>(py: Python<'py>, fit: FitOutcome) -> PyFit<'py> {
    let chi2 = fit.chi2();
    (chi2, fit.coefficients().clone().into_pyarray(py), fit.covariance().clone().into_pyarray(py))
}

/// Chi-square periodogram and window function over `pl..=ph` × `vsamp`.
///
/// Parameters
/// ----------
/// - `datasets`: list of `(t, y, wt[, ep[, idc[, iamp]]])` tuples.
/// - `pl`, `ph`: inclusive frequency index range; `pl ≥ 1`.
/// - `vsamp`: frequency step.
/// - `nthr`: worker threads; `None`, `-1` or `0` use every CPU.
///
/// Returns
/// -------
/// `(chisq, winfunc)` as 1-D float64 arrays of length `ph − pl + 1`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "search", signature = (datasets, pl, ph, vsamp, nthr = None))]
fn py_search<'py>(
    py: Python<'py>, datasets: &Bound<'py, PyList>, pl: usize, ph: usize, vsamp: f64,
    nthr: Option<i64>,
) -> PyResult<(Bound<'py, PyArray1<f64>>, Bound<'py, PyArray1<f64>>)> {
    let designs = extract_designs(py, datasets)?;
    let grid = FrequencyGrid::new(pl, ph, vsamp)?;
    let opts = SearchOptions { threads: thread_count(nthr), ..SearchOptions::default() };

    let periodogram = py.allow_threads(|| search_with(&designs, &grid, &opts))?;
    Ok((periodogram.chi2().clone().into_pyarray(py), periodogram.window().clone().into_pyarray(py)))
}

/// Null-hypothesis fit: returns `(chisq, b, bcov)`.
///
/// Notes
/// -----
/// - `b` is the flat packed vector `[offsets..., ep_slopes...]` per dataset,
///   concatenated in dataset order, not an `(nlc, stride)` array indexed
///   per light curve. Slice it with the block lengths implied by each
///   dataset's segment and external-parameter counts.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "null", signature = (datasets))]
fn py_null<'py>(py: Python<'py>, datasets: &Bound<'py, PyList>) -> PyResult<PyFit<'py>> {
    let designs = extract_designs(py, datasets)?;
    let fit = py.allow_threads(|| null(&designs))?;
    Ok(fit_to_py(py, fit))
}

/// Single-frequency fit at `v`: returns `(chisq, b, bcov)`.
///
/// Notes
/// -----
/// - `b` is flat and packed per dataset as
///   `[offsets..., ep_slopes..., sin, cos, ...]` in dataset order; it is not
///   an `(nlc, stride)` array indexed per light curve.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "single", signature = (datasets, v))]
fn py_single<'py>(py: Python<'py>, datasets: &Bound<'py, PyList>, v: f64) -> PyResult<PyFit<'py>> {
    let designs = extract_designs(py, datasets)?;
    let fit = py.allow_threads(|| single(&designs, v))?;
    Ok(fit_to_py(py, fit))
}

/// Grid indices and step for a period range: returns `(pl, ph, vsamp)`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(name = "frequency_grid", signature = (baseline, pmin, pmax, oversampling = 10.0))]
fn py_frequency_grid(
    baseline: f64, pmin: f64, pmax: f64, oversampling: f64,
) -> PyResult<(usize, usize, f64)> {
    let grid = FrequencyGrid::from_period_range(baseline, pmin, pmax, oversampling)?;
    Ok((grid.low(), grid.high(), grid.step()))
}

/// Module initializer for the `_periodfit` extension.
///
/// Notes
/// -----
/// - Invoked by Python on import; not called directly by user code.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _periodfit<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(py_search, m)?)?;
    m.add_function(wrap_pyfunction!(py_null, m)?)?;
    m.add_function(wrap_pyfunction!(py_single, m)?)?;
    m.add_function(wrap_pyfunction!(py_frequency_grid, m)?)?;
    Ok(())
}
