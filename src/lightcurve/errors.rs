//! Errors for light-curve ingestion and design-matrix construction.
//!
//! This module defines [`DataError`], the data-quality fault raised while
//! turning raw light curves into [`DesignMatrix`](crate::lightcurve::design::DesignMatrix)
//! values, and [`FaultKind`], the coarse classification shared by every error
//! type in the crate. All variants are fatal and are raised before any linear
//! solve is attempted.
//!
//! ## Conventions
//! - **Indices are 0-based**: `dataset` is the position of the light curve in
//!   the caller's slice, `index` the position of the sample inside it.
//! - Uncertainties must be **strictly positive and finite**; weights are their
//!   inverse squares.
//! - Errors convert to a Python `ValueError` when the `python-bindings`
//!   feature is enabled.
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for ingestion and design-matrix paths that may produce
/// [`DataError`].
pub type DataResult<T> = Result<T, DataError>;

/// Coarse classification of every fault the crate can raise.
///
/// - `Data`: the inputs cannot support the requested model (bad samples,
///   empty datasets, singular systems). The caller should fix or drop data.
/// - `Range`: the requested frequency/period range is empty, inverted, or
///   otherwise unusable. The caller should change the search bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Data,
    Range,
}

/// Data-quality faults detected while validating light curves and building
/// their design matrices.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    // ---- Collection-level ----
    /// No light curves were supplied.
    NoDatasets,

    /// A light curve has zero samples (e.g. everything was clipped upstream).
    EmptyDataset { dataset: usize },

    // ---- Structural ----
    /// A per-sample column does not match the length of the time column.
    LengthMismatch { field: &'static str, expected: usize, actual: usize },

    // ---- Sample values ----
    /// A sample field is NaN/±inf.
    NonFiniteSample { dataset: usize, index: usize, field: &'static str, value: f64 },

    /// A magnitude uncertainty is ≤ 0, so no inverse-variance weight exists.
    NonPositiveUncertainty { dataset: usize, index: usize, value: f64 },
}

impl DataError {
    /// Every `DataError` is a [`FaultKind::Data`].
    pub fn fault_kind(&self) -> FaultKind {
        FaultKind::Data
    }
}

impl std::error::Error for DataError {}

impl std::fmt::Display for DataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Collection-level ----
            DataError::NoDatasets => {
                write!(f, "No light curves were supplied.")
            }
            DataError::EmptyDataset { dataset } => {
                write!(f, "Dataset {dataset} has no samples.")
            }
            // ---- Structural ----
            DataError::LengthMismatch { field, expected, actual } => {
                write!(
                    f,
                    "Column '{field}' has length {actual}; expected {expected} (length of 'time')."
                )
            }
            // ---- Sample values ----
            DataError::NonFiniteSample { dataset, index, field, value } => {
                write!(f, "Dataset {dataset}: '{field}' at sample {index} is non-finite: {value}")
            }
            DataError::NonPositiveUncertainty { dataset, index, value } => {
                write!(
                    f,
                    "Dataset {dataset}: magnitude uncertainty at sample {index} must be > 0; got {value}"
                )
            }
        }
    }
}

/// Convert a [`DataError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<DataError> for PyErr {
    fn from(err: DataError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
