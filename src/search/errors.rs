//! Errors for the frequency grid, periodogram search and refinement.
//!
//! [`SearchError`] sits on top of [`FitError`] (which itself wraps
//! [`DataError`]) and adds the range faults of the frequency grid plus the
//! few runtime failures of the search layer. An alias [`SearchResult<T>`]
//! standardizes the return type.
use crate::{lightcurve::errors::DataError, regression::errors::FitError};
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

pub use crate::lightcurve::errors::FaultKind;

pub type SearchResult<T> = Result<T, SearchError>;

#[derive(Debug, Clone, PartialEq)]
pub enum SearchError {
    // ---- Period / frequency range ----
    /// The requested period range is unusable.
    InvalidPeriodRange { pmin: f64, pmax: f64, reason: &'static str },

    /// Frequency index range with `low > high`.
    InvertedIndexRange { low: usize, high: usize },

    /// Frequency index 0 is the null model and cannot host a sinusoid.
    ZeroFrequencyIndex,

    /// Frequency step must be finite and > 0.
    InvalidFrequencyStep { step: f64 },

    /// Time baseline must be finite and > 0.
    InvalidBaseline { baseline: f64 },

    /// Oversampling factor must be finite and > 0.
    InvalidOversampling { value: f64 },

    // ---- Refinement ----
    /// Refinement was asked for on an empty periodogram.
    EmptyPeriodogram,

    // ---- Runtime ----
    /// The dedicated worker pool could not be built.
    ThreadPool { reason: String },

    /// The chi-square reference distribution could not be built.
    InvalidDistribution { dof: usize },

    // ---- Propagated ----
    Fit(FitError),
}

impl SearchError {
    /// Classify the fault; propagated fit errors keep their own kind.
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            SearchError::Fit(err) => err.fault_kind(),
            SearchError::ThreadPool { .. } | SearchError::InvalidDistribution { .. } => {
                FaultKind::Data
            }
            _ => FaultKind::Range,
        }
    }
}

impl std::error::Error for SearchError {}

impl std::fmt::Display for SearchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Period / frequency range ----
            SearchError::InvalidPeriodRange { pmin, pmax, reason } => {
                write!(f, "Invalid period range [{pmin}, {pmax}]: {reason}.")
            }
            SearchError::InvertedIndexRange { low, high } => {
                write!(f, "Frequency index range is inverted: low = {low} > high = {high}.")
            }
            SearchError::ZeroFrequencyIndex => {
                write!(f, "Frequency index 0 (zero frequency) cannot be searched.")
            }
            SearchError::InvalidFrequencyStep { step } => {
                write!(f, "Frequency step must be finite and > 0; got {step}")
            }
            SearchError::InvalidBaseline { baseline } => {
                write!(f, "Time baseline must be finite and > 0; got {baseline}")
            }
            SearchError::InvalidOversampling { value } => {
                write!(f, "Oversampling factor must be finite and > 0; got {value}")
            }

            // ---- Refinement ----
            SearchError::EmptyPeriodogram => write!(f, "Cannot refine an empty periodogram."),

            // ---- Runtime ----
            SearchError::ThreadPool { reason } => {
                write!(f, "Failed to build the search thread pool: {reason}")
            }
            SearchError::InvalidDistribution { dof } => {
                write!(f, "Cannot build a chi-square distribution with {dof} degrees of freedom.")
            }

            // ---- Propagated ----
            SearchError::Fit(err) => write!(f, "{err}"),
        }
    }
}

impl From<FitError> for SearchError {
    fn from(err: FitError) -> SearchError {
        SearchError::Fit(err)
    }
}

impl From<DataError> for SearchError {
    fn from(err: DataError) -> SearchError {
        SearchError::Fit(FitError::Data(err))
    }
}

/// Convert a [`SearchError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<SearchError> for PyErr {
    fn from(err: SearchError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
