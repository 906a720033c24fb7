//! Errors for the weighted least-squares solver.
//!
//! [`FitError`] wraps the ingestion-level [`DataError`] and adds the faults
//! that only become visible once the model is assembled: too few samples for
//! the number of free coefficients, a (near-)singular normal system, and an
//! unusable trial frequency. Singular systems name the dataset and the
//! coefficient whose column could not be resolved so the caller can drop or
//! merge that segment upstream.
use crate::{
    lightcurve::errors::{DataError, FaultKind},
    regression::layout::CoefficientRole,
};
#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

/// Result alias for solver operations that may produce [`FitError`].
pub type FitResult<T> = Result<T, FitError>;

#[derive(Debug, Clone, PartialEq)]
pub enum FitError {
    // ---- Input data ----
    /// Propagated data-quality fault.
    Data(DataError),

    // ---- Model identifiability ----
    /// A dataset has fewer samples than free coefficients.
    InsufficientSamples { dataset: usize, samples: usize, coefficients: usize },

    /// The normal system of a dataset is singular or numerically so; `role`
    /// names the first coefficient that is not resolvable from the others and
    /// `segments` the segments whose offsets it is collinear with.
    SingularSystem { dataset: usize, role: CoefficientRole, segments: Vec<String> },

    // ---- Trial frequency ----
    /// Single-frequency fits need a finite frequency > 0.
    InvalidFrequency { value: f64 },

    // ---- Fit consumers ----
    /// A sinusoid was required but the fit is a null fit.
    MissingSinusoid,

    /// The fit was produced for a different number of datasets.
    DatasetCountMismatch { expected: usize, actual: usize },
}

impl FitError {
    /// Trial-frequency problems are range faults; everything else is data.
    pub fn fault_kind(&self) -> FaultKind {
        match self {
            FitError::InvalidFrequency { .. } => FaultKind::Range,
            _ => FaultKind::Data,
        }
    }
}

impl std::error::Error for FitError {}

impl std::fmt::Display for FitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitError::Data(err) => write!(f, "{err}"),
            FitError::InsufficientSamples { dataset, samples, coefficients } => {
                write!(
                    f,
                    "Dataset {dataset} has {samples} samples but the model needs {coefficients} coefficients."
                )
            }
            FitError::SingularSystem { dataset, role, segments } => {
                write!(f, "Dataset {dataset}: singular system; cannot resolve the {role}")?;
                if segments.is_empty() {
                    return write!(f, ".");
                }
                let quoted: Vec<String> = segments.iter().map(|s| format!("'{s}'")).collect();
                write!(f, " from the offset of segment(s) {}.", quoted.join(", "))
            }
            FitError::InvalidFrequency { value } => {
                write!(f, "Trial frequency must be finite and > 0; got {value}")
            }
            FitError::MissingSinusoid => {
                write!(f, "A single-frequency fit is required; got a null fit.")
            }
            FitError::DatasetCountMismatch { expected, actual } => {
                write!(f, "Fit covers {expected} datasets but {actual} were supplied.")
            }
        }
    }
}

impl From<DataError> for FitError {
    fn from(err: DataError) -> FitError {
        FitError::Data(err)
    }
}

/// Convert a [`FitError`] into a Python `ValueError` with the error message.
#[cfg(feature = "python-bindings")]
impl std::convert::From<FitError> for PyErr {
    fn from(err: FitError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}
