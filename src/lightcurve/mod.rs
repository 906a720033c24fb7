//! lightcurve — raw light curves and their regression design structures.
//!
//! Purpose
//! -------
//! Accept clipped photometric time series from an upstream loader and turn
//! them into immutable per-dataset design structures for the joint
//! sinusoid + systematics regression.
//!
//! Key behaviors
//! -------------
//! - [`LightCurve`] stores one dataset in columnar form (time, magnitude,
//!   uncertainty, segment label, external parameters, optional amplitude
//!   groups) and checks column lengths.
//! - [`DesignMatrix::build`] / [`build_designs`] validate sample values,
//!   compute inverse-variance weights, subtract the shared zero point, and
//!   coordinate-compress segment labels into dense offset indices.
//! - [`DataError`] reports every data-quality fault with dataset and sample
//!   context; [`FaultKind`] classifies faults crate-wide.
//!
//! Invariants & assumptions
//! ------------------------
//! - Building is pure and independent per dataset; no shared state.
//! - The zero point is the minimum time of the first dataset.
//! - Segment indices are dense and cover exactly the segments present.
//!
//! Downstream usage
//! ----------------
//! - `regression::solver::{null, single}` and `search::periodogram::search`
//!   take `&[DesignMatrix]`.
//! - `reconstruction` reads offsets/external parameters back through the
//!   same design structures.

pub mod data;
pub mod design;
pub mod errors;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::data::LightCurve;
pub use self::design::{DesignMatrix, build_designs, compress_labels, longest_baseline};
pub use self::errors::{DataError, DataResult, FaultKind};
