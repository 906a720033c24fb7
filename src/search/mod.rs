//! search — frequency grids, chi-square periodograms and minimum refinement.
//!
//! Purpose
//! -------
//! Scan a uniform grid of trial frequencies with the joint single-frequency
//! fit, then locate the best frequency to sub-grid precision.
//!
//! Key behaviors
//! -------------
//! - [`FrequencyGrid`] validates index ranges and derives grids from a
//!   period range and time baseline.
//! - [`search`] / [`search_with`] produce a [`Periodogram`] (chi-square and
//!   window function per grid point), in parallel when the `parallel`
//!   feature is on.
//! - [`refine`] fits a parabola around the minimum and flags boundary minima
//!   through [`BoundaryMinimum`].
//! - [`SearchOptions`] carries the thread count, grid oversampling and
//!   [`RefineScale`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Results never depend on the number of worker threads.
//! - Range problems surface as [`SearchError`] values with
//!   `FaultKind::Range` before any fit is attempted.

pub mod errors;
pub mod grid;
pub mod options;
pub mod periodogram;
pub mod refine;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{FaultKind, SearchError, SearchResult};
pub use self::grid::FrequencyGrid;
pub use self::options::{RefineScale, SearchOptions};
pub use self::periodogram::{Periodogram, search, search_with, window_function};
pub use self::refine::{BoundaryMinimum, Refinement, parabolic_offset, refine};
