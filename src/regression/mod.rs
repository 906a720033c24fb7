//! regression — joint weighted least-squares fits of sinusoid + systematics.
//!
//! Purpose
//! -------
//! Fit the per-dataset systematics model (segment offsets and external
//! parameter slopes), optionally augmented by a sinusoid at one shared trial
//! frequency, to a collection of [`DesignMatrix`](crate::lightcurve::DesignMatrix)
//! values.
//!
//! Key behaviors
//! -------------
//! - [`null`] and [`single`] solve the joint problem and return a
//!   [`FitOutcome`] with pooled chi-square, packed coefficients and a
//!   block-diagonal covariance.
//! - [`CoefficientLayout`] / [`BlockLayout`] describe how coefficients are
//!   packed; [`CoefficientRole`] names any single coefficient.
//! - [`NormalSystem`] accumulates and solves the weighted normal equations of
//!   one block with Jacobi-scaled Cholesky.
//!
//! Invariants & assumptions
//! ------------------------
//! - No coefficient is shared between datasets, so blocks are solved
//!   independently and concatenated in dataset order.
//! - Failures are reported through [`FitError`]; nothing here panics on user
//!   input.
//!
//! Downstream usage
//! ----------------
//! - `search::periodogram` reuses the block helpers of `solver` and caches the
//!   systematics part of each block across trial frequencies.
//! - `reconstruction` consumes a [`FitOutcome`] produced by [`single`].

pub mod errors;
pub mod layout;
pub mod normal;
pub mod solver;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::errors::{FitError, FitResult};
pub use self::layout::{BlockLayout, CoefficientLayout, CoefficientRole};
pub use self::normal::{BlockSolution, Degeneracy, NormalSystem, PIVOT_EPS};
pub use self::solver::{FitOutcome, null, single};
