//! reconstruction — presentation quantities derived from a single-frequency fit.
//!
//! [`reconstruct`] returns one [`DatasetReconstruction`] per dataset: the
//! systematics-corrected series, fitted model, folded phase and one
//! [`SinusoidComponent`] (amplitude, phase, T0 with uncertainties) per
//! amplitude group.

pub mod ephemeris;

pub use self::ephemeris::{DatasetReconstruction, SinusoidComponent, reconstruct};
