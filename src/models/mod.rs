//! models — high-level analysis pipelines built on the core modules.
//!
//! [`PeriodSearch`] chains design building, grid derivation, null fit,
//! periodogram scan, refinement, best-frequency refit and reconstruction
//! into a single call and reports the detection significance.

pub mod period_search;

pub use self::period_search::{PeriodSearch, PeriodSearchOutcome};
