//! Configuration for the period search pipeline.
//!
//! [`SearchOptions`] bundles grid oversampling and the worker-thread count
//! with the choice of values fed to the parabolic refinement
//! ([`RefineScale`]).

/// Values the parabolic refinement is fitted to.
///
/// Variants
/// --------
/// - `ChiSquare`
///   Fit the parabola to the chi-square values around the minimum. This is
///   the default and the only scale on which
///   [`Refinement::frequency_sigma`](crate::search::refine::Refinement)
///   is reported.
/// - `SqrtChiSquare`
///   Fit the parabola to `sqrt(χ²)`, which is closer to an amplitude
///   spectrum and flattens very deep minima. The vertex formula is the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefineScale {
    #[default]
    ChiSquare,
    SqrtChiSquare,
}

impl RefineScale {
    /// Map a chi-square value onto this scale.
    pub fn apply(self, chi2: f64) -> f64 {
        match self {
            RefineScale::ChiSquare => chi2,
            RefineScale::SqrtChiSquare => chi2.max(0.0).sqrt(),
        }
    }
}

/// Search configuration.
///
/// Fields
/// ------
/// - `threads`: `Option<usize>`
///   Size of a dedicated worker pool for the periodogram. `None` uses the
///   global rayon pool. Ignored when the `parallel` feature is disabled.
/// - `oversampling`: `f64`
///   Grid oversampling factor; the frequency step is
///   `1 / (oversampling · baseline)`.
/// - `refine_scale`: [`RefineScale`]
///   Values fed to the parabolic refinement.
///
/// Notes
/// -----
/// - A `Default` implementation gives `threads = None`, `oversampling = 10`,
///   `refine_scale = ChiSquare`.
/// - Validation happens where the values are used
///   ([`FrequencyGrid::from_period_range`](crate::search::grid::FrequencyGrid::from_period_range)
///   and the pool builder), not here.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub threads: Option<usize>,
    pub oversampling: f64,
    pub refine_scale: RefineScale,
}

impl SearchOptions {
    /// Construct options from explicit settings.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use periodfit::search::options::{RefineScale, SearchOptions};
    /// let opts = SearchOptions::new(Some(2), 5.0, RefineScale::SqrtChiSquare);
    /// assert_eq!(opts.threads, Some(2));
    /// ```
    pub fn new(threads: Option<usize>, oversampling: f64, refine_scale: RefineScale) -> Self {
        SearchOptions { threads, oversampling, refine_scale }
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions { threads: None, oversampling: 10.0, refine_scale: RefineScale::ChiSquare }
    }
}
