//! Raw light-curve containers handed to the design-matrix builder.
//!
//! Purpose
//! -------
//! Hold one photometric time series (a "light curve") in columnar form exactly
//! as delivered by the upstream loader/cleaner: times, magnitudes, magnitude
//! uncertainties, a segment label per sample, and a matrix of external
//! parameters (auxiliary measured quantities such as comparison-star
//! magnitude or seeing).
//!
//! Key behaviors
//! -------------
//! - [`LightCurve::new`] checks only **structural** invariants: every column
//!   must have one entry per sample. Value checks (finiteness, positive
//!   uncertainties) need the dataset's position for error context and are
//!   done by the builder in [`crate::lightcurve::design`].
//! - Segment labels are any totally ordered type `L`; they are compressed to
//!   dense indices later, so raw label values never leak into the solver.
//! - Amplitude groups are optional. Without them the whole light curve shares
//!   one sine/cosine pair.
//!
//! Invariants & assumptions
//! ------------------------
//! - `mag.len() == mag_err.len() == segments.len() == time.len()`.
//! - `external` has shape `n_ep × time.len()` (rows = auxiliary quantities,
//!   columns = samples); `n_ep` may be zero.
//! - If present, `amplitude_groups.len() == time.len()`.
//! - Samples need not be time-ordered; nothing downstream depends on order.
//!
//! Conventions
//! -----------
//! - Times are in the caller's unit (typically days, e.g. BJD). The shared
//!   zero point is subtracted by the builder, not here.
//! - Upstream clipping is assumed to have happened already.
use crate::lightcurve::errors::{DataError, DataResult};
use ndarray::{Array1, Array2};

/// `LightCurve` — one clipped light curve in columnar layout.
///
/// Fields
/// ------
/// - `time`: observation times.
/// - `mag`: observed magnitudes.
/// - `mag_err`: 1σ magnitude uncertainties.
/// - `segments`: per-sample segment label (one DC offset per distinct label).
/// - `external`: `n_ep × n` external-parameter matrix.
/// - `amplitude_groups`: optional per-sample amplitude-group label.
///
/// Invariants
/// ----------
/// - All per-sample columns share the length of `time`; enforced by
///   [`LightCurve::new`] and [`LightCurve::with_amplitude_groups`]. Fields are
///   private so the invariant cannot be broken after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct LightCurve<L> {
    time: Array1<f64>,
    mag: Array1<f64>,
    mag_err: Array1<f64>,
    segments: Vec<L>,
    external: Array2<f64>,
    amplitude_groups: Option<Vec<usize>>,
}

impl<L> LightCurve<L> {
    /// Construct a [`LightCurve`] from its columns.
    ///
    /// Parameters
    /// ----------
    /// - `time`, `mag`, `mag_err`: `Array1<f64>`
    ///   Per-sample columns of equal length `n`.
    /// - `segments`: `Vec<L>`
    ///   Per-sample segment labels, length `n`.
    /// - `external`: `Array2<f64>`
    ///   External parameters with shape `n_ep × n`. Use `Array2::zeros((0, n))`
    ///   for a light curve without external parameters.
    ///
    /// Errors
    /// ------
    /// - `DataError::LengthMismatch { field, expected, actual }`
    ///   Returned for the first column whose length differs from `time.len()`.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use ndarray::{array, Array2};
    /// # use periodfit::lightcurve::data::LightCurve;
    /// let lc = LightCurve::new(
    ///     array![0.0, 1.0, 2.0],
    ///     array![12.1, 12.0, 12.2],
    ///     array![0.01, 0.01, 0.02],
    ///     vec!["night-1", "night-1", "night-2"],
    ///     Array2::zeros((0, 3)),
    /// )
    /// .unwrap();
    /// assert_eq!(lc.len(), 3);
    /// assert_eq!(lc.n_external(), 0);
    /// ```
    pub fn new(
        time: Array1<f64>, mag: Array1<f64>, mag_err: Array1<f64>, segments: Vec<L>,
        external: Array2<f64>,
    ) -> DataResult<Self> {
        let n = time.len();
        check_len("mag", n, mag.len())?;
        check_len("mag_err", n, mag_err.len())?;
        check_len("segments", n, segments.len())?;
        check_len("external", n, external.ncols())?;

        Ok(LightCurve { time, mag, mag_err, segments, external, amplitude_groups: None })
    }

    /// Attach per-sample amplitude-group labels.
    ///
    /// Each distinct label receives its own sine/cosine pair at the shared
    /// trial frequency. Labels are compressed to dense indices in sorted order
    /// by the builder.
    ///
    /// Errors
    /// ------
    /// - `DataError::LengthMismatch` if `groups.len() != self.len()`.
    pub fn with_amplitude_groups(mut self, groups: Vec<usize>) -> DataResult<Self> {
        check_len("amplitude_groups", self.time.len(), groups.len())?;
        self.amplitude_groups = Some(groups);
        Ok(self)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Number of external-parameter rows.
    pub fn n_external(&self) -> usize {
        self.external.nrows()
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn mag(&self) -> &Array1<f64> {
        &self.mag
    }

    pub fn mag_err(&self) -> &Array1<f64> {
        &self.mag_err
    }

    pub fn segments(&self) -> &[L] {
        &self.segments
    }

    pub fn external(&self) -> &Array2<f64> {
        &self.external
    }

    pub fn amplitude_groups(&self) -> Option<&[usize]> {
        self.amplitude_groups.as_deref()
    }
}

impl<L: Clone> LightCurve<L> {
    /// Light curve with a single segment and no external parameters.
    ///
    /// The resulting model is one global offset plus the sinusoid, i.e. a
    /// plain weighted sinusoid fit.
    pub fn without_systematics(
        time: Array1<f64>, mag: Array1<f64>, mag_err: Array1<f64>, segment: L,
    ) -> DataResult<Self> {
        let n = time.len();
        let segments = vec![segment; n];
        LightCurve::new(time, mag, mag_err, segments, Array2::zeros((0, n)))
    }
}

fn check_len(field: &'static str, expected: usize, actual: usize) -> DataResult<()> {
    if expected != actual {
        return Err(DataError::LengthMismatch { field, expected, actual });
    }
    Ok(())
}
