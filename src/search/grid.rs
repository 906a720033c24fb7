//! search::grid — uniform trial-frequency grids.
//!
//! A grid is the inclusive index range `[low, high]` with frequencies
//! `f_k = k · step`. Index 0 (zero frequency) is excluded: a sinusoid at
//! `f = 0` is a constant and collides with the segment offsets.
use crate::search::errors::{SearchError, SearchResult};

/// Inclusive uniform frequency grid `k · step`, `k ∈ [low, high]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyGrid {
    low: usize,
    high: usize,
    step: f64,
}

impl FrequencyGrid {
    /// Grid from explicit indices and step.
    ///
    /// Errors
    /// ------
    /// - `SearchError::InvalidFrequencyStep` unless `step` is finite and > 0.
    /// - `SearchError::ZeroFrequencyIndex` if `low == 0`.
    /// - `SearchError::InvertedIndexRange` if `low > high`.
    pub fn new(low: usize, high: usize, step: f64) -> SearchResult<FrequencyGrid> {
        if !(step.is_finite() && step > 0.0) {
            return Err(SearchError::InvalidFrequencyStep { step });
        }
        if low == 0 {
            return Err(SearchError::ZeroFrequencyIndex);
        }
        if low > high {
            return Err(SearchError::InvertedIndexRange { low, high });
        }
        Ok(FrequencyGrid { low, high, step })
    }

    /// Grid covering periods `[pmin, pmax]` for a data set spanning `baseline`.
    ///
    /// The step is `1 / (oversampling · baseline)`, the low index is
    /// `max(1, floor(1 / (step · pmax)))` and the high index is
    /// `ceil(1 / (step · pmin))`, so the grid brackets the requested range.
    ///
    /// Errors
    /// ------
    /// - `SearchError::InvalidPeriodRange` for non-finite or non-positive
    ///   periods, or `pmin >= pmax`.
    /// - `SearchError::InvalidBaseline` / `SearchError::InvalidOversampling`
    ///   for non-finite or non-positive values.
    ///
    /// Examples
    /// --------
    /// ```rust
    /// # use periodfit::search::grid::FrequencyGrid;
    /// let grid = FrequencyGrid::from_period_range(100.0, 2.4, 3.5, 10.0).unwrap();
    /// assert_eq!(grid.step(), 1e-3);
    /// assert_eq!(grid.low(), 285);
    /// assert_eq!(grid.high(), 417);
    /// ```
    pub fn from_period_range(
        baseline: f64, pmin: f64, pmax: f64, oversampling: f64,
    ) -> SearchResult<FrequencyGrid> {
        if !(pmin.is_finite() && pmax.is_finite()) {
            return Err(SearchError::InvalidPeriodRange { pmin, pmax, reason: "not finite" });
        }
        if pmin <= 0.0 {
            return Err(SearchError::InvalidPeriodRange { pmin, pmax, reason: "pmin must be > 0" });
        }
        if pmin >= pmax {
            return Err(SearchError::InvalidPeriodRange {
                pmin,
                pmax,
                reason: "pmin must be < pmax",
            });
        }
        if !(baseline.is_finite() && baseline > 0.0) {
            return Err(SearchError::InvalidBaseline { baseline });
        }
        if !(oversampling.is_finite() && oversampling > 0.0) {
            return Err(SearchError::InvalidOversampling { value: oversampling });
        }

        let step = 1.0 / (oversampling * baseline);
        let low = ((1.0 / (step * pmax)).floor() as usize).max(1);
        let high = (1.0 / (step * pmin)).ceil() as usize;
        FrequencyGrid::new(low, high, step)
    }

    pub fn low(&self) -> usize {
        self.low
    }

    pub fn high(&self) -> usize {
        self.high
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Number of grid points (`high − low + 1`).
    pub fn len(&self) -> usize {
        self.high - self.low + 1
    }

    /// Always `false`: construction guarantees `low <= high`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Frequency of grid position `i` (0-based from `low`).
    pub fn frequency(&self, i: usize) -> f64 {
        (self.low + i) as f64 * self.step
    }

    /// All grid frequencies in ascending order.
    pub fn frequencies(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.len()).map(|i| self.frequency(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::errors::FaultKind;

    #[test]
    // Purpose
    // -------
    // Verify index/step bookkeeping of an explicit grid.
    fn explicit_grid_enumerates_inclusive_range() {
        let grid = FrequencyGrid::new(3, 7, 0.5).unwrap();
        assert_eq!(grid.len(), 5);
        let f: Vec<f64> = grid.frequencies().collect();
        assert_eq!(f, vec![1.5, 2.0, 2.5, 3.0, 3.5]);
        assert_eq!(FrequencyGrid::new(4, 4, 0.1).unwrap().len(), 1);
    }

    #[test]
    // Purpose
    // -------
    // Ensure malformed grids are range faults.
    //
    // Expect
    // ------
    // - Zero index, inverted range, non-positive step and bad period ranges
    //   are all rejected with `FaultKind::Range`.
    fn malformed_grids_are_range_faults() {
        let cases = [
            FrequencyGrid::new(0, 5, 0.1).unwrap_err(),
            FrequencyGrid::new(6, 5, 0.1).unwrap_err(),
            FrequencyGrid::new(1, 5, 0.0).unwrap_err(),
            FrequencyGrid::new(1, 5, f64::NAN).unwrap_err(),
            FrequencyGrid::from_period_range(10.0, 3.0, 2.0, 10.0).unwrap_err(),
            FrequencyGrid::from_period_range(10.0, 0.0, 2.0, 10.0).unwrap_err(),
            FrequencyGrid::from_period_range(10.0, 1.0, f64::INFINITY, 10.0).unwrap_err(),
            FrequencyGrid::from_period_range(0.0, 1.0, 2.0, 10.0).unwrap_err(),
            FrequencyGrid::from_period_range(10.0, 1.0, 2.0, -1.0).unwrap_err(),
        ];
        for err in cases {
            assert_eq!(err.fault_kind(), FaultKind::Range, "{err}");
        }
        assert_eq!(FrequencyGrid::new(0, 5, 0.1).unwrap_err(), SearchError::ZeroFrequencyIndex);
    }

    #[test]
    // Purpose
    // -------
    // A very long maximum period must not produce index 0.
    fn period_range_clamps_low_index_to_one() {
        let grid = FrequencyGrid::from_period_range(10.0, 1.05, 1e6, 10.0).unwrap();
        assert_eq!(grid.low(), 1);
        assert_eq!(grid.high(), 96);
    }
}
