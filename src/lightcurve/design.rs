//! Design-matrix construction for joint sinusoid + systematics regression.
//!
//! Purpose
//! -------
//! Turn each validated [`LightCurve`] into the compact regression structure the
//! solver consumes: time relative to a shared zero point, observations,
//! inverse-variance weights, the external-parameter matrix, and dense
//! segment/amplitude-group indices.
//!
//! Key behaviors
//! -------------
//! - Segment labels are coordinate-compressed with [`compress_labels`]: the
//!   distinct labels present are sorted ascending and numbered `0..k`. Labels
//!   that no longer occur (clipped away upstream) simply do not get an index.
//! - Weights are `1 / mag_err²`; a non-positive uncertainty is a
//!   [`DataError::NonPositiveUncertainty`], never silently skipped.
//! - [`build_designs`] fixes the shared zero point as the minimum time of the
//!   first light curve and builds every dataset independently.
//!
//! Invariants & assumptions
//! ------------------------
//! - A built [`DesignMatrix`] is immutable; fields are reachable only through
//!   accessors. Rebuild it if the underlying light curve changes.
//! - `offset_index[j] < n_segments()` and `amplitude_index[j] < n_amplitudes()`
//!   for every sample `j`, and every index in those ranges is used.
//! - All stored values are finite.
//!
//! Conventions
//! -----------
//! - `external` keeps the light curve's `n_ep × n` orientation (rows are
//!   auxiliary quantities, columns are samples aligned with `obs`).
//! - Segment labels are kept as strings (via `Display`) for diagnostics only.
use crate::lightcurve::{
    data::LightCurve,
    errors::{DataError, DataResult},
};
use ndarray::{Array1, Array2, ArrayView1};
use std::fmt::Display;
use tracing::debug;

/// `DesignMatrix` — per-dataset regression inputs.
///
/// Fields
/// ------
/// - `dataset`: position of the source light curve in the caller's slice.
/// - `zero_point`: shared time origin subtracted from every sample time.
/// - `time`: sample times minus `zero_point`.
/// - `obs`: observed magnitudes.
/// - `weight`: inverse-variance weights `1 / mag_err²`.
/// - `external`: `n_ep × n` external-parameter matrix.
/// - `offset_index`: dense segment index per sample.
/// - `segment_labels`: original segment label for each dense index.
/// - `amplitude_index`: dense amplitude-group index per sample.
/// - `n_amplitudes`: number of amplitude groups (≥ 1).
#[derive(Debug, Clone, PartialEq)]
pub struct DesignMatrix {
    dataset: usize,
    zero_point: f64,
    time: Array1<f64>,
    obs: Array1<f64>,
    weight: Array1<f64>,
    external: Array2<f64>,
    offset_index: Vec<usize>,
    segment_labels: Vec<String>,
    amplitude_index: Vec<usize>,
    n_amplitudes: usize,
}

impl DesignMatrix {
    /// Build the design structure for one light curve.
    ///
    /// Parameters
    /// ----------
    /// - `dataset`: `usize`
    ///   Position of `lc` in the caller's collection; used for error context.
    /// - `lc`: `&LightCurve<L>`
    ///   Clipped light curve. Segment labels must be totally ordered.
    /// - `zero_point`: `f64`
    ///   Shared time origin (see [`build_designs`]).
    ///
    /// Errors
    /// ------
    /// - `DataError::EmptyDataset` when `lc` has no samples.
    /// - `DataError::NonFiniteSample` for the first NaN/±inf in `time`, `mag`,
    ///   `mag_err`, or `external`.
    /// - `DataError::NonPositiveUncertainty` for the first `mag_err ≤ 0`.
    pub fn build<L: Ord + Clone + Display>(
        dataset: usize, lc: &LightCurve<L>, zero_point: f64,
    ) -> DataResult<Self> {
        validate_samples(dataset, lc)?;

        let time = lc.time().mapv(|t| t - zero_point);
        let obs = lc.mag().clone();
        let weight = lc.mag_err().mapv(|e| 1.0 / (e * e));
        let external = lc.external().clone();

        let (labels, offset_index) = compress_labels(lc.segments());
        let segment_labels: Vec<String> = labels.iter().map(|l| l.to_string()).collect();

        let (amplitude_index, n_amplitudes) = match lc.amplitude_groups() {
            Some(groups) => {
                let (unique, index) = compress_labels(groups);
                (index, unique.len())
            }
            None => (vec![0; lc.len()], 1),
        };

        debug!(
            dataset,
            samples = lc.len(),
            offsets = segment_labels.len(),
            external = external.nrows(),
            amplitude_groups = n_amplitudes,
            "built design matrix"
        );

        Ok(DesignMatrix {
            dataset,
            zero_point,
            time,
            obs,
            weight,
            external,
            offset_index,
            segment_labels,
            amplitude_index,
            n_amplitudes,
        })
    }

    pub fn dataset(&self) -> usize {
        self.dataset
    }

    pub fn zero_point(&self) -> f64 {
        self.zero_point
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn time(&self) -> &Array1<f64> {
        &self.time
    }

    pub fn obs(&self) -> &Array1<f64> {
        &self.obs
    }

    pub fn weight(&self) -> &Array1<f64> {
        &self.weight
    }

    pub fn external(&self) -> &Array2<f64> {
        &self.external
    }

    /// External-parameter values of sample `j` (one per auxiliary quantity).
    pub fn external_at(&self, j: usize) -> ArrayView1<'_, f64> {
        self.external.column(j)
    }

    pub fn offset_index(&self) -> &[usize] {
        &self.offset_index
    }

    pub fn segment_labels(&self) -> &[String] {
        &self.segment_labels
    }

    pub fn amplitude_index(&self) -> &[usize] {
        &self.amplitude_index
    }

    pub fn n_segments(&self) -> usize {
        self.segment_labels.len()
    }

    pub fn n_external(&self) -> usize {
        self.external.nrows()
    }

    pub fn n_amplitudes(&self) -> usize {
        self.n_amplitudes
    }

    /// Largest relative time, i.e. the span from the shared zero point to the
    /// last sample of this dataset.
    pub fn baseline(&self) -> f64 {
        self.time.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Median relative time (mean of the two middle values for even `n`).
    pub fn median_time(&self) -> f64 {
        let mut sorted = self.time.to_vec();
        sorted.sort_by(f64::total_cmp);
        let n = sorted.len();
        if n % 2 == 1 { sorted[n / 2] } else { 0.5 * (sorted[n / 2 - 1] + sorted[n / 2]) }
    }
}

/// Build design matrices for every light curve with a shared zero point.
///
/// The zero point is the minimum time of the **first** light curve, so all
/// datasets are expressed on one time axis and the sinusoid phase is
/// comparable between them.
///
/// Errors
/// ------
/// - `DataError::NoDatasets` for an empty slice.
/// - Any error of [`DesignMatrix::build`], reported for the first failing
///   dataset.
pub fn build_designs<L: Ord + Clone + Display>(
    curves: &[LightCurve<L>],
) -> DataResult<Vec<DesignMatrix>> {
    let first = curves.first().ok_or(DataError::NoDatasets)?;
    validate_samples(0, first)?;
    let zero_point = first.time().iter().copied().fold(f64::INFINITY, f64::min);

    curves.iter().enumerate().map(|(i, lc)| DesignMatrix::build(i, lc, zero_point)).collect()
}

/// Longest time baseline across datasets, measured from the shared zero point.
///
/// This sets the coarsest usable frequency resolution for the search grid.
/// Returns `0.0` for an empty slice.
pub fn longest_baseline(designs: &[DesignMatrix]) -> f64 {
    designs.iter().map(DesignMatrix::baseline).fold(0.0, f64::max)
}

/// Coordinate-compress arbitrary ordered labels into dense indices.
///
/// Returns the sorted distinct labels and, for each input label, its position
/// in that sorted list. The mapping depends only on label identity, so any
/// permutation of the input permutes the index vector the same way.
///
/// Examples
/// --------
/// ```rust
/// # use periodfit::lightcurve::design::compress_labels;
/// let (unique, index) = compress_labels(&[30, 10, 30, 20]);
/// assert_eq!(unique, vec![10, 20, 30]);
/// assert_eq!(index, vec![2, 0, 2, 1]);
/// ```
pub fn compress_labels<L: Ord + Clone>(labels: &[L]) -> (Vec<L>, Vec<usize>) {
    let mut unique = labels.to_vec();
    unique.sort();
    unique.dedup();

    let index = labels
        .iter()
        .map(|label| match unique.binary_search(label) {
            Ok(i) | Err(i) => i,
        })
        .collect();

    (unique, index)
}

fn validate_samples<L>(dataset: usize, lc: &LightCurve<L>) -> DataResult<()> {
    if lc.is_empty() {
        return Err(DataError::EmptyDataset { dataset });
    }

    let columns: [(&'static str, &Array1<f64>); 3] =
        [("time", lc.time()), ("mag", lc.mag()), ("mag_err", lc.mag_err())];
    for (field, column) in columns {
        if let Some((index, &value)) = column.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(DataError::NonFiniteSample { dataset, index, field, value });
        }
    }

    for (index, &value) in lc.mag_err().iter().enumerate() {
        if value <= 0.0 {
            return Err(DataError::NonPositiveUncertainty { dataset, index, value });
        }
    }

    for (index, column) in lc.external().columns().into_iter().enumerate() {
        if let Some(&value) = column.iter().find(|v| !v.is_finite()) {
            return Err(DataError::NonFiniteSample { dataset, index, field: "external", value });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Coordinate compression of segment labels.
    // - Weight construction and zero-point handling in `DesignMatrix::build`.
    // - DataFault reporting for empty datasets and bad samples.
    // - Shared zero point and baseline in `build_designs`/`longest_baseline`.
    // -------------------------------------------------------------------------

    fn three_segment_curve() -> LightCurve<i32> {
        LightCurve::new(
            array![100.0, 100.5, 101.0, 102.0, 103.5],
            array![12.0, 12.1, 11.9, 12.2, 12.0],
            array![0.1, 0.2, 0.1, 0.5, 0.1],
            vec![40, 40, 7, 19, 7],
            array![[1.0, 1.1, 0.9, 1.0, 1.2], [2.0, 2.5, 2.1, 2.2, 2.4]],
        )
        .unwrap()
    }

    #[test]
    // Purpose
    // -------
    // Verify that segment labels are renumbered in ascending label order,
    // independent of where they first appear.
    //
    // Given
    // -----
    // - Labels `[40, 40, 7, 19, 7]`.
    //
    // Expect
    // ------
    // - Sorted labels `[7, 19, 40]` → indices `[2, 2, 0, 1, 0]`.
    fn compress_labels_orders_by_label_not_position() {
        let (unique, index) = compress_labels(&[40, 40, 7, 19, 7]);
        assert_eq!(unique, vec![7, 19, 40]);
        assert_eq!(index, vec![2, 2, 0, 1, 0]);
    }

    #[test]
    // Purpose
    // -------
    // Check the contents of a built design matrix.
    //
    // Given
    // -----
    // - A 5-sample curve with three segments and two external parameters.
    // - Zero point 100.0.
    //
    // Expect
    // ------
    // - Relative times start at 0, weights are 1/err², segment labels are
    //   stringified in sorted order, one amplitude group.
    fn build_produces_weights_relative_times_and_dense_offsets() {
        let design = DesignMatrix::build(3, &three_segment_curve(), 100.0).unwrap();

        assert_eq!(design.dataset(), 3);
        assert_eq!(design.time(), &array![0.0, 0.5, 1.0, 2.0, 3.5]);
        assert_relative_eq!(design.weight()[0], 100.0, max_relative = 1e-12);
        assert_relative_eq!(design.weight()[3], 4.0, max_relative = 1e-12);
        assert_eq!(design.segment_labels(), &["7", "19", "40"]);
        assert_eq!(design.offset_index(), &[2, 2, 0, 1, 0]);
        assert_eq!(design.n_external(), 2);
        assert_eq!(design.n_amplitudes(), 1);
        assert_eq!(design.external_at(1), array![1.1, 2.5]);
        assert_relative_eq!(design.baseline(), 3.5);
        assert_relative_eq!(design.median_time(), 1.0);
    }

    #[test]
    // Purpose
    // -------
    // Ensure a zero uncertainty is reported as a DataFault with context.
    //
    // Given
    // -----
    // - Dataset index 2 whose sample 1 has `mag_err = 0.0`.
    //
    // Expect
    // ------
    // - `Err(NonPositiveUncertainty { dataset: 2, index: 1, value: 0.0 })`.
    fn build_rejects_zero_uncertainty() {
        let lc = LightCurve::without_systematics(
            array![0.0, 1.0, 2.0],
            array![1.0, 1.0, 1.0],
            array![0.1, 0.0, 0.1],
            0,
        )
        .unwrap();

        let err = DesignMatrix::build(2, &lc, 0.0).unwrap_err();
        assert_eq!(err, DataError::NonPositiveUncertainty { dataset: 2, index: 1, value: 0.0 });
    }

    #[test]
    // Purpose
    // -------
    // Ensure NaN magnitudes and empty datasets are rejected before any solve.
    //
    // Given
    // -----
    // - A curve with a NaN magnitude; an empty curve.
    //
    // Expect
    // ------
    // - `NonFiniteSample { field: "mag", .. }` and `EmptyDataset`.
    fn build_rejects_nan_and_empty_inputs() {
        let nan = LightCurve::without_systematics(
            array![0.0, 1.0],
            array![1.0, f64::NAN],
            array![0.1, 0.1],
            0,
        )
        .unwrap();
        match DesignMatrix::build(0, &nan, 0.0) {
            Err(DataError::NonFiniteSample { dataset: 0, index: 1, field: "mag", .. }) => {}
            other => panic!("expected NonFiniteSample, got {other:?}"),
        }

        let empty =
            LightCurve::<u8>::without_systematics(array![], array![], array![], 0).unwrap();
        assert_eq!(
            DesignMatrix::build(1, &empty, 0.0).unwrap_err(),
            DataError::EmptyDataset { dataset: 1 }
        );
    }

    #[test]
    // Purpose
    // -------
    // Verify the shared zero point comes from the first dataset and the
    // baseline is the longest span across datasets.
    //
    // Given
    // -----
    // - Dataset 0 spanning [5, 8], dataset 1 spanning [4, 20].
    //
    // Expect
    // ------
    // - Zero point 5 for both; baseline 15.
    fn build_designs_shares_zero_point_of_first_dataset() {
        let a = LightCurve::without_systematics(
            array![6.0, 5.0, 8.0],
            array![1.0, 1.0, 1.0],
            array![0.1, 0.1, 0.1],
            0,
        )
        .unwrap();
        let b = LightCurve::without_systematics(
            array![4.0, 20.0],
            array![1.0, 1.0],
            array![0.1, 0.1],
            0,
        )
        .unwrap();

        let designs = build_designs(&[a, b]).unwrap();
        assert_eq!(designs[0].zero_point(), 5.0);
        assert_eq!(designs[1].zero_point(), 5.0);
        assert_eq!(designs[1].time(), &array![-1.0, 15.0]);
        assert_relative_eq!(longest_baseline(&designs), 15.0);

        let none: [LightCurve<u8>; 0] = [];
        assert_eq!(build_designs(&none).unwrap_err(), DataError::NoDatasets);
    }
}
