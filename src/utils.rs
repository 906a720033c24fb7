//! Conversion helpers between Python objects and the core light-curve types.
//!
//! Compiled only with the `python-bindings` feature. The Python surface
//! describes a dataset as the tuple `(t, y, wt[, ep[, idc[, iamp]]])` where
//! `wt` are inverse-variance weights, `ep` an `n_ep × n` array, `idc` segment
//! indices and `iamp` amplitude-group indices; trailing entries may be
//! omitted or `None`.

use ndarray::{Array1, Array2};

use numpy::{
    IntoPyArray,    // Vec → PyArray
    PyArrayMethods, // .readonly()
    PyReadonlyArray1,
    PyReadonlyArray2,
};

use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::{PyAny, PyList, PyTuple},
};

use crate::lightcurve::{data::LightCurve, design::DesignMatrix, errors::DataError};

/// Borrow a contiguous 1-D `float64` array from a numpy array, a pandas
/// Series, or any sequence of floats.
#[inline]
pub fn extract_f64_array<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>,
) -> PyResult<PyReadonlyArray1<'py, f64>> {
    if let Ok(arr_ro) = raw_data.extract::<PyReadonlyArray1<f64>>() {
        if arr_ro.as_slice().is_ok() {
            return Ok(arr_ro);
        }
    }

    if let Ok(obj) = raw_data.call_method("to_numpy", (false,), None) {
        if let Ok(series_ro) = obj.extract::<PyReadonlyArray1<f64>>() {
            if series_ro.as_slice().is_ok() {
                return Ok(series_ro);
            }
        }
    }

    let vec: Vec<f64> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of float64")
    })?;
    Ok(vec.into_pyarray(py).readonly())
}

/// Copy a 1-D float array-like into an owned `Array1`.
pub fn extract_array1<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Array1<f64>> {
    let arr = extract_f64_array(py, raw_data)?;
    let slice = arr.as_slice().map_err(|_| {
        PyValueError::new_err(format!("{name} must be a 1-D contiguous float64 array"))
    })?;
    Ok(Array1::from(slice.to_vec()))
}

/// Copy a 2-D float array-like (`n_ep × n`) into an owned `Array2`.
///
/// A 1-D input is treated as a single external parameter.
pub fn extract_array2<'py>(
    py: Python<'py>, raw_data: &Bound<'py, PyAny>, name: &str,
) -> PyResult<Array2<f64>> {
    if let Ok(arr) = raw_data.extract::<PyReadonlyArray2<f64>>() {
        return Ok(arr.as_array().to_owned());
    }
    if let Ok(row) = extract_array1(py, raw_data, name) {
        let n = row.len();
        return row
            .into_shape_with_order((1, n))
            .map_err(|e| PyValueError::new_err(format!("{name}: {e}")));
    }
    let rows: Vec<Vec<f64>> = raw_data.extract().map_err(|_| {
        PyTypeError::new_err(format!("{name} must be a 2-D float64 array (n_ep x n)"))
    })?;
    let n = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != n) {
        return Err(PyValueError::new_err(format!("{name} rows must all have the same length")));
    }
    Array2::from_shape_vec((rows.len(), n), rows.concat())
        .map_err(|e| PyValueError::new_err(format!("{name}: {e}")))
}

/// Extract non-negative integer labels (segment or amplitude-group indices).
pub fn extract_labels(raw_data: &Bound<'_, PyAny>, name: &str) -> PyResult<Vec<usize>> {
    let values: Vec<i64> = match raw_data.extract::<PyReadonlyArray1<i64>>() {
        Ok(arr) => arr.as_array().to_vec(),
        Err(_) => raw_data.extract().map_err(|_| {
            PyTypeError::new_err(format!("{name} must be a 1-D integer array or sequence"))
        })?,
    };
    values
        .into_iter()
        .map(|v| {
            usize::try_from(v)
                .map_err(|_| PyValueError::new_err(format!("{name} must be non-negative; got {v}")))
        })
        .collect()
}

/// Convert one `(t, y, wt[, ep[, idc[, iamp]]])` tuple into a [`LightCurve`].
///
/// Weights must be strictly positive; uncertainties are `1 / sqrt(wt)`.
pub fn extract_light_curve<'py>(
    py: Python<'py>, item: &Bound<'py, PyAny>, dataset: usize,
) -> PyResult<LightCurve<usize>> {
    let tuple = item.downcast::<PyTuple>().map_err(|_| {
        PyTypeError::new_err(format!("dataset {dataset} must be a tuple (t, y, wt[, ep[, idc[, iamp]]])"))
    })?;
    if !(3..=6).contains(&tuple.len()) {
        return Err(PyValueError::new_err(format!(
            "dataset {dataset} must have 3 to 6 entries; got {}",
            tuple.len()
        )));
    }
    let optional = |i: usize| -> PyResult<Option<Bound<'py, PyAny>>> {
        if i >= tuple.len() {
            return Ok(None);
        }
        let obj = tuple.get_item(i)?;
        Ok(if obj.is_none() { None } else { Some(obj) })
    };

    let time = extract_array1(py, &tuple.get_item(0)?, "t")?;
    let mag = extract_array1(py, &tuple.get_item(1)?, "y")?;
    let weight = extract_array1(py, &tuple.get_item(2)?, "wt")?;
    let n = time.len();

    if let Some((index, &value)) = weight.iter().enumerate().find(|(_, w)| !(**w > 0.0)) {
        return Err(PyValueError::new_err(format!(
            "Dataset {dataset}, sample {index}: weight must be > 0; got {value}"
        )));
    }
    let mag_err = weight.mapv(|w| 1.0 / w.sqrt());

    let external = match optional(3)? {
        Some(obj) => extract_array2(py, &obj, "ep")?,
        None => Array2::zeros((0, n)),
    };
    let segments = match optional(4)? {
        Some(obj) => extract_labels(&obj, "idc")?,
        None => vec![0; n],
    };

    let lc = LightCurve::new(time, mag, mag_err, segments, external)?;
    match optional(5)? {
        Some(obj) => Ok(lc.with_amplitude_groups(extract_labels(&obj, "iamp")?)?),
        None => Ok(lc),
    }
}

/// Convert a Python list of dataset tuples into design structures.
///
/// Times are used as given (zero point 0), matching callers that already
/// subtract their own reference epoch.
pub fn extract_designs<'py>(
    py: Python<'py>, datasets: &Bound<'py, PyList>,
) -> PyResult<Vec<DesignMatrix>> {
    if datasets.is_empty() {
        return Err(DataError::NoDatasets.into());
    }
    datasets
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let lc = extract_light_curve(py, &item, i)?;
            Ok(DesignMatrix::build(i, &lc, 0.0)?)
        })
        .collect()
}

/// Map the Python `nthr` argument (`None`, `-1` or `0` = all CPUs) to a
/// thread count.
pub fn thread_count(nthr: Option<i64>) -> Option<usize> {
    nthr.filter(|&n| n > 0).map(|n| n as usize)
}
