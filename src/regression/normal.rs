//! regression::normal — weighted normal equations and their solution.
//!
//! Purpose
//! -------
//! Accumulate the weighted normal equations `XᵀWX β = XᵀWy` for one dataset
//! block and solve them for the coefficients `β` and their covariance
//! `(XᵀWX)⁻¹`, detecting singular or numerically singular systems and naming
//! the offending column.
//!
//! Key behaviors
//! -------------
//! - [`NormalSystem::accumulate`] adds one weighted design row; only the lower
//!   triangle of the Gram matrix is written until [`NormalSystem::symmetrize`].
//! - [`NormalSystem::solve`] applies Jacobi scaling (`D = diag(G)^{-1/2}`) so
//!   the scaled Gram matrix has a unit diagonal, factors it once with a
//!   pivot check, then solves through `nalgebra::Cholesky` and unscales.
//! - A column whose pivot falls below [`PIVOT_EPS`] after scaling is reported
//!   as a [`Degeneracy`]: it is (numerically) a linear combination of the
//!   columns before it, and those columns are listed.
//!
//! Invariants & assumptions
//! ------------------------
//! - Weights are strictly positive (guaranteed by the design builder).
//! - On a unit-diagonal matrix, the Cholesky pivot of column `j` equals
//!   `1 − R²_j`, the fraction of that column not explained by the earlier
//!   columns. The threshold is therefore scale-free.
//!
//! Conventions
//! -----------
//! - Matrices are `nalgebra::DMatrix` internally; [`to_array1`] and
//!   [`to_array2`] copy results into `ndarray` for the public surface.
//! - Column indices in errors are block-local (0-based within one dataset).
use nalgebra::{Cholesky, DMatrix, DVector};
use ndarray::{Array1, Array2};

/// Smallest admissible scaled Cholesky pivot (`1 − R²` of a column against
/// the preceding ones).
pub const PIVOT_EPS: f64 = 1e-10;

/// Smallest scaled weight for an earlier column to count as part of a
/// degenerate column's dependency.
const COLLINEAR_EPS: f64 = 1e-6;

/// Coefficients and covariance of one solved block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSolution {
    pub coefficients: DVector<f64>,
    pub covariance: DMatrix<f64>,
}

/// Weighted normal equations for one dataset block.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalSystem {
    gram: DMatrix<f64>,
    rhs: DVector<f64>,
}

impl NormalSystem {
    pub fn zeros(p: usize) -> NormalSystem {
        NormalSystem { gram: DMatrix::zeros(p, p), rhs: DVector::zeros(p) }
    }

    /// Build from an explicit (already symmetric) Gram matrix and right-hand side.
    pub fn from_parts(gram: DMatrix<f64>, rhs: DVector<f64>) -> NormalSystem {
        NormalSystem { gram, rhs }
    }

    pub fn dim(&self) -> usize {
        self.rhs.len()
    }

    pub fn gram(&self) -> &DMatrix<f64> {
        &self.gram
    }

    pub fn rhs(&self) -> &DVector<f64> {
        &self.rhs
    }

    /// Add design row `row` with weight `w` and observation `y`.
    ///
    /// Writes the lower triangle only; call [`NormalSystem::symmetrize`]
    /// before solving.
    pub fn accumulate(&mut self, row: &[f64], w: f64, y: f64) {
        for a in 0..row.len() {
            let wa = w * row[a];
            if wa == 0.0 {
                continue;
            }
            self.rhs[a] += wa * y;
            for b in 0..=a {
                self.gram[(a, b)] += wa * row[b];
            }
        }
    }

    /// Mirror the lower triangle into the upper triangle.
    pub fn symmetrize(&mut self) {
        let p = self.dim();
        for a in 0..p {
            for b in 0..a {
                self.gram[(b, a)] = self.gram[(a, b)];
            }
        }
    }

    /// Solve for coefficients and covariance.
    ///
    /// Returns
    /// -------
    /// - `Ok(BlockSolution)` when every scaled pivot is at least [`PIVOT_EPS`].
    /// - `Err(Degeneracy)` naming the first degenerate column otherwise
    ///   (including a column with a zero or non-finite diagonal).
    pub fn solve(&self) -> Result<BlockSolution, Degeneracy> {
        let p = self.dim();
        if p == 0 {
            return Ok(BlockSolution {
                coefficients: DVector::zeros(0),
                covariance: DMatrix::zeros(0, 0),
            });
        }

        let mut scale = DVector::zeros(p);
        for i in 0..p {
            let d = self.gram[(i, i)];
            if !(d.is_finite() && d > 0.0) {
                return Err(Degeneracy { column: i, collinear_with: Vec::new() });
            }
            scale[i] = 1.0 / d.sqrt();
        }

        let scaled = DMatrix::from_fn(p, p, |i, j| self.gram[(i, j)] * scale[i] * scale[j]);
        let chol = Cholesky::pack_dirty(pivoted_factor(&scaled)?);
        let z = chol.solve(&self.rhs.component_mul(&scale));
        let coefficients = z.component_mul(&scale);

        let inv = chol.inverse();
        let covariance = DMatrix::from_fn(p, p, |i, j| inv[(i, j)] * scale[i] * scale[j]);

        Ok(BlockSolution { coefficients, covariance })
    }
}

/// A column of the normal system that the preceding columns explain.
///
/// `collinear_with` lists the earlier columns that carry the dependency, in
/// ascending order; it is empty when the column is identically zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degeneracy {
    pub column: usize,
    pub collinear_with: Vec<usize>,
}

/// Cholesky factor of the unit-diagonal matrix `a`, with every pivot checked
/// against [`PIVOT_EPS`].
///
/// Returns the lower factor (upper triangle zero) or the first column whose
/// pivot `1 − R²` falls below the threshold, together with the earlier
/// columns it is a combination of.
pub fn pivoted_factor(a: &DMatrix<f64>) -> Result<DMatrix<f64>, Degeneracy> {
    let p = a.nrows();
    let mut l = DMatrix::<f64>::zeros(p, p);
    for j in 0..p {
        let mut pivot = a[(j, j)];
        for k in 0..j {
            pivot -= l[(j, k)] * l[(j, k)];
        }
        if !(pivot >= PIVOT_EPS) {
            return Err(Degeneracy { column: j, collinear_with: dependency(&l, j) });
        }
        let ljj = pivot.sqrt();
        l[(j, j)] = ljj;
        for i in (j + 1)..p {
            let mut s = a[(i, j)];
            for k in 0..j {
                s -= l[(i, k)] * l[(j, k)];
            }
            l[(i, j)] = s / ljj;
        }
    }
    Ok(l)
}

/// Columns `k < j` with a non-negligible weight in the least-squares
/// combination reproducing column `j`.
///
/// Row `j` of the partial factor holds `L_p⁻¹ a_j`, so the weights
/// `λ = A_p⁻¹ a_j` follow from one back substitution with `L_pᵀ`.
fn dependency(l: &DMatrix<f64>, j: usize) -> Vec<usize> {
    let mut lambda = vec![0.0; j];
    for k in (0..j).rev() {
        let mut s = l[(j, k)];
        for i in (k + 1)..j {
            s -= l[(i, k)] * lambda[i];
        }
        lambda[k] = s / l[(k, k)];
    }
    (0..j).filter(|&k| lambda[k].abs() > COLLINEAR_EPS).collect()
}

/// First column whose Cholesky pivot on the unit-diagonal matrix `a` is below
/// [`PIVOT_EPS`], or `None` if the matrix is comfortably positive definite.
pub fn first_degenerate_column(a: &DMatrix<f64>) -> Option<usize> {
    pivoted_factor(a).err().map(|d| d.column)
}

/// Copy a `DVector` into an `ndarray::Array1`.
pub fn to_array1(v: &DVector<f64>) -> Array1<f64> {
    Array1::from_iter(v.iter().copied())
}

/// Copy a `DMatrix` into an `ndarray::Array2` (row-major).
pub fn to_array2(m: &DMatrix<f64>) -> Array2<f64> {
    Array2::from_shape_fn((m.nrows(), m.ncols()), |(i, j)| m[(i, j)])
}
