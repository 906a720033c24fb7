//! search::refine — sub-grid location of the periodogram minimum.
//!
//! The global minimum of the chi-square sequence (first occurrence on ties)
//! is refined by the vertex of the parabola through the three samples
//! centred on it. Minima on the first or last grid point cannot be refined;
//! they are returned unrefined and flagged with [`BoundaryMinimum`] so the
//! caller can widen the period range and search again.
use crate::search::{
    errors::{SearchError, SearchResult},
    options::RefineScale,
    periodogram::Periodogram,
};
use tracing::warn;

/// Which edge of the grid the minimum landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryMinimum {
    /// Lowest frequency (longest period) of the grid.
    LowFrequency,
    /// Highest frequency (shortest period) of the grid.
    HighFrequency,
}

impl std::fmt::Display for BoundaryMinimum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryMinimum::LowFrequency => {
                write!(f, "minimum at the lowest trial frequency; widen pmax")
            }
            BoundaryMinimum::HighFrequency => {
                write!(f, "minimum at the highest trial frequency; lower pmin")
            }
        }
    }
}

/// Refined location of the periodogram minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    /// Grid position (0-based from the low index) of the raw minimum.
    pub min_index: usize,
    /// Vertex offset in grid units, within `[-0.5, 0.5]`.
    pub offset: f64,
    /// `(low + min_index + offset) · step`.
    pub frequency: f64,
    /// Chi-square at the raw minimum.
    pub chi2_min: f64,
    /// Set when the minimum is on a grid edge.
    pub boundary: Option<BoundaryMinimum>,
    /// Δχ² = 1 half-width of the minimum in frequency units, if defined.
    pub frequency_sigma: Option<f64>,
}

impl Refinement {
    pub fn period(&self) -> f64 {
        1.0 / self.frequency
    }

    /// Period uncertainty propagated from `frequency_sigma` (`σ_P = σ_f / f²`).
    pub fn period_sigma(&self) -> Option<f64> {
        self.frequency_sigma.map(|s| s / (self.frequency * self.frequency))
    }
}

/// Vertex of the parabola through `(-1, a)`, `(0, b)`, `(1, c)`.
///
/// Returns `-0.5 · (c − a) / (a + c − 2b)` clamped to `[-0.5, 0.5]`, or `0`
/// when the curvature `a + c − 2b` is not positive (no interior minimum).
///
/// Examples
/// --------
/// ```rust
/// # use periodfit::search::refine::parabolic_offset;
/// assert_eq!(parabolic_offset(3.0, 1.0, 2.0), -0.5 * (2.0 - 3.0) / (3.0 + 2.0 - 2.0));
/// assert_eq!(parabolic_offset(1.0, 1.0, 1.0), 0.0);
/// ```
pub fn parabolic_offset(a: f64, b: f64, c: f64) -> f64 {
    let curvature = a + c - 2.0 * b;
    if !(curvature > 0.0) {
        return 0.0;
    }
    (-0.5 * (c - a) / curvature).clamp(-0.5, 0.5)
}

/// Refine the minimum of `periodogram`.
///
/// The vertex is computed on the values selected by `scale`; the frequency
/// uncertainty always uses the chi-square values.
///
/// Errors
/// ------
/// - `SearchError::EmptyPeriodogram` if there is nothing to refine.
pub fn refine(periodogram: &Periodogram, scale: RefineScale) -> SearchResult<Refinement> {
    let chi2 = periodogram.chi2();
    let min_index = periodogram.best_index().ok_or(SearchError::EmptyPeriodogram)?;
    let grid = periodogram.grid();
    let last = chi2.len() - 1;

    let boundary = if min_index == 0 {
        Some(BoundaryMinimum::LowFrequency)
    } else if min_index == last {
        Some(BoundaryMinimum::HighFrequency)
    } else {
        None
    };

    let (offset, frequency_sigma) = match boundary {
        Some(edge) => {
            warn!(min_index, %edge, "periodogram minimum on grid boundary; not refined");
            (0.0, None)
        }
        None => {
            let (a, b, c) = (chi2[min_index - 1], chi2[min_index], chi2[min_index + 1]);
            let offset = parabolic_offset(scale.apply(a), scale.apply(b), scale.apply(c));
            let curvature = a + c - 2.0 * b;
            let sigma = (curvature > 0.0).then(|| grid.step() * (2.0 / curvature).sqrt());
            (offset, sigma)
        }
    };

    Ok(Refinement {
        min_index,
        offset,
        frequency: ((grid.low() + min_index) as f64 + offset) * grid.step(),
        chi2_min: chi2[min_index],
        boundary,
        frequency_sigma,
    })
}
