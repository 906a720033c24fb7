//! Packing of the joint coefficient vector.
//!
//! The joint vector is the concatenation, in dataset order, of one block per
//! dataset laid out as
//!
//! ```text
//! [offset_0 .. offset_{k-1}, ep_0 .. ep_{m-1}, sin_0, cos_0, sin_1, cos_1, ...]
//! ```
//!
//! where `k` is the number of segments, `m` the number of external parameters,
//! and the sine/cosine pairs (one per amplitude group) are present only for a
//! single-frequency fit. With one amplitude group this is exactly
//! `[offsets..., ep_slopes..., sin, cos]`.
use crate::lightcurve::design::DesignMatrix;
use std::ops::Range;

/// What a single coefficient in a dataset block represents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoefficientRole {
    /// DC offset of the segment with this (stringified) label.
    Offset { segment: String },
    /// Slope against external-parameter row `index`.
    ExternalParameter { index: usize },
    /// Sine amplitude of amplitude group `group`.
    Sine { group: usize },
    /// Cosine amplitude of amplitude group `group`.
    Cosine { group: usize },
}

impl std::fmt::Display for CoefficientRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoefficientRole::Offset { segment } => write!(f, "offset of segment '{segment}'"),
            CoefficientRole::ExternalParameter { index } => {
                write!(f, "external parameter {index}")
            }
            CoefficientRole::Sine { group } => write!(f, "sine term of amplitude group {group}"),
            CoefficientRole::Cosine { group } => {
                write!(f, "cosine term of amplitude group {group}")
            }
        }
    }
}

/// Shape of one dataset's coefficient block.
///
/// `n_amplitudes == 0` denotes a null (no sinusoid) block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    pub n_offsets: usize,
    pub n_external: usize,
    pub n_amplitudes: usize,
}

impl BlockLayout {
    /// Block for `design`, with or without the sinusoid terms.
    pub fn for_design(design: &DesignMatrix, with_sinusoid: bool) -> BlockLayout {
        BlockLayout {
            n_offsets: design.n_segments(),
            n_external: design.n_external(),
            n_amplitudes: if with_sinusoid { design.n_amplitudes() } else { 0 },
        }
    }

    /// Total number of coefficients in the block.
    pub fn len(&self) -> usize {
        self.n_offsets + self.n_external + 2 * self.n_amplitudes
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of linear terms excluding the sinusoid.
    pub fn n_systematics(&self) -> usize {
        self.n_offsets + self.n_external
    }

    pub fn offsets(&self) -> Range<usize> {
        0..self.n_offsets
    }

    pub fn external(&self) -> Range<usize> {
        self.n_offsets..self.n_systematics()
    }

    pub fn sinusoid(&self) -> Range<usize> {
        self.n_systematics()..self.len()
    }

    /// Column of the sine term for amplitude group `group`.
    pub fn sine(&self, group: usize) -> usize {
        self.n_systematics() + 2 * group
    }

    /// Column of the cosine term for amplitude group `group`.
    pub fn cosine(&self, group: usize) -> usize {
        self.sine(group) + 1
    }

    /// Role of column `col` within this block, using `design` for labels.
    pub fn role(&self, col: usize, design: &DesignMatrix) -> CoefficientRole {
        if col < self.n_offsets {
            let segment = design.segment_labels().get(col).cloned().unwrap_or_default();
            CoefficientRole::Offset { segment }
        } else if col < self.n_systematics() {
            CoefficientRole::ExternalParameter { index: col - self.n_offsets }
        } else {
            let k = col - self.n_systematics();
            if k % 2 == 0 {
                CoefficientRole::Sine { group: k / 2 }
            } else {
                CoefficientRole::Cosine { group: k / 2 }
            }
        }
    }
}

/// Layout of the concatenated coefficient vector across all datasets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoefficientLayout {
    blocks: Vec<BlockLayout>,
    starts: Vec<usize>,
    total: usize,
}

impl CoefficientLayout {
    pub fn new(blocks: Vec<BlockLayout>) -> CoefficientLayout {
        let mut starts = Vec::with_capacity(blocks.len());
        let mut total = 0;
        for block in &blocks {
            starts.push(total);
            total += block.len();
        }
        CoefficientLayout { blocks, starts, total }
    }

    /// Layout for a null (`with_sinusoid = false`) or single-frequency fit.
    pub fn for_designs(designs: &[DesignMatrix], with_sinusoid: bool) -> CoefficientLayout {
        CoefficientLayout::new(
            designs.iter().map(|d| BlockLayout::for_design(d, with_sinusoid)).collect(),
        )
    }

    /// Length of the joint vector.
    pub fn len(&self) -> usize {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn n_datasets(&self) -> usize {
        self.blocks.len()
    }

    pub fn block(&self, dataset: usize) -> &BlockLayout {
        &self.blocks[dataset]
    }

    pub fn blocks(&self) -> &[BlockLayout] {
        &self.blocks
    }

    /// Range of dataset `dataset`'s block inside the joint vector.
    pub fn range(&self, dataset: usize) -> Range<usize> {
        let start = self.starts[dataset];
        start..start + self.blocks[dataset].len()
    }

    /// Total number of sinusoid coefficients across datasets.
    pub fn n_sinusoid_terms(&self) -> usize {
        self.blocks.iter().map(|b| 2 * b.n_amplitudes).sum()
    }
}
