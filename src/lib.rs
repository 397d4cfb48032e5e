//! The ndarray-rebin crate provides conservative rebinning and shrinking
//! of histogram-like data stored in _n_-dimensional arrays.
//!
//! Every axis of a grid is described by a bin sequence: `n + 1` strictly
//! increasing boundaries for the `n` values along that axis.
//!
//! - [`rebin_1d`] re-expresses a grid on new boundaries along one axis,
//!   preserving the integral (grouped data) or the width weighted
//!   average (density data) over every covered range.
//! - [`rebin_nd`] and [`Rebinner`] apply a sequence of such operations,
//!   optionally handing large arrays to a [`LargeArrayStrategy`].
//! - [`shrink_1d`] and [`shrink_nd`] select the minimal set of bins
//!   fully covering a requested interval, without copying.
//!
//! ```rust
//! # use ndarray::{array, Axis};
//! # use ndarray_rebin::*;
//! # use approx::*;
//! let bins = array![0.0, 1.0, 2.0];
//! let data = array![1.0, 2.0];
//!
//! let density = rebin_1d(&data, &bins, &array![0.0, 2.0], Axis(0), false, false).unwrap();
//! assert_abs_diff_eq!(density, array![1.5], epsilon = f64::EPSILON);
//!
//! let totals = rebin_1d(&data, &bins, &array![0.0, 2.0], Axis(0), true, false).unwrap();
//! assert_abs_diff_eq!(totals, array![3.0], epsilon = f64::EPSILON);
//! ```
use std::fmt::Debug;

use num_traits::Float;
use thiserror::Error;

mod aliases;
mod interpolate;
pub mod rebin;
pub mod shrink;
mod vector_extensions;

pub use aliases::*;
pub use interpolate::{interpolate, interpolate_axis};
pub use rebin::{
    rebin_1d, rebin_nd, rebin_spec_composer, Chunked, GroupedFlags, InProcess, Isolated,
    LargeArrayStrategy, RebinOp, Rebinner, RebinnerBuilder, DEFAULT_OFFLOAD_THRESHOLD,
};
pub use shrink::{shrink_1d, shrink_nd, trim_spec_composer, ShrinkOp, Shrunk, ShrunkNd};
pub use vector_extensions::{is_monotonically_increasing, Monotonic, VectorExtensions};

/// Element types the rebinning engine operates on
///
/// This is implemented for every [`Float`] that can be shared with a worker
/// thread, in practice `f64` and `f32`.
pub trait BinFloat: Float + Debug + Send + Sync + 'static {}

impl<T> BinFloat for T where T: Float + Debug + Send + Sync + 'static {}

/// Type alias for `Result<T, RebinError>`
pub type Result<T> = core::result::Result<T, RebinError>;

/// Which of the two bin sequences of an operation an error refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinsKind {
    /// the bins the data is currently defined on
    Source,
    /// the requested bins
    Target,
}

impl std::fmt::Display for BinsKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinsKind::Source => write!(f, "bins"),
            BinsKind::Target => write!(f, "new bins"),
        }
    }
}

/// The error type for rebinning and shrinking
#[derive(Debug, Error)]
pub enum RebinError {
    /// A bin sequence is empty or not strictly increasing.
    /// Equal neighbours are a violation, zero width bins are not supported.
    #[error("{0} are not strictly monotonic rising")]
    NotMonotonic(BinsKind),

    /// The extent of the data along an axis does not match the bin count
    #[error("data extent along axis {axis} is {found}, but the bins describe {expected} bins")]
    ShapeMismatch {
        axis: usize,
        expected: usize,
        found: usize,
    },

    /// A requested boundary lies outside of the source bins, extrapolation is never done
    #[error("{value:?} is not in the range of the bins [{lower:?}..{upper:?}]")]
    OutOfRange {
        value: f64,
        lower: f64,
        upper: f64,
    },

    /// A shrink request does not cover a single bin
    #[error("shrinking to [{low:?}..{high:?}] results in an empty grid")]
    EmptyResult { low: f64, high: f64 },

    #[error("axis {axis} is out of bounds for data with {ndim} dimensions")]
    AxisOutOfBounds { axis: usize, ndim: usize },

    /// A bin sequence has fewer boundaries than the operation requires
    #[error("{kind} need at least {minimum} boundaries, got {length}")]
    NotEnoughBins {
        kind: BinsKind,
        length: usize,
        minimum: usize,
    },

    /// The isolated worker could not be started or did not finish
    #[error("isolated rebin worker failed: {0}")]
    WorkerFailed(String),

    #[error(transparent)]
    Shape(#[from] ndarray::ShapeError),
}

impl RebinError {
    pub(crate) fn out_of_range<A: BinFloat>(value: A, lower: A, upper: A) -> Self {
        RebinError::OutOfRange {
            value: value.to_f64().unwrap_or(f64::NAN),
            lower: lower.to_f64().unwrap_or(f64::NAN),
            upper: upper.to_f64().unwrap_or(f64::NAN),
        }
    }
}
