//! This module contains the vector extensions trait for bin sequences

use ndarray::{s, Array1, ArrayBase, Data, Ix1};
use num_traits::Float;

pub trait VectorExtensions<T> {
    /// get the monotonic property of the vector
    fn monotonic_prop(&self) -> Monotonic;

    /// the number of values at or below `x`
    ///
    /// For a rising vector this is the insertion index of `x` right of any
    /// equal value, so `x` lies in bin `digitize(x) - 1`.
    fn digitize(&self, x: T) -> usize;

    /// the differences of neighbouring values, i.e. the bin widths
    fn widths(&self) -> Array1<T>;
}

/// Describes the monotonic property of a vector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Monotonic {
    Rising { strict: bool },
    Falling { strict: bool },
    NotMonotonic,
}

impl<S, T> VectorExtensions<T> for ArrayBase<S, Ix1>
where
    S: Data<Elem = T>,
    T: Float,
{
    fn monotonic_prop(&self) -> Monotonic {
        if self.is_empty() {
            return Monotonic::NotMonotonic;
        }

        let mut rising = true;
        let mut falling = true;
        let mut strict = true;
        for pair in self.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            if left < right {
                falling = false;
            } else if left > right {
                rising = false;
            } else if left == right {
                strict = false;
            } else {
                // NaN is not ordered
                return Monotonic::NotMonotonic;
            }
        }

        match (rising, falling) {
            (true, _) => Monotonic::Rising { strict },
            (false, true) => Monotonic::Falling { strict },
            (false, false) => Monotonic::NotMonotonic,
        }
    }

    fn digitize(&self, x: T) -> usize {
        let mut range = (0usize, self.len());
        while range.0 < range.1 {
            let mid_idx = range.0 + (range.1 - range.0) / 2;
            if self[mid_idx] <= x {
                range.0 = mid_idx + 1;
            } else {
                range.1 = mid_idx;
            }
        }
        range.0
    }

    fn widths(&self) -> Array1<T> {
        if self.len() < 2 {
            return Array1::zeros(0);
        }
        &self.slice(s![1..]) - &self.slice(s![..-1])
    }
}

/// Check that `bins` are strictly monotonic rising.
///
/// An empty sequence is not, a single boundary is.
///
/// ```rust
/// # use ndarray::array;
/// # use ndarray_rebin::is_monotonically_increasing;
/// assert!(is_monotonically_increasing(&array![0.0, 1.0, 2.5]));
/// assert!(!is_monotonically_increasing(&array![0.0, 1.0, 1.0]));
/// ```
pub fn is_monotonically_increasing<S, T>(bins: &ArrayBase<S, Ix1>) -> bool
where
    S: Data<Elem = T>,
    T: Float,
{
    matches!(bins.monotonic_prop(), Monotonic::Rising { strict: true })
}
