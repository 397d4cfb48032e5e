//! Piecewise linear interpolation of tabulated data along one axis.
//!
//! Both functions expect `x` to be strictly monotonic rising, this is not
//! checked here. [`rebin_1d`](crate::rebin_1d) validates its bins before
//! calling in.

use ndarray::{Array, Array1, ArrayBase, Axis, Data, Dimension, Ix1, RemoveAxis, Zip};

use crate::{vector_extensions::VectorExtensions, BinFloat, BinsKind, RebinError, Result};

/// Ordinary piecewise linear interpolation of `y(x)` at every point in `x_new`.
///
/// Queries left of `x[0]` or right of the last `x` yield the first or last
/// value of `y`.
///
/// ```rust
/// # use ndarray::array;
/// # use ndarray_rebin::interpolate;
/// # use approx::*;
/// let x = array![0.0, 1.0, 3.0];
/// let y = array![0.0, 2.0, 3.0];
/// let y_new = interpolate(&array![-1.0, 0.5, 2.0, 4.0], &x, &y).unwrap();
/// assert_abs_diff_eq!(y_new, array![0.0, 1.0, 2.5, 3.0], epsilon = f64::EPSILON);
/// ```
pub fn interpolate<A, Sq, Sx, Sy>(
    x_new: &ArrayBase<Sq, Ix1>,
    x: &ArrayBase<Sx, Ix1>,
    y: &ArrayBase<Sy, Ix1>,
) -> Result<Array1<A>>
where
    A: BinFloat,
    Sq: Data<Elem = A>,
    Sx: Data<Elem = A>,
    Sy: Data<Elem = A>,
{
    check_table(x, y.len(), Axis(0))?;
    let last = x.len() - 1;

    Ok(x_new.mapv(|xq| {
        if xq <= x[0] {
            y[0]
        } else if xq >= x[last] {
            y[last]
        } else {
            let idx = x.digitize(xq).clamp(1, last);
            calc_frac((x[idx - 1], y[idx - 1]), (x[idx], y[idx]), xq)
        }
    }))
}

/// Interpolate the _n_-dimensional table `y` along `axis` at every point in `x_new`.
///
/// The result has the shape of `y` with the extent along `axis` replaced
/// by `x_new.len()`. Every query point is bracketed by a binary search in `x`,
/// the bracket is clamped to the first and last interval, and the slices of
/// `y` on both sides are blended linearly. Queries outside of `x` are
/// extrapolated from the outermost interval.
///
/// ```rust
/// # use ndarray::{array, Axis};
/// # use ndarray_rebin::interpolate_axis;
/// # use approx::*;
/// let x = array![0.0, 1.0, 2.0];
/// let y = array![
///     [0.0, 1.0, 2.0],
///     [2.0, 3.0, 6.0],
/// ];
/// let y_new = interpolate_axis(&array![0.5, 1.5], &x, &y, Axis(1)).unwrap();
/// let expected = array![
///     [0.5, 1.5],
///     [2.5, 4.5],
/// ];
/// assert_abs_diff_eq!(y_new, expected, epsilon = f64::EPSILON);
/// ```
pub fn interpolate_axis<A, Sq, Sx, Sy, D>(
    x_new: &ArrayBase<Sq, Ix1>,
    x: &ArrayBase<Sx, Ix1>,
    y: &ArrayBase<Sy, D>,
    axis: Axis,
) -> Result<Array<A, D>>
where
    A: BinFloat,
    Sq: Data<Elem = A>,
    Sx: Data<Elem = A>,
    Sy: Data<Elem = A>,
    D: Dimension + RemoveAxis,
{
    if axis.index() >= y.ndim() {
        return Err(RebinError::AxisOutOfBounds {
            axis: axis.index(),
            ndim: y.ndim(),
        });
    }
    check_table(x, y.len_of(axis), axis)?;
    let last = x.len() - 1;

    let mut dim = y.raw_dim();
    dim[axis.index()] = x_new.len();
    let mut y_new = Array::zeros(dim);

    for (target, &xq) in y_new.axis_iter_mut(axis).zip(x_new.iter()) {
        let idx = x.digitize(xq).clamp(1, last);
        let (x1, x2) = (x[idx - 1], x[idx]);
        Zip::from(target)
            .and(y.index_axis(axis, idx - 1))
            .and(y.index_axis(axis, idx))
            .for_each(|t, &y1, &y2| {
                *t = calc_frac((x1, y1), (x2, y2), xq);
            });
    }
    Ok(y_new)
}

/// `x` must carry one value per entry of the table and span at least one interval
fn check_table<A, Sx>(x: &ArrayBase<Sx, Ix1>, table_len: usize, axis: Axis) -> Result<()>
where
    A: BinFloat,
    Sx: Data<Elem = A>,
{
    if x.len() < 2 {
        return Err(RebinError::NotEnoughBins {
            kind: BinsKind::Source,
            length: x.len(),
            minimum: 2,
        });
    }
    if x.len() != table_len {
        return Err(RebinError::ShapeMismatch {
            axis: axis.index(),
            expected: x.len(),
            found: table_len,
        });
    }
    Ok(())
}

/// linearly interpolate/extrapolate between two points
#[inline]
pub(crate) fn calc_frac<T: BinFloat>((x1, y1): (T, T), (x2, y2): (T, T), x: T) -> T {
    let b = y1;
    let m = (y2 - y1) / (x2 - x1);
    m * (x - x1) + b
}
