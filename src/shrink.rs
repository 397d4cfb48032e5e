//! Shrinking gridded data to a region of interest
//!
//! A shrink selects the minimal run of whole bins that covers a requested
//! interval `[low, high]`. Bins are never split, so the result may reach
//! beyond the interval on both sides.
//!
//! Results are views into the inputs. Shrinking is free of copies,
//! [`Shrunk::into_owned`] and [`ShrunkNd::into_owned`] detach them.

use std::{collections::HashSet, ops::Range};

use log::{debug, trace, warn};
use ndarray::{
    s, Array, Array1, ArrayBase, ArrayView, ArrayView1, Axis, Data, Dimension, Ix1, Slice,
};

use crate::{
    vector_extensions::{is_monotonically_increasing, VectorExtensions},
    BinFloat, Bins, BinsKind, BinsView, RebinError, Result, TrimSpec,
};

/// A single axis shrink: limit `axis` to the bins covering `[low, high]`
///
/// A missing bound is replaced by the corresponding edge of `bins`.
#[derive(Debug, Clone, PartialEq)]
pub struct ShrinkOp<A> {
    pub bins: Array1<A>,
    pub low: Option<A>,
    pub high: Option<A>,
    pub axis: Axis,
}

impl<A: BinFloat> ShrinkOp<A> {
    pub fn new(bins: Array1<A>, low: Option<A>, high: Option<A>, axis: Axis) -> Self {
        Self {
            bins,
            low,
            high,
            axis,
        }
    }
}

/// The result of [`shrink_1d`]
#[derive(Debug, Clone)]
pub struct Shrunk<'a, A, D: Dimension> {
    bins: ArrayView1<'a, A>,
    data: ArrayView<'a, A, D>,
    axis: Axis,
    range: Range<usize>,
    source_shape: Vec<usize>,
}

impl<'a, A, D> Shrunk<'a, A, D>
where
    A: BinFloat,
    D: Dimension,
{
    /// the boundaries of the selected bins
    pub fn bins(&self) -> &ArrayView1<'a, A> {
        &self.bins
    }

    /// the selected slice of the data
    pub fn data(&self) -> &ArrayView<'a, A, D> {
        &self.data
    }

    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// the selected bin indices along [`axis`](Shrunk::axis).
    ///
    /// The new bins are `bins[range.start..=range.end]`.
    pub fn range(&self) -> Range<usize> {
        self.range.clone()
    }

    /// true if nothing was cut away
    pub fn is_unchanged(&self) -> bool {
        self.range.start == 0 && self.range.end + 1 == self.source_bins_len()
    }

    /// Select the same bins from another array on the same grid,
    /// e.g. the errors belonging to a shrunk set of values.
    ///
    /// # Errors
    /// [`RebinError::ShapeMismatch`] if `other` does not have the shape of the unshrunk data
    pub fn window_of<'b, B, S>(&self, other: &'b ArrayBase<S, D>) -> Result<ArrayView<'b, B, D>>
    where
        S: Data<Elem = B>,
    {
        check_same_shape(&self.source_shape, other.shape())?;
        let mut view = other.view();
        view.slice_axis_inplace(self.axis, Slice::from(self.range.clone()));
        Ok(view)
    }

    pub fn into_parts(self) -> (ArrayView1<'a, A>, ArrayView<'a, A, D>) {
        (self.bins, self.data)
    }

    /// copy the selected bins and data
    pub fn into_owned(self) -> (Array1<A>, Array<A, D>) {
        (self.bins.to_owned(), self.data.to_owned())
    }

    fn source_bins_len(&self) -> usize {
        self.source_shape
            .get(self.axis.index())
            .map_or(0, |extent| extent + 1)
    }
}

/// The result of [`shrink_nd`]
#[derive(Debug, Clone)]
pub struct ShrunkNd<'a, A, D: Dimension> {
    bins: Vec<ArrayView1<'a, A>>,
    data: ArrayView<'a, A, D>,
    windows: Vec<(Axis, Range<usize>)>,
    source_shape: Vec<usize>,
}

impl<'a, A, D> ShrunkNd<'a, A, D>
where
    A: BinFloat,
    D: Dimension,
{
    /// the new bins, one sequence per operation in the order of the trim spec
    pub fn bins(&self) -> &[BinsView<'a, A>] {
        &self.bins
    }

    pub fn data(&self) -> &ArrayView<'a, A, D> {
        &self.data
    }

    /// the selected bin index range of every operation, in the order of the trim spec.
    ///
    /// Each range is relative to the data left by the operations after it.
    pub fn windows(&self) -> &[(Axis, Range<usize>)] {
        &self.windows
    }

    /// Select the same bins from another array on the same grid.
    ///
    /// The windows are replayed in the order [`shrink_nd`] applied them.
    ///
    /// # Errors
    /// [`RebinError::ShapeMismatch`] if `other` does not have the shape of the unshrunk data
    pub fn window_of<'b, B, S>(&self, other: &'b ArrayBase<S, D>) -> Result<ArrayView<'b, B, D>>
    where
        S: Data<Elem = B>,
    {
        check_same_shape(&self.source_shape, other.shape())?;
        let mut view = other.view();
        for (axis, range) in self.windows.iter().rev() {
            view.slice_axis_inplace(*axis, Slice::from(range.clone()));
        }
        Ok(view)
    }

    pub fn into_parts(self) -> (Vec<ArrayView1<'a, A>>, ArrayView<'a, A, D>) {
        (self.bins, self.data)
    }

    pub fn into_owned(self) -> (Vec<Array1<A>>, Array<A, D>) {
        (
            self.bins.iter().map(|bins| bins.to_owned()).collect(),
            self.data.to_owned(),
        )
    }
}

/// Select the minimal span of bins of `a` along `axis` which completely
/// covers `[low, high]`, both sides included.
///
/// Without `low` and `high` the input is returned as is. Only one given
/// bound is completed with the edge of `bins`. If the bounds are the edges
/// of `bins` the input is returned as is as well.
///
/// # Errors
///  - [`RebinError::AxisOutOfBounds`] if `axis` is not an axis of `a`
///  - [`RebinError::ShapeMismatch`] if the extent of `a` along `axis` is not `bins.len() - 1`
///  - [`RebinError::NotEnoughBins`] if `bins` has less than 2 boundaries
///  - [`RebinError::NotMonotonic`] if `bins` are not strictly rising, skipped when `assume_sorted`
///  - [`RebinError::OutOfRange`] if `low` or `high` lie outside of `bins`
///  - [`RebinError::EmptyResult`] if no bin is selected, e.g. for `low == high`
///    on a boundary or `low > high`
///
/// ```rust
/// # use ndarray::{array, Axis};
/// # use ndarray_rebin::*;
/// let bins = array![0.0, 1.0, 2.0, 3.0, 4.0];
/// let data = array![10.0, 20.0, 30.0, 40.0];
///
/// let shrunk = shrink_1d(&data, &bins, Some(1.5), Some(2.5), Axis(0), false).unwrap();
/// assert_eq!(shrunk.bins(), &array![1.0, 2.0, 3.0]);
/// assert_eq!(shrunk.data(), &array![20.0, 30.0]);
/// assert_eq!(shrunk.range(), 1..3);
/// ```
pub fn shrink_1d<'a, A, S, Sb, D>(
    a: &'a ArrayBase<S, D>,
    bins: &'a ArrayBase<Sb, Ix1>,
    low: Option<A>,
    high: Option<A>,
    axis: Axis,
    assume_sorted: bool,
) -> Result<Shrunk<'a, A, D>>
where
    A: BinFloat,
    S: Data<Elem = A>,
    Sb: Data<Elem = A>,
    D: Dimension,
{
    shrink_view(a.view(), bins.view(), low, high, axis, assume_sorted)
}

fn shrink_view<'a, A, D>(
    a: ArrayView<'a, A, D>,
    bins: ArrayView1<'a, A>,
    low: Option<A>,
    high: Option<A>,
    axis: Axis,
    assume_sorted: bool,
) -> Result<Shrunk<'a, A, D>>
where
    A: BinFloat,
    D: Dimension,
{
    if axis.index() >= a.ndim() {
        return Err(RebinError::AxisOutOfBounds {
            axis: axis.index(),
            ndim: a.ndim(),
        });
    }
    if low.is_none() && high.is_none() {
        return Ok(unchanged(a, bins, axis));
    }

    let extent = a.len_of(axis);
    if bins.len() != extent + 1 {
        return Err(RebinError::ShapeMismatch {
            axis: axis.index(),
            expected: bins.len().saturating_sub(1),
            found: extent,
        });
    }
    if bins.len() < 2 {
        return Err(RebinError::NotEnoughBins {
            kind: BinsKind::Source,
            length: bins.len(),
            minimum: 2,
        });
    }
    if !assume_sorted && !is_monotonically_increasing(&bins) {
        return Err(RebinError::NotMonotonic(BinsKind::Source));
    }

    let last = bins.len() - 1;
    let (first_edge, last_edge) = (bins[0], bins[last]);
    let low = low.unwrap_or(first_edge);
    let high = high.unwrap_or(last_edge);

    if low == first_edge && high == last_edge {
        return Ok(unchanged(a, bins, axis));
    }
    for value in [low, high] {
        if !(first_edge <= value && value <= last_edge) {
            return Err(RebinError::out_of_range(value, first_edge, last_edge));
        }
    }

    // both values are inside the bins, so digitize is at least 1
    let left = bins.digitize(low) - 1;
    let mut right = bins.digitize(high) - 1;
    if right < last && bins[right] < high {
        right += 1;
    }

    if right <= left {
        return Err(RebinError::EmptyResult {
            low: low.to_f64().unwrap_or(f64::NAN),
            high: high.to_f64().unwrap_or(f64::NAN),
        });
    }
    if left == 0 && right == last {
        return Ok(unchanged(a, bins, axis));
    }

    trace!(
        "Shrinking axis {} to bins {left}..={right} of {}",
        axis.index(),
        bins.len()
    );
    let source_shape = a.shape().to_vec();
    let mut data = a;
    data.slice_axis_inplace(axis, Slice::from(left..right));
    Ok(Shrunk {
        bins: bins.slice_move(s![left..=right]),
        data,
        axis,
        range: left..right,
        source_shape,
    })
}

/// select the whole axis of `a`, `bins` may not have been checked against it
fn unchanged<'a, A, D>(
    a: ArrayView<'a, A, D>,
    bins: ArrayView1<'a, A>,
    axis: Axis,
) -> Shrunk<'a, A, D>
where
    D: Dimension,
{
    Shrunk {
        range: 0..a.len_of(axis),
        source_shape: a.shape().to_vec(),
        bins,
        data: a,
        axis,
    }
}

/// Shrink `a` along every axis in `trim_spec`.
///
/// Operations are applied from the last to the first, the axes in one spec
/// are expected to be distinct. The returned bins and windows are in the
/// order of `trim_spec`.
///
/// ```rust
/// # use ndarray::{array, Array, Axis};
/// # use ndarray_rebin::*;
/// let data = Array::from_shape_fn((4, 3), |(i, j)| (i * 3 + j) as f64);
/// let spec = trim_spec_composer(
///     vec![array![0.0, 1.0, 2.0, 3.0, 4.0], array![0.0, 10.0, 20.0, 30.0]],
///     Some(&[Some(1.0), None]),
///     Some(&[Some(3.0), Some(15.0)]),
///     None,
/// );
/// let shrunk = shrink_nd(&data, &spec, false).unwrap();
/// assert_eq!(shrunk.bins()[0], array![1.0, 2.0, 3.0]);
/// assert_eq!(shrunk.bins()[1], array![0.0, 10.0, 20.0]);
/// assert_eq!(shrunk.data(), &array![[3.0, 4.0], [6.0, 7.0]]);
/// ```
pub fn shrink_nd<'a, A, S, D>(
    a: &'a ArrayBase<S, D>,
    trim_spec: &'a [ShrinkOp<A>],
    assume_sorted: bool,
) -> Result<ShrunkNd<'a, A, D>>
where
    A: BinFloat,
    S: Data<Elem = A>,
    D: Dimension,
{
    let mut seen = HashSet::with_capacity(trim_spec.len());
    for op in trim_spec {
        if !seen.insert(op.axis.index()) {
            warn!(
                "Axis {} is shrunk more than once, results depend on the operation order",
                op.axis.index()
            );
        }
    }

    let mut data = a.view();
    let mut bins = Vec::with_capacity(trim_spec.len());
    let mut windows = Vec::with_capacity(trim_spec.len());

    for op in trim_spec.iter().rev() {
        debug!(
            "Shrinking axis {} to [{:?}..{:?}]",
            op.axis.index(),
            op.low,
            op.high
        );
        let shrunk = shrink_view(data, op.bins.view(), op.low, op.high, op.axis, assume_sorted)?;
        windows.push((shrunk.axis, shrunk.range.clone()));
        let (new_bins, new_data) = shrunk.into_parts();
        bins.push(new_bins);
        data = new_data;
    }
    bins.reverse();
    windows.reverse();

    Ok(ShrunkNd {
        bins,
        data,
        windows,
        source_shape: a.shape().to_vec(),
    })
}

/// Compose the operations for [`shrink_nd`] from parallel sequences.
///
/// `lows` and `highs` default to no bound for every axis, `axes` to
/// `0, 1, 2, ...`, when `None` or empty. The result is as long as the shortest
/// of the given sequences.
pub fn trim_spec_composer<A, I>(
    bins_seq: I,
    lows: Option<&[Option<A>]>,
    highs: Option<&[Option<A>]>,
    axes: Option<&[usize]>,
) -> TrimSpec<A>
where
    A: BinFloat,
    I: IntoIterator<Item = Bins<A>>,
{
    let lows = lows.filter(|lows| !lows.is_empty());
    let highs = highs.filter(|highs| !highs.is_empty());
    let axes = axes.filter(|axes| !axes.is_empty());

    let mut spec = Vec::new();
    for (nr, bins) in bins_seq.into_iter().enumerate() {
        let low = match lows {
            Some(lows) => lows.get(nr).copied(),
            None => Some(None),
        };
        let high = match highs {
            Some(highs) => highs.get(nr).copied(),
            None => Some(None),
        };
        let axis = match axes {
            Some(axes) => axes.get(nr).copied(),
            None => Some(nr),
        };
        let (Some(low), Some(high), Some(axis)) = (low, high, axis) else {
            warn!("Trim spec truncated to {nr} operations, not enough bounds or axes");
            break;
        };
        spec.push(ShrinkOp::new(bins, low, high, Axis(axis)));
    }
    spec
}

fn check_same_shape(expected: &[usize], found: &[usize]) -> Result<()> {
    if expected == found {
        return Ok(());
    }
    let axis = expected
        .iter()
        .zip(found)
        .position(|(e, f)| e != f)
        .unwrap_or(expected.len().min(found.len()));
    Err(RebinError::ShapeMismatch {
        axis,
        expected: expected.get(axis).copied().unwrap_or(0),
        found: found.get(axis).copied().unwrap_or(0),
    })
}
