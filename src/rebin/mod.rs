//! Conservative rebinning of gridded data
//!
//! # Functions
//!  - [`rebin_1d`] Rebin along a single axis
//!  - [`rebin_nd`] Rebin along several axes with the default configuration
//!  - [`rebin_spec_composer`] Build the list of [`RebinOp`]s for [`rebin_nd`]
//!
//! # Configuration
//!  - [`Rebinner`] The configured engine
//!  - [`RebinnerBuilder`] Configure the engine
//!
//! # Strategies
//!  - [`LargeArrayStrategy`] The trait used to handle arrays above the offload threshold
//!  - [`InProcess`], [`Isolated`], [`Chunked`]

use std::collections::HashSet;

use log::{debug, trace, warn};
use ndarray::{
    Array, Array1, ArrayBase, ArrayViewMut, Axis, Data, Dimension, Ix1, RemoveAxis, Slice, Zip,
};

use crate::{
    interpolate::interpolate_axis,
    vector_extensions::{is_monotonically_increasing, VectorExtensions},
    BinFloat, Bins, BinsKind, RebinError, RebinSpec, Result,
};

mod strategies;
pub use strategies::{Chunked, InProcess, Isolated, LargeArrayStrategy};

/// Arrays with more elements than this are handed to the [`LargeArrayStrategy`]
pub const DEFAULT_OFFLOAD_THRESHOLD: usize = 1_000_000;

/// A single axis rebin: move the data along `axis` from `bins` to `new_bins`
#[derive(Debug, Clone, PartialEq)]
pub struct RebinOp<A> {
    pub bins: Array1<A>,
    pub new_bins: Array1<A>,
    pub axis: Axis,
    /// `true` if the values are already integrated over their bin,
    /// `false` if they are densities
    pub grouped: bool,
}

impl<A: BinFloat> RebinOp<A> {
    pub fn new(bins: Array1<A>, new_bins: Array1<A>, axis: Axis, grouped: bool) -> Self {
        Self {
            bins,
            new_bins,
            axis,
            grouped,
        }
    }

    /// Rebin `a` according to this operation, see [`rebin_1d`]
    pub fn apply<S, D>(&self, a: &ArrayBase<S, D>, assume_sorted: bool) -> Result<Array<A, D>>
    where
        S: Data<Elem = A>,
        D: Dimension + RemoveAxis,
    {
        rebin_1d(
            a,
            &self.bins,
            &self.new_bins,
            self.axis,
            self.grouped,
            assume_sorted,
        )
    }
}

/// Grouped flags for [`rebin_spec_composer`]
///
/// A single flag applies to all axes. An empty list of flags means
/// no axis is grouped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupedFlags {
    All(bool),
    PerAxis(Vec<bool>),
}

impl GroupedFlags {
    /// the flag for the `nr`th operation, `None` when the list is exhausted
    fn get(&self, nr: usize) -> Option<bool> {
        match self {
            GroupedFlags::All(grouped) => Some(*grouped),
            GroupedFlags::PerAxis(flags) if flags.is_empty() => Some(false),
            GroupedFlags::PerAxis(flags) => flags.get(nr).copied(),
        }
    }
}

impl Default for GroupedFlags {
    fn default() -> Self {
        GroupedFlags::All(false)
    }
}

impl From<bool> for GroupedFlags {
    fn from(grouped: bool) -> Self {
        GroupedFlags::All(grouped)
    }
}

impl From<Vec<bool>> for GroupedFlags {
    fn from(flags: Vec<bool>) -> Self {
        GroupedFlags::PerAxis(flags)
    }
}

impl From<&[bool]> for GroupedFlags {
    fn from(flags: &[bool]) -> Self {
        GroupedFlags::PerAxis(flags.to_vec())
    }
}

/// Compose the operations for [`rebin_nd`] from parallel sequences.
///
/// - `axes` defaults to `0, 1, 2, ...` when `None` or empty
/// - `grouped` defaults to `false` for every axis, a single `bool` applies to all
///
/// The result is as long as the shortest of the given sequences.
///
/// ```rust
/// # use ndarray::{array, Axis};
/// # use ndarray_rebin::*;
/// let spec = rebin_spec_composer(
///     vec![array![0.0, 1.0, 2.0], array![0.0, 10.0]],
///     vec![array![0.0, 2.0], array![0.0, 5.0, 10.0]],
///     None,
///     vec![false, true],
/// );
/// assert_eq!(spec.len(), 2);
/// assert_eq!(spec[1].axis, Axis(1));
/// assert!(spec[1].grouped);
/// ```
pub fn rebin_spec_composer<A, I, J>(
    bins_seq: I,
    new_bins_seq: J,
    axes: Option<&[usize]>,
    grouped: impl Into<GroupedFlags>,
) -> RebinSpec<A>
where
    A: BinFloat,
    I: IntoIterator<Item = Bins<A>>,
    J: IntoIterator<Item = Bins<A>>,
{
    let bins_seq: Vec<_> = bins_seq.into_iter().collect();
    let new_bins_seq: Vec<_> = new_bins_seq.into_iter().collect();
    let axes = axes.filter(|axes| !axes.is_empty());
    let flags: GroupedFlags = grouped.into();

    if bins_seq.len() != new_bins_seq.len() {
        warn!(
            "{} bin sequences given for {} new bin sequences, extra sequences are ignored",
            bins_seq.len(),
            new_bins_seq.len()
        );
    }

    let mut spec = Vec::with_capacity(bins_seq.len().min(new_bins_seq.len()));
    for (nr, (bins, new_bins)) in bins_seq.into_iter().zip(new_bins_seq).enumerate() {
        let axis = match axes {
            Some(axes) => axes.get(nr).copied(),
            None => Some(nr),
        };
        let (Some(axis), Some(grouped)) = (axis, flags.get(nr)) else {
            warn!("Rebin spec truncated to {nr} operations, not enough axes or grouped flags");
            break;
        };
        spec.push(RebinOp::new(bins, new_bins, Axis(axis), grouped));
    }

    trace!("Composed rebin spec for axes {:?}", axes_of(&spec));
    spec
}

/// Rebin `a`, defined on `bins` along `axis`, onto `new_bins`.
///
/// The integral over every range covered by `new_bins` is the same before and
/// after rebinning. If `grouped` the values of `a` are treated as integrated
/// over their bin (group totals), otherwise as densities which are
/// multiplied by the bin width before and divided by the new width after.
///
/// The cumulative integral up to each old boundary is interpolated linearly at
/// the new boundaries and differenced, which makes the transform exact for
/// piecewise constant data.
///
/// # Errors
///  - [`RebinError::AxisOutOfBounds`] if `axis` is not an axis of `a`
///  - [`RebinError::ShapeMismatch`] if the extent of `a` along `axis` is not `bins.len() - 1`
///  - [`RebinError::NotEnoughBins`] if either sequence has less than 2 boundaries
///  - [`RebinError::NotMonotonic`] if either sequence is not strictly rising,
///    skipped when `assume_sorted`
///  - [`RebinError::OutOfRange`] if `new_bins` leave the span of `bins`
///
/// ```rust
/// # use ndarray::{array, Axis};
/// # use ndarray_rebin::*;
/// # use approx::*;
/// let bins = array![0.0, 1.0, 2.0, 3.0];
/// let data = array![
///     [1.0, 2.0, 3.0],
///     [4.0, 4.0, 4.0],
/// ];
/// let result = rebin_1d(&data, &bins, &array![0.5, 2.5], Axis(1), true, false).unwrap();
/// assert_abs_diff_eq!(result, array![[4.0], [8.0]], epsilon = 1e-12);
/// ```
pub fn rebin_1d<A, S, Sb, Sn, D>(
    a: &ArrayBase<S, D>,
    bins: &ArrayBase<Sb, Ix1>,
    new_bins: &ArrayBase<Sn, Ix1>,
    axis: Axis,
    grouped: bool,
    assume_sorted: bool,
) -> Result<Array<A, D>>
where
    A: BinFloat,
    S: Data<Elem = A>,
    Sb: Data<Elem = A>,
    Sn: Data<Elem = A>,
    D: Dimension + RemoveAxis,
{
    check_rebin(a.shape(), bins, new_bins, axis, assume_sorted)?;
    trace!(
        "Rebinning axis {} of {:?} from {} to {} bins",
        axis.index(),
        a.shape(),
        bins.len() - 1,
        new_bins.len() - 1
    );

    // integral up to each of the old boundaries
    let mut dim = a.raw_dim();
    dim[axis.index()] += 1;
    let mut cumulative: Array<A, D> = Array::zeros(dim);
    {
        let mut integrals = cumulative.slice_axis_mut(axis, Slice::new(1, None, 1));
        integrals.assign(a);
        if !grouped {
            scale_lanes(integrals, &bins.widths(), axis, |value, width| value * width);
        }
    }
    cumulative.accumulate_axis_inplace(axis, |&prev, curr| *curr = *curr + prev);

    let at_new_bins = interpolate_axis(new_bins, bins, &cumulative, axis)?;
    drop(cumulative);

    let mut rebinned = diff_axis(&at_new_bins, axis);
    drop(at_new_bins);

    if !grouped {
        let new_widths = new_bins.widths();
        scale_lanes(rebinned.view_mut(), &new_widths, axis, |value, width| {
            value / width
        });
    }
    Ok(rebinned)
}

/// Rebin `a` along every axis in `rebin_spec` with the default [`Rebinner`].
///
/// Axes without an operation are left untouched, an empty spec returns a copy of `a`.
pub fn rebin_nd<A, S, D>(a: &ArrayBase<S, D>, rebin_spec: &[RebinOp<A>]) -> Result<Array<A, D>>
where
    A: BinFloat,
    S: Data<Elem = A>,
    D: Dimension + RemoveAxis + Send,
{
    Rebinner::<InProcess>::default().rebin_nd(a.to_owned(), rebin_spec)
}

/// The configured _n_-dimensional rebinning engine
///
/// ```rust
/// # use ndarray::{array, Array};
/// # use ndarray_rebin::*;
/// # use approx::*;
/// let rebinner = Rebinner::builder()
///     .offload_threshold(4)
///     .strategy(Isolated::new())
///     .build();
///
/// let data = Array::from_elem((2, 4), 1.0);
/// let spec = rebin_spec_composer(
///     vec![array![0.0, 1.0, 2.0], array![0.0, 1.0, 2.0, 3.0, 4.0]],
///     vec![array![0.0, 2.0], array![0.0, 4.0]],
///     None,
///     true,
/// );
/// let result = rebinner.rebin_nd(data, &spec).unwrap();
/// assert_abs_diff_eq!(result, array![[8.0]], epsilon = 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Rebinner<Strat = InProcess> {
    assume_sorted: bool,
    offload_threshold: usize,
    strategy: Strat,
}

impl Rebinner<InProcess> {
    /// Get the [RebinnerBuilder]
    pub fn builder() -> RebinnerBuilder<InProcess> {
        RebinnerBuilder::new()
    }
}

impl Default for Rebinner<InProcess> {
    fn default() -> Self {
        RebinnerBuilder::new().build()
    }
}

impl<Strat: LargeArrayStrategy> Rebinner<Strat> {
    pub fn assume_sorted(&self) -> bool {
        self.assume_sorted
    }

    pub fn offload_threshold(&self) -> usize {
        self.offload_threshold
    }

    pub fn strategy(&self) -> &Strat {
        &self.strategy
    }

    /// Rebin the owned array `a` along every axis in `rebin_spec`.
    ///
    /// Operations are applied one after another from the last to the first.
    /// The axes in one spec are expected to be distinct, in that case the
    /// order does not change the result.
    pub fn rebin_nd<A, D>(&self, a: Array<A, D>, rebin_spec: &[RebinOp<A>]) -> Result<Array<A, D>>
    where
        A: BinFloat,
        D: Dimension + RemoveAxis + Send,
    {
        let mut seen = HashSet::with_capacity(rebin_spec.len());
        for op in rebin_spec {
            if !seen.insert(op.axis.index()) {
                warn!(
                    "Axis {} is rebinned more than once, results depend on the operation order",
                    op.axis.index()
                );
            }
        }

        let mut data = a;
        for op in rebin_spec.iter().rev() {
            data = self.rebin_axis(data, op)?;
        }
        Ok(data)
    }

    /// Apply a single operation, handing `a` to the strategy if it is large
    pub fn rebin_axis<A, D>(&self, a: Array<A, D>, op: &RebinOp<A>) -> Result<Array<A, D>>
    where
        A: BinFloat,
        D: Dimension + RemoveAxis + Send,
    {
        if a.len() > self.offload_threshold {
            debug!(
                "Rebinning axis {} of {} elements with {:?}",
                op.axis.index(),
                a.len(),
                self.strategy
            );
            self.strategy.rebin_axis(a, op, self.assume_sorted)
        } else {
            debug!("Rebinning axis {} of {} elements", op.axis.index(), a.len());
            InProcess.rebin_axis(a, op, self.assume_sorted)
        }
    }
}

/// Create and configure a [Rebinner].
///
/// # Default configuration
/// Bin sequences are validated, arrays above [`DEFAULT_OFFLOAD_THRESHOLD`]
/// elements are offloaded, and the strategy is [`InProcess`].
#[derive(Debug, Clone)]
pub struct RebinnerBuilder<Strat> {
    assume_sorted: bool,
    offload_threshold: usize,
    strategy: Strat,
}

impl RebinnerBuilder<InProcess> {
    pub fn new() -> Self {
        RebinnerBuilder {
            assume_sorted: false,
            offload_threshold: DEFAULT_OFFLOAD_THRESHOLD,
            strategy: InProcess,
        }
    }
}

impl Default for RebinnerBuilder<InProcess> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Strat: LargeArrayStrategy> RebinnerBuilder<Strat> {
    /// Skip the monotonicity checks of all bin sequences
    pub fn assume_sorted(mut self, assume_sorted: bool) -> Self {
        self.assume_sorted = assume_sorted;
        self
    }

    /// Arrays with more elements than `threshold` are rebinned with the strategy
    pub fn offload_threshold(mut self, threshold: usize) -> Self {
        self.offload_threshold = threshold;
        self
    }

    /// Set the [LargeArrayStrategy], by default [InProcess] is used.
    pub fn strategy<NewStrat>(self, strategy: NewStrat) -> RebinnerBuilder<NewStrat>
    where
        NewStrat: LargeArrayStrategy,
    {
        let RebinnerBuilder {
            assume_sorted,
            offload_threshold,
            ..
        } = self;
        RebinnerBuilder {
            assume_sorted,
            offload_threshold,
            strategy,
        }
    }

    pub fn build(self) -> Rebinner<Strat> {
        let RebinnerBuilder {
            assume_sorted,
            offload_threshold,
            strategy,
        } = self;
        Rebinner {
            assume_sorted,
            offload_threshold,
            strategy,
        }
    }
}

fn check_rebin<A, Sb, Sn>(
    shape: &[usize],
    bins: &ArrayBase<Sb, Ix1>,
    new_bins: &ArrayBase<Sn, Ix1>,
    axis: Axis,
    assume_sorted: bool,
) -> Result<()>
where
    A: BinFloat,
    Sb: Data<Elem = A>,
    Sn: Data<Elem = A>,
{
    let Some(&extent) = shape.get(axis.index()) else {
        return Err(RebinError::AxisOutOfBounds {
            axis: axis.index(),
            ndim: shape.len(),
        });
    };
    check_bins(bins, BinsKind::Source, assume_sorted)?;
    check_bins(new_bins, BinsKind::Target, assume_sorted)?;
    if bins.len() != extent + 1 {
        return Err(RebinError::ShapeMismatch {
            axis: axis.index(),
            expected: bins.len() - 1,
            found: extent,
        });
    }

    let (lower, upper) = (bins[0], bins[bins.len() - 1]);
    for value in [new_bins[0], new_bins[new_bins.len() - 1]] {
        if !(lower <= value && value <= upper) {
            return Err(RebinError::out_of_range(value, lower, upper));
        }
    }
    Ok(())
}

fn check_bins<A, S>(bins: &ArrayBase<S, Ix1>, kind: BinsKind, assume_sorted: bool) -> Result<()>
where
    A: BinFloat,
    S: Data<Elem = A>,
{
    if bins.len() < 2 {
        return Err(RebinError::NotEnoughBins {
            kind,
            length: bins.len(),
            minimum: 2,
        });
    }
    if !assume_sorted && !is_monotonically_increasing(bins) {
        return Err(RebinError::NotMonotonic(kind));
    }
    Ok(())
}

/// combine every lane of `a` along `axis` elementwise with `factors`
fn scale_lanes<A, D, F>(mut a: ArrayViewMut<'_, A, D>, factors: &Array1<A>, axis: Axis, f: F)
where
    A: BinFloat,
    D: Dimension,
    F: Fn(A, A) -> A,
{
    for lane in a.lanes_mut(axis) {
        Zip::from(lane)
            .and(factors)
            .for_each(|value, &factor| *value = f(*value, factor));
    }
}

/// first order differences along `axis`
fn diff_axis<A, D>(a: &Array<A, D>, axis: Axis) -> Array<A, D>
where
    A: BinFloat,
    D: Dimension + RemoveAxis,
{
    let mut dim = a.raw_dim();
    dim[axis.index()] = a.len_of(axis).saturating_sub(1);
    let mut diff: Array<A, D> = Array::zeros(dim);
    Zip::from(&mut diff)
        .and(a.slice_axis(axis, Slice::new(1, None, 1)))
        .and(a.slice_axis(axis, Slice::new(0, Some(-1), 1)))
        .for_each(|d, &right, &left| *d = right - left);
    diff
}

fn axes_of<A>(spec: &[RebinOp<A>]) -> Vec<usize> {
    spec.iter().map(|op| op.axis.index()).collect()
}
