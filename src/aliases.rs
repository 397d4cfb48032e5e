use ndarray::{Array1, ArrayView1};

use crate::{
    rebin::{Chunked, Isolated, RebinOp, Rebinner},
    shrink::ShrinkOp,
};

/// owned bin boundaries along one axis
pub type Bins<A> = Array1<A>;
/// borrowed bin boundaries along one axis
pub type BinsView<'a, A> = ArrayView1<'a, A>;
/// the ordered operations consumed by [`rebin_nd`](crate::rebin_nd)
pub type RebinSpec<A> = Vec<RebinOp<A>>;
/// the ordered operations consumed by [`shrink_nd`](crate::shrink_nd)
pub type TrimSpec<A> = Vec<ShrinkOp<A>>;
/// rebinner moving large axis operations onto a worker thread
pub type IsolatedRebinner = Rebinner<Isolated>;
/// rebinner splitting large arrays into chunks
pub type ChunkedRebinner = Rebinner<Chunked>;
