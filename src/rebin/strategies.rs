use std::fmt::Debug;

use ndarray::{Array, Dimension, RemoveAxis};

use super::RebinOp;
use crate::{BinFloat, Result};

mod chunked;
mod in_process;
mod isolated;

pub use chunked::Chunked;
pub use in_process::InProcess;
pub use isolated::Isolated;

/// How a [`Rebinner`](super::Rebinner) processes arrays above its offload threshold.
///
/// A strategy only controls where and in which pieces the work happens.
/// Every implementation must return the same values as [`InProcess`].
pub trait LargeArrayStrategy: Debug {
    /// Rebin the owned array `a` according to `op`.
    ///
    /// `a` is consumed so an implementation can release it as soon as
    /// it is no longer needed.
    fn rebin_axis<A, D>(
        &self,
        a: Array<A, D>,
        op: &RebinOp<A>,
        assume_sorted: bool,
    ) -> Result<Array<A, D>>
    where
        A: BinFloat,
        D: Dimension + RemoveAxis + Send;
}
