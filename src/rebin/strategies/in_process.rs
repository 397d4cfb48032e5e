use ndarray::{Array, Dimension, RemoveAxis};

use super::LargeArrayStrategy;
use crate::{rebin::RebinOp, BinFloat, Result};

/// Rebin on the calling thread
///
/// The input is dropped as soon as the result exists, so at most the input,
/// the result and the intermediates of one axis are alive at the same time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InProcess;

impl LargeArrayStrategy for InProcess {
    fn rebin_axis<A, D>(
        &self,
        a: Array<A, D>,
        op: &RebinOp<A>,
        assume_sorted: bool,
    ) -> Result<Array<A, D>>
    where
        A: BinFloat,
        D: Dimension + RemoveAxis + Send,
    {
        let rebinned = op.apply(&a, assume_sorted)?;
        drop(a);
        Ok(rebinned)
    }
}
