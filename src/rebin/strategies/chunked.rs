use log::trace;
use ndarray::{Array, Axis, Dimension, RemoveAxis};

use super::{InProcess, LargeArrayStrategy};
use crate::{
    rebin::{RebinOp, DEFAULT_OFFLOAD_THRESHOLD},
    BinFloat, Result,
};

/// Rebin in slabs cut across another axis
///
/// The array is split along its longest axis other than the rebinned one into
/// chunks of at most `max_chunk_len` elements (but at least one index wide).
/// Each chunk is rebinned on its own and the pieces are joined again, so the
/// cumulative and interpolation buffers only ever hold a single chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunked {
    max_chunk_len: usize,
}

impl Chunked {
    pub fn new(max_chunk_len: usize) -> Self {
        Self {
            max_chunk_len: max_chunk_len.max(1),
        }
    }

    pub fn max_chunk_len(&self) -> usize {
        self.max_chunk_len
    }
}

impl Default for Chunked {
    fn default() -> Self {
        Self::new(DEFAULT_OFFLOAD_THRESHOLD)
    }
}

impl LargeArrayStrategy for Chunked {
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
        let Some(split) = split_axis(a.shape(), op.axis) else {
            return InProcess.rebin_axis(a, op, assume_sorted);
        };
        let per_index = a.len() / a.len_of(split);
        let chunk_width = (self.max_chunk_len / per_index.max(1)).max(1);
        trace!(
            "Rebinning axis {} in chunks of {} along axis {}",
            op.axis.index(),
            chunk_width,
            split.index()
        );

        let parts = a
            .axis_chunks_iter(split, chunk_width)
            .map(|chunk| op.apply(&chunk, assume_sorted))
            .collect::<Result<Vec<_>>>()?;
        drop(a);

        let views: Vec<_> = parts.iter().map(|part| part.view()).collect();
        Ok(ndarray::concatenate(split, &views)?)
    }
}

/// the longest axis other than `rebinned` worth splitting
fn split_axis(shape: &[usize], rebinned: Axis) -> Option<Axis> {
    shape
        .iter()
        .enumerate()
        .filter(|&(nr, &len)| nr != rebinned.index() && len > 1)
        .max_by_key(|&(_, &len)| len)
        .map(|(nr, _)| Axis(nr))
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array, Axis};

    use super::*;

    #[test]
    fn picks_longest_other_axis() {
        assert_eq!(split_axis(&[4, 10, 3], Axis(1)), Some(Axis(0)));
        assert_eq!(split_axis(&[4, 10, 3], Axis(0)), Some(Axis(1)));
        assert_eq!(split_axis(&[1, 10, 1], Axis(1)), None);
        assert_eq!(split_axis(&[10], Axis(0)), None);
    }

    #[test]
    fn chunks_match_in_process() {
        let a = Array::from_shape_fn((7, 4), |(i, j)| (i * 4 + j) as f64 + 0.5);
        let op = RebinOp::new(
            array![0.0, 1.0, 2.0, 3.0, 4.0],
            array![0.5, 1.75, 4.0],
            Axis(1),
            false,
        );
        let expected = InProcess.rebin_axis(a.clone(), &op, false).unwrap();
        for max_chunk_len in [1, 4, 9, 100] {
            let result = Chunked::new(max_chunk_len)
                .rebin_axis(a.clone(), &op, false)
                .unwrap();
            assert_abs_diff_eq!(result, expected, epsilon = 1e-12);
        }
    }
}
