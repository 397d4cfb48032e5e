use std::{any::Any, thread};

use log::trace;
use ndarray::{Array, Dimension, RemoveAxis};

use super::{InProcess, LargeArrayStrategy};
use crate::{rebin::RebinOp, BinFloat, RebinError, Result};

const WORKER_NAME: &str = "rebin-worker";

/// Rebin on a dedicated worker thread that owns the input array
///
/// All buffers of the axis operation live and die on the worker, only the
/// result is handed back. The caller blocks until the worker finished, so
/// this never runs in parallel with anything else.
///
/// Errors from the rebin are returned unchanged. A worker that can not be
/// spawned or panics is reported as [`RebinError::WorkerFailed`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Isolated {
    stack_size: Option<usize>,
}

impl Isolated {
    /// create an isolated strategy with the platform default stack size
    pub fn new() -> Self {
        Self { stack_size: None }
    }

    /// set the stack size of the worker thread in bytes
    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }
}

impl LargeArrayStrategy for Isolated {
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
        trace!("Spawning {WORKER_NAME} for axis {}", op.axis.index());
        thread::scope(|scope| {
            let mut builder = thread::Builder::new().name(WORKER_NAME.into());
            if let Some(bytes) = self.stack_size {
                builder = builder.stack_size(bytes);
            }
            let worker = builder
                .spawn_scoped(scope, move || InProcess.rebin_axis(a, op, assume_sorted))
                .map_err(|err| RebinError::WorkerFailed(err.to_string()))?;
            worker
                .join()
                .map_err(|payload| RebinError::WorkerFailed(panic_message(payload.as_ref())))?
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "worker panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::panic_message;

    #[test]
    fn panic_payloads() {
        let payload = std::thread::spawn(|| panic!("boom")).join().unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload = std::thread::spawn(|| panic!("{} {}", "formatted", 1))
            .join()
            .unwrap_err();
        assert_eq!(panic_message(payload.as_ref()), "formatted 1");
    }
}
