use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::error::TileErrorKind;
use crate::layout::TileDescriptor;
use crate::pipeline::TileOutput;

/// Shared stop flag. Workers check it at the checkpoint between pipeline
/// stages; the binary can flip it from a signal handler.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

pub(crate) struct TileResult {
    pub col: usize,
    pub row: usize,
    pub outcome: Result<TileOutput, TileErrorKind>,
}

/// Run every tile through `process` on a fixed pool of `workers` threads.
///
/// Both channels are bounded to `queue_bound` entries: workers consume tile
/// descriptors from a bounded work queue and push results into a bounded
/// buffer. The single orchestrator loop dispatches descriptors while the
/// work queue has room and drains a result whenever dispatch would block,
/// so backpressure on either side stalls progress without deadlocking.
/// A fatal tile outcome flips the cancellation flag so in-flight peers
/// abort at their next checkpoint; a worker panic becomes a `Panicked`
/// tile failure instead of taking the pool down.
pub(crate) fn run_tiles<F>(
    descriptors: Vec<TileDescriptor>,
    workers: usize,
    queue_bound: usize,
    cancel: &Cancellation,
    process: F,
) -> Vec<TileResult>
where
    F: Fn(&TileDescriptor, &Cancellation) -> Result<TileOutput, TileErrorKind> + Sync,
{
    let expected = descriptors.len();

    thread::scope(|s| {
        let (job_tx, job_rx) = mpsc::sync_channel::<TileDescriptor>(queue_bound.max(1));
        let job_rx = Arc::new(Mutex::new(job_rx));
        let (res_tx, res_rx) = mpsc::sync_channel::<TileResult>(queue_bound.max(1));
        let process = &process;

        for _ in 0..workers {
            let job_rx = Arc::clone(&job_rx);
            let res_tx = res_tx.clone();
            let cancel = cancel.clone();

            s.spawn(move || {
                loop {
                    let msg = match job_rx.lock() {
                        Ok(rx) => rx.recv(),
                        Err(_) => break,
                    };
                    let Ok(desc) = msg else { break };

                    let outcome =
                        panic::catch_unwind(AssertUnwindSafe(|| process(&desc, &cancel)))
                            .unwrap_or(Err(TileErrorKind::Panicked));
                    let fatal = matches!(&outcome, Err(k) if k.is_fatal());

                    let sent = res_tx
                        .send(TileResult {
                            col: desc.col,
                            row: desc.row,
                            outcome,
                        })
                        .is_ok();

                    if fatal {
                        cancel.cancel();
                    }
                    if !sent {
                        break;
                    }
                }
            });
        }
        drop(res_tx);

        let mut job_tx = Some(job_tx);
        let mut queue = descriptors.into_iter();
        let mut carry = queue.next();
        let mut results: Vec<TileResult> = Vec::with_capacity(expected);

        loop {
            if let Some(tx) = &job_tx {
                loop {
                    let Some(desc) = carry.take() else { break };
                    match tx.try_send(desc) {
                        Ok(()) => carry = queue.next(),
                        Err(TrySendError::Full(desc)) => {
                            carry = Some(desc);
                            break;
                        }
                        // All workers exited; nothing left to dispatch to.
                        Err(TrySendError::Disconnected(_)) => break,
                    }
                }
                if carry.is_none() {
                    // Close the work queue so workers exit once it drains.
                    job_tx = None;
                }
            }

            if results.len() == expected {
                break;
            }
            match res_rx.recv() {
                Ok(r) => results.push(r),
                Err(_) => break,
            }
        }

        debug_assert_eq!(results.len(), expected);

        // Deterministic merge order regardless of completion order.
        results.sort_by_key(|r| (r.row, r.col));
        results
    })
}
