use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use crate::error::{ErrorKind, PautaError};
use crate::{process, Artifact, Backends, Job};

/// Completion message for a submitted job.
#[derive(Debug)]
pub enum WorkerEvent {
    Finished(Artifact),
    Failed { kind: ErrorKind, message: String },
}

/// Runs one job at a time on a background thread.
///
/// There is no queue: submitting while a job is running is refused.
pub struct Worker {
    backends: Backends,
    busy: Arc<AtomicBool>,
}

/// Frees the worker slot when dropped, including on panic.
struct SlotGuard(Arc<AtomicBool>);

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Worker {
    pub fn new(backends: Backends) -> Self {
        Worker {
            backends,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Start `job` in the background.
    ///
    /// The returned receiver yields exactly one event.
    pub fn submit(&self, job: Job) -> Result<mpsc::Receiver<WorkerEvent>, PautaError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PautaError::Busy);
        }
        let guard = SlotGuard(Arc::clone(&self.busy));
        let backends = self.backends.clone();
        let (tx, rx) = mpsc::channel();

        let spawned = thread::Builder::new()
            .name("pauta-worker".into())
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| process(&job, &backends)));
                let event = match outcome {
                    Ok(Ok(artifact)) => WorkerEvent::Finished(artifact),
                    Ok(Err(e)) => {
                        tracing::warn!(error = %e, "job failed");
                        WorkerEvent::Failed {
                            kind: e.kind(),
                            message: e.to_string(),
                        }
                    }
                    Err(_) => {
                        tracing::error!("job panicked");
                        WorkerEvent::Failed {
                            kind: ErrorKind::ExtractionFailure,
                            message: "unexpected internal error while processing".into(),
                        }
                    }
                };
                // Free the slot before reporting, so the receiver can resubmit at once.
                drop(guard);
                let _ = tx.send(event);
            });

        match spawned {
            Ok(_) => Ok(rx),
            // The closure (and the guard inside it) is dropped, freeing the slot.
            Err(e) => Err(PautaError::Extraction(format!("failed to start worker: {e}"))),
        }
    }
}
