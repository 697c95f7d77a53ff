//! Background compile worker.
//!
//! # Responsibility
//! - Run the compile pipeline off the caller's thread.
//! - Hand outcomes back over a channel the caller drains on its own thread.
//!
//! # Invariants
//! - At most one compile is in flight; a second submit is rejected.
//! - A panicking pipeline yields a failed outcome, never a lost job.
//! - The in-flight flag is cleared before the outcome is delivered.

use log::{error, info, warn};
use std::any::Any;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use uuid::Uuid;

use crate::compiler::{CompileOutcome, CompilePipeline, CompileRequest};

const WORKER_THREAD_NAME: &str = "cvgen-compile";

#[derive(Debug)]
pub enum CompileServiceError {
    /// A compile is already running.
    Busy,
    /// Worker thread could not be started.
    Spawn(io::Error),
}

impl Display for CompileServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Busy => write!(f, "a compile is already in progress"),
            Self::Spawn(err) => write!(f, "failed to start compile worker: {err}"),
        }
    }
}

impl Error for CompileServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Busy => None,
            Self::Spawn(err) => Some(err),
        }
    }
}

/// Single-slot compile worker.
pub struct CompileService {
    pipeline: Arc<CompilePipeline>,
    in_flight: Arc<AtomicBool>,
    sender: Sender<CompileOutcome>,
    receiver: Receiver<CompileOutcome>,
}

impl CompileService {
    pub fn new(pipeline: CompilePipeline) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            pipeline: Arc::new(pipeline),
            in_flight: Arc::new(AtomicBool::new(false)),
            sender,
            receiver,
        }
    }

    pub fn pipeline(&self) -> &CompilePipeline {
        &self.pipeline
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Starts `request` on the worker thread and returns its job id.
    ///
    /// # Errors
    /// - `Busy` while a previous compile has not finished.
    /// - `Spawn` when the worker thread cannot be created.
    pub fn submit(&self, request: CompileRequest) -> Result<Uuid, CompileServiceError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(
                "event=compile_submit module=service status=rejected job_id={} reason=busy",
                request.job_id
            );
            return Err(CompileServiceError::Busy);
        }

        let job_id = request.job_id;
        let pipeline = Arc::clone(&self.pipeline);
        let in_flight = Arc::clone(&self.in_flight);
        let sender = self.sender.clone();
        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let outcome =
                    match panic::catch_unwind(AssertUnwindSafe(|| pipeline.run(&request))) {
                        Ok(outcome) => outcome,
                        Err(payload) => {
                            error!(
                                "event=compile_run module=service status=error job_id={} error_code=panic",
                                job_id
                            );
                            CompileOutcome::failure(
                                job_id,
                                format!("compile aborted: {}", panic_message(payload.as_ref())),
                            )
                        }
                    };
                in_flight.store(false, Ordering::Release);
                // Receiver is gone only when the service was dropped.
                let _ = sender.send(outcome);
            });

        if let Err(err) = spawned {
            self.in_flight.store(false, Ordering::Release);
            error!(
                "event=compile_submit module=service status=error job_id={} error_code=spawn_failed",
                job_id
            );
            return Err(CompileServiceError::Spawn(err));
        }
        info!(
            "event=compile_submit module=service status=ok job_id={}",
            job_id
        );
        Ok(job_id)
    }

    /// Returns a finished outcome without blocking.
    pub fn try_next(&self) -> Option<CompileOutcome> {
        self.receiver.try_recv().ok()
    }

    /// Waits up to `timeout` for a finished outcome.
    pub fn wait_next(&self, timeout: Duration) -> Option<CompileOutcome> {
        self.receiver.recv_timeout(timeout).ok()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
