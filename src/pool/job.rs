// src/pool/job.rs

//! Jobs as queued by the pool, and the handle their submitter keeps.

use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;
use tokio::sync::oneshot::error::TryRecvError;

use crate::errors::JobError;
use crate::types::CancelFlag;

/// Type-erased unit of work sitting in a worker queue.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Wrap `work` so that its outcome (value or panic) lands in the returned
/// handle instead of unwinding into the worker loop.
pub(crate) fn package<F, T>(work: F) -> (Job, JobHandle<T>)
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let cancel = CancelFlag::new();
    let job_cancel = cancel.clone();

    let job: Job = Box::new(move || {
        if job_cancel.is_cancelled() {
            let _ = tx.send(Err(JobError::Cancelled));
            return;
        }
        let outcome = panic::catch_unwind(AssertUnwindSafe(work))
            .map_err(|payload| JobError::Panicked(panic_message(payload.as_ref())));
        // The submitter may have dropped its handle; nothing to report then.
        let _ = tx.send(outcome);
    });

    (job, JobHandle { rx, cancel })
}

/// Best-effort extraction of a panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Future-like handle to the outcome of a submitted job.
///
/// The result can be obtained by blocking ([`JobHandle::wait`]), by polling
/// ([`JobHandle::try_result`]) or by `.await`ing the handle. If the pool drops
/// the job without running it (shutdown, shrinking resize) the handle resolves
/// to [`JobError::Abandoned`].
#[derive(Debug)]
pub struct JobHandle<T> {
    rx: oneshot::Receiver<Result<T, JobError>>,
    cancel: CancelFlag,
}

impl<T> JobHandle<T> {
    /// Block the current thread until the job has an outcome.
    ///
    /// Must not be called from inside an async runtime; `.await` the handle
    /// there instead.
    pub fn wait(self) -> Result<T, JobError> {
        self.rx.blocking_recv().unwrap_or(Err(JobError::Abandoned))
    }

    /// Non-blocking check. `None` means the job has not finished yet.
    pub fn try_result(&mut self) -> Option<Result<T, JobError>> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(Err(JobError::Abandoned)),
        }
    }

    /// Ask the pool not to start this job. Has no effect once it is running.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl<T> Future for JobHandle<T> {
    type Output = Result<T, JobError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx)
            .poll(cx)
            .map(|res| res.unwrap_or(Err(JobError::Abandoned)))
    }
}
