// src/pool/mod.rs

//! Work-stealing worker pool.
//!
//! - [`job`] wraps closures into queueable jobs and exposes [`JobHandle`].
//! - [`worker`] holds the per-worker deques and the worker loop.
//!
//! The pool knows nothing about DAGs: it runs closures and hands their
//! outcome back through a handle. Placement is uniformly random across the
//! worker queues; idle workers steal from the tail of a random victim.

pub mod job;
mod worker;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use crate::errors::PoolError;

pub use job::JobHandle;
use worker::{Shared, worker_loop};

/// Worker count used when the hardware concurrency cannot be determined.
pub const FALLBACK_WORKERS: usize = 2;

/// Resolve a requested worker count: `0` means "one per available core".
pub fn effective_workers(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_WORKERS)
}

/// Fixed-size (but resizable) set of worker threads with private queues.
pub struct WorkerPool {
    shared: RwLock<Arc<Shared>>,
    /// Join handles of the live generation. Also serialises resize/shutdown.
    workers: Mutex<Vec<JoinHandle<()>>>,
    /// Survives generations so a shrink does not reset it.
    completed: Arc<AtomicU64>,
}

impl WorkerPool {
    /// Start a pool with `workers` threads (`0` auto-detects).
    pub fn new(workers: usize) -> Result<Self, PoolError> {
        let count = effective_workers(workers);
        let completed = Arc::new(AtomicU64::new(0));
        let shared = Arc::new(Shared::new(count, Arc::clone(&completed)));
        let mut handles = Vec::with_capacity(count);
        if let Err(err) = spawn_workers(&shared, 0..count, &mut handles) {
            shared.begin_stop();
            stop_generation(&shared, &mut handles);
            return Err(err);
        }

        info!(workers = count, "worker pool started");

        Ok(Self {
            shared: RwLock::new(shared),
            workers: Mutex::new(handles),
            completed,
        })
    }

    fn shared(&self) -> Arc<Shared> {
        self.shared
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Queue `work` on a random worker and return a handle to its outcome.
    ///
    /// Fails immediately with [`PoolError::Stopping`] once shutdown began.
    pub fn submit<F, T>(&self, work: F) -> Result<JobHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let shared = self.shared();
        if shared.is_stopping() {
            return Err(PoolError::Stopping);
        }

        let (job, handle) = job::package(work);
        shared.push_random(job);

        // Lost a race with shutdown: nobody will pop this job any more.
        if shared.is_stopping() {
            shared.drain();
        }

        Ok(handle)
    }

    /// Like [`WorkerPool::submit`], but returns `None` instead of an error
    /// when the pool is stopping.
    pub fn try_submit<F, T>(&self, work: F) -> Option<JobHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        self.submit(work).ok()
    }

    /// Stop accepting work, wake every worker and join them.
    ///
    /// Idempotent: only the first caller performs the join; concurrent
    /// callers wait for it and then return, later calls are no-ops. Jobs
    /// still queued are dropped and their handles resolve to
    /// `JobError::Abandoned`.
    pub fn shutdown(&self) {
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let shared = self.shared();
        if !shared.begin_stop() {
            return;
        }

        stop_generation(&shared, &mut workers);
        info!("worker pool shut down");
    }

    /// Change the number of workers.
    ///
    /// Growing adds workers with fresh queues. Shrinking stops the pool and
    /// recreates it with `n` empty queues; queued jobs are **not** carried
    /// over, and a submission racing the shrink may see [`PoolError::Stopping`].
    /// `0` auto-detects like [`WorkerPool::new`].
    pub fn resize(&self, n: usize) -> Result<(), PoolError> {
        let target = effective_workers(n);
        let mut workers = self.workers.lock().unwrap_or_else(PoisonError::into_inner);
        let shared = self.shared();

        if shared.is_stopping() {
            return Err(PoolError::Stopping);
        }

        let current = workers.len();
        if target == current {
            return Ok(());
        }

        if target > current {
            // Workers tolerate a missing queue until `grow` adds it.
            let spawned = spawn_workers(&shared, current..target, &mut workers);
            shared.grow(workers.len());
            spawned?;
            info!(from = current, to = target, "worker pool grown");
            return Ok(());
        }

        shared.begin_stop();
        stop_generation(&shared, &mut workers);

        let fresh = Arc::new(Shared::new(target, Arc::clone(&self.completed)));
        let spawned = spawn_workers(&fresh, 0..target, &mut workers);
        *self.shared.write().unwrap_or_else(PoisonError::into_inner) = fresh;
        spawned?;

        info!(from = current, to = target, "worker pool shrunk");
        Ok(())
    }

    /// Number of per-worker queues in the live generation.
    pub fn queue_count(&self) -> usize {
        self.shared().queue_count()
    }

    /// Number of live worker threads.
    pub fn size(&self) -> usize {
        self.workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Approximate number of queued jobs. Read without locking any queue, so
    /// it may race with concurrent pushes and pops; diagnostics only.
    pub fn queue_size(&self) -> usize {
        self.shared().pending()
    }

    /// Exact number of jobs executed since the pool was created.
    pub fn completed_task_count(&self) -> u64 {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn is_stopping(&self) -> bool {
        self.shared().is_stopping()
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size())
            .field("queue_size", &self.queue_size())
            .field("completed", &self.completed_task_count())
            .finish()
    }
}

/// Spawn workers `ids` into `handles`. On failure the threads that did start
/// stay in `handles` so the caller still owns and joins them.
fn spawn_workers(
    shared: &Arc<Shared>,
    ids: std::ops::Range<usize>,
    handles: &mut Vec<JoinHandle<()>>,
) -> Result<(), PoolError> {
    handles.reserve(ids.len());
    for id in ids {
        let worker_shared = Arc::clone(shared);
        let handle = thread::Builder::new()
            .name(format!("dagflow-worker-{id}"))
            .spawn(move || worker_loop(worker_shared, id))
            .map_err(PoolError::Spawn)?;
        handles.push(handle);
    }
    Ok(())
}

/// Wake and join every worker of a generation whose stopping flag is set,
/// then drop whatever is still queued.
fn stop_generation(shared: &Shared, workers: &mut Vec<JoinHandle<()>>) {
    shared.notify_all();

    for handle in workers.drain(..) {
        if handle.join().is_err() {
            warn!("worker thread panicked outside of a job");
        }
    }

    let dropped = shared.drain();
    if dropped > 0 {
        debug!(dropped, "dropped queued jobs on stop");
    }
}
