// src/pool/worker.rs

//! Per-worker queues, stealing and the worker loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock};

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{debug, trace};

use super::job::Job;

/// One worker's deque. The owner pops from the front, thieves from the back.
#[derive(Default)]
pub(crate) struct WorkerQueue {
    deque: Mutex<VecDeque<Job>>,
}

impl WorkerQueue {
    fn lock(&self) -> MutexGuard<'_, VecDeque<Job>> {
        // Jobs never panic while the lock is held, but be lenient anyway.
        self.deque.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// State shared between a pool handle and its worker threads.
///
/// A pool generation owns one `Shared`; shrinking the pool replaces it.
pub(crate) struct Shared {
    queues: RwLock<Vec<Arc<WorkerQueue>>>,
    /// Jobs pushed but not yet popped, across all queues.
    pending: AtomicUsize,
    stopping: AtomicBool,
    completed: Arc<AtomicU64>,
    sleep: Mutex<()>,
    work_available: Condvar,
}

impl Shared {
    pub(crate) fn new(workers: usize, completed: Arc<AtomicU64>) -> Self {
        Self {
            queues: RwLock::new((0..workers).map(|_| Arc::default()).collect()),
            pending: AtomicUsize::new(0),
            stopping: AtomicBool::new(false),
            completed,
            sleep: Mutex::new(()),
            work_available: Condvar::new(),
        }
    }

    pub(crate) fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Flip the stopping flag. Returns `true` only for the caller that
    /// actually performed the transition.
    pub(crate) fn begin_stop(&self) -> bool {
        self.stopping
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn pending(&self) -> usize {
        self.pending.load(Ordering::Relaxed)
    }

    fn queues(&self) -> Vec<Arc<WorkerQueue>> {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn queue_count(&self) -> usize {
        self.queues
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Append fresh queues for workers `[old_len, new_len)`.
    pub(crate) fn grow(&self, new_len: usize) {
        let mut queues = self.queues.write().unwrap_or_else(PoisonError::into_inner);
        while queues.len() < new_len {
            queues.push(Arc::default());
        }
    }

    /// Push onto a uniformly random worker's queue and wake every worker.
    pub(crate) fn push_random(&self, job: Job) {
        let queues = self.queues();
        let idx = rand::thread_rng().gen_range(0..queues.len());
        {
            let mut deque = queues[idx].lock();
            // Count before the job becomes visible so a fast pop never
            // underflows the counter.
            self.pending.fetch_add(1, Ordering::SeqCst);
            deque.push_back(job);
        }
        trace!(queue = idx, "job queued");
        self.notify_all();
    }

    pub(crate) fn notify_all(&self) {
        // Taking the sleep lock orders this wake-up after any waiter's
        // predicate check, so the notification cannot be lost.
        let _guard = self.sleep.lock().unwrap_or_else(PoisonError::into_inner);
        self.work_available.notify_all();
    }

    fn pop_own(&self, queues: &[Arc<WorkerQueue>], id: usize) -> Option<Job> {
        let job = queues.get(id)?.lock().pop_front();
        if job.is_some() {
            self.pending.fetch_sub(1, Ordering::SeqCst);
        }
        job
    }

    /// Probe the other queues in random order and take from the tail of the
    /// first non-empty one.
    fn steal(&self, queues: &[Arc<WorkerQueue>], id: usize) -> Option<Job> {
        let mut victims: Vec<usize> = (0..queues.len()).filter(|&v| v != id).collect();
        victims.shuffle(&mut rand::thread_rng());

        for victim in victims {
            let job = queues[victim].lock().pop_back();
            if let Some(job) = job {
                self.pending.fetch_sub(1, Ordering::SeqCst);
                trace!(worker = id, victim, "stole job");
                return Some(job);
            }
        }
        None
    }

    fn wait_for_work(&self) {
        let guard = self.sleep.lock().unwrap_or_else(PoisonError::into_inner);
        let _guard = self
            .work_available
            .wait_while(guard, |_| {
                !self.is_stopping() && self.pending.load(Ordering::SeqCst) == 0
            })
            .unwrap_or_else(PoisonError::into_inner);
    }

    /// Remove every queued job. Dropping them resolves their handles as
    /// abandoned.
    pub(crate) fn drain(&self) -> usize {
        let mut dropped = 0;
        for queue in self.queues() {
            let jobs: Vec<Job> = queue.lock().drain(..).collect();
            dropped += jobs.len();
        }
        self.pending.fetch_sub(dropped, Ordering::SeqCst);
        dropped
    }
}

/// Body of worker thread `id`.
pub(crate) fn worker_loop(shared: Arc<Shared>, id: usize) {
    debug!(worker = id, "worker started");

    while !shared.is_stopping() {
        let queues = shared.queues();
        let job = shared
            .pop_own(&queues, id)
            .or_else(|| shared.steal(&queues, id));

        match job {
            Some(job) => {
                // Panics are caught inside the job and routed to its handle.
                job();
                shared.completed.fetch_add(1, Ordering::SeqCst);
            }
            None => shared.wait_for_work(),
        }
    }

    debug!(worker = id, "worker stopped");
}
