// tests/pool_shutdown.rs

mod common;
use crate::common::init_tracing;

use std::sync::{Arc, Barrier};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use dagflow::errors::{JobError, PoolError};
use dagflow::pool::WorkerPool;

/// Occupy the (single) worker until `release` is signalled. Returns once the
/// blocking job is actually running.
fn block_worker(pool: &WorkerPool) -> (mpsc::Sender<()>, dagflow::pool::JobHandle<()>) {
    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let handle = pool
        .submit(move || {
            started_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        })
        .unwrap();
    started_rx.recv().unwrap();
    (release_tx, handle)
}

#[test]
fn submit_after_shutdown_fails() {
    init_tracing();

    let pool = WorkerPool::new(2).unwrap();
    pool.shutdown();

    assert!(pool.is_stopping());
    assert!(matches!(pool.submit(|| 1), Err(PoolError::Stopping)));
    assert!(pool.try_submit(|| 1).is_none());
    assert_eq!(pool.size(), 0);
}

#[test]
fn concurrent_shutdowns_collapse_into_one() {
    init_tracing();

    let pool = Arc::new(WorkerPool::new(4).unwrap());
    for _ in 0..100 {
        pool.submit(|| thread::sleep(Duration::from_micros(50))).unwrap();
    }

    let callers: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.shutdown())
        })
        .collect();
    for caller in callers {
        caller.join().expect("shutdown must not panic");
    }

    pool.shutdown();
    assert_eq!(pool.size(), 0);
    assert!(matches!(pool.submit(|| ()), Err(PoolError::Stopping)));
}

#[test]
fn queued_jobs_are_abandoned_on_shutdown() {
    init_tracing();

    let pool = Arc::new(WorkerPool::new(1).unwrap());
    let (release, running) = block_worker(&pool);

    let queued: Vec<_> = (0..5).map(|i| pool.submit(move || i).unwrap()).collect();
    assert_eq!(pool.queue_size(), 5);

    let stopper = {
        let pool = Arc::clone(&pool);
        thread::spawn(move || pool.shutdown())
    };
    while !pool.is_stopping() {
        thread::yield_now();
    }
    release.send(()).unwrap();
    stopper.join().unwrap();

    assert_eq!(running.wait(), Ok(()));
    for handle in queued {
        assert_eq!(handle.wait(), Err(JobError::Abandoned));
    }
    assert_eq!(pool.queue_size(), 0);
    assert_eq!(pool.completed_task_count(), 1);
}

#[test]
fn panicking_job_reports_through_its_handle() {
    init_tracing();

    let pool = WorkerPool::new(1).unwrap();
    let handle = pool.submit(|| -> u32 { panic!("boom") }).unwrap();

    match handle.wait() {
        Err(JobError::Panicked(msg)) => assert!(msg.contains("boom"), "got {msg}"),
        other => panic!("expected a captured panic, got {other:?}"),
    }

    // The worker survived.
    assert_eq!(pool.submit(|| 1).unwrap().wait(), Ok(1));
    assert_eq!(pool.size(), 1);
}

#[test]
fn cancelled_job_never_runs() {
    init_tracing();

    let pool = WorkerPool::new(1).unwrap();
    let (release, running) = block_worker(&pool);

    let ran = Arc::new(AtomicBool::new(false));
    let handle = {
        let ran = Arc::clone(&ran);
        pool.submit(move || ran.store(true, Ordering::SeqCst)).unwrap()
    };
    handle.cancel();
    assert!(handle.is_cancelled());

    release.send(()).unwrap();
    running.wait().unwrap();

    assert_eq!(handle.wait(), Err(JobError::Cancelled));
    assert!(!ran.load(Ordering::SeqCst));
}

#[test]
fn resize_grows_and_shrinks() {
    init_tracing();

    let pool = WorkerPool::new(2).unwrap();
    assert_eq!(pool.size(), 2);

    pool.resize(4).unwrap();
    assert_eq!(pool.size(), 4);
    let results: Vec<_> = (0..20).map(|i| pool.submit(move || i * 2).unwrap()).collect();
    for (i, handle) in results.into_iter().enumerate() {
        assert_eq!(handle.wait(), Ok(i * 2));
    }

    pool.resize(1).unwrap();
    assert_eq!(pool.size(), 1);
    assert!(!pool.is_stopping());
    assert_eq!(pool.submit(|| "still alive").unwrap().wait(), Ok("still alive"));

    // Counts survive a shrink.
    pool.shutdown();
    assert_eq!(pool.completed_task_count(), 21);
}

#[test]
fn grown_workers_each_get_a_queue_and_run_jobs() {
    init_tracing();

    let pool = WorkerPool::new(1).unwrap();
    pool.resize(4).unwrap();
    assert_eq!(pool.size(), 4);
    assert_eq!(pool.queue_count(), pool.size());

    // Only completes if all four workers pick up a job at the same time.
    let barrier = Arc::new(Barrier::new(4));
    let (done_tx, done_rx) = mpsc::channel();
    for _ in 0..4 {
        let barrier = Arc::clone(&barrier);
        let done_tx = done_tx.clone();
        pool.submit(move || {
            barrier.wait();
            done_tx.send(()).unwrap();
        })
        .unwrap();
    }
    for _ in 0..4 {
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
    }

    pool.resize(2).unwrap();
    assert_eq!(pool.queue_count(), 2);
}

#[test]
fn resize_to_same_size_is_a_no_op() {
    init_tracing();

    let pool = WorkerPool::new(3).unwrap();
    pool.resize(3).unwrap();
    assert_eq!(pool.size(), 3);
}

#[test]
fn resize_after_shutdown_fails() {
    init_tracing();

    let pool = WorkerPool::new(2).unwrap();
    pool.shutdown();
    assert!(matches!(pool.resize(4), Err(PoolError::Stopping)));
}

#[test]
fn dropping_the_pool_joins_workers() {
    init_tracing();

    let handle = {
        let pool = WorkerPool::new(2).unwrap();
        pool.submit(|| 3).unwrap()
        // Dropped here; the job either ran or was abandoned, but nothing hangs.
    };

    match handle.wait() {
        Ok(3) | Err(JobError::Abandoned) => {}
        other => panic!("unexpected outcome {other:?}"),
    }
}
