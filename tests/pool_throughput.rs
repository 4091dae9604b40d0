// tests/pool_throughput.rs

mod common;
use crate::common::init_tracing;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use dagflow::pool::WorkerPool;

#[test]
fn thousand_increments_on_four_workers_are_exact() {
    init_tracing();

    let pool = WorkerPool::new(4).unwrap();
    let counter = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..1000)
        .map(|_| {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap()
        })
        .collect();

    for handle in handles {
        handle.wait().unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1000);

    // Joining the workers makes the completed counter final.
    pool.shutdown();
    assert_eq!(pool.completed_task_count(), 1000);
    assert_eq!(pool.queue_size(), 0);
}

#[test]
fn submit_returns_the_job_value() {
    init_tracing();

    let pool = WorkerPool::new(2).unwrap();
    let handle = pool.submit(|| 6 * 7).unwrap();
    assert_eq!(handle.wait(), Ok(42));

    let text = pool.submit(|| "hello".to_string()).unwrap();
    assert_eq!(text.wait().unwrap(), "hello");
}

#[test]
fn concurrent_submitters_lose_nothing() {
    init_tracing();

    let pool = Arc::new(WorkerPool::new(4).unwrap());
    let counter = Arc::new(AtomicUsize::new(0));

    let submitters: Vec<_> = (0..4)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let counter = Arc::clone(&counter);
            thread::spawn(move || {
                let handles: Vec<_> = (0..250)
                    .map(|_| {
                        let counter = Arc::clone(&counter);
                        pool.submit(move || counter.fetch_add(1, Ordering::SeqCst))
                            .unwrap()
                    })
                    .collect();
                for handle in handles {
                    handle.wait().unwrap();
                }
            })
        })
        .collect();

    for s in submitters {
        s.join().unwrap();
    }

    assert_eq!(counter.load(Ordering::SeqCst), 1000);
}

#[test]
fn idle_workers_pick_up_work_from_busy_queues() {
    init_tracing();

    // Every job waits until all four are running at once. With random
    // placement several jobs usually share a queue, so this only completes
    // if idle workers steal.
    let pool = WorkerPool::new(4).unwrap();
    let running = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let running = Arc::clone(&running);
            pool.submit(move || {
                running.fetch_add(1, Ordering::SeqCst);
                let deadline = Instant::now() + Duration::from_secs(5);
                while running.load(Ordering::SeqCst) < 4 {
                    if Instant::now() > deadline {
                        return false;
                    }
                    thread::sleep(Duration::from_millis(1));
                }
                true
            })
            .unwrap()
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.wait(), Ok(true));
    }
}

#[test]
fn try_result_is_none_until_the_job_finishes() {
    init_tracing();

    let pool = WorkerPool::new(1).unwrap();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();

    let mut handle = pool
        .submit(move || {
            release_rx.recv().unwrap();
            5
        })
        .unwrap();

    assert!(handle.try_result().is_none());
    release_tx.send(()).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    let outcome = loop {
        if let Some(outcome) = handle.try_result() {
            break outcome;
        }
        assert!(Instant::now() < deadline, "job never finished");
        thread::sleep(Duration::from_millis(1));
    };
    assert_eq!(outcome, Ok(5));
}

#[test]
fn zero_workers_means_one_per_core() {
    init_tracing();

    let pool = WorkerPool::new(0).unwrap();
    let expected = thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(dagflow::pool::FALLBACK_WORKERS);
    assert_eq!(pool.size(), expected);
    assert!(!pool.is_stopping());
}
