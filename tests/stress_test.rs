use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use repool::{Config, Pool};

fn pool_with(capacity: i64, survival: Duration) -> Pool {
    Pool::with_config(
        Config::builder()
            .capacity(capacity)
            .survival_time(survival)
            .cleanup_interval(Duration::from_millis(100))
            .build(),
    )
    .unwrap()
}

#[test]
fn test_many_submitters_all_tasks_run() {
    const SUBMITTERS: usize = 8;
    const TASKS_PER_SUBMITTER: usize = 2_000;

    let pool = Arc::new(pool_with(64, Duration::from_secs(5)));
    let executed = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..SUBMITTERS)
        .map(|_| {
            let pool = Arc::clone(&pool);
            let executed = Arc::clone(&executed);
            thread::spawn(move || {
                for _ in 0..TASKS_PER_SUBMITTER {
                    let executed = Arc::clone(&executed);
                    pool.submit(move || {
                        executed.fetch_add(1, Ordering::Relaxed);
                    })
                    .unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    pool.close_graceful().unwrap();

    assert_eq!(
        executed.load(Ordering::Relaxed),
        SUBMITTERS * TASKS_PER_SUBMITTER
    );
    assert_eq!(pool.len(), 0);
}

#[test]
fn test_sequential_churn_respects_capacity_invariant() {
    let pool = pool_with(32, Duration::from_secs(5));
    let executed = Arc::new(AtomicUsize::new(0));

    for _ in 0..1_000 {
        let executed = Arc::clone(&executed);
        pool.submit(move || {
            executed.fetch_add(1, Ordering::Relaxed);
        })
        .unwrap();
    }

    // quiesce: every live worker has parked
    thread::sleep(Duration::from_millis(200));
    assert_eq!(executed.load(Ordering::Relaxed), 1_000);
    assert_eq!(pool.len(), pool.idle());
    assert_eq!(pool.free() + pool.len() as i64, pool.capacity() as i64);

    pool.close_graceful().unwrap();
}

#[test]
fn test_panic_storm_leaves_pool_usable() {
    let pool = Arc::new(pool_with(16, Duration::from_secs(5)));
    let panics = Arc::new(AtomicUsize::new(0));
    let completed = Arc::new(AtomicUsize::new(0));

    let counter = panics.clone();
    pool.set_panic_handler(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    for i in 0..100 {
        if i % 2 == 0 {
            pool.submit(|| panic!("storm")).unwrap();
        } else {
            let completed = Arc::clone(&completed);
            pool.submit(move || {
                completed.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
    }

    pool.close_graceful().unwrap();
    assert_eq!(panics.load(Ordering::SeqCst), 50);
    assert_eq!(completed.load(Ordering::SeqCst), 50);
    assert_eq!(pool.len(), 0);
}

#[test]
fn test_repeated_bursts_are_reaped_between_rounds() {
    let pool = pool_with(64, Duration::from_millis(100));
    let executed = Arc::new(AtomicUsize::new(0));

    for _ in 0..5 {
        for _ in 0..20 {
            let executed = Arc::clone(&executed);
            pool.submit(move || {
                executed.fetch_add(1, Ordering::Relaxed);
            })
            .unwrap();
        }
        // long enough for every worker of this round to idle out
        thread::sleep(Duration::from_millis(400));
        assert_eq!(pool.idle(), 0);
        assert_eq!(pool.len(), 0);
    }

    assert_eq!(executed.load(Ordering::Relaxed), 100);
    pool.close_graceful().unwrap();
}
