//! The pool: admission control, capacity accounting, and shutdown.

mod idle;
mod reaper;
mod worker;

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Sender};
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::task::{Mail, Task};

use idle::IdleQueue;
use worker::WorkerShell;

type PanicHook = Box<dyn Fn() + Send + Sync + 'static>;

/// Upper bound on retained retired shells. Keeps the free-list from
/// pinning one channel allocation per historical peak worker.
const SHELL_CACHE_LIMIT: usize = 64;

/// State shared between the pool handle, its workers, and the reaper.
pub(crate) struct PoolInner {
    capacity: AtomicI64,
    pub(crate) running: AtomicI64,
    closed: AtomicBool,

    pub(crate) survival_time: Duration,
    pub(crate) cleanup_interval: Duration,
    pub(crate) thread_name_prefix: String,
    pub(crate) next_worker_id: AtomicU64,

    pub(crate) idle: Mutex<IdleQueue>,
    /// Wakes submitters blocked on a saturated pool. Paired with `idle`.
    available: Condvar,
    /// Wakes graceful-close waiters when the last worker retires. Paired
    /// with `idle`.
    joined: Condvar,

    /// Free-list of retired worker shells, reused on the next spawn.
    cache: Mutex<Vec<WorkerShell>>,
    panic_hook: RwLock<Option<PanicHook>>,
}

impl PoolInner {
    fn free_raw(&self) -> i64 {
        self.capacity.load(Ordering::Relaxed) - self.running.load(Ordering::Relaxed)
    }

    /// Park a worker that finished its task.
    ///
    /// Rejected when the pool has closed (the worker self-terminates
    /// instead of parking) or when live workers exceed the current
    /// capacity after a runtime reduction (the worker self-terminates,
    /// shrinking the live count back toward the new capacity).
    pub(crate) fn park(&self, slot: &Sender<Mail>) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        if self.free_raw() < 0 {
            return Err(Error::Overload);
        }

        let mut idle = self.idle.lock();
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        idle.push_back(slot.clone());
        self.available.notify_one();
        Ok(())
    }

    /// Tear down a terminating worker: return its shell to the cache and
    /// drop it from the live count.
    ///
    /// The decrement and the `joined` notify happen under the `idle`
    /// mutex — the same lock a graceful close holds while checking the
    /// live count — so the closer either observes the decrement or is
    /// guaranteed the notify that follows it. The cache lock is released
    /// before `idle` is taken; the two are never held together.
    pub(crate) fn retire(&self, shell: WorkerShell) {
        if !self.closed.load(Ordering::Acquire) {
            let mut cache = self.cache.lock();
            if cache.len() < SHELL_CACHE_LIMIT {
                cache.push(shell);
            }
        }

        let _idle = self.idle.lock();
        if self.running.fetch_sub(1, Ordering::Relaxed) == 1 {
            self.joined.notify_all();
        }
    }

    fn checkout_shell(&self) -> WorkerShell {
        self.cache.lock().pop().unwrap_or_else(WorkerShell::new)
    }

    pub(crate) fn invoke_panic_hook(&self) {
        if let Some(hook) = self.panic_hook.read().as_ref() {
            hook();
        }
    }
}

/// A bounded worker pool that recycles idle threads.
///
/// Submitted tasks are handed to the oldest parked worker when one
/// exists; otherwise a new worker thread is started, up to the configured
/// capacity. At capacity, [`submit`](Pool::submit) blocks the caller
/// until a worker parks. Workers idle longer than the survival time are
/// retired by a background reaper.
///
/// ```
/// use repool::{Config, Pool};
///
/// let pool = Pool::with_config(Config::builder().capacity(8).build()).unwrap();
/// pool.submit(|| println!("hello from a pooled worker")).unwrap();
/// pool.close_graceful().unwrap();
/// ```
pub struct Pool {
    inner: Arc<PoolInner>,
    shutdown_tx: Sender<()>,
    reaper: Option<JoinHandle<()>>,
}

impl Pool {
    /// Create a pool with the default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(Config::default())
    }

    /// Create a pool, normalizing `config` and starting the reaper.
    pub fn with_config(config: Config) -> Result<Self> {
        let config = config.normalized();
        let (shutdown_tx, shutdown_rx) = bounded(1);

        let inner = Arc::new(PoolInner {
            capacity: AtomicI64::new(config.capacity),
            running: AtomicI64::new(0),
            closed: AtomicBool::new(false),
            survival_time: config.survival_time,
            cleanup_interval: config.cleanup_interval,
            thread_name_prefix: config.thread_name_prefix,
            next_worker_id: AtomicU64::new(0),
            idle: Mutex::new(IdleQueue::default()),
            available: Condvar::new(),
            joined: Condvar::new(),
            cache: Mutex::new(Vec::new()),
            panic_hook: RwLock::new(None),
        });

        let reaper = thread::Builder::new()
            .name(format!("{}-reaper", inner.thread_name_prefix))
            .spawn({
                let inner = Arc::clone(&inner);
                move || reaper::run(&inner, &shutdown_rx)
            })?;

        Ok(Self {
            inner,
            shutdown_tx,
            reaper: Some(reaper),
        })
    }

    /// Submit a closure for execution.
    ///
    /// Blocks when the pool is saturated, until some worker finishes and
    /// parks. The task runs exactly once; there is no result channel and
    /// no retry.
    pub fn submit<F>(&self, task: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_task(Some(Box::new(task)))
    }

    /// Submit an already-boxed task. `None` is rejected with
    /// [`Error::InvalidTask`]: it is reserved as the worker termination
    /// sentinel.
    pub fn submit_task(&self, task: Option<Box<dyn Task>>) -> Result<()> {
        let Some(task) = task else {
            return Err(Error::InvalidTask);
        };
        let inner = &self.inner;

        if inner.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }

        let mut idle = inner.idle.lock();
        if inner.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }

        // Reuse the oldest parked worker when one exists.
        if let Some(parked) = idle.pop_front() {
            drop(idle);
            let _ = parked.slot.send(Some(task));
            return Ok(());
        }

        // Under capacity: start a fresh worker. The check is optimistic
        // (no reserved slot), so racing submitters can briefly push the
        // live count past capacity; the overload path in park() shrinks
        // it back as workers complete.
        if inner.free_raw() > 0 {
            drop(idle);
            let shell = inner.checkout_shell();
            let _ = shell.tx.send(Some(task));
            return worker::spawn(Arc::clone(inner), shell);
        }

        // Saturated: block until some worker parks. Exactly one racing
        // submitter claims each parked worker.
        loop {
            inner.available.wait(&mut idle);
            if inner.closed.load(Ordering::Acquire) {
                return Err(Error::Closed);
            }
            if let Some(parked) = idle.pop_front() {
                drop(idle);
                let _ = parked.slot.send(Some(task));
                return Ok(());
            }
        }
    }

    /// Number of live workers, parked ones included.
    pub fn len(&self) -> usize {
        self.inner.running.load(Ordering::Relaxed).max(0) as usize
    }

    /// True when no worker is live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of concurrently live workers.
    pub fn capacity(&self) -> usize {
        self.inner.capacity.load(Ordering::Relaxed).max(0) as usize
    }

    /// Remaining admission headroom. Transiently negative when live
    /// workers exceed a freshly lowered capacity; self-heals as those
    /// workers complete.
    pub fn free(&self) -> i64 {
        self.inner.free_raw()
    }

    /// Number of parked workers.
    pub fn idle(&self) -> usize {
        self.inner.idle.lock().len()
    }

    /// Replace the capacity at runtime. No-op for a negative or unchanged
    /// value. Takes effect on the next admission decision; workers
    /// already running above a lowered capacity are not interrupted, they
    /// retire on their next park attempt.
    pub fn adjust(&self, new_capacity: i64) {
        if new_capacity < 0 || new_capacity == self.inner.capacity.load(Ordering::Relaxed) {
            return;
        }
        self.inner.capacity.store(new_capacity, Ordering::Relaxed);
    }

    /// Install the callback invoked when a task panics. Replaces any
    /// previous handler. The callback receives no task context and its
    /// return is ignored.
    pub fn set_panic_handler<F>(&self, handler: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *self.inner.panic_hook.write() = Some(Box::new(handler));
    }

    /// Close the pool without waiting for in-flight tasks.
    ///
    /// Idempotent. Every parked worker is signaled to terminate via the
    /// reaper's final sweep; running workers finish their current task
    /// and then terminate instead of re-parking. Blocked submitters are
    /// woken and receive [`Error::Closed`].
    pub fn close(&self) -> Result<()> {
        self.close_inner(false)
    }

    /// Close the pool and wait until every worker has terminated.
    pub fn close_graceful(&self) -> Result<()> {
        self.close_inner(true)
    }

    fn close_inner(&self, graceful: bool) -> Result<()> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Ok(());
        }

        let mut idle = inner.idle.lock();
        if !inner.closed.swap(true, Ordering::AcqRel) {
            debug!(graceful, "closing pool");
            // One-shot cancellation: the reaper wakes, runs its final
            // sweep terminating every parked worker, and exits.
            let _ = self.shutdown_tx.try_send(());
            inner.available.notify_all();
            // no worker is recycled after close; release the retained
            // shells now instead of at the last handle drop
            inner.cache.lock().clear();
        }

        if graceful {
            while inner.running.load(Ordering::Relaxed) > 0 {
                inner.joined.wait(&mut idle);
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("idle", &self.idle())
            .field("closed", &self.inner.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl Drop for Pool {
    fn drop(&mut self) {
        let _ = self.close();
        if let Some(reaper) = self.reaper.take() {
            let _ = reaper.join();
        }
    }
}
