//! Worker execution loop and shell recycling.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::task::Mail;

use super::PoolInner;

/// Identity-stable execution context for one worker.
///
/// Holds both ends of the single-slot mailbox. The shell moves into the
/// worker thread while the worker is live and returns to the pool's cache
/// when it terminates, so the channel allocation outlives any single
/// thread and is reused by the next spawn.
pub(crate) struct WorkerShell {
    pub(crate) tx: Sender<Mail>,
    rx: Receiver<Mail>,
}

impl WorkerShell {
    pub(crate) fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx }
    }
}

/// Start a worker thread for `shell`. The first task must already sit in
/// the shell's mailbox.
///
/// The live count is incremented here, before the thread actually starts,
/// so racing submitters observe the claim immediately and cannot spawn
/// past capacity more than the tolerated transient overshoot.
pub(crate) fn spawn(inner: Arc<PoolInner>, shell: WorkerShell) -> Result<()> {
    inner.running.fetch_add(1, Ordering::Relaxed);
    let id = inner.next_worker_id.fetch_add(1, Ordering::Relaxed);
    let name = format!("{}-worker-{}", inner.thread_name_prefix, id);

    let spawned = thread::Builder::new().name(name).spawn({
        let inner = Arc::clone(&inner);
        move || run(&inner, shell)
    });

    match spawned {
        Ok(_) => {
            trace!(worker = id, "spawned worker");
            Ok(())
        }
        Err(e) => {
            inner.running.fetch_sub(1, Ordering::Relaxed);
            Err(Error::Spawn(e))
        }
    }
}

/// The worker loop: run the task in the mailbox, re-park, wait for the
/// next delivery. Exits on the termination sentinel, on a park rejection
/// (pool closed or over capacity), or after a task panic.
fn run(inner: &Arc<PoolInner>, shell: WorkerShell) {
    loop {
        match shell.rx.recv() {
            Ok(Some(task)) => {
                // A panicking task never unwinds across the thread
                // boundary; the pool stays intact and the hook, if any,
                // is told fire-and-forget.
                if catch_unwind(AssertUnwindSafe(|| task.run())).is_err() {
                    debug!("task panicked, retiring worker");
                    inner.invoke_panic_hook();
                    break;
                }
                if inner.park(&shell.tx).is_err() {
                    break;
                }
            }
            // Sentinel from the reaper or shutdown sweep, or the channel
            // was torn down with the pool.
            Ok(None) | Err(_) => break,
        }
    }
    inner.retire(shell);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_mailbox_is_single_slot() {
        let shell = WorkerShell::new();
        shell.tx.send(None).unwrap();
        assert!(shell.tx.try_send(None).is_err());
        assert!(shell.rx.recv().unwrap().is_none());
    }

    #[test]
    fn test_shell_mailbox_reusable_after_drain() {
        let shell = WorkerShell::new();
        shell.tx.send(Some(Box::new(|| {}))).unwrap();
        let mail = shell.rx.recv().unwrap();
        mail.unwrap().run();
        // drained shell accepts the next delivery
        shell.tx.send(None).unwrap();
    }
}
