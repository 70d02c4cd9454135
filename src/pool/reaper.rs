//! Background reclamation of long-idle workers.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, trace};

use super::PoolInner;

/// The reaper loop. One per pool, running until shutdown.
///
/// Sleeps until the oldest parked worker can possibly have expired, then
/// sweeps. The shutdown signal (or the sender disappearing with the pool)
/// triggers one final sweep that unconditionally terminates every parked
/// worker.
pub(crate) fn run(inner: &Arc<PoolInner>, shutdown: &Receiver<()>) {
    let mut next_wake = inner.survival_time;
    loop {
        match shutdown.recv_timeout(next_wake) {
            Err(RecvTimeoutError::Timeout) => next_wake = sweep(inner),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                final_sweep(inner);
                return;
            }
        }
    }
}

/// Retire every worker idle for at least the survival time, front to
/// back. The registry is age-ordered, so the scan stops at the first
/// worker still inside the survival window. Returns the time until the
/// now-oldest worker expires, floored by the cleanup interval.
fn sweep(inner: &PoolInner) -> Duration {
    let now = Instant::now();
    let mut until_expiry = inner.survival_time;
    let mut reaped = 0usize;

    let mut idle = inner.idle.lock();
    while let Some(front) = idle.front() {
        let age = now.saturating_duration_since(front.parked_at);
        if age < inner.survival_time {
            until_expiry = inner.survival_time - age;
            break;
        }
        if let Some(parked) = idle.pop_front() {
            // The worker is blocked on its empty mailbox; the send
            // cannot block or fail while it is parked.
            let _ = parked.slot.send(None);
            reaped += 1;
        }
    }
    drop(idle);

    if reaped > 0 {
        trace!(reaped, "retired idle workers");
    }
    until_expiry.max(inner.cleanup_interval)
}

/// Shutdown sweep: terminate every remaining parked worker.
fn final_sweep(inner: &PoolInner) {
    let mut idle = inner.idle.lock();
    let mut terminated = 0usize;
    for parked in idle.drain() {
        let _ = parked.slot.send(None);
        terminated += 1;
    }
    drop(idle);
    debug!(terminated, "reaper shut down");
}
