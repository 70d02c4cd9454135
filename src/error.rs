//! Error types.

use std::io;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by pool operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The pool has been closed; no further submissions are accepted.
    #[error("pool has closed")]
    Closed,

    /// A `None` task was submitted. `None` is reserved as the internal
    /// termination sentinel delivered through worker mailboxes, so it can
    /// never be scheduled as work.
    #[error("invalid task, must not be None")]
    InvalidTask,

    /// Live workers exceed the current capacity, typically after the
    /// capacity was lowered at runtime. Never returned from the public
    /// API: a worker observing it self-terminates instead of re-parking,
    /// shrinking the live count back toward the new capacity.
    #[error("pool overload")]
    Overload,

    /// Spawning an OS thread for a worker or the reaper failed.
    #[error("failed to spawn pool thread: {0}")]
    Spawn(#[from] io::Error),
}
