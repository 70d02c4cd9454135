//! repool - a bounded worker pool that recycles idle threads.
//!
//! A capped number of worker threads execute a bursty stream of
//! short-lived tasks. Workers that finish a task park in an idle registry
//! instead of exiting; the next submission reuses the oldest parked
//! worker rather than spawning a new thread, and a background reaper
//! retires workers that stay idle past a survival threshold.
//!
//! # Quick Start
//!
//! ```
//! use repool::{Config, Pool};
//! use std::time::Duration;
//!
//! let pool = Pool::with_config(
//!     Config::builder()
//!         .capacity(64)
//!         .survival_time(Duration::from_secs(1))
//!         .build(),
//! )
//! .unwrap();
//!
//! pool.submit(|| {
//!     // short-lived work
//! })
//! .unwrap();
//!
//! // waits for every in-flight task before returning
//! pool.close_graceful().unwrap();
//! ```
//!
//! # Behavior
//!
//! - **Reuse first**: an idle worker is always preferred over a fresh
//!   thread; claims are FIFO by park time, so reuse spreads across the
//!   pool.
//! - **True backpressure**: at capacity, [`Pool::submit`] blocks the
//!   calling thread until a worker parks; tasks are never queued
//!   unbounded or silently dropped.
//! - **Fault isolation**: a panicking task retires its worker and is
//!   reported through the optional panic handler; it never poisons the
//!   pool or reaches other workers.
//! - **Idle reclamation**: the reaper retires workers idle longer than
//!   the configured survival time, oldest first.

#![warn(missing_docs, missing_debug_implementations)]

pub mod config;
pub mod error;
mod pool;
mod task;

pub use config::{
    Config, ConfigBuilder, DEFAULT_CAPACITY, DEFAULT_CLEANUP_INTERVAL, DEFAULT_SURVIVAL_TIME,
    MIN_CLEANUP_INTERVAL,
};
pub use error::{Error, Result};
pub use pool::Pool;
pub use task::Task;
