//! Pool configuration and defaults.

use std::time::Duration;

/// Default maximum number of concurrently live workers.
pub const DEFAULT_CAPACITY: i64 = 100_000;

/// Default idle duration before a worker becomes eligible for reaping.
pub const DEFAULT_SURVIVAL_TIME: Duration = Duration::from_secs(1);

/// Default floor on the reaper wake interval.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_millis(100);

/// Hard lower bound on the reaper wake interval. Configured values below
/// this are clamped up to avoid a hot reaper loop when the survival time
/// is very small.
pub const MIN_CLEANUP_INTERVAL: Duration = Duration::from_millis(100);

/// Pool configuration.
///
/// Out-of-range values are normalized rather than rejected: a negative
/// capacity falls back to [`DEFAULT_CAPACITY`] and a cleanup interval
/// below [`MIN_CLEANUP_INTERVAL`] is clamped up.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of concurrently live workers. Negative means "use
    /// the default".
    pub capacity: i64,
    /// How long a worker may sit idle before the reaper retires it.
    pub survival_time: Duration,
    /// Floor on the interval between reaper sweeps.
    pub cleanup_interval: Duration,
    /// Prefix for worker and reaper thread names.
    pub thread_name_prefix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            survival_time: DEFAULT_SURVIVAL_TIME,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
            thread_name_prefix: "repool".to_string(),
        }
    }
}

impl Config {
    /// Start building a configuration.
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Apply the fallback and clamping rules.
    pub(crate) fn normalized(mut self) -> Self {
        if self.capacity < 0 {
            self.capacity = DEFAULT_CAPACITY;
        }
        if self.cleanup_interval < MIN_CLEANUP_INTERVAL {
            self.cleanup_interval = MIN_CLEANUP_INTERVAL;
        }
        self
    }
}

/// Builder for [`Config`].
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a builder holding the default configuration.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Set the maximum number of concurrently live workers.
    pub fn capacity(mut self, capacity: i64) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the idle duration after which a worker is retired.
    pub fn survival_time(mut self, survival_time: Duration) -> Self {
        self.config.survival_time = survival_time;
        self
    }

    /// Set the floor on the interval between reaper sweeps.
    pub fn cleanup_interval(mut self, cleanup_interval: Duration) -> Self {
        self.config.cleanup_interval = cleanup_interval;
        self
    }

    /// Set the prefix used for worker and reaper thread names.
    pub fn thread_name_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        self.config.thread_name_prefix = prefix.into();
        self
    }

    /// Finish, applying the normalization rules.
    pub fn build(self) -> Config {
        self.config.normalized()
    }
}
