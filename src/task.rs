//! Task representation.

/// A unit of work accepted by the pool.
///
/// Implemented for every `FnOnce() + Send + 'static`, so closures can be
/// handed to [`Pool::submit`](crate::Pool::submit) directly. Implement the
/// trait by hand when the work item carries state of its own:
///
/// ```
/// use repool::Task;
///
/// struct Download {
///     url: String,
/// }
///
/// impl Task for Download {
///     fn run(self: Box<Self>) {
///         // fetch self.url ...
///     }
/// }
/// ```
pub trait Task: Send + 'static {
    /// Execute the task, consuming it.
    fn run(self: Box<Self>);
}

impl<F> Task for F
where
    F: FnOnce() + Send + 'static,
{
    fn run(self: Box<Self>) {
        (*self)()
    }
}

/// Message delivered through a worker's single-slot mailbox.
///
/// `None` is the termination sentinel: a worker receiving it exits its
/// loop instead of running another task.
pub(crate) type Mail = Option<Box<dyn Task>>;
