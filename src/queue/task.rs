//! The unit of work handed from the dispatcher to the pool.

use std::fmt;

/// A runnable unit queued for execution on the worker pool.
///
/// `Run` carries one handler invocation bound to its payload. `Retire` is the
/// retirement sentinel: whichever worker pops it exits its loop, which is how
/// the supervisor shrinks a pool whose workers are blocked in `pop`.
pub(crate) enum Task {
    /// Invoke a subscriber with its payload.
    Run(Box<dyn FnOnce() + Send + 'static>),
    /// Instruct the receiving worker to exit.
    Retire,
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Task::Run(_) => f.write_str("Task::Run"),
            Task::Retire => f.write_str("Task::Retire"),
        }
    }
}

impl Task {
    /// Wraps a closure as a runnable task.
    pub(crate) fn run(f: impl FnOnce() + Send + 'static) -> Self {
        Task::Run(Box::new(f))
    }
}
