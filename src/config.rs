//! Bus configuration types.
//!
//! [`BusConfig`] holds the concrete values that drive dispatcher behavior:
//! the thread model (fixed or elastic pool), the task model (FIFO or
//! three-level priority queue), the pool bounds, and the queue capacity.
//! Prefer the preset constructors ([`BusConfig::fixed`],
//! [`BusConfig::dynamic`]) with chainable modifiers over filling fields by
//! hand.
//!
//! # Defaults
//!
//! | Field | Default |
//! |-------|---------|
//! | `thread_model` | `Dynamic` |
//! | `task_model` | `Fifo` |
//! | `thread_min` | 1 |
//! | `thread_max` | available CPU parallelism |
//! | `task_max` | 1024 |
//! | `thread_name_prefix` | `"topicbus"` |
//! | `supervise_interval` | 50 ms |

use std::time::Duration;

use crate::error::{BusError, Result};

/// Default task queue capacity.
pub const DEFAULT_TASK_MAX: usize = 1024;

/// Default sampling period of the dynamic pool supervisor.
pub const DEFAULT_SUPERVISE_INTERVAL: Duration = Duration::from_millis(50);

/// Worker pool sizing discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThreadModel {
    /// The pool holds exactly `thread_min` workers for its whole lifetime.
    Fixed,
    /// The pool grows and shrinks within `[thread_min, thread_max]` under a
    /// supervisor that samples queue depth and worker idleness.
    Dynamic,
}

/// Task queue ordering discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskModel {
    /// Oldest insertion wins.
    Fifo,
    /// Three discrete levels; higher levels win, FIFO within a level.
    Priority,
}

/// Priority carried by a task in a [`TaskModel::Priority`] queue.
///
/// Exactly three levels exist. [`TaskPriority::Middle`] is the default used
/// when [`publish`](crate::EventBus::publish) is called on a
/// priority-configured bus without an explicit priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskPriority {
    /// Runs before everything else.
    High,
    /// The default level.
    Middle,
    /// Runs only when no higher-level task is pending.
    Low,
}

impl TaskPriority {
    pub(crate) const fn lane(self) -> usize {
        match self {
            TaskPriority::High => 0,
            TaskPriority::Middle => 1,
            TaskPriority::Low => 2,
        }
    }
}

/// Configuration for an [`EventBus`](crate::EventBus).
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Worker pool sizing discipline.
    pub thread_model: ThreadModel,
    /// Task queue ordering discipline.
    pub task_model: TaskModel,
    /// Lower bound on pool size; in [`ThreadModel::Fixed`] mode this is also
    /// the exact size.
    pub thread_min: usize,
    /// Upper bound on pool size. Ignored in [`ThreadModel::Fixed`] mode.
    pub thread_max: usize,
    /// Task queue capacity; pushes beyond it are rejected with
    /// [`BusError::QueueFull`].
    pub task_max: usize,
    /// Name prefix for worker and supervisor threads.
    pub thread_name_prefix: String,
    /// Sampling period of the dynamic pool supervisor.
    pub supervise_interval: Duration,
}

impl BusConfig {
    /// A fixed pool of exactly `threads` workers, FIFO task model.
    #[must_use]
    pub fn fixed(threads: usize) -> Self {
        Self {
            thread_model: ThreadModel::Fixed,
            thread_min: threads,
            thread_max: threads,
            ..Self::default()
        }
    }

    /// An elastic pool bounded by `[min, max]`, FIFO task model.
    #[must_use]
    pub fn dynamic(min: usize, max: usize) -> Self {
        Self {
            thread_model: ThreadModel::Dynamic,
            thread_min: min,
            thread_max: max,
            ..Self::default()
        }
    }

    /// Switches to the three-level priority task model.
    #[must_use]
    pub fn priority(mut self) -> Self {
        self.task_model = TaskModel::Priority;
        self
    }

    /// Switches to the FIFO task model.
    #[must_use]
    pub fn fifo(mut self) -> Self {
        self.task_model = TaskModel::Fifo;
        self
    }

    /// Sets the task queue capacity.
    #[must_use]
    pub fn task_max(mut self, capacity: usize) -> Self {
        self.task_max = capacity;
        self
    }

    /// Sets the worker thread name prefix.
    #[must_use]
    pub fn thread_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name_prefix = prefix.into();
        self
    }

    /// Sets the supervisor sampling period.
    #[must_use]
    pub fn supervise_interval(mut self, interval: Duration) -> Self {
        self.supervise_interval = interval;
        self
    }

    /// Checks every constraint on the configuration domain.
    ///
    /// Called by [`init`](crate::EventBus::init); exposed so a config can be
    /// vetted before handing it over.
    pub fn validate(&self) -> Result<()> {
        if self.thread_min < 1 {
            return Err(BusError::Configuration {
                reason: format!("thread_min must be >= 1, got {}", self.thread_min),
            });
        }
        if self.thread_max < self.thread_min {
            return Err(BusError::Configuration {
                reason: format!(
                    "thread_min ({}) cannot be greater than thread_max ({})",
                    self.thread_min, self.thread_max
                ),
            });
        }
        if self.task_max < 1 {
            return Err(BusError::Configuration {
                reason: format!("task_max must be >= 1, got {}", self.task_max),
            });
        }
        if self.supervise_interval.is_zero() {
            return Err(BusError::Configuration {
                reason: "supervise_interval must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// The pool's effective upper bound: in fixed mode the minimum is also
    /// the maximum.
    pub(crate) fn effective_max(&self) -> usize {
        match self.thread_model {
            ThreadModel::Fixed => self.thread_min,
            ThreadModel::Dynamic => self.thread_max,
        }
    }

    fn default_thread_max() -> usize {
        std::thread::available_parallelism()
            .map_or(1, std::num::NonZeroUsize::get)
            .max(1)
    }
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            thread_model: ThreadModel::Dynamic,
            task_model: TaskModel::Fifo,
            thread_min: 1,
            thread_max: Self::default_thread_max(),
            task_max: DEFAULT_TASK_MAX,
            thread_name_prefix: "topicbus".to_string(),
            supervise_interval: DEFAULT_SUPERVISE_INTERVAL,
        }
    }
}
