//! The user-facing dispatcher.
//!
//! [`EventBus`] glues the three subsystems together: it owns the event
//! table, the bounded task queue, and the worker pool, and translates every
//! publish into one task submission per subscriber. All methods are safe to
//! call from any thread.
//!
//! # Lifecycle
//!
//! A bus starts uninitialized; every operation except construction fails
//! with [`BusError::NotInitialized`] until [`EventBus::init`] succeeds.
//! [`EventBus::shutdown`] (also run on drop) closes the queue, discards
//! tasks still buffered, lets in-flight tasks finish, and joins every
//! worker thread.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::config::{BusConfig, TaskModel, TaskPriority};
use crate::error::{BusError, Result};
use crate::pool::WorkerPool;
use crate::queue::{PushError, Task, TaskQueue};
use crate::tracing_compat::{debug, warn};

use super::handler::{Payload, SharedPayload, SubscriptionId, TypedHandler};
use super::registry::Registry;

struct BusCore {
    registry: Registry,
    queue: Arc<TaskQueue>,
    pool: WorkerPool,
    task_model: TaskModel,
}

/// An in-process, topic-addressed event dispatcher backed by a worker pool.
///
/// ```
/// use topicbus::{BusConfig, EventBus};
///
/// # fn main() -> topicbus::Result<()> {
/// let bus = EventBus::new();
/// bus.init(BusConfig::dynamic(2, 4))?;
///
/// bus.register_event("add")?;
/// bus.subscribe("add", |(a, b): (i32, i32)| {
///     println!("a + b = {}", a + b);
/// })?;
/// bus.publish("add", (77, 88))?;
/// # std::thread::sleep(std::time::Duration::from_millis(100));
/// bus.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct EventBus {
    core: RwLock<Option<Arc<BusCore>>>,
}

impl EventBus {
    /// Creates an uninitialized bus. Call [`init`](Self::init) before
    /// anything else.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: RwLock::new(None),
        }
    }

    /// Validates `config`, then constructs the queue and pool it describes.
    ///
    /// Re-initializing an already-initialized bus tears the previous pool
    /// down (joining its workers) once the new one is in place; existing
    /// registrations and subscriptions are discarded with it.
    ///
    /// # Errors
    ///
    /// [`BusError::Configuration`] when the config violates its domain
    /// (`thread_min >= 1`, `thread_max >= thread_min`, `task_max >= 1`).
    pub fn init(&self, config: BusConfig) -> Result<()> {
        config.validate()?;

        let queue = Arc::new(match config.task_model {
            TaskModel::Fifo => TaskQueue::fifo(config.task_max),
            TaskModel::Priority => TaskQueue::priority(config.task_max),
        });
        let pool = WorkerPool::start(&config, Arc::clone(&queue));
        let core = Arc::new(BusCore {
            registry: Registry::new(),
            queue,
            pool,
            task_model: config.task_model,
        });

        debug!(
            thread_model = ?config.thread_model,
            task_model = ?config.task_model,
            thread_min = config.thread_min,
            thread_max = config.effective_max(),
            task_max = config.task_max,
            "event bus initialized"
        );

        let previous = self.core.write().replace(core);
        if let Some(old) = previous {
            old.pool.shutdown();
        }
        Ok(())
    }

    /// Ensures `name` exists in the event table. Idempotent.
    ///
    /// # Errors
    ///
    /// [`BusError::NotInitialized`] before [`init`](Self::init).
    pub fn register_event(&self, name: &str) -> Result<()> {
        self.core()?.registry.register(name);
        Ok(())
    }

    /// Whether `name` is present in the event table. Never errors; an
    /// uninitialized bus has no registered events.
    #[must_use]
    pub fn is_event_registered(&self, name: &str) -> bool {
        self.core
            .read()
            .as_ref()
            .is_some_and(|core| core.registry.is_registered(name))
    }

    /// Appends `handler` to the subscriber list of `name` and returns its
    /// subscription id.
    ///
    /// The payload type is fixed here: a later publish on `name` reaches
    /// this handler only when it carries a `P` (or the handler was
    /// subscribed with the zero-argument form `()`, which accepts any
    /// payload).
    ///
    /// # Errors
    ///
    /// [`BusError::NotInitialized`]; [`BusError::NotRegistered`] when `name`
    /// is absent (use [`subscribe_safe`](Self::subscribe_safe) to register
    /// on demand).
    pub fn subscribe<P, F>(&self, name: &str, handler: F) -> Result<SubscriptionId>
    where
        P: Payload,
        F: Fn(P) + Send + Sync + 'static,
    {
        let core = self.core()?;
        core.registry
            .subscribe(name, Arc::new(TypedHandler::new(handler)))
    }

    /// As [`subscribe`](Self::subscribe), but auto-registers `name` if
    /// absent.
    ///
    /// # Errors
    ///
    /// [`BusError::NotInitialized`].
    pub fn subscribe_safe<P, F>(&self, name: &str, handler: F) -> Result<SubscriptionId>
    where
        P: Payload,
        F: Fn(P) + Send + Sync + 'static,
    {
        let core = self.core()?;
        core.registry.register(name);
        core.registry
            .subscribe(name, Arc::new(TypedHandler::new(handler)))
    }

    /// Publishes `payload` to every subscriber of `name`.
    ///
    /// One task per subscriber is submitted to the queue, in subscription
    /// order; all of them share one reference-counted copy of `payload`,
    /// freed when the last task completes. On a priority-configured bus the
    /// tasks ride [`TaskPriority::Middle`].
    ///
    /// Publishing to a registered name with zero subscribers succeeds and
    /// submits nothing.
    ///
    /// # Errors
    ///
    /// [`BusError::NotInitialized`]; [`BusError::NotRegistered`];
    /// [`BusError::QueueFull`] when the queue reaches `task_max` mid-publish.
    /// Tasks already submitted for earlier subscribers are **not** rolled
    /// back and will still be delivered.
    pub fn publish<P: Payload>(&self, name: &str, payload: P) -> Result<()> {
        self.submit(name, payload, TaskPriority::Middle, false)
    }

    /// As [`publish`](Self::publish), with an explicit priority.
    ///
    /// # Errors
    ///
    /// As [`publish`](Self::publish), plus [`BusError::TaskModelMismatch`]
    /// on a FIFO-configured bus: priority publishing requires the PRIORITY
    /// task model.
    pub fn publish_with_priority<P: Payload>(
        &self,
        priority: TaskPriority,
        name: &str,
        payload: P,
    ) -> Result<()> {
        self.submit(name, payload, priority, true)
    }

    /// Removes the first subscription of `name` whose id equals `id`.
    ///
    /// Returns whether a record was removed: `true` exactly once per issued
    /// id, `false` thereafter and for ids never issued. An unknown `name` is
    /// reported as `Ok(false)`, not an error.
    ///
    /// # Errors
    ///
    /// [`BusError::NotInitialized`].
    pub fn unsubscribe(&self, name: &str, id: SubscriptionId) -> Result<bool> {
        Ok(self.core()?.registry.unsubscribe(name, id))
    }

    /// Number of subscriptions currently held for `name`.
    #[must_use]
    pub fn subscriber_count(&self, name: &str) -> usize {
        self.core
            .read()
            .as_ref()
            .map_or(0, |core| core.registry.subscriber_count(name))
    }

    /// Snapshot of the number of tasks waiting in the queue.
    #[must_use]
    pub fn queued_tasks(&self) -> usize {
        self.core.read().as_ref().map_or(0, |core| core.queue.len())
    }

    /// The queue capacity (`task_max`), or 0 before init.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.core
            .read()
            .as_ref()
            .map_or(0, |core| core.queue.capacity())
    }

    /// Number of live worker threads.
    #[must_use]
    pub fn live_workers(&self) -> usize {
        self.core
            .read()
            .as_ref()
            .map_or(0, |core| core.pool.live_workers())
    }

    /// Number of workers currently blocked waiting for a task.
    #[must_use]
    pub fn idle_workers(&self) -> usize {
        self.core
            .read()
            .as_ref()
            .map_or(0, |core| core.pool.idle_workers())
    }

    /// Shuts the bus down: no new tasks are accepted, tasks still queued are
    /// discarded, in-flight tasks run to completion, and every worker thread
    /// is joined. The bus returns to the uninitialized state. Idempotent.
    pub fn shutdown(&self) {
        let core = self.core.write().take();
        if let Some(core) = core {
            core.pool.shutdown();
            debug!("event bus shut down");
        }
    }

    /// As [`shutdown`](Self::shutdown), waiting at most `timeout` for
    /// workers to exit.
    ///
    /// Returns `false` when a worker (typically one stuck in a long-running
    /// handler) outlived the deadline; its thread finishes and exits on its
    /// own.
    pub fn shutdown_timeout(&self, timeout: Duration) -> bool {
        let core = self.core.write().take();
        match core {
            Some(core) => core.pool.shutdown_timeout(timeout),
            None => true,
        }
    }

    fn core(&self) -> Result<Arc<BusCore>> {
        self.core
            .read()
            .as_ref()
            .cloned()
            .ok_or(BusError::NotInitialized)
    }

    fn submit<P: Payload>(
        &self,
        name: &str,
        payload: P,
        priority: TaskPriority,
        explicit_priority: bool,
    ) -> Result<()> {
        let core = self.core()?;
        if explicit_priority && core.task_model == TaskModel::Fifo {
            return Err(BusError::TaskModelMismatch {
                reason: "priority publishing requires the PRIORITY task model".to_string(),
            });
        }

        // Resolve the subscriber list under the table's read guard, release
        // it, then submit to the queue.
        let subscribers = core.registry.snapshot(name).ok_or_else(|| {
            BusError::NotRegistered {
                name: name.to_string(),
            }
        })?;
        if subscribers.is_empty() {
            return Ok(());
        }

        let shared = SharedPayload::new(payload);
        for subscription in subscribers {
            let payload = shared.clone();
            let task = Task::run(move || {
                if let Err(mismatch) = subscription.handler.invoke(&payload) {
                    warn!(
                        subscription = %subscription.id,
                        expected = mismatch.expected,
                        got = mismatch.got,
                        "payload type mismatch; task dropped"
                    );
                }
            });
            match core.queue.push(task, priority) {
                Ok(()) => {}
                Err(PushError::Full) => return Err(BusError::QueueFull),
                Err(PushError::Closed) => return Err(BusError::NotInitialized),
            }
        }
        Ok(())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventBus {
    fn drop(&mut self) {
        self.shutdown();
    }
}
