//! Bounded task queues.
//!
//! One synchronization protocol serves both ordering disciplines: a mutex
//! guards the buffer, the atomic size counter is updated inside the critical
//! section, and a condition variable wakes blocked consumers. The buffer
//! behind the mutex is either a single FIFO ring ([`fifo::FifoBuffer`]) or
//! three priority lanes ([`priority::LaneBuffer`]).
//!
//! Producer side never blocks: a push either lands within `capacity` or is
//! rejected. Consumer side blocks in [`TaskQueue::pop`] until a task arrives
//! or the queue is closed, in which case `pop` returns `None` so workers can
//! exit. Tasks still buffered when the queue closes are discarded.

mod fifo;
mod priority;
mod task;

pub(crate) use self::task::Task;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use crate::config::TaskPriority;
use self::fifo::FifoBuffer;
use self::priority::LaneBuffer;

/// Why a push was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PushError {
    /// The queue already holds `capacity` items.
    Full,
    /// The queue was closed by shutdown; no new tasks are accepted.
    Closed,
}

enum Buffer {
    Fifo(FifoBuffer),
    Lanes(LaneBuffer),
}

impl Buffer {
    fn push(&mut self, task: Task, priority: TaskPriority) {
        match self {
            Buffer::Fifo(b) => b.push(task),
            Buffer::Lanes(b) => b.push(task, priority),
        }
    }

    fn pop(&mut self) -> Option<Task> {
        match self {
            Buffer::Fifo(b) => b.pop(),
            Buffer::Lanes(b) => b.pop(),
        }
    }
}

struct Inner {
    buffer: Buffer,
    closed: bool,
}

/// A bounded, multi-producer multi-consumer task queue.
pub(crate) struct TaskQueue {
    inner: Mutex<Inner>,
    available: Condvar,
    size: AtomicUsize,
    capacity: usize,
}

impl TaskQueue {
    /// Creates a FIFO queue holding at most `capacity` tasks.
    pub(crate) fn fifo(capacity: usize) -> Self {
        Self::new(Buffer::Fifo(FifoBuffer::new(capacity)), capacity)
    }

    /// Creates a three-lane priority queue holding at most `capacity` tasks
    /// across all lanes.
    pub(crate) fn priority(capacity: usize) -> Self {
        Self::new(Buffer::Lanes(LaneBuffer::new()), capacity)
    }

    fn new(buffer: Buffer, capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                buffer,
                closed: false,
            }),
            available: Condvar::new(),
            size: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Enqueues one task. Never blocks.
    ///
    /// Rejects with [`PushError::Full`] when the queue holds `capacity`
    /// items, and with [`PushError::Closed`] after shutdown. On success one
    /// blocked consumer is woken.
    pub(crate) fn push(&self, task: Task, priority: TaskPriority) -> Result<(), PushError> {
        let mut inner = self.inner.lock().expect("task queue lock poisoned");
        if inner.closed {
            return Err(PushError::Closed);
        }
        if self.size.load(Ordering::Relaxed) >= self.capacity {
            return Err(PushError::Full);
        }
        inner.buffer.push(task, priority);
        self.size.fetch_add(1, Ordering::Release);
        self.available.notify_one();
        Ok(())
    }

    /// Removes and returns the next task, blocking while the queue is empty.
    ///
    /// Returns `None` once the queue has been closed; tasks still buffered at
    /// that point are discarded.
    pub(crate) fn pop(&self) -> Option<Task> {
        let mut inner = self.inner.lock().expect("task queue lock poisoned");
        loop {
            if inner.closed {
                return None;
            }
            if let Some(task) = inner.buffer.pop() {
                self.size.fetch_sub(1, Ordering::Release);
                return Some(task);
            }
            inner = self
                .available
                .wait(inner)
                .expect("task queue lock poisoned");
        }
    }

    /// Closes the queue and wakes every blocked consumer.
    pub(crate) fn close(&self) {
        let mut inner = self.inner.lock().expect("task queue lock poisoned");
        inner.closed = true;
        self.available.notify_all();
    }

    /// Eventually consistent snapshot of the current item count.
    pub(crate) fn len(&self) -> usize {
        self.size.load(Ordering::Relaxed)
    }

    /// The immutable capacity this queue was constructed with.
    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }
}
