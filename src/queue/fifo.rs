//! Insertion-ordered buffer for the FIFO task model.

use std::collections::VecDeque;

use super::Task;

/// A single ring: oldest insertion wins.
pub(super) struct FifoBuffer {
    ring: VecDeque<Task>,
}

impl FifoBuffer {
    pub(super) fn new(capacity: usize) -> Self {
        Self {
            ring: VecDeque::with_capacity(capacity.min(64)),
        }
    }

    pub(super) fn push(&mut self, task: Task) {
        self.ring.push_back(task);
    }

    pub(super) fn pop(&mut self) -> Option<Task> {
        self.ring.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::super::{TaskQueue, Task};
    use crate::config::TaskPriority;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn oldest_insertion_wins() {
        let q = TaskQueue::fifo(8);
        let order = Arc::new(AtomicUsize::new(0));

        for expected in 0..4usize {
            let order = Arc::clone(&order);
            q.push(
                Task::run(move || {
                    // Each task asserts it runs in its insertion slot.
                    assert_eq!(order.fetch_add(1, Ordering::SeqCst), expected);
                }),
                TaskPriority::Middle,
            )
            .unwrap();
        }

        for _ in 0..4 {
            match q.pop().unwrap() {
                Task::Run(f) => f(),
                Task::Retire => unreachable!("no sentinel was pushed"),
            }
        }
        assert_eq!(order.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn priority_argument_is_ignored() {
        let q = TaskQueue::fifo(8);
        let log = Arc::new(AtomicUsize::new(0));

        // A "high" task pushed second must still run second.
        let first = Arc::clone(&log);
        q.push(
            Task::run(move || assert_eq!(first.fetch_add(1, Ordering::SeqCst), 0)),
            TaskPriority::Low,
        )
        .unwrap();
        let second = Arc::clone(&log);
        q.push(
            Task::run(move || assert_eq!(second.fetch_add(1, Ordering::SeqCst), 1)),
            TaskPriority::High,
        )
        .unwrap();

        for _ in 0..2 {
            match q.pop().unwrap() {
                Task::Run(f) => f(),
                Task::Retire => unreachable!("no sentinel was pushed"),
            }
        }
        assert_eq!(log.load(Ordering::SeqCst), 2);
    }
}
