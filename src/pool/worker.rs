//! The worker loop.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;

use crate::queue::Task;
use crate::tracing_compat::{debug, error};

use super::pool::PoolShared;

/// Drains the queue until shutdown or a retirement sentinel.
///
/// The idle counter brackets the blocking pop so the supervisor can tell
/// waiting workers from busy ones. Anything a subscriber does inside a task
/// stays inside the task: panics are caught, logged, and swallowed.
pub(super) fn run(shared: &PoolShared) {
    loop {
        shared.idle.fetch_add(1, Ordering::SeqCst);
        let task = shared.queue.pop();
        shared.idle.fetch_sub(1, Ordering::SeqCst);

        match task {
            // Closed queue: shutdown in progress.
            None => break,
            Some(Task::Retire) => {
                debug!("worker retiring on sentinel");
                break;
            }
            Some(Task::Run(work)) => {
                if panic::catch_unwind(AssertUnwindSafe(work)).is_err() {
                    error!("subscriber task panicked; worker continues");
                }
            }
        }
    }
    shared.live.fetch_sub(1, Ordering::SeqCst);
}
