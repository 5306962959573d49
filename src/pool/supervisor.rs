//! Grow/shrink controller for dynamic pools.
//!
//! A single supervisor thread samples queue depth and worker idleness once
//! per interval and makes at most one sizing decision per sample:
//!
//! - **Grow** when work is pending, nobody is idle, and the pool is below
//!   `thread_max`: spawn one worker.
//! - **Shrink** when the queue is empty, more than half the workers are
//!   idle, and the pool is above `thread_min`: push one retirement sentinel.
//!   Whichever worker pops it exits; the supervisor never kills a thread
//!   blocked in `pop` directly.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crate::config::TaskPriority;
use crate::queue::Task;
use crate::tracing_compat::debug;

use super::pool::{spawn_worker, PoolShared};

/// One-shot shutdown signal the supervisor sleeps against.
///
/// `wait` doubles as the sampling clock: it blocks for one interval unless
/// the gate opens first, so shutdown interrupts the supervisor mid-sleep
/// instead of costing a full interval.
pub(super) struct ShutdownGate {
    opened: Mutex<bool>,
    cvar: Condvar,
}

impl ShutdownGate {
    pub(super) fn new() -> Self {
        Self {
            opened: Mutex::new(false),
            cvar: Condvar::new(),
        }
    }

    /// Blocks for up to `period`. Returns `true` once the gate is open.
    pub(super) fn wait(&self, period: Duration) -> bool {
        let opened = self.opened.lock().expect("shutdown gate lock poisoned");
        if *opened {
            return true;
        }
        let (opened, _) = self
            .cvar
            .wait_timeout(opened, period)
            .expect("shutdown gate lock poisoned");
        *opened
    }

    /// Opens the gate, waking the supervisor immediately.
    pub(super) fn open(&self) {
        let mut opened = self.opened.lock().expect("shutdown gate lock poisoned");
        *opened = true;
        self.cvar.notify_all();
    }
}

/// The supervisor loop. Runs on its own thread in dynamic mode only.
pub(super) fn run(shared: &Arc<PoolShared>, interval: Duration) {
    debug!(interval_ms = interval.as_millis() as u64, "pool supervisor started");
    loop {
        if shared.gate.wait(interval) {
            break;
        }
        if shared.shutdown.load(Ordering::SeqCst) {
            break;
        }

        let depth = shared.queue.len();
        let idle = shared.idle.load(Ordering::SeqCst);
        let live = shared.live.load(Ordering::SeqCst);

        if depth > 0 && idle == 0 && live < shared.thread_max {
            if spawn_worker(shared) {
                debug!(live = live + 1, depth, "pool grew by one worker");
            }
        } else if depth == 0 && live > shared.thread_min && idle > live.div_ceil(2) {
            // The sentinel rides the lowest lane so pending work, should any
            // arrive before a worker claims it, drains first.
            if shared.queue.push(Task::Retire, TaskPriority::Low).is_ok() {
                debug!(live, idle, "pool shrink requested");
            }
        }
    }
    debug!("pool supervisor stopped");
}
