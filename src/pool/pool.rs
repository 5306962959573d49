//! Pool ownership: spawning, counters, and the shutdown protocol.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::{BusConfig, ThreadModel};
use crate::queue::TaskQueue;
use crate::tracing_compat::warn;

use super::supervisor::{self, ShutdownGate};
use super::worker;

/// State shared between the pool handle, its workers, and the supervisor.
pub(super) struct PoolShared {
    pub(super) queue: Arc<TaskQueue>,
    pub(super) thread_min: usize,
    pub(super) thread_max: usize,
    /// Workers currently alive (spawned and not yet exited).
    pub(super) live: AtomicUsize,
    /// Workers currently blocked in `queue.pop`.
    pub(super) idle: AtomicUsize,
    pub(super) shutdown: AtomicBool,
    pub(super) gate: ShutdownGate,
    name_prefix: String,
    worker_seq: AtomicUsize,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

/// A pool of worker threads draining one [`TaskQueue`].
///
/// The pool holds between `thread_min` and `thread_max` workers. In
/// [`ThreadModel::Dynamic`] mode a supervisor thread adjusts the count to
/// load; in fixed mode the count never changes. Shutdown closes the queue,
/// stops the supervisor, and joins every worker before returning.
pub(crate) struct WorkerPool {
    shared: Arc<PoolShared>,
    supervisor: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Starts a pool sized per `config`, draining `queue`.
    pub(crate) fn start(config: &BusConfig, queue: Arc<TaskQueue>) -> Self {
        let shared = Arc::new(PoolShared {
            queue,
            thread_min: config.thread_min,
            thread_max: config.effective_max(),
            live: AtomicUsize::new(0),
            idle: AtomicUsize::new(0),
            shutdown: AtomicBool::new(false),
            gate: ShutdownGate::new(),
            name_prefix: config.thread_name_prefix.clone(),
            worker_seq: AtomicUsize::new(0),
            handles: Mutex::new(Vec::with_capacity(config.effective_max())),
        });

        for _ in 0..shared.thread_min {
            spawn_worker(&shared);
        }

        let supervisor = match config.thread_model {
            ThreadModel::Dynamic => spawn_supervisor(&shared, config.supervise_interval),
            ThreadModel::Fixed => None,
        };

        Self {
            shared,
            supervisor: Mutex::new(supervisor),
        }
    }

    /// Number of live worker threads.
    pub(crate) fn live_workers(&self) -> usize {
        self.shared.live.load(Ordering::SeqCst)
    }

    /// Number of workers currently blocked waiting for a task.
    pub(crate) fn idle_workers(&self) -> usize {
        self.shared.idle.load(Ordering::SeqCst)
    }

    /// Shuts the pool down and joins every thread. Idempotent.
    ///
    /// Tasks still queued are discarded; tasks already running complete
    /// before their worker exits.
    pub(crate) fn shutdown(&self) {
        self.begin_shutdown();
        let handles: Vec<_> = {
            let mut guard = self.shared.handles.lock().expect("pool handle lock poisoned");
            guard.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }
    }

    /// Shuts down, waiting at most `timeout` for workers to exit.
    ///
    /// Returns `false` when a worker (typically one stuck in a long-running
    /// handler) outlived the deadline; its thread is detached and exits on
    /// its own once the handler returns.
    pub(crate) fn shutdown_timeout(&self, timeout: Duration) -> bool {
        self.begin_shutdown();

        let deadline = Instant::now() + timeout;
        while self.shared.live.load(Ordering::Acquire) > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                // Detach the stragglers; they observe the closed queue and
                // exit after their current task.
                self.shared
                    .handles
                    .lock()
                    .expect("pool handle lock poisoned")
                    .clear();
                return false;
            }
            thread::sleep(Duration::from_millis(10).min(remaining));
        }

        let handles: Vec<_> = {
            let mut guard = self.shared.handles.lock().expect("pool handle lock poisoned");
            guard.drain(..).collect()
        };
        for handle in handles {
            let _ = handle.join();
        }
        true
    }

    /// Signals shutdown and stops the supervisor; workers observe the closed
    /// queue on their next wake.
    fn begin_shutdown(&self) {
        self.shared.shutdown.store(true, Ordering::SeqCst);
        self.shared.gate.open();
        self.shared.queue.close();
        let supervisor = self
            .supervisor
            .lock()
            .expect("pool supervisor lock poisoned")
            .take();
        if let Some(handle) = supervisor {
            let _ = handle.join();
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Spawns one worker thread, downgrading to the current pool on failure.
///
/// Returns whether the spawn succeeded. The live counter is claimed before
/// the spawn so the supervisor never over-grows past `thread_max` on the
/// strength of a thread that does not exist yet.
pub(super) fn spawn_worker(shared: &Arc<PoolShared>) -> bool {
    let seq = shared.worker_seq.fetch_add(1, Ordering::Relaxed);
    let name = format!("{}-worker-{seq}", shared.name_prefix);
    shared.live.fetch_add(1, Ordering::SeqCst);

    let worker_shared = Arc::clone(shared);
    match thread::Builder::new()
        .name(name)
        .spawn(move || worker::run(&worker_shared))
    {
        Ok(handle) => {
            shared
                .handles
                .lock()
                .expect("pool handle lock poisoned")
                .push(handle);
            true
        }
        Err(err) => {
            shared.live.fetch_sub(1, Ordering::SeqCst);
            warn!(error = %err, "worker spawn failed; pool continues at current size");
            false
        }
    }
}

fn spawn_supervisor(shared: &Arc<PoolShared>, interval: Duration) -> Option<JoinHandle<()>> {
    let name = format!("{}-supervisor", shared.name_prefix);
    let supervisor_shared = Arc::clone(shared);
    match thread::Builder::new()
        .name(name)
        .spawn(move || supervisor::run(&supervisor_shared, interval))
    {
        Ok(handle) => Some(handle),
        Err(err) => {
            // The pool still works at its initial size; it just cannot adapt.
            warn!(error = %err, "supervisor spawn failed; pool stays fixed at thread_min");
            None
        }
    }
}
