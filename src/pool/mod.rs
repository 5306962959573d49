//! Worker-thread pool and its dynamic supervisor.

mod pool;
mod supervisor;
mod worker;

pub(crate) use self::pool::WorkerPool;
