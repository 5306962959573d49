//! Topicbus: an in-process, topic-addressed event dispatcher backed by an
//! elastic worker-thread pool.
//!
//! Producers publish named events with arbitrary typed payloads; consumers
//! subscribe typed handlers against those names. Each delivery runs
//! asynchronously on a worker drawn from the pool.
//!
//! # Components
//!
//! | Area | Description | Key types |
//! |------|-------------|-----------|
//! | **Dispatcher** | Topic table, typed subscriptions, publish-to-task translation. | [`EventBus`], [`SubscriptionId`] |
//! | **Worker pool** | Fixed or elastic thread pool bounded by `[thread_min, thread_max]`. | [`ThreadModel`] |
//! | **Task queue** | Bounded, FIFO or three-level priority, rejecting on overflow. | [`TaskModel`], [`TaskPriority`] |
//! | **Configuration** | Validated config with preset constructors. | [`BusConfig`] |
//! | **Errors** | Typed errors at the API boundary. | [`BusError`] |
//!
//! # Guarantees
//!
//! - **Bounded memory**: the queue never holds more than `task_max` tasks; a
//!   publish that would overflow is rejected with [`BusError::QueueFull`].
//! - **Fault isolation**: a panicking or type-mismatched handler is logged
//!   and swallowed inside its worker; it never reaches the publisher and
//!   never kills the worker thread.
//! - **Ordered delivery**: within one publish, tasks are enqueued in
//!   subscription order; in the priority model, higher levels always run
//!   first, ties resolving by insertion order.
//! - **Clean teardown**: shutdown discards queued tasks, completes in-flight
//!   ones, and joins every worker thread.
//!
//! # Example
//!
//! ```
//! use topicbus::{BusConfig, EventBus};
//!
//! # fn main() -> topicbus::Result<()> {
//! let bus = EventBus::new();
//! bus.init(BusConfig::dynamic(2, 4).task_max(1024))?;
//!
//! bus.register_event("add")?;
//! bus.subscribe("add", |(a, b): (i32, i32)| {
//!     println!("a + b = {}", a + b);
//! })?;
//!
//! bus.publish("add", (77, 88))?;
//! # std::thread::sleep(std::time::Duration::from_millis(100));
//! bus.shutdown();
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! - `tracing-integration`: emit structured diagnostics through the
//!   [`tracing`](https://docs.rs/tracing) crate; without it every log site
//!   compiles to nothing (see [`tracing_compat`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bus;
pub mod config;
pub mod error;
pub mod tracing_compat;

mod pool;
mod queue;

pub use bus::{EventBus, Payload, SubscriptionId};
pub use config::{BusConfig, TaskModel, TaskPriority, ThreadModel};
pub use error::{BusError, Result};
