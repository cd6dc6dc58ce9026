//! # Bounded task execution.
//!
//! This module provides the work surface the worker service offers to the host:
//! - [`Task`] - trait for one-shot async cancelable units producing a value
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskHandle`] - future resolving to a task's result (explicit oneshot channel)
//! - [`BoundedTaskExecutor`] - fixed pool of worker threads fed by one FIFO queue
//!
//! ```text
//! submit(task) ──► [unbounded FIFO queue] ──► worker 1 ─┐
//!      │                                  ──► worker 2 ─┼──► oneshot ──► TaskHandle
//!      └──► TaskHandle                    ──► worker N ─┘      └──────► on_complete()
//! ```

mod handle;
mod pool;
mod task;

pub use handle::TaskHandle;
pub use pool::BoundedTaskExecutor;
pub use task::{BoxTaskFuture, Task, TaskFn};
