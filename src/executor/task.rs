//! # Task abstraction and function-backed task implementation.
//!
//! A [`Task`] is consumed by a single execution: it has a stable name, receives a
//! [`CancellationToken`] and produces one `Result<Output, TaskError>`.
//! [`TaskFn`] wraps a closure `F: FnOnce(CancellationToken) -> Fut`.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use shellvisor::{Task, TaskFn, TaskError};
//!
//! let t = TaskFn::new("checksum", |ctx: CancellationToken| async move {
//!     if ctx.is_cancelled() {
//!         return Err(TaskError::Canceled);
//!     }
//!     Ok::<u32, TaskError>(42)
//! });
//! assert_eq!(t.name(), "checksum");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// Boxed future returned by [`Task::spawn`].
pub type BoxTaskFuture<T> = Pin<Box<dyn Future<Output = Result<T, TaskError>> + Send + 'static>>;

/// # Asynchronous, cancelable, one-shot unit of work.
///
/// Implementations should check `ctx.is_cancelled()` and return
/// [`TaskError::Canceled`] promptly when the executor is shut down forcibly.
pub trait Task: Send + 'static {
    /// Value produced on success.
    type Output: Send + 'static;

    /// Returns a stable, human-readable task name.
    fn name(&self) -> &str;

    /// Consumes the task and creates the future that executes it.
    fn spawn(self, ctx: CancellationToken) -> BoxTaskFuture<Self::Output>;
}

/// Function-backed task implementation.
#[derive(Debug)]
pub struct TaskFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F, Fut, T> Task for TaskFn<F>
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, TaskError>> + Send + 'static,
    T: Send + 'static,
{
    type Output = T;

    fn name(&self) -> &str {
        &self.name
    }

    fn spawn(self, ctx: CancellationToken) -> BoxTaskFuture<T> {
        Box::pin((self.f)(ctx))
    }
}
