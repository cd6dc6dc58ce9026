use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::error::TaskError;

/// Completion handle for a submitted task.
///
/// Resolves to the task's result once a worker finished it. If the task is
/// dropped without running (forced shutdown), resolves to [`TaskError::Canceled`].
#[derive(Debug)]
pub struct TaskHandle<T> {
    name: Arc<str>,
    rx: oneshot::Receiver<Result<T, TaskError>>,
}

impl<T> TaskHandle<T> {
    pub(crate) fn new(name: Arc<str>, rx: oneshot::Receiver<Result<T, TaskError>>) -> Self {
        Self { name, rx }
    }

    /// Name of the submitted task.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<T> Future for TaskHandle<T> {
    type Output = Result<T, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|res| res.unwrap_or_else(|_closed| Err(TaskError::Canceled)))
    }
}
