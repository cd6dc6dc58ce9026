use std::fmt;
use std::sync::Arc;

use crate::error::{ServiceError, SubmitError, TaskError};
use crate::executor::{BoundedTaskExecutor, Task, TaskHandle};

/// Worker-side service: owns the bounded pool that runs delegated work.
pub struct WorkerService {
    name: Arc<str>,
    executor: BoundedTaskExecutor,
}

impl WorkerService {
    /// Creates the service with a pool of `workers` threads.
    pub fn new(name: impl Into<Arc<str>>, workers: usize) -> Result<Arc<Self>, ServiceError> {
        let name = name.into();
        let executor = BoundedTaskExecutor::new(workers)?;
        tracing::debug!(service = %name, workers = executor.workers(), "worker service created");
        Ok(Arc::new(Self { name, executor }))
    }

    /// Returns the capability handed out to a binding client.
    pub fn on_bind(self: &Arc<Self>) -> WorkerHandle {
        WorkerHandle {
            service: Arc::clone(self),
        }
    }

    /// Stops accepting work. Tasks already queued still finish.
    pub fn on_destroy(&self) {
        tracing::debug!(service = %self.name, "worker service destroyed");
        self.executor.shutdown();
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pool running the delegated work.
    pub fn executor(&self) -> &BoundedTaskExecutor {
        &self.executor
    }
}

impl fmt::Debug for WorkerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerService")
            .field("name", &self.name)
            .field("workers", &self.executor.workers())
            .field("shutdown", &self.executor.is_shutdown())
            .finish()
    }
}

/// Capability a bound client uses to delegate work to the worker service.
#[derive(Clone)]
pub struct WorkerHandle {
    service: Arc<WorkerService>,
}

impl WorkerHandle {
    /// Submits a task to the worker pool.
    pub fn submit<T: Task>(&self, task: T) -> Result<TaskHandle<T::Output>, SubmitError> {
        self.service.executor.submit(task)
    }

    /// Submits a task with a completion callback run on the worker.
    pub fn submit_with<T, C>(&self, task: T, on_complete: C) -> Result<TaskHandle<T::Output>, SubmitError>
    where
        T: Task,
        C: FnOnce(&Result<T::Output, TaskError>) + Send + 'static,
    {
        self.service.executor.submit_with(task, on_complete)
    }

    /// Name of the service behind this handle.
    pub fn service_name(&self) -> &str {
        self.service.name()
    }
}

impl fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("service", &self.service.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::TaskFn;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_handle_delegates_to_service_pool() {
        let service = WorkerService::new("worker", 2).unwrap();

        let handle = service.on_bind();
        let res = handle
            .submit(TaskFn::new("square", |_ctx: CancellationToken| async move {
                Ok::<_, TaskError>(9 * 9)
            }))
            .unwrap()
            .await;
        assert_eq!(res, Ok(81));
        assert_eq!(handle.service_name(), "worker");
    }

    #[tokio::test]
    async fn test_destroy_rejects_new_work() {
        let service = WorkerService::new("worker", 1).unwrap();
        let handle = service.on_bind();
        service.on_destroy();

        let res = handle.submit(TaskFn::new("late", |_ctx: CancellationToken| async move {
            Ok::<_, TaskError>(())
        }));
        assert_eq!(res.unwrap_err(), SubmitError::Rejected);
    }
}
