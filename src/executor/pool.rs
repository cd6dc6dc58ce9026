//! # BoundedTaskExecutor: fixed worker pool over a FIFO queue.
//!
//! The executor owns `N` dedicated OS threads, each driving its own
//! current-thread tokio runtime, and one unbounded FIFO queue they all pull
//! from. A worker runs exactly one task at a time, so at most `N` tasks execute
//! concurrently and queued tasks start in submission order.
//!
//! ## Lifecycle
//! ```text
//! new(N) ──► N workers waiting on queue
//! submit(task) ──► queue ──► worker ──► task.spawn(child token) ──► oneshot ──► TaskHandle
//! shutdown()      ──► queue closed: submit → Rejected; queued + running work still finishes
//! shutdown_now()  ──► queue closed + token cancelled: running tasks see cancellation,
//!                     queued tasks are dropped (handles resolve Canceled)
//! await_termination(t) ──► waits until every worker exited
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use std::{io, thread};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;

use crate::error::{SubmitError, TaskError};
use crate::subscribers::panic_message;

use super::handle::TaskHandle;
use super::task::Task;

/// Type-erased unit the workers pull from the queue.
type Job = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, ()> + Send>;

type SharedReceiver = Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<Job>>>;

/// State shared between the executor and its workers.
struct Shared {
    /// `None` once shut down.
    queue: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    /// Cancelled by `shutdown_now`; parent of every task token.
    token: CancellationToken,
    active: AtomicUsize,
    queued: AtomicUsize,
    /// Number of worker threads still running.
    live: watch::Sender<usize>,
}

impl Shared {
    fn close(&self) -> bool {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    fn worker_exited(&self) {
        self.live.send_modify(|n| *n = n.saturating_sub(1));
    }
}

/// Fixed-capacity concurrent worker pool.
///
/// ### Rules
/// - Never more than [`workers`](Self::workers) tasks run at once
/// - Tasks never run on the submitting thread
/// - `submit` after shutdown fails with [`SubmitError::Rejected`]
pub struct BoundedTaskExecutor {
    shared: Arc<Shared>,
    workers: usize,
}

impl BoundedTaskExecutor {
    /// Spawns `workers` worker threads (minimum 1).
    pub fn new(workers: usize) -> io::Result<Self> {
        let workers = workers.max(1);
        let (tx, rx) = mpsc::unbounded_channel::<Job>();
        let rx: SharedReceiver = Arc::new(tokio::sync::Mutex::new(rx));
        let (live, _) = watch::channel(0usize);

        let shared = Arc::new(Shared {
            queue: Mutex::new(Some(tx)),
            token: CancellationToken::new(),
            active: AtomicUsize::new(0),
            queued: AtomicUsize::new(0),
            live,
        });

        for id in 0..workers {
            let rx = Arc::clone(&rx);
            let worker_shared = Arc::clone(&shared);
            shared.live.send_modify(|n| *n += 1);

            let spawned = thread::Builder::new()
                .name(format!("shellvisor-worker-{id}"))
                .spawn(move || worker_main(id, rx, worker_shared));
            if let Err(e) = spawned {
                shared.worker_exited();
                shared.close();
                return Err(e);
            }
        }
        tracing::debug!(workers, "executor started");

        Ok(Self { shared, workers })
    }

    /// Enqueues a task; returns a handle observable for completion.
    pub fn submit<T: Task>(&self, task: T) -> Result<TaskHandle<T::Output>, SubmitError> {
        self.submit_with(task, |_| {})
    }

    /// Enqueues a task and runs `on_complete` on the worker once it finished.
    ///
    /// The callback sees the same result the handle resolves to. A panicking
    /// callback is logged and does not affect the handle.
    pub fn submit_with<T, C>(
        &self,
        task: T,
        on_complete: C,
    ) -> Result<TaskHandle<T::Output>, SubmitError>
    where
        T: Task,
        C: FnOnce(&Result<T::Output, TaskError>) + Send + 'static,
    {
        let name: Arc<str> = Arc::from(task.name());
        let (tx, rx) = oneshot::channel();
        let job_name = Arc::clone(&name);

        let job: Job = Box::new(move |ctx: CancellationToken| {
            async move {
                let run = AssertUnwindSafe(async move { task.spawn(ctx).await });
                let res = match run.catch_unwind().await {
                    Ok(res) => res,
                    Err(panic) => Err(TaskError::Panicked {
                        info: panic_message(panic.as_ref()),
                    }),
                };
                if let Err(e) = &res {
                    tracing::debug!(task = %job_name, error = %e, label = e.as_label(), "task finished with error");
                }
                if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(|| on_complete(&res))) {
                    tracing::warn!(task = %job_name, info = %panic_message(panic.as_ref()), "completion callback panicked");
                }
                let _ = tx.send(res);
            }
            .boxed()
        });

        let guard = self
            .shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(sender) = guard.as_ref() else {
            tracing::debug!(task = %name, "submission rejected after shutdown");
            return Err(SubmitError::Rejected);
        };
        self.shared.queued.fetch_add(1, Ordering::SeqCst);
        if sender.send(job).is_err() {
            self.shared.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(SubmitError::Rejected);
        }
        Ok(TaskHandle::new(name, rx))
    }

    /// Stops accepting new submissions. Non-blocking; queued and running
    /// tasks still complete.
    pub fn shutdown(&self) {
        if self.shared.close() {
            tracing::debug!("executor shutdown requested");
        }
    }

    /// Stops accepting submissions, cancels running tasks' tokens and drops
    /// queued tasks.
    pub fn shutdown_now(&self) {
        self.shared.close();
        self.shared.token.cancel();
        tracing::debug!("executor forced shutdown requested");
    }

    /// Waits until every worker thread has exited; returns `false` on timeout.
    pub async fn await_termination(&self, timeout: Duration) -> bool {
        let mut live = self.shared.live.subscribe();
        let done = match tokio::time::timeout(timeout, live.wait_for(|n| *n == 0)).await {
            Ok(res) => res.is_ok(),
            Err(_elapsed) => false,
        };
        done
    }

    /// True once `shutdown` or `shutdown_now` was called.
    pub fn is_shutdown(&self) -> bool {
        self.shared
            .queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    /// True once shut down and every worker exited.
    pub fn is_terminated(&self) -> bool {
        self.is_shutdown() && *self.shared.live.borrow() == 0
    }

    /// Pool size.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Tasks currently executing.
    pub fn active(&self) -> usize {
        self.shared.active.load(Ordering::SeqCst)
    }

    /// Tasks waiting for a worker.
    pub fn queued(&self) -> usize {
        self.shared.queued.load(Ordering::SeqCst)
    }
}

impl Drop for BoundedTaskExecutor {
    fn drop(&mut self) {
        self.shared.close();
    }
}

/// Worker thread body: one task at a time until the queue closes or the pool is cancelled.
fn worker_main(id: usize, rx: SharedReceiver, shared: Arc<Shared>) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!(worker = id, error = %e, "failed to build worker runtime");
            shared.worker_exited();
            return;
        }
    };

    runtime.block_on(async {
        loop {
            let job = {
                let mut rx = rx.lock().await;
                tokio::select! {
                    biased;
                    _ = shared.token.cancelled() => None,
                    job = rx.recv() => job,
                }
            };
            let Some(job) = job else { break };
            shared.queued.fetch_sub(1, Ordering::SeqCst);

            shared.active.fetch_add(1, Ordering::SeqCst);
            job(shared.token.child_token()).await;
            shared.active.fetch_sub(1, Ordering::SeqCst);
        }

        // Jobs left behind by `shutdown_now` are dropped here; their handles resolve Canceled.
        if shared.token.is_cancelled() {
            let mut rx = rx.lock().await;
            while let Ok(job) = rx.try_recv() {
                shared.queued.fetch_sub(1, Ordering::SeqCst);
                drop(job);
            }
        }
    });

    tracing::trace!(worker = id, "worker exited");
    shared.worker_exited();
}
