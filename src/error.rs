//! Error types used by the shellvisor core and its collaborators.
//!
//! - [`FatalInitError`]: startup failures that end the process (exit `-1`).
//! - [`SequenceError`]: startup calls made out of order.
//! - [`SubsystemError`]: failures reported by the external subsystem.
//! - [`ServiceError`]: failures of the service host (start/stop/bind).
//! - [`SubmitError`]: task submission refused by the executor.
//! - [`TaskError`]: outcome of an individual task execution.
//!
//! Every enum provides `as_label` (a stable snake_case label for logs).
//! Only [`FatalInitError`] ever crosses into process termination; everything
//! else is absorbed by the component that detected it.

use std::io;

use thiserror::Error;

/// # Unrecoverable initialization failures.
///
/// No partial operation is meaningful without the subsystem, so the host exits
/// with [`FatalInitError::exit_code`] instead of leaving a half-initialized UI.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum FatalInitError {
    /// The subsystem library could not be attached.
    #[error("library attach failed: {error}")]
    LibraryAttach {
        /// Underlying subsystem error.
        error: SubsystemError,
    },

    /// Synchronous (layout-test) subsystem start failed.
    #[error("synchronous subsystem start failed: {error}")]
    SyncStartup {
        /// Underlying subsystem error.
        error: SubsystemError,
    },

    /// The subsystem refused to even begin an asynchronous start.
    #[error("asynchronous subsystem start could not be requested: {error}")]
    AsyncStartupRequest {
        /// Underlying subsystem error.
        error: SubsystemError,
    },

    /// Startup calls were issued in the wrong order.
    #[error(transparent)]
    OutOfSequence(#[from] SequenceError),
}

impl FatalInitError {
    /// Status the process exits with.
    pub const EXIT_CODE: i32 = -1;

    /// Returns the process exit status for this failure.
    pub fn exit_code(&self) -> i32 {
        Self::EXIT_CODE
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use shellvisor::{FatalInitError, SubsystemError};
    ///
    /// let err = FatalInitError::LibraryAttach { error: SubsystemError::new("missing .so") };
    /// assert_eq!(err.as_label(), "fatal_library_attach");
    /// assert_eq!(err.exit_code(), -1);
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            FatalInitError::LibraryAttach { .. } => "fatal_library_attach",
            FatalInitError::SyncStartup { .. } => "fatal_sync_startup",
            FatalInitError::AsyncStartupRequest { .. } => "fatal_async_startup_request",
            FatalInitError::OutOfSequence(_) => "fatal_out_of_sequence",
        }
    }
}

/// Startup operations issued out of order.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceError {
    /// A subsystem call was made before the library was attached.
    #[error("subsystem library is not attached")]
    NotAttached,

    /// The library was attached twice.
    #[error("subsystem library is already attached")]
    AlreadyAttached,

    /// A start was requested after one was already issued.
    #[error("subsystem start was already requested")]
    AlreadyStarted,
}

/// # Failure reported by the external subsystem.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason}")]
pub struct SubsystemError {
    /// Human-readable reason.
    pub reason: String,
}

impl SubsystemError {
    /// Creates a new subsystem error.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// # Errors produced by a service host.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The named service is not running.
    #[error("service {name:?} is not running")]
    NotRunning {
        /// Service name.
        name: String,
    },

    /// Worker threads for the service could not be spawned.
    #[error("failed to spawn service workers: {0}")]
    Spawn(#[from] io::Error),
}

impl ServiceError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::NotRunning { .. } => "service_not_running",
            ServiceError::Spawn(_) => "service_spawn_failed",
        }
    }
}

/// Error returned by [`BoundedTaskExecutor::submit`](crate::BoundedTaskExecutor::submit).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The executor was shut down and no longer accepts work.
    #[error("submission rejected: executor is shut down")]
    Rejected,
}

impl SubmitError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            SubmitError::Rejected => "submit_rejected",
        }
    }
}

/// # Errors produced by task execution.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Task execution failed.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Task was cancelled or dropped before producing a result.
    #[error("task cancelled")]
    Canceled,

    /// Task panicked while running.
    #[error("task panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl TaskError {
    /// Convenience constructor for [`TaskError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use shellvisor::TaskError;
    ///
    /// assert_eq!(TaskError::Canceled.as_label(), "task_canceled");
    /// assert_eq!(TaskError::fail("boom").as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "task_canceled",
            TaskError::Panicked { .. } => "task_panicked",
        }
    }
}

/// The main execution context no longer accepts messages.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("main loop is closed")]
pub struct MainLoopClosed;
