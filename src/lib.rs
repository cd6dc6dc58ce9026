//! # shellvisor
//!
//! **Shellvisor** is the process lifecycle and worker-service coordination
//! core of a browser-shell host. The engine, view rendering and widgets are
//! external collaborators reached through narrow traits; this crate sequences
//! them.
//!
//! ## Architecture
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!  LaunchRequest ─►  ProcessLifecycleOrchestrator                 │
//!                 │   ├─ ProcessState (forward only)             │
//!                 │   ├─ StartupSequencer ──► Subsystem          │
//!                 │   └─ WorkerServiceConnection ──► ServiceHost │
//!                 └───────▲───────────────────────────┬──────────┘
//!                         │ dispatch(MainMessage)     │ publish(Event)
//!                 ┌───────┴────────┐           ┌──────▼──────┐
//!                 │ MainLoop (FIFO)│           │ Bus         │──► SubscriberSet ──► LogWriter, ...
//!                 └───────▲────────┘           └─────────────┘
//!                         │ Startup / Binding / Relaunch / Run / Destroy
//!        StartupSequencer task, BindingSink, external re-entry
//!
//!  ServiceHost ──► WorkerService ──► BoundedTaskExecutor (N threads, FIFO)
//!                       └─ on_bind ──► WorkerHandle (capability)
//! ```
//!
//! ### Creation
//! ```text
//! on_create ─► command line (once) ─► debugger wait? ─► start + bind worker
//!           ─► attach library (fatal) ─► start sync | async
//!           ─► Startup(Succeeded) ─► launch view       Startup(Failed) ─► notify, close UI
//! ```
//!
//! ### Teardown
//! ```text
//! on_destroy ─► release UI ─► unbind ─► stop worker
//! ```
//!
//! ## Features
//! | Area              | Description                                               | Key types / traits                                   |
//! |-------------------|-----------------------------------------------------------|------------------------------------------------------|
//! | **Lifecycle**     | Creation sequence, re-entry, teardown, saved state        | [`ProcessLifecycleOrchestrator`], [`run`]            |
//! | **Startup**       | Two-phase subsystem initialization                        | [`Subsystem`], [`StartupSequencer`]                  |
//! | **Worker**        | Binding protocol and the worker service                   | [`ServiceHost`], [`WorkerServiceConnection`]         |
//! | **Execution**     | Bounded pool running delegated work                       | [`BoundedTaskExecutor`], [`Task`], [`TaskFn`]        |
//! | **Subscriber API**| Hook into lifecycle events                                | [`Subscribe`], [`LogWriter`]                         |
//! | **Errors**        | Typed errors with stable log labels                       | [`FatalInitError`], [`TaskError`], [`ServiceError`]  |
//! | **Configuration** | Centralized settings                                      | [`Config`]                                           |
//!
//! ## Example
//! ```no_run
//! use std::sync::Arc;
//! use shellvisor::{
//!     Collaborators, Config, LaunchRequest, LocalServiceHost, LogWriter,
//!     ProcessLifecycleOrchestrator, ShellContext, TracerPidGate,
//! };
//! # use shellvisor::{ShellUi, Subsystem, SubsystemError};
//! # struct Ui;
//! # impl ShellUi for Ui {
//! #     fn launch_view(&mut self, _: &str) {}
//! #     fn active_view_url(&self) -> Option<String> { None }
//! #     fn load_url(&mut self, _: &str) {}
//! #     fn notify(&mut self, _: &str) {}
//! #     fn finish(&mut self) {}
//! # }
//! # struct Engine;
//! # #[async_trait::async_trait]
//! # impl Subsystem for Engine {
//! #     fn attach_library(&self) -> Result<(), SubsystemError> { Ok(()) }
//! #     async fn start(&self) -> Result<bool, SubsystemError> { Ok(false) }
//! #     fn start_sync(&self) -> Result<(), SubsystemError> { Ok(()) }
//! # }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let cfg = Config::default();
//!     let (ctx, mut main_loop) = ShellContext::new(cfg.clone(), vec![Arc::new(LogWriter::new())]);
//!
//!     let mut orchestrator = ProcessLifecycleOrchestrator::new(
//!         ctx.clone(),
//!         Collaborators {
//!             ui: Box::new(Ui),
//!             subsystem: Arc::new(Engine),
//!             host: Arc::new(LocalServiceHost::from_config(&cfg)),
//!             debugger: Arc::new(TracerPidGate::from_config(&cfg)),
//!         },
//!     );
//!
//!     if let Err(e) = orchestrator.on_create(LaunchRequest::default(), None).await {
//!         std::process::exit(e.exit_code());
//!     }
//!     shellvisor::run(&mut orchestrator, &mut main_loop).await;
//!     ctx.shutdown().await;
//! }
//! ```
mod command_line;
mod config;
mod context;
mod error;
mod events;
mod executor;
mod lifecycle;
mod main_loop;
mod service;
mod startup;
mod subscribers;

// ---- Public re-exports ----

pub use command_line::{switches, CommandLine};
pub use config::{Config, DEFAULT_WORKER_THREADS};
pub use context::ShellContext;
pub use error::{
    FatalInitError, MainLoopClosed, SequenceError, ServiceError, SubmitError, SubsystemError, TaskError,
};
pub use events::{Bus, Event, EventKind};
pub use executor::{BoundedTaskExecutor, BoxTaskFuture, Task, TaskFn, TaskHandle};
pub use lifecycle::{
    run, wait_for_shutdown_signal, Collaborators, DebuggerGate, LaunchRequest, ProcessLifecycleOrchestrator,
    ProcessState, SavedState, ShellUi, TracerPidGate,
};
pub use main_loop::{MainHandle, MainLoop, MainMessage};
pub use service::{
    BindReply, BindingEvent, BindingEventKind, BindingSink, BindingState, LocalServiceHost, ServiceHost,
    ServiceTarget, WorkerHandle, WorkerService, WorkerServiceConnection,
};
pub use startup::{StartupOutcome, StartupSequencer, Subsystem};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
