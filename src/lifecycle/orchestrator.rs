//! # ProcessLifecycleOrchestrator
//!
//! Top-level coordinator of one UI unit. It owns the [`ProcessState`], the
//! [`WorkerServiceConnection`] and the [`StartupSequencer`], and reacts to every
//! [`MainMessage`] delivered on the main context.
//!
//! ## Creation
//! ```text
//! on_create(launch, saved)
//!   1. ShellContext::init_command_line        (first creation only)
//!   2. wait-for-debugger?  ──► DebuggerGate   (main context stalls)
//!   3. start worker service + bind            (fire-and-forget)
//!   4. attach library                         (Err ──► FatalInitError, exit -1)
//!   5. run-layout-test? start_sync : start_async
//!   6. Startup(Succeeded) ──► SubsystemReady, launch view, restore window
//!      Startup(Failed)    ──► SubsystemFailed, notify, finish, post Destroy
//! ```
//!
//! ## Teardown
//! `on_destroy`: release UI resources ──► unbind ──► stop worker service.
//! Runs once; later calls are no-ops.

use std::ops::ControlFlow;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use crate::command_line::switches;
use crate::context::ShellContext;
use crate::error::FatalInitError;
use crate::events::{Event, EventKind};
use crate::main_loop::MainMessage;
use crate::service::{BindingState, ServiceHost, ServiceTarget, WorkerHandle, WorkerServiceConnection};
use crate::startup::{StartupOutcome, StartupSequencer, Subsystem};
use crate::subscribers::panic_message;

use super::collab::{DebuggerGate, ShellUi};
use super::launch::{LaunchRequest, SavedState};
use super::state::ProcessState;

/// External collaborators of one orchestrator instance.
pub struct Collaborators {
    /// UI unit.
    pub ui: Box<dyn ShellUi>,
    /// Engine driven through two-phase startup.
    pub subsystem: Arc<dyn Subsystem>,
    /// Platform running the worker service.
    pub host: Arc<dyn ServiceHost>,
    /// Debugger wait used under `wait-for-debugger`.
    pub debugger: Arc<dyn DebuggerGate>,
}

/// Coordinates startup, the worker binding and teardown of one UI unit.
pub struct ProcessLifecycleOrchestrator {
    ctx: ShellContext,
    ui: Box<dyn ShellUi>,
    host: Arc<dyn ServiceHost>,
    debugger: Arc<dyn DebuggerGate>,
    target: ServiceTarget,
    connection: WorkerServiceConnection,
    sequencer: StartupSequencer,
    state: ProcessState,
    /// Saved state handed to `on_create`, applied once the subsystem is ready.
    restore: SavedState,
    startup_url: Option<String>,
    torn_down: bool,
}

impl ProcessLifecycleOrchestrator {
    /// Creates an orchestrator in [`ProcessState::Created`].
    pub fn new(ctx: ShellContext, collab: Collaborators) -> Self {
        let target = ServiceTarget::new(ctx.config().service_name.as_str());
        let connection = WorkerServiceConnection::new(
            Arc::clone(&collab.host),
            target.clone(),
            ctx.main().clone(),
            ctx.bus().clone(),
        );
        let sequencer = StartupSequencer::new(collab.subsystem, ctx.main().clone(), ctx.bus().clone());

        Self {
            ctx,
            ui: collab.ui,
            host: collab.host,
            debugger: collab.debugger,
            target,
            connection,
            sequencer,
            state: ProcessState::Created,
            restore: SavedState::default(),
            startup_url: None,
            torn_down: false,
        }
    }

    /// Runs the creation sequence.
    ///
    /// Returns only fatal failures; the caller must exit with
    /// [`FatalInitError::exit_code`].
    pub async fn on_create(
        &mut self,
        launch: LaunchRequest,
        saved: Option<SavedState>,
    ) -> Result<(), FatalInitError> {
        self.publish(Event::new(EventKind::ProcessCreated));
        self.ctx.init_command_line(launch.command_line.as_deref());

        self.wait_for_debugger_if_needed().await;
        self.start_worker();

        if let Err(e) = self.sequencer.attach_library() {
            self.set_state(ProcessState::LibraryAttachFailed);
            return Err(e);
        }

        self.restore = saved.unwrap_or_default();
        self.startup_url = launch.non_empty_url().map(str::to_owned);

        self.set_state(ProcessState::SubsystemStarting);
        if self.ctx.has_switch(switches::RUN_LAYOUT_TEST) {
            if let Err(e) = self.sequencer.start_sync() {
                tracing::error!(error = %e, label = e.as_label(), "synchronous start failed");
                self.set_state(ProcessState::SubsystemFailed);
                return Err(e);
            }
            self.set_state(ProcessState::SubsystemReady);
            self.publish(Event::new(EventKind::SubsystemReady).with_already_running(false));
        } else if let Err(e) = self.sequencer.start_async() {
            tracing::error!(error = %e, label = e.as_label(), "asynchronous start could not be requested");
            self.set_state(ProcessState::SubsystemFailed);
            return Err(e);
        }
        Ok(())
    }

    async fn wait_for_debugger_if_needed(&mut self) {
        if !self.ctx.has_switch(switches::WAIT_FOR_DEBUGGER) {
            return;
        }
        self.publish(Event::new(EventKind::DebuggerWaiting));
        if !self.debugger.is_attached() {
            self.debugger.wait_for_attach().await;
        }
        self.publish(Event::new(EventKind::DebuggerAttached));
    }

    fn start_worker(&mut self) {
        if self.host.is_isolated() {
            tracing::debug!(service = %self.target, "isolated host: binding without explicit start");
        } else {
            match self.host.start_service(&self.target) {
                Ok(()) => self.publish(Event::new(EventKind::WorkerStartRequested).with_service(self.target.name())),
                Err(e) => tracing::warn!(service = %self.target, error = %e, label = e.as_label(), "worker start failed"),
            }
        }
        if let Err(e) = self.connection.bind() {
            tracing::warn!(service = %self.target, error = %e, label = e.as_label(), "worker bind failed");
        }
    }

    /// Handles one message from the main context.
    ///
    /// Returns `Break` once the UI unit is destroyed.
    pub fn dispatch(&mut self, msg: MainMessage) -> ControlFlow<()> {
        match msg {
            MainMessage::Binding(ev) => self.connection.handle_event(ev),
            MainMessage::Startup(outcome) => self.on_startup(outcome),
            MainMessage::Relaunch(launch) => self.on_relaunch(launch),
            MainMessage::Run(task) => {
                if let Err(panic) = std::panic::catch_unwind(AssertUnwindSafe(task)) {
                    tracing::warn!(info = %panic_message(panic.as_ref()), "posted task panicked");
                }
            }
            MainMessage::Destroy => {
                self.on_destroy();
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn on_startup(&mut self, outcome: StartupOutcome) {
        match outcome {
            StartupOutcome::Succeeded { already_running } => {
                if !self.set_state(ProcessState::SubsystemReady) {
                    return;
                }
                self.publish(Event::new(EventKind::SubsystemReady).with_already_running(already_running));
                self.finish_initialization();
            }
            StartupOutcome::Failed { reason } => {
                if !self.set_state(ProcessState::SubsystemFailed) {
                    return;
                }
                self.publish(Event::new(EventKind::SubsystemFailed).with_reason(reason));
                let message = self.ctx.config().startup_failure_message.clone();
                self.ui.notify(&message);
                self.ui.finish();
                if self.ctx.main().post(MainMessage::Destroy).is_err() {
                    self.on_destroy();
                }
            }
        }
    }

    fn finish_initialization(&mut self) {
        let url = self
            .restore
            .active_url
            .clone()
            .or_else(|| self.startup_url.clone())
            .unwrap_or_else(|| self.ctx.config().default_view_url.clone());

        self.ui.launch_view(&url);
        self.publish(Event::new(EventKind::ViewLaunched).with_url(url));
        if !self.restore.window.is_empty() {
            self.ui.restore_window_state(&self.restore.window);
        }
    }

    /// Handles an external invocation targeting the running process.
    pub fn on_relaunch(&mut self, launch: LaunchRequest) {
        let mut ev = Event::new(EventKind::Relaunched);
        if let Some(url) = launch.non_empty_url() {
            ev = ev.with_url(url);
        }
        self.publish(ev);

        if launch.command_line.is_some() {
            self.publish(Event::new(EventKind::CommandLineIgnored));
        }
        if let Some(action) = launch.debug_action.as_deref() {
            if self.ui.handle_debug_action(action) {
                return;
            }
        }
        if let Some(url) = launch.non_empty_url() {
            if self.ui.active_view_url().is_some() {
                self.ui.load_url(url);
            }
        }
    }

    /// Snapshot to persist before the UI unit is suspended.
    pub fn save_state(&self) -> SavedState {
        SavedState {
            active_url: self.ui.active_view_url(),
            window: self.ui.save_window_state(),
        }
    }

    /// Tears the UI unit down: release, unbind, then stop the worker.
    pub fn on_destroy(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        self.ui.release();
        self.connection.unbind();
        match self.host.stop_service(&self.target) {
            Ok(_) => self.publish(
                Event::new(EventKind::WorkerStopRequested)
                    .with_service(self.target.name())
                    .with_reason("teardown"),
            ),
            Err(e) => tracing::debug!(service = %self.target, error = %e, label = e.as_label(), "worker stop failed"),
        }

        self.set_state(ProcessState::Destroyed);
        self.publish(Event::new(EventKind::ProcessDestroyed));
    }

    /// Teardown requested from outside the main context (termination signal).
    pub fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.publish(Event::new(EventKind::ShutdownRequested));
        self.ui.finish();
        self.on_destroy();
    }

    /// Current process state.
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Current binding state of the worker connection.
    pub fn binding_state(&self) -> BindingState {
        self.connection.state()
    }

    /// Worker capability, present only while bound.
    pub fn worker(&self) -> Option<&WorkerHandle> {
        self.connection.capability()
    }

    /// True once teardown ran.
    pub fn is_destroyed(&self) -> bool {
        self.torn_down
    }

    fn set_state(&mut self, next: ProcessState) -> bool {
        if self.state.can_transition_to(next) {
            tracing::debug!(from = %self.state, to = %next, "process state");
            self.state = next;
            true
        } else {
            tracing::warn!(from = %self.state, to = %next, "process state transition rejected");
            false
        }
    }

    fn publish(&self, ev: Event) {
        self.ctx.bus().publish(ev);
    }
}
