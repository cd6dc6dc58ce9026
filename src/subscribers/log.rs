//! # LogWriter: lifecycle events to `tracing`
//!
//! A subscriber that forwards every [`Event`] to the `tracing` macros with
//! structured fields. Failures log at `warn`/`error`, routine steps at `info`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! INFO shellvisor::subscribers::log: [bind-requested] service="worker"
//! WARN shellvisor::subscribers::log: [capability-unavailable] service="worker" reason="..."
//! INFO shellvisor::subscribers::log: [subsystem-ready] already_running=false
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let service = e.service.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("-");
        let url = e.url.as_deref().unwrap_or("-");

        match e.kind {
            EventKind::SubscriberPanicked => {
                tracing::error!(seq = e.seq, subscriber = service, info = reason, "[subscriber-panicked]");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(seq = e.seq, subscriber = service, reason, "[subscriber-overflow]");
            }
            EventKind::ProcessCreated => tracing::info!(seq = e.seq, "[process-created]"),
            EventKind::CommandLineInitialized => {
                tracing::info!(seq = e.seq, reason, "[command-line-initialized]");
            }
            EventKind::CommandLineIgnored => {
                tracing::info!(seq = e.seq, "[command-line-ignored] params can only be set at first creation");
            }
            EventKind::DebuggerWaiting => tracing::warn!(seq = e.seq, "[debugger-waiting]"),
            EventKind::DebuggerAttached => tracing::warn!(seq = e.seq, "[debugger-attached]"),
            EventKind::Relaunched => tracing::info!(seq = e.seq, url, "[relaunched]"),
            EventKind::ShutdownRequested => tracing::info!(seq = e.seq, "[shutdown-requested]"),
            EventKind::ProcessDestroyed => tracing::info!(seq = e.seq, "[process-destroyed]"),
            EventKind::LibraryAttached => tracing::info!(seq = e.seq, "[library-attached]"),
            EventKind::LibraryAttachFailed => {
                tracing::error!(seq = e.seq, reason, "[library-attach-failed]");
            }
            EventKind::SubsystemStarting => tracing::info!(seq = e.seq, "[subsystem-starting]"),
            EventKind::SubsystemReady => {
                tracing::info!(seq = e.seq, already_running = ?e.already_running, "[subsystem-ready]");
            }
            EventKind::SubsystemFailed => {
                tracing::error!(seq = e.seq, reason, "[subsystem-failed]");
            }
            EventKind::ViewLaunched => tracing::info!(seq = e.seq, url, "[view-launched]"),
            EventKind::WorkerStartRequested => {
                tracing::info!(seq = e.seq, service, "[worker-start-requested]");
            }
            EventKind::BindRequested => tracing::info!(seq = e.seq, service, "[bind-requested]"),
            EventKind::WorkerBound => tracing::info!(seq = e.seq, service, "[worker-bound]"),
            EventKind::WorkerCapabilityUnavailable => {
                tracing::warn!(seq = e.seq, service, reason, "[capability-unavailable]");
            }
            EventKind::WorkerDisconnected => {
                tracing::warn!(seq = e.seq, service, "[worker-disconnected]");
            }
            EventKind::WorkerUnbound => tracing::info!(seq = e.seq, service, "[worker-unbound]"),
            EventKind::WorkerStopRequested => {
                tracing::info!(seq = e.seq, service, reason, "[worker-stop-requested]");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
