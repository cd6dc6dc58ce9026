//! # Collaborators the orchestrator calls into.
//!
//! The UI unit and the debugger are external; the orchestrator reaches them
//! only through [`ShellUi`] and [`DebuggerGate`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::Config;

/// The UI unit hosting views.
///
/// Called only from the main context.
pub trait ShellUi: Send {
    /// Creates a view showing `url` and makes it active.
    fn launch_view(&mut self, url: &str);

    /// Address shown by the active view, if one exists.
    fn active_view_url(&self) -> Option<String>;

    /// Loads `url` into the active view.
    fn load_url(&mut self, url: &str);

    /// Handles a debug action; returns true when it was consumed.
    fn handle_debug_action(&mut self, _action: &str) -> bool {
        false
    }

    /// Applies window state saved by a previous instance.
    fn restore_window_state(&mut self, _state: &BTreeMap<String, String>) {}

    /// Window state to persist.
    fn save_window_state(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }

    /// Shows a short user-visible message.
    fn notify(&mut self, message: &str);

    /// Closes the UI unit.
    fn finish(&mut self);

    /// Releases resources held for the UI unit.
    fn release(&mut self) {}
}

/// Stalls startup until a debugger is attached.
#[async_trait]
pub trait DebuggerGate: Send + Sync {
    /// True if a debugger is attached right now.
    fn is_attached(&self) -> bool;

    /// Resolves once a debugger is attached.
    async fn wait_for_attach(&self);
}

/// [`DebuggerGate`] that polls the `TracerPid` field of a proc status file.
#[derive(Clone, Debug)]
pub struct TracerPidGate {
    status_path: PathBuf,
    poll: Duration,
}

impl TracerPidGate {
    /// Gate for the current process.
    pub fn new(poll: Duration) -> Self {
        Self::with_status_path("/proc/self/status", poll)
    }

    /// Gate polling at [`Config::debugger_poll`].
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.debugger_poll)
    }

    /// Gate reading an arbitrary status file.
    pub fn with_status_path(path: impl Into<PathBuf>, poll: Duration) -> Self {
        Self {
            status_path: path.into(),
            poll: poll.max(Duration::from_millis(1)),
        }
    }
}

#[async_trait]
impl DebuggerGate for TracerPidGate {
    fn is_attached(&self) -> bool {
        match std::fs::read_to_string(&self.status_path) {
            Ok(status) => tracer_pid(&status).is_some_and(|pid| pid != 0),
            Err(e) => {
                tracing::debug!(path = %self.status_path.display(), error = %e, "status unreadable");
                false
            }
        }
    }

    async fn wait_for_attach(&self) {
        while !self.is_attached() {
            tokio::time::sleep(self.poll).await;
        }
    }
}

fn tracer_pid(status: &str) -> Option<u32> {
    status
        .lines()
        .find_map(|line| line.strip_prefix("TracerPid:"))
        .and_then(|pid| pid.trim().parse().ok())
}
