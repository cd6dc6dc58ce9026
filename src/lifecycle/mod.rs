//! # Process lifecycle.
//!
//! - [`ProcessLifecycleOrchestrator`] creation sequence, message dispatch, teardown
//! - [`ProcessState`] monotonic process state
//! - [`LaunchRequest`], [`SavedState`] invocation parameters and persisted UI state
//! - [`ShellUi`], [`DebuggerGate`], [`TracerPidGate`] collaborator seams
//! - [`run`] drives the orchestrator from the main loop until destroyed

mod collab;
mod launch;
mod orchestrator;
mod run;
mod shutdown;
mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use collab::{DebuggerGate, ShellUi, TracerPidGate};
pub use launch::{LaunchRequest, SavedState};
pub use orchestrator::{Collaborators, ProcessLifecycleOrchestrator};
pub use run::run;
pub use shutdown::wait_for_shutdown_signal;
pub use state::ProcessState;
