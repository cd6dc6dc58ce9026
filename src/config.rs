//! # Global host configuration.
//!
//! Provides [`Config`], the centralized settings for the lifecycle core.
//!
//! Config is used in three places:
//! 1. **Context creation**: `ShellContext::new(config, subscribers)` (bus capacity,
//!    command-line file, defaults for the orchestrator)
//! 2. **Worker service**: `LocalServiceHost` sizes the executor from `worker_threads`
//! 3. **Debugger gate**: `TracerPidGate::from_config` polls at `debugger_poll`
//!
//! ## Sentinel values
//! - `worker_threads = 0` → clamped to 1
//! - `bus_capacity = 0` → clamped to 1
//! - `command_line_file = None` → command line built from launch parameters only

use std::path::PathBuf;
use std::time::Duration;

/// Number of worker threads the task executor runs with by default.
pub const DEFAULT_WORKER_THREADS: usize = 8;

/// Global configuration for the host process.
///
/// ## Field semantics
/// - `worker_threads`: Executor pool size (`0` = clamped to 1)
/// - `bus_capacity`: Event bus ring buffer size (min 1)
/// - `command_line_file`: Optional file holding extra launch switches
/// - `default_view_url`: View shown when nothing else was requested
/// - `startup_failure_message`: Notification text when the subsystem fails to start
/// - `debugger_poll`: Poll interval while waiting for a debugger
/// - `service_name`: Name of the worker service the host binds to
#[derive(Clone, Debug)]
pub struct Config {
    /// Number of worker threads in the worker service's executor.
    pub worker_threads: usize,

    /// Capacity of the event bus broadcast channel ring buffer.
    ///
    /// Slow subscribers that lag behind more than `bus_capacity` messages will
    /// skip older items.
    pub bus_capacity: usize,

    /// File read once, at the first creation, for extra command-line switches.
    ///
    /// A missing file is not an error: the command line is then built from the
    /// launch parameters alone.
    pub command_line_file: Option<PathBuf>,

    /// View address launched when neither a saved view nor a launch URL exists.
    pub default_view_url: String,

    /// Text shown to the user when asynchronous subsystem start fails.
    pub startup_failure_message: String,

    /// How often the debugger gate re-checks for an attached tracer.
    pub debugger_poll: Duration,

    /// Name of the worker service.
    pub service_name: String,
}

impl Config {
    /// Returns the executor pool size, clamped to a minimum of 1.
    #[inline]
    pub fn worker_threads_clamped(&self) -> usize {
        self.worker_threads.max(1)
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `worker_threads = 8`
    /// - `bus_capacity = 1024`
    /// - `command_line_file = None`
    /// - `default_view_url = "about:blank"`
    /// - `debugger_poll = 100ms`
    /// - `service_name = "worker"`
    fn default() -> Self {
        Self {
            worker_threads: DEFAULT_WORKER_THREADS,
            bus_capacity: 1024,
            command_line_file: None,
            default_view_url: "about:blank".to_string(),
            startup_failure_message: "Browser process initialization failed".to_string(),
            debugger_poll: Duration::from_millis(100),
            service_name: "worker".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_use_eight_workers() {
        let cfg = Config::default();
        assert_eq!(cfg.worker_threads, 8);
        assert_eq!(cfg.worker_threads_clamped(), 8);
        assert!(cfg.command_line_file.is_none());
    }

    #[test]
    fn test_zero_values_are_clamped() {
        let cfg = Config {
            worker_threads: 0,
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.worker_threads_clamped(), 1);
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
