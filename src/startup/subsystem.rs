use async_trait::async_trait;

use crate::error::SubsystemError;

/// External subsystem driven through two-phase initialization.
///
/// The library must be attached before any other call. Exactly one of
/// [`start`](Subsystem::start) or [`start_sync`](Subsystem::start_sync) is used per process.
#[async_trait]
pub trait Subsystem: Send + Sync + 'static {
    /// Name used in logs.
    fn name(&self) -> &'static str {
        "subsystem"
    }

    /// Loads the subsystem library.
    fn attach_library(&self) -> Result<(), SubsystemError>;

    /// Checks that an asynchronous start can be issued at all.
    ///
    /// An error here is fatal, unlike a failure reported by [`start`](Subsystem::start).
    fn prepare_start(&self) -> Result<(), SubsystemError> {
        Ok(())
    }

    /// Starts the subsystem; `Ok(true)` when it was already running.
    async fn start(&self) -> Result<bool, SubsystemError>;

    /// Starts the subsystem on the caller's thread (layout-test mode).
    fn start_sync(&self) -> Result<(), SubsystemError>;
}
