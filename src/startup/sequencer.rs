use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;

use crate::error::{FatalInitError, SequenceError};
use crate::events::{Bus, Event, EventKind};
use crate::main_loop::{MainHandle, MainMessage};
use crate::subscribers::panic_message;

use super::subsystem::Subsystem;

/// Completion of an asynchronous subsystem start.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartupOutcome {
    /// The subsystem is up.
    Succeeded {
        /// The subsystem was already running before this start.
        already_running: bool,
    },
    /// The subsystem could not start.
    Failed {
        /// Why the start failed.
        reason: String,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    Attached,
    Started,
}

/// Drives the [`Subsystem`] through attach and start.
pub struct StartupSequencer {
    subsystem: Arc<dyn Subsystem>,
    main: MainHandle,
    bus: Bus,
    phase: Phase,
}

impl StartupSequencer {
    /// Creates a sequencer that reports completion through `main`.
    pub fn new(subsystem: Arc<dyn Subsystem>, main: MainHandle, bus: Bus) -> Self {
        Self {
            subsystem,
            main,
            bus,
            phase: Phase::Idle,
        }
    }

    /// Attaches the subsystem library. Must precede any start.
    pub fn attach_library(&mut self) -> Result<(), FatalInitError> {
        if self.phase != Phase::Idle {
            return Err(SequenceError::AlreadyAttached.into());
        }
        match self.subsystem.attach_library() {
            Ok(()) => {
                self.phase = Phase::Attached;
                self.bus.publish(Event::new(EventKind::LibraryAttached));
                Ok(())
            }
            Err(error) => {
                self.bus
                    .publish(Event::new(EventKind::LibraryAttachFailed).with_reason(error.reason.clone()));
                Err(FatalInitError::LibraryAttach { error })
            }
        }
    }

    /// Starts the subsystem on the current thread.
    pub fn start_sync(&mut self) -> Result<(), FatalInitError> {
        self.begin_start()?;
        tracing::debug!(subsystem = self.subsystem.name(), "synchronous start");
        self.subsystem
            .start_sync()
            .map_err(|error| FatalInitError::SyncStartup { error })
    }

    /// Starts the subsystem in the background and returns immediately.
    ///
    /// Exactly one [`MainMessage::Startup`] is posted once the start finished.
    /// A panic inside the subsystem is reported as [`StartupOutcome::Failed`].
    pub fn start_async(&mut self) -> Result<(), FatalInitError> {
        self.begin_start()?;
        self.subsystem
            .prepare_start()
            .map_err(|error| FatalInitError::AsyncStartupRequest { error })?;

        let subsystem = Arc::clone(&self.subsystem);
        let main = self.main.clone();
        tokio::spawn(async move {
            let start = AssertUnwindSafe(subsystem.start()).catch_unwind().await;
            let outcome = match start {
                Ok(Ok(already_running)) => StartupOutcome::Succeeded { already_running },
                Ok(Err(e)) => StartupOutcome::Failed { reason: e.reason },
                Err(panic) => StartupOutcome::Failed {
                    reason: format!("subsystem panicked: {}", panic_message(panic.as_ref())),
                },
            };
            tracing::debug!(subsystem = subsystem.name(), ?outcome, "asynchronous start finished");
            if main.post(MainMessage::Startup(outcome)).is_err() {
                tracing::debug!(subsystem = subsystem.name(), "startup outcome dropped: main loop closed");
            }
        });
        Ok(())
    }

    /// True once the library was attached.
    pub fn is_attached(&self) -> bool {
        self.phase != Phase::Idle
    }

    fn begin_start(&mut self) -> Result<(), FatalInitError> {
        match self.phase {
            Phase::Idle => Err(SequenceError::NotAttached.into()),
            Phase::Started => Err(SequenceError::AlreadyStarted.into()),
            Phase::Attached => {
                self.phase = Phase::Started;
                self.bus.publish(Event::new(EventKind::SubsystemStarting));
                Ok(())
            }
        }
    }
}
