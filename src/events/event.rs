//! # Lifecycle events emitted by the orchestrator, connection and sequencer.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Process events**: creation, command line, debugger wait, destruction
//! - **Startup events**: library attach and subsystem start outcome
//! - **Worker events**: service start/stop requests and binding changes
//! - **Subscriber events**: overflow and panics inside subscribers
//!
//! The [`Event`] struct carries additional metadata such as timestamps,
//! the service or view involved, and a reason.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use shellvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::WorkerCapabilityUnavailable)
//!     .with_service("worker")
//!     .with_reason("no capability across isolation boundary");
//!
//! assert_eq!(ev.kind, EventKind::WorkerCapabilityUnavailable);
//! assert_eq!(ev.service.as_deref(), Some("worker"));
//! ```

use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets: `service` (subscriber name), `reason` (panic info).
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets: `service` (subscriber name), `reason` ("full" / "closed").
    SubscriberOverflow,

    // === Process events ===
    /// Orchestrator began its creation sequence.
    ProcessCreated,

    /// The process-wide command line was initialized.
    ///
    /// Sets: `reason` (number of switches/arguments applied).
    CommandLineInitialized,

    /// Launch parameters arrived after initialization and were ignored.
    CommandLineIgnored,

    /// The main context is stalled waiting for a debugger.
    DebuggerWaiting,

    /// A debugger attached; execution resumes.
    DebuggerAttached,

    /// A re-entry invocation reached the running process.
    ///
    /// Sets: `url` (if any).
    Relaunched,

    /// Termination signal observed by the main loop.
    ShutdownRequested,

    /// Teardown finished.
    ProcessDestroyed,

    // === Startup events ===
    /// Library attach succeeded.
    LibraryAttached,

    /// Library attach failed (fatal).
    ///
    /// Sets: `reason`.
    LibraryAttachFailed,

    /// Subsystem start was requested.
    SubsystemStarting,

    /// Subsystem reported a successful start.
    ///
    /// Sets: `already_running`.
    SubsystemReady,

    /// Subsystem reported a failed start.
    ///
    /// Sets: `reason`.
    SubsystemFailed,

    /// A view was launched in the UI unit.
    ///
    /// Sets: `url`.
    ViewLaunched,

    // === Worker events ===
    /// Worker service start was requested.
    ///
    /// Sets: `service`.
    WorkerStartRequested,

    /// Binding to the worker service was requested.
    ///
    /// Sets: `service`.
    BindRequested,

    /// Binding completed with a usable capability.
    ///
    /// Sets: `service`.
    WorkerBound,

    /// Binding completed without a capability (isolation fallback).
    ///
    /// Sets: `service`, `reason`.
    WorkerCapabilityUnavailable,

    /// Worker service went away while bound.
    ///
    /// Sets: `service`.
    WorkerDisconnected,

    /// Binding registration was released.
    ///
    /// Sets: `service`.
    WorkerUnbound,

    /// Worker service stop was requested.
    ///
    /// Sets: `service`, `reason` (what triggered the stop).
    WorkerStopRequested,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Worker service (or subscriber) name, if applicable.
    pub service: Option<Arc<str>>,
    /// View address, if applicable.
    pub url: Option<Arc<str>>,
    /// Whether the subsystem was already running when start was requested.
    pub already_running: Option<bool>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            reason: None,
            service: None,
            url: None,
            already_running: None,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a service name.
    #[inline]
    pub fn with_service(mut self, service: impl Into<Arc<str>>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Attaches a view address.
    #[inline]
    pub fn with_url(mut self, url: impl Into<Arc<str>>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Marks whether the subsystem was already running.
    #[inline]
    pub fn with_already_running(mut self, already_running: bool) -> Self {
        self.already_running = Some(already_running);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_service(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_service(subscriber)
            .with_reason(info)
    }
}
