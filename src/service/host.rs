//! # Binding protocol seam.
//!
//! A [`ServiceHost`] is the platform that starts, stops, binds and unbinds
//! services. Binding completes asynchronously: the host answers through the
//! [`BindingSink`] it was handed, which posts a [`BindingEvent`] onto the main
//! context. The reply is a tagged [`BindReply`], never a runtime type check.

use std::fmt;
use std::sync::Arc;

use crate::error::{MainLoopClosed, ServiceError};
use crate::main_loop::{MainHandle, MainMessage};

use super::worker::WorkerHandle;

/// Name of a service the host can run.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ServiceTarget {
    name: Arc<str>,
}

impl ServiceTarget {
    /// Creates a target for the named service.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self { name: name.into() }
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ServiceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// What the worker hands back when a binding completes.
#[derive(Clone, Debug)]
pub enum BindReply {
    /// A usable capability object.
    Capability(WorkerHandle),
    /// The binding crossed an isolation boundary that prevents capability exchange.
    NoCapability,
}

/// Binding protocol notification.
#[derive(Clone, Debug)]
pub enum BindingEventKind {
    /// Binding completed.
    Connected(BindReply),
    /// The service went away while bound.
    Disconnected,
}

/// Binding notification tagged with the bind request it answers.
#[derive(Clone, Debug)]
pub struct BindingEvent {
    /// Bind request generation; stale generations are ignored.
    pub generation: u64,
    /// What happened.
    pub kind: BindingEventKind,
}

/// Reply channel handed to [`ServiceHost::bind_service`].
#[derive(Clone, Debug)]
pub struct BindingSink {
    main: MainHandle,
    generation: u64,
}

impl BindingSink {
    pub(crate) fn new(main: MainHandle, generation: u64) -> Self {
        Self { main, generation }
    }

    /// Reports a completed binding.
    pub fn connected(&self, reply: BindReply) -> Result<(), MainLoopClosed> {
        self.send(BindingEventKind::Connected(reply))
    }

    /// Reports that the service went away.
    pub fn disconnected(&self) -> Result<(), MainLoopClosed> {
        self.send(BindingEventKind::Disconnected)
    }

    fn send(&self, kind: BindingEventKind) -> Result<(), MainLoopClosed> {
        self.main.post(MainMessage::Binding(BindingEvent {
            generation: self.generation,
            kind,
        }))
    }
}

/// Platform operations on services.
///
/// Implementations must not invoke the sink synchronously in a way that
/// re-enters the caller; posting through [`BindingSink`] already defers
/// delivery to the main context.
pub trait ServiceHost: Send + Sync + 'static {
    /// True when services run behind an isolation boundary, so bindings
    /// never carry a capability and the service is not started explicitly.
    fn is_isolated(&self) -> bool {
        false
    }

    /// Starts the service (idempotent).
    fn start_service(&self, target: &ServiceTarget) -> Result<(), ServiceError>;

    /// Requests the service to stop; returns whether it was running.
    fn stop_service(&self, target: &ServiceTarget) -> Result<bool, ServiceError>;

    /// Requests an asynchronous binding; the reply arrives through `sink`.
    fn bind_service(&self, target: &ServiceTarget, sink: BindingSink) -> Result<(), ServiceError>;

    /// Releases the binding registration (also cancels a pending bind).
    fn unbind_service(&self, target: &ServiceTarget) -> Result<(), ServiceError>;
}
