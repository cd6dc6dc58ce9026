//! # Host-side view of the worker service link.
//!
//! [`WorkerServiceConnection`] owns the binding registration and the
//! capability obtained from it. Every method runs on the main context.
//!
//! ```text
//!            bind()                Connected(Capability)
//! Unbound ───────────► Binding ─────────────────────────► Bound
//!    ▲                    │  Connected(NoCapability)        │ Disconnected
//!    │                    └──► Unbound (stop posted once)   ▼
//!    └────────────── unbind() ◄──────────────── DisconnectedUnexpectedly
//! ```
//!
//! A reply tagged with an older generation than the current bind request, or
//! arriving after `unbind`, is ignored.

use std::sync::Arc;

use crate::error::ServiceError;
use crate::events::{Bus, Event, EventKind};
use crate::main_loop::MainHandle;

use super::host::{BindReply, BindingEvent, BindingEventKind, BindingSink, ServiceHost, ServiceTarget};
use super::worker::WorkerHandle;

/// Binding status as seen by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BindingState {
    /// No usable binding.
    Unbound,
    /// Bind requested, reply pending.
    Binding,
    /// Capability held.
    Bound,
    /// The worker went away while bound.
    DisconnectedUnexpectedly,
}

/// Binding lifecycle of the worker service on the host side.
pub struct WorkerServiceConnection {
    host: Arc<dyn ServiceHost>,
    target: ServiceTarget,
    main: MainHandle,
    bus: Bus,
    state: BindingState,
    capability: Option<WorkerHandle>,
    registered: bool,
    generation: u64,
    stop_posted: bool,
}

impl WorkerServiceConnection {
    /// Creates an unbound connection to `target`.
    pub fn new(host: Arc<dyn ServiceHost>, target: ServiceTarget, main: MainHandle, bus: Bus) -> Self {
        Self {
            host,
            target,
            main,
            bus,
            state: BindingState::Unbound,
            capability: None,
            registered: false,
            generation: 0,
            stop_posted: false,
        }
    }

    /// Requests an asynchronous binding.
    ///
    /// A no-op while a registration is already held.
    pub fn bind(&mut self) -> Result<(), ServiceError> {
        if self.registered {
            tracing::debug!(service = %self.target, state = ?self.state, "bind skipped: already registered");
            return Ok(());
        }
        self.generation += 1;
        self.stop_posted = false;
        self.state = BindingState::Binding;
        self.registered = true;

        let sink = BindingSink::new(self.main.clone(), self.generation);
        if let Err(e) = self.host.bind_service(&self.target, sink) {
            self.state = BindingState::Unbound;
            self.registered = false;
            return Err(e);
        }
        self.bus.publish(Event::new(EventKind::BindRequested).with_service(self.target.name()));
        Ok(())
    }

    /// Applies a binding notification delivered on the main context.
    pub fn handle_event(&mut self, ev: BindingEvent) {
        if !self.registered || ev.generation != self.generation {
            tracing::debug!(
                service = %self.target,
                generation = ev.generation,
                current = self.generation,
                "stale binding event ignored"
            );
            return;
        }
        match ev.kind {
            BindingEventKind::Connected(reply) => self.on_connected(reply),
            BindingEventKind::Disconnected => self.on_disconnected(),
        }
    }

    fn on_connected(&mut self, reply: BindReply) {
        match reply {
            BindReply::Capability(handle) => {
                self.capability = Some(handle);
                self.state = BindingState::Bound;
                self.bus.publish(Event::new(EventKind::WorkerBound).with_service(self.target.name()));
            }
            BindReply::NoCapability => {
                self.capability = None;
                self.state = BindingState::Unbound;
                self.bus.publish(
                    Event::new(EventKind::WorkerCapabilityUnavailable)
                        .with_service(self.target.name())
                        .with_reason("no capability across isolation boundary"),
                );
                self.post_stop();
            }
        }
    }

    fn on_disconnected(&mut self) {
        self.capability = None;
        self.state = BindingState::DisconnectedUnexpectedly;
        self.bus.publish(Event::new(EventKind::WorkerDisconnected).with_service(self.target.name()));
    }

    /// Posts one stop request for the unreachable worker to the main context.
    fn post_stop(&mut self) {
        if self.stop_posted {
            return;
        }
        self.stop_posted = true;

        let host = Arc::clone(&self.host);
        let target = self.target.clone();
        let posted = self.main.post_task(move || {
            if let Err(e) = host.stop_service(&target) {
                tracing::debug!(service = %target, error = %e, label = e.as_label(), "worker stop failed");
            }
        });
        match posted {
            Ok(()) => self.bus.publish(
                Event::new(EventKind::WorkerStopRequested)
                    .with_service(self.target.name())
                    .with_reason("capability unavailable"),
            ),
            Err(e) => tracing::debug!(service = %self.target, error = %e, "worker stop not posted"),
        }
    }

    /// Releases the registration, if any; returns whether one was held.
    ///
    /// Cancels a pending bind: a reply arriving later is ignored.
    pub fn unbind(&mut self) -> bool {
        if !self.registered {
            return false;
        }
        self.registered = false;
        self.capability = None;
        self.state = BindingState::Unbound;
        if let Err(e) = self.host.unbind_service(&self.target) {
            tracing::debug!(service = %self.target, error = %e, label = e.as_label(), "unbind failed");
        }
        self.bus.publish(Event::new(EventKind::WorkerUnbound).with_service(self.target.name()));
        true
    }

    /// Capability held while [`BindingState::Bound`].
    pub fn capability(&self) -> Option<&WorkerHandle> {
        self.capability.as_ref()
    }

    /// Current binding state.
    pub fn state(&self) -> BindingState {
        self.state
    }

    /// True while a binding registration is held.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Target service.
    pub fn target(&self) -> &ServiceTarget {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_loop::{MainLoop, MainMessage};
    use crate::service::LocalServiceHost;

    fn drain(main: &mut MainLoop, conn: &mut WorkerServiceConnection) {
        while let Some(msg) = main.try_next() {
            match msg {
                MainMessage::Binding(ev) => conn.handle_event(ev),
                MainMessage::Run(f) => f(),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    fn setup(isolated: bool) -> (Arc<LocalServiceHost>, MainLoop, WorkerServiceConnection) {
        let host = Arc::new(LocalServiceHost::new(1).isolated(isolated));
        let main = MainLoop::new();
        let conn = WorkerServiceConnection::new(
            host.clone(),
            ServiceTarget::new("worker"),
            main.handle(),
            Bus::new(16),
        );
        (host, main, conn)
    }

    #[tokio::test]
    async fn test_bind_then_connect_holds_capability() {
        let (_host, mut main, mut conn) = setup(false);

        conn.bind().unwrap();
        assert_eq!(conn.state(), BindingState::Binding);
        drain(&mut main, &mut conn);

        assert_eq!(conn.state(), BindingState::Bound);
        assert!(conn.capability().is_some());
    }

    #[tokio::test]
    async fn test_no_capability_stops_worker_but_keeps_registration() {
        let (host, mut main, mut conn) = setup(true);
        host.start_service(conn.target()).unwrap();

        conn.bind().unwrap();
        drain(&mut main, &mut conn);

        assert_eq!(conn.state(), BindingState::Unbound);
        assert!(conn.capability().is_none());
        assert!(conn.is_registered());
        // still bound at the host, so the stop is deferred
        assert!(host.is_running(conn.target()));

        assert!(conn.unbind());
        assert!(!host.is_running(conn.target()));
        assert!(!conn.unbind());
    }

    #[tokio::test]
    async fn test_reply_after_unbind_is_ignored() {
        let (_host, mut main, mut conn) = setup(false);

        conn.bind().unwrap();
        assert!(conn.unbind());
        drain(&mut main, &mut conn);

        assert_eq!(conn.state(), BindingState::Unbound);
        assert!(conn.capability().is_none());
    }

    #[tokio::test]
    async fn test_disconnect_clears_capability() {
        let (host, mut main, mut conn) = setup(false);
        conn.bind().unwrap();
        drain(&mut main, &mut conn);

        host.kill(conn.target()).unwrap();
        drain(&mut main, &mut conn);

        assert_eq!(conn.state(), BindingState::DisconnectedUnexpectedly);
        assert!(conn.capability().is_none());
        assert!(conn.is_registered());
    }
}
