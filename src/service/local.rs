//! # In-process service host.
//!
//! [`LocalServiceHost`] runs [`WorkerService`]s inside the current process and
//! follows the usual bound-service rules:
//!
//! - binding creates the service if it is not running
//! - a service stays alive while started **or** bound
//! - a stop request against a bound service takes effect on unbind
//! - `kill` simulates the worker dying; bound clients see `Disconnected`
//!
//! With `isolated` set, every binding completes with [`BindReply::NoCapability`]
//! (the worker lives behind a boundary that does not allow capability exchange).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::Config;
use crate::error::ServiceError;

use super::host::{BindReply, BindingSink, ServiceHost, ServiceTarget};
use super::worker::WorkerService;

#[derive(Default)]
struct Slot {
    service: Option<Arc<WorkerService>>,
    started: bool,
    binding: Option<BindingSink>,
}

impl Slot {
    fn is_idle(&self) -> bool {
        !self.started && self.binding.is_none()
    }
}

/// Service host running workers in this process.
pub struct LocalServiceHost {
    workers: usize,
    isolated: bool,
    slots: Mutex<HashMap<ServiceTarget, Slot>>,
}

impl LocalServiceHost {
    /// Creates a host whose services run `workers` executor threads.
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            isolated: false,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a host sized from [`Config::worker_threads`].
    pub fn from_config(cfg: &Config) -> Self {
        Self::new(cfg.worker_threads_clamped())
    }

    /// Makes every binding complete without a capability.
    pub fn isolated(mut self, isolated: bool) -> Self {
        self.isolated = isolated;
        self
    }

    /// Returns the running service instance, if any.
    pub fn running(&self, target: &ServiceTarget) -> Option<Arc<WorkerService>> {
        self.lock()
            .get(target)
            .and_then(|slot| slot.service.as_ref().map(Arc::clone))
    }

    /// Returns true while the service instance exists.
    pub fn is_running(&self, target: &ServiceTarget) -> bool {
        self.running(target).is_some()
    }

    /// Destroys the service as if its process died.
    ///
    /// A bound client is told the service disconnected. Killed services are
    /// not recreated.
    pub fn kill(&self, target: &ServiceTarget) -> Result<(), ServiceError> {
        let sink = {
            let mut slots = self.lock();
            let Some(service) = slots.get_mut(target).and_then(|slot| {
                slot.started = false;
                slot.service.take()
            }) else {
                return Err(ServiceError::NotRunning {
                    name: target.name().to_string(),
                });
            };
            service.on_destroy();
            slots.get(target).and_then(|slot| slot.binding.clone())
        };
        tracing::debug!(service = %target, "service killed");

        if let Some(sink) = sink {
            if sink.disconnected().is_err() {
                tracing::debug!(service = %target, "disconnect not delivered: main loop closed");
            }
        }
        self.destroy_if_idle(target);
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<ServiceTarget, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_running(&self, target: &ServiceTarget) -> Result<Arc<WorkerService>, ServiceError> {
        let mut slots = self.lock();
        let slot = slots.entry(target.clone()).or_default();
        if let Some(service) = &slot.service {
            return Ok(Arc::clone(service));
        }
        let service = WorkerService::new(target.name(), self.workers)?;
        slot.service = Some(Arc::clone(&service));
        Ok(service)
    }

    fn reply(&self, service: &Arc<WorkerService>, sink: &BindingSink) {
        let reply = if self.isolated {
            BindReply::NoCapability
        } else {
            BindReply::Capability(service.on_bind())
        };
        if sink.connected(reply).is_err() {
            tracing::debug!(service = service.name(), "bind reply not delivered: main loop closed");
        }
    }

    fn destroy_if_idle(&self, target: &ServiceTarget) {
        let mut slots = self.lock();
        if slots.get(target).is_some_and(Slot::is_idle) {
            if let Some(service) = slots.remove(target).and_then(|slot| slot.service) {
                service.on_destroy();
            }
        }
    }
}

impl ServiceHost for LocalServiceHost {
    fn is_isolated(&self) -> bool {
        self.isolated
    }

    fn start_service(&self, target: &ServiceTarget) -> Result<(), ServiceError> {
        let service = self.ensure_running(target)?;
        let mut slots = self.lock();
        let slot = slots.entry(target.clone()).or_default();
        slot.started = true;
        tracing::debug!(service = %target, workers = service.executor().workers(), "service started");
        Ok(())
    }

    fn stop_service(&self, target: &ServiceTarget) -> Result<bool, ServiceError> {
        let was_running = {
            let mut slots = self.lock();
            match slots.get_mut(target) {
                Some(slot) => {
                    slot.started = false;
                    if slot.binding.is_some() {
                        tracing::debug!(service = %target, "stop deferred until unbound");
                    }
                    slot.service.is_some()
                }
                None => false,
            }
        };
        self.destroy_if_idle(target);
        Ok(was_running)
    }

    fn bind_service(&self, target: &ServiceTarget, sink: BindingSink) -> Result<(), ServiceError> {
        let service = self.ensure_running(target)?;
        if let Some(slot) = self.lock().get_mut(target) {
            slot.binding = Some(sink.clone());
        }
        self.reply(&service, &sink);
        Ok(())
    }

    fn unbind_service(&self, target: &ServiceTarget) -> Result<(), ServiceError> {
        if let Some(slot) = self.lock().get_mut(target) {
            slot.binding = None;
        }
        self.destroy_if_idle(target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::main_loop::{MainLoop, MainMessage};
    use crate::service::{BindingEvent, BindingEventKind};

    fn target() -> ServiceTarget {
        ServiceTarget::new("worker")
    }

    fn next_binding(main: &mut MainLoop) -> BindingEvent {
        match main.try_next() {
            Some(MainMessage::Binding(ev)) => ev,
            other => panic!("expected binding event, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_bind_creates_service_and_replies_with_capability() {
        let host = LocalServiceHost::new(2);
        let mut main = MainLoop::new();

        host.bind_service(&target(), BindingSink::new(main.handle(), 1))
            .unwrap();

        assert!(host.is_running(&target()));
        let ev = next_binding(&mut main);
        assert_eq!(ev.generation, 1);
        assert!(matches!(
            ev.kind,
            BindingEventKind::Connected(BindReply::Capability(_))
        ));
    }

    #[tokio::test]
    async fn test_isolated_host_replies_without_capability() {
        let host = LocalServiceHost::new(1).isolated(true);
        let mut main = MainLoop::new();
        assert!(host.is_isolated());
        assert!(!LocalServiceHost::new(1).is_isolated());

        host.bind_service(&target(), BindingSink::new(main.handle(), 7))
            .unwrap();

        let ev = next_binding(&mut main);
        assert!(matches!(
            ev.kind,
            BindingEventKind::Connected(BindReply::NoCapability)
        ));
    }

    #[tokio::test]
    async fn test_stop_while_bound_waits_for_unbind() {
        let host = LocalServiceHost::new(1);
        let main = MainLoop::new();

        host.start_service(&target()).unwrap();
        host.bind_service(&target(), BindingSink::new(main.handle(), 1))
            .unwrap();
        let service = host.running(&target()).unwrap();

        assert!(host.stop_service(&target()).unwrap());
        assert!(host.is_running(&target()));

        host.unbind_service(&target()).unwrap();
        assert!(!host.is_running(&target()));
        assert!(service.executor().is_shutdown());
        assert!(!host.stop_service(&target()).unwrap());
    }

    #[tokio::test]
    async fn test_kill_notifies_bound_client_and_does_not_restart() {
        let host = LocalServiceHost::new(1);
        let mut main = MainLoop::new();

        host.start_service(&target()).unwrap();
        host.bind_service(&target(), BindingSink::new(main.handle(), 3))
            .unwrap();
        let _connected = next_binding(&mut main);

        host.kill(&target()).unwrap();

        let ev = next_binding(&mut main);
        assert!(matches!(ev.kind, BindingEventKind::Disconnected));
        assert!(!host.is_running(&target()));
        assert!(main.try_next().is_none());
    }

    #[test]
    fn test_kill_unknown_service_fails() {
        let host = LocalServiceHost::new(1);
        let err = host.kill(&target()).unwrap_err();
        assert_eq!(err.as_label(), "service_not_running");
    }
}
