//! # The single main execution context.
//!
//! All lifecycle callbacks (binding completion, startup outcome, re-entry,
//! posted tasks) are delivered as [`MainMessage`]s through one unbounded FIFO
//! and consumed by one loop, so they never run concurrently with each other.
//!
//! ```text
//! StartupSequencer ──┐
//! BindingSink      ──┼──► MainHandle::post ──► [FIFO] ──► MainLoop::next ──► orchestrator.dispatch
//! external re-entry──┘
//! ```

use std::fmt;

use tokio::sync::mpsc;

use crate::error::MainLoopClosed;
use crate::lifecycle::LaunchRequest;
use crate::service::BindingEvent;
use crate::startup::StartupOutcome;

/// Work delivered to the main context.
pub enum MainMessage {
    /// Binding protocol completion from the service host.
    Binding(BindingEvent),
    /// Asynchronous subsystem start finished.
    Startup(StartupOutcome),
    /// External invocation targeting the running process.
    Relaunch(LaunchRequest),
    /// Posted closure, run in order with every other message.
    Run(Box<dyn FnOnce() + Send>),
    /// Close the UI unit and tear down.
    Destroy,
}

impl fmt::Debug for MainMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MainMessage::Binding(ev) => f.debug_tuple("Binding").field(ev).finish(),
            MainMessage::Startup(outcome) => f.debug_tuple("Startup").field(outcome).finish(),
            MainMessage::Relaunch(req) => f.debug_tuple("Relaunch").field(req).finish(),
            MainMessage::Run(_) => f.write_str("Run(..)"),
            MainMessage::Destroy => f.write_str("Destroy"),
        }
    }
}

/// Cloneable sender side of the main context.
#[derive(Clone, Debug)]
pub struct MainHandle {
    tx: mpsc::UnboundedSender<MainMessage>,
}

impl MainHandle {
    /// Enqueues a message.
    pub fn post(&self, msg: MainMessage) -> Result<(), MainLoopClosed> {
        self.tx.send(msg).map_err(|_| MainLoopClosed)
    }

    /// Enqueues a closure to run on the main context.
    pub fn post_task<F>(&self, f: F) -> Result<(), MainLoopClosed>
    where
        F: FnOnce() + Send + 'static,
    {
        self.post(MainMessage::Run(Box::new(f)))
    }

    /// True once the loop was dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiver side of the main context.
#[derive(Debug)]
pub struct MainLoop {
    handle: MainHandle,
    rx: mpsc::UnboundedReceiver<MainMessage>,
}

impl MainLoop {
    /// Creates an empty main loop.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            handle: MainHandle { tx },
            rx,
        }
    }

    /// Returns a handle for posting messages.
    pub fn handle(&self) -> MainHandle {
        self.handle.clone()
    }

    /// Waits for the next message.
    pub async fn next(&mut self) -> Option<MainMessage> {
        self.rx.recv().await
    }

    /// Returns the next message if one is already queued.
    pub fn try_next(&mut self) -> Option<MainMessage> {
        self.rx.try_recv().ok()
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_messages_arrive_in_post_order() {
        let mut main = MainLoop::new();
        let handle = main.handle();
        let counter = Arc::new(AtomicUsize::new(0));

        let c = Arc::clone(&counter);
        handle.post_task(move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        handle.post(MainMessage::Destroy).unwrap();

        match main.next().await {
            Some(MainMessage::Run(f)) => f(),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert!(matches!(main.try_next(), Some(MainMessage::Destroy)));
        assert!(main.try_next().is_none());
    }

    #[test]
    fn test_post_after_drop_fails() {
        let main = MainLoop::new();
        let handle = main.handle();
        drop(main);
        assert!(handle.is_closed());
        assert_eq!(handle.post(MainMessage::Destroy), Err(MainLoopClosed));
    }
}
