//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted while the host starts, binds its
//! worker service, and tears down.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `ProcessLifecycleOrchestrator`, `WorkerServiceConnection`,
//!   `StartupSequencer`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the `ShellContext` listener (fans out to `SubscriberSet`).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
