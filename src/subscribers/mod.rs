//! # Event subscribers for the lifecycle core.
//!
//! This module provides the [`Subscribe`] trait and built-in implementations
//! for handling events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! Event flow:
//!   Orchestrator ── publish(Event) ──► Bus ──► context listener ──► SubscriberSet::emit
//!                                                                      │
//!                                                         ┌────────────┼──────────┐
//!                                                         ▼            ▼          ▼
//!                                                     LogWriter     Metrics    Custom
//! ```
//!
//! ## Implementing custom subscribers
//! ```no_run
//! use shellvisor::{Event, EventKind, Subscribe};
//! use async_trait::async_trait;
//!
//! struct BindAudit;
//!
//! #[async_trait]
//! impl Subscribe for BindAudit {
//!     async fn on_event(&self, event: &Event) {
//!         if event.kind == EventKind::WorkerCapabilityUnavailable {
//!             // record that the worker was unreachable
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str {
//!         "bind-audit"
//!     }
//! }
//! ```

mod log;
mod set;
mod subscribe;

pub use log::LogWriter;
pub use set::SubscriberSet;
pub(crate) use set::panic_message;
pub use subscribe::Subscribe;
