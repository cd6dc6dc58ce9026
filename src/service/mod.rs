//! # Worker service and the binding protocol.
//!
//! ```text
//!  host process                                   worker service
//! ┌──────────────────────────┐   bind_service   ┌─────────────────────────┐
//! │ WorkerServiceConnection  │ ───────────────► │ ServiceHost             │
//! │  state: BindingState     │                  │  └─ WorkerService       │
//! │  capability: WorkerHandle│ ◄─────────────── │      └─ BoundedTaskExec │
//! └──────────────────────────┘   BindingSink    └─────────────────────────┘
//!            ▲                  (MainMessage::Binding on the main context)
//!            └── Capability(handle) | NoCapability | Disconnected
//! ```
//!
//! ## Contents
//! - [`ServiceHost`] start/stop/bind/unbind seam; [`LocalServiceHost`] in-process implementation
//! - [`BindingSink`], [`BindingEvent`], [`BindReply`] the reply side of the protocol
//! - [`WorkerService`], [`WorkerHandle`] the service and its capability object
//! - [`WorkerServiceConnection`], [`BindingState`] the host's view of the link

mod connection;
mod host;
mod local;
mod worker;

pub use connection::{BindingState, WorkerServiceConnection};
pub use host::{BindReply, BindingEvent, BindingEventKind, BindingSink, ServiceHost, ServiceTarget};
pub use local::LocalServiceHost;
pub use worker::{WorkerHandle, WorkerService};
