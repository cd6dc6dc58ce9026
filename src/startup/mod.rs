//! # Two-phase subsystem startup.
//!
//! - [`Subsystem`] the external heavyweight subsystem (engine) seam
//! - [`StartupSequencer`] attach, then start (sync or async), in that order
//! - [`StartupOutcome`] the single completion message of an async start
//!
//! ```text
//! attach_library() ──► start_async() ──► tokio task ──► subsystem.start()
//!      (fatal)              │                              │
//!                           └─ returns immediately         └─► MainMessage::Startup(outcome)  (exactly once)
//! ```

mod sequencer;
mod subsystem;

pub use sequencer::{StartupOutcome, StartupSequencer};
pub use subsystem::Subsystem;
