//! The five-stage curve workflow.
//!
//! [`Sequencer`] is the synchronous state machine. [`WorkflowDriver`] runs
//! it on a tokio runtime with handlers on worker threads. Both report the
//! same [`WorkflowSnapshot`].

mod driver;
mod job;
mod sequencer;
mod snapshot;

#[cfg(test)]
mod integration_tests;

pub use driver::{CancelHandle, StageWorker, WorkflowDriver};
pub use job::{StageCompletion, StageJob};
pub use sequencer::Sequencer;
pub use snapshot::{StageSnapshot, WorkflowSnapshot};
