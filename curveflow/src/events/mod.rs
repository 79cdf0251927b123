//! Workflow lifecycle events.
//!
//! The sequencer reports every transition to an injected [`EventSink`].
//! Event types are dotted names; payloads are small JSON objects carrying
//! the run id, stage index and stage name.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the sequencer and driver.
pub mod names {
    /// A run was started.
    pub const WORKFLOW_STARTED: &str = "workflow.started";
    /// Every stage completed.
    pub const WORKFLOW_COMPLETED: &str = "workflow.completed";
    /// A stage failed and the run stopped.
    pub const WORKFLOW_FAILED: &str = "workflow.failed";
    /// The workflow was reset to idle.
    pub const WORKFLOW_RESET: &str = "workflow.reset";
    /// Cancellation was requested by the driver's owner.
    pub const WORKFLOW_CANCEL_REQUESTED: &str = "workflow.cancel_requested";
    /// A stage handler was dispatched.
    pub const STAGE_STARTED: &str = "stage.started";
    /// A stage handler succeeded.
    pub const STAGE_COMPLETED: &str = "stage.completed";
    /// A stage handler failed.
    pub const STAGE_FAILED: &str = "stage.failed";
    /// Stage parameters were changed.
    pub const STAGE_PARAMETERS_UPDATED: &str = "stage.parameters_updated";
}
