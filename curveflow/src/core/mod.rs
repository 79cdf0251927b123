//! Core types for the curve workflow.

mod params;
mod stage;
mod status;

pub use params::{Parameters, ScalarValue};
pub use stage::Stage;
pub use status::{StageKind, StageStatus, WorkflowStatus};
