//! Testing utilities for curve workflows.
//!
//! This module provides:
//! - Mock stage handlers
//! - Assertions over sequencer state
//! - Sample curves and ready-to-run sequencers

mod assertions;
pub mod fixtures;
mod mocks;

pub use assertions::{
    assert_failed_at, assert_stage_status, assert_stage_statuses, assert_workflow_status,
};
pub use mocks::{
    FailingHandler, MockHandler, PanickingHandler, RecordedCall, RecordingHandler, SlowHandler,
};
