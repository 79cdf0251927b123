//! Test assertions for sequencer state.

use crate::core::{StageKind, StageStatus, WorkflowStatus};
use crate::workflow::Sequencer;

/// Asserts the overall workflow status.
pub fn assert_workflow_status(sequencer: &Sequencer, expected: WorkflowStatus) {
    assert_eq!(
        sequencer.overall_status(),
        expected,
        "Expected workflow {:?}, got {:?}",
        expected,
        sequencer.overall_status()
    );
}

/// Asserts the status of one stage.
pub fn assert_stage_status(sequencer: &Sequencer, kind: StageKind, expected: StageStatus) {
    let actual = sequencer.stage(kind).status;
    assert_eq!(
        actual, expected,
        "Expected stage '{kind}' to be {expected:?}, got {actual:?}"
    );
}

/// Asserts the status of every stage in pipeline order.
pub fn assert_stage_statuses(sequencer: &Sequencer, expected: [StageStatus; 5]) {
    let actual: Vec<StageStatus> = sequencer.stages().iter().map(|s| s.status).collect();
    assert_eq!(
        actual,
        expected.to_vec(),
        "Stage statuses differ from expectation"
    );
}

/// Asserts that the workflow failed at `kind` with `message`.
pub fn assert_failed_at(sequencer: &Sequencer, kind: StageKind, message: &str) {
    assert_workflow_status(sequencer, WorkflowStatus::Failed);
    assert_stage_status(sequencer, kind, StageStatus::Failed);
    assert_eq!(sequencer.current_index(), kind.index());
    let recorded = sequencer.last_error().map(|e| (e.stage, e.message.as_str()));
    assert_eq!(
        recorded,
        Some((kind, message)),
        "Expected failure in '{kind}' with '{message}', got {recorded:?}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NoOpEventSink;
    use crate::stages::StageHandlers;
    use crate::testing::FailingHandler;
    use std::sync::Arc;

    #[test]
    fn test_assert_fresh_sequencer() {
        let seq = Sequencer::new(StageHandlers::pass_through(), Arc::new(NoOpEventSink));
        assert_workflow_status(&seq, WorkflowStatus::Idle);
        assert_stage_statuses(&seq, [StageStatus::Pending; 5]);
    }

    #[test]
    #[should_panic(expected = "Expected workflow")]
    fn test_assert_workflow_status_fails() {
        let seq = Sequencer::new(StageHandlers::pass_through(), Arc::new(NoOpEventSink));
        assert_workflow_status(&seq, WorkflowStatus::Completed);
    }

    #[test]
    fn test_assert_failed_at() {
        let handlers = StageHandlers::pass_through()
            .with(StageKind::Validate, Arc::new(FailingHandler::new("gaps found")));
        let mut seq = Sequencer::new(handlers, Arc::new(NoOpEventSink));
        seq.run_to_completion().unwrap();

        assert_failed_at(&seq, StageKind::Validate, "gaps found");
    }
}
