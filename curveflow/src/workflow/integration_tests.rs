//! End-to-end scenarios across the sequencer, handlers, events and driver.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

use super::{Sequencer, WorkflowDriver};
use crate::analysis::{CurveAnalysis, ParameterSuggestions};
use crate::config::AppConfig;
use crate::core::{Parameters, StageKind, StageStatus, WorkflowStatus};
use crate::errors::ProtocolError;
use crate::events::{names, CollectingEventSink, NoOpEventSink};
use crate::stages::{HandlerOutcome, MockStageHandler, StageHandlers};
use crate::testing::{
    assert_failed_at, assert_stage_statuses, assert_workflow_status, fixtures, FailingHandler,
    MockHandler, PanickingHandler, RecordingHandler, SlowHandler,
};

use StageStatus::{Completed, Failed, Pending};

fn sequencer(handlers: StageHandlers) -> Sequencer {
    Sequencer::new(handlers, Arc::new(NoOpEventSink))
}

#[test]
fn all_stages_succeed() {
    let mut seq = sequencer(StageHandlers::pass_through());
    let status = seq.run_to_completion().unwrap();

    assert_eq!(status, WorkflowStatus::Completed);
    assert_eq!(seq.current_index(), 5);
    assert_stage_statuses(&seq, [Completed; 5]);
    assert!(seq.last_error().is_none());
}

#[test]
fn offset_failure_halts_pipeline() {
    let handlers = StageHandlers::pass_through()
        .with(StageKind::Offset, Arc::new(FailingHandler::new("bad offset_distance")));
    let mut seq = sequencer(handlers);
    let status = seq.run_to_completion().unwrap();

    assert_eq!(status, WorkflowStatus::Failed);
    assert_stage_statuses(&seq, [Completed, Completed, Failed, Pending, Pending]);
    assert_failed_at(&seq, StageKind::Offset, "bad offset_distance");
}

#[test]
fn simulated_offset_rejects_zero_distance() {
    let mut seq = fixtures::simulated_sequencer(Arc::new(NoOpEventSink)).unwrap();
    seq.update_parameters(
        StageKind::Offset,
        &Parameters::new().with("offset_distance", 0.0),
    )
    .unwrap();

    seq.run_to_completion().unwrap();
    assert_failed_at(&seq, StageKind::Offset, "bad offset_distance");
}

#[test]
fn handler_error_and_panic_become_stage_failures() {
    let handlers = StageHandlers::pass_through()
        .with(StageKind::Load, Arc::new(FailingHandler::erroring("file not found")));
    let mut seq = sequencer(handlers);
    seq.run_to_completion().unwrap();
    assert_failed_at(&seq, StageKind::Load, "file not found");

    let handlers = StageHandlers::pass_through()
        .with(StageKind::Validate, Arc::new(PanickingHandler::new("index out of bounds")));
    let mut seq = sequencer(handlers);
    seq.run_to_completion().unwrap();
    assert_workflow_status(&seq, WorkflowStatus::Failed);
    assert!(seq
        .last_error()
        .is_some_and(|e| e.message.contains("index out of bounds")));
}

#[test]
fn protocol_violations_leave_state_untouched() {
    let mut seq = sequencer(StageHandlers::pass_through());
    let before = seq.snapshot();

    assert!(seq.execute_current().is_err());
    assert!(seq.advance().is_err());
    assert_eq!(seq.snapshot(), before);

    seq.start().unwrap();
    let running = seq.snapshot();
    assert!(matches!(
        seq.start(),
        Err(ProtocolError::InvalidState { .. })
    ));
    assert_eq!(seq.snapshot(), running);
}

#[test]
fn failed_workflow_needs_reset_or_restart() {
    let handlers = StageHandlers::pass_through()
        .with(StageKind::Optimize, Arc::new(FailingHandler::new("degenerate curve")));
    let mut seq = sequencer(handlers);
    seq.run_to_completion().unwrap();

    assert!(seq.execute_current().is_err());
    assert!(seq.run_to_completion().is_err());

    seq.reset();
    assert_workflow_status(&seq, WorkflowStatus::Idle);
    assert_stage_statuses(&seq, [Pending; 5]);
    assert_eq!(seq.current_index(), 0);
}

#[test]
fn rerun_after_fixing_parameters() {
    let mut seq = sequencer(StageHandlers::simulated());
    seq.run_to_completion().unwrap();
    assert_failed_at(&seq, StageKind::Load, "no input curve file selected");

    seq.reset();
    seq.update_parameters(StageKind::Load, &fixtures::input_parameters("a.svg"))
        .unwrap();
    assert_eq!(seq.run_to_completion().unwrap(), WorkflowStatus::Completed);

    let load = seq.stage(StageKind::Load);
    assert_eq!(load.result.as_ref().unwrap()["file_path"], json!("a.svg"));
    let validate = seq.stage(StageKind::Validate);
    assert_eq!(validate.result.as_ref().unwrap()["quality_score"], json!(0.95));
}

#[test]
fn handlers_see_their_stage_parameters() {
    let mock = Arc::new(MockHandler::with_outcome(
        HandlerOutcome::ok(json!({"curves_generated": 2})).with_message("generated"),
    ));
    let handlers = StageHandlers::pass_through().with(StageKind::Offset, mock.clone());
    let mut seq = sequencer(handlers);
    seq.update_parameters(
        StageKind::Offset,
        &Parameters::new()
            .with("offset_distance", 2.5)
            .with("corner_handling", "sharp"),
    )
    .unwrap();

    seq.run_to_completion().unwrap();

    assert_eq!(mock.call_count(), 1);
    let received = &mock.recorded_parameters()[0];
    assert_eq!(received.get_f64("offset_distance"), Some(2.5));
    assert_eq!(received.get_str("corner_handling"), Some("sharp"));
    assert_eq!(received.get_str("offset_algorithm"), Some("arc_segment"));
    assert_eq!(
        seq.stage(StageKind::Offset).result,
        Some(json!({"curves_generated": 2}))
    );
}

#[test]
fn mockall_handler_called_once_per_run() {
    let mut mock = MockStageHandler::new();
    mock.expect_handle()
        .withf(|kind, _, _| *kind == StageKind::Export)
        .times(1)
        .returning(|_, _, _| Ok(HandlerOutcome::ok(json!({"written": true}))));
    let handlers = StageHandlers::pass_through().with(StageKind::Export, Arc::new(mock));
    let mut seq = sequencer(handlers);

    assert_eq!(seq.run_to_completion().unwrap(), WorkflowStatus::Completed);
}

#[test]
fn order_is_fixed() {
    let recorder = Arc::new(RecordingHandler::new());
    let handlers = StageHandlers::new(
        recorder.clone(),
        recorder.clone(),
        recorder.clone(),
        recorder.clone(),
        recorder.clone(),
    );
    let mut seq = sequencer(handlers);
    seq.run_to_completion().unwrap();
    seq.start().unwrap();
    seq.run_to_completion().unwrap();

    let kinds = recorder.kinds();
    assert_eq!(kinds.len(), 10);
    assert_eq!(kinds[..5].to_vec(), StageKind::ALL.to_vec());
    assert_eq!(kinds[5..].to_vec(), StageKind::ALL.to_vec());
}

#[test]
fn event_stream_for_failed_run() {
    let sink = Arc::new(CollectingEventSink::new());
    let handlers = StageHandlers::pass_through()
        .with(StageKind::Offset, Arc::new(FailingHandler::new("bad offset_distance")));
    let mut seq = Sequencer::new(handlers, sink.clone());
    seq.run_to_completion().unwrap();

    assert_eq!(
        sink.event_types(),
        vec![
            names::WORKFLOW_STARTED,
            names::STAGE_STARTED,
            names::STAGE_COMPLETED,
            names::STAGE_STARTED,
            names::STAGE_COMPLETED,
            names::STAGE_STARTED,
            names::STAGE_FAILED,
            names::WORKFLOW_FAILED,
        ]
    );
    let failures = sink.events_of_type(names::STAGE_FAILED);
    let failed = failures[0].1.as_ref().unwrap();
    assert_eq!(failed["stage"], json!("Offset Curve Generation"));
    assert_eq!(failed["message"], json!("bad offset_distance"));
}

#[test]
fn events_are_scoped_to_their_run() {
    let sink = Arc::new(CollectingEventSink::new());
    let mut seq = Sequencer::new(StageHandlers::pass_through(), sink.clone());
    seq.run_to_completion().unwrap();
    let first = seq.run_id().unwrap().to_string();
    seq.start().unwrap();
    seq.run_to_completion().unwrap();
    let second = seq.run_id().unwrap().to_string();

    assert_ne!(first, second);
    for run in [first, second] {
        let events = sink.events_for_run(&run);
        assert_eq!(events.len(), 12);
        assert_eq!(events[0].0, names::WORKFLOW_STARTED);
        assert_eq!(events[11].0, names::WORKFLOW_COMPLETED);
    }
}

#[test]
fn config_and_suggestions_feed_parameters() {
    let config = AppConfig::from_json_str(r#"{"optimization": {"optimization_level": 7}}"#).unwrap();
    let mut seq = Sequencer::with_config(
        StageHandlers::pass_through(),
        Arc::new(NoOpEventSink),
        &config,
    );
    assert_eq!(
        seq.stage(StageKind::Optimize).parameters.get_i64("optimization_level"),
        Some(7)
    );

    let analysis = CurveAnalysis::analyze(&fixtures::square(200.0, 150)).unwrap();
    ParameterSuggestions::from_analysis(&analysis)
        .apply(&mut seq)
        .unwrap();

    let optimize = &seq.stage(StageKind::Optimize).parameters;
    assert_eq!(optimize.get_i64("optimization_level"), Some(8));
    let offset = &seq.stage(StageKind::Offset).parameters;
    assert_eq!(offset.get_str("offset_algorithm"), Some("parallel"));
    let distance = offset.get_f64("offset_distance").unwrap();
    assert!((distance - 20.0).abs() < 1e-9);

    assert_eq!(seq.run_to_completion().unwrap(), WorkflowStatus::Completed);
}

#[tokio::test]
async fn driver_matches_synchronous_run() {
    let handlers = StageHandlers::pass_through()
        .with(StageKind::Offset, Arc::new(FailingHandler::new("bad offset_distance")));
    let mut driver = WorkflowDriver::new(sequencer(handlers));

    assert_eq!(driver.run().await.unwrap(), WorkflowStatus::Failed);
    assert_stage_statuses(
        driver.sequencer(),
        [Completed, Completed, Failed, Pending, Pending],
    );
    assert_eq!(
        driver.progress().borrow().failed_stage().map(|s| s.kind),
        Some(StageKind::Offset)
    );
}

#[tokio::test]
async fn driver_cancels_slow_stage() {
    let handlers = StageHandlers::pass_through()
        .with(StageKind::Optimize, Arc::new(SlowHandler::with_delay_ms(5_000)));
    let mut driver = WorkflowDriver::new(sequencer(handlers));
    let handle = driver.cancel_handle();

    let canceller = tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        handle.cancel("user pressed stop");
    });
    let status = driver.run().await.unwrap();
    canceller.await.unwrap();

    assert_eq!(status, WorkflowStatus::Failed);
    assert_failed_at(
        driver.sequencer(),
        StageKind::Optimize,
        "cancelled: user pressed stop",
    );
}
