//! The linear five-stage workflow state machine.

use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{StageCompletion, StageJob, StageSnapshot, WorkflowSnapshot};
use crate::cancellation::CancellationToken;
use crate::config::AppConfig;
use crate::core::{Parameters, Stage, StageKind, StageStatus, WorkflowStatus};
use crate::errors::{CurveflowError, ProtocolError, StageExecutionError};
use crate::events::{names, EventSink};
use crate::stages::StageHandlers;

/// Walks the five stages in order, one at a time.
///
/// State moves `idle → running → {completed, failed}`. The terminal states
/// stay put until [`Sequencer::start`] or [`Sequencer::reset`]. Only the
/// owner mutates the sequencer; handlers influence it solely through the
/// outcome they return.
pub struct Sequencer {
    stages: Vec<Stage>,
    current_index: usize,
    status: WorkflowStatus,
    run_id: Option<Uuid>,
    dispatched: u64,
    in_flight: Option<u64>,
    last_error: Option<StageExecutionError>,
    handlers: StageHandlers,
    sink: Arc<dyn EventSink>,
    cancel: Arc<CancellationToken>,
}

impl Sequencer {
    /// Creates an idle sequencer with default stage parameters.
    #[must_use]
    pub fn new(handlers: StageHandlers, sink: Arc<dyn EventSink>) -> Self {
        Self::from_stages(StageKind::ALL.map(Stage::new).into(), handlers, sink)
    }

    /// Creates an idle sequencer with stage parameters seeded from configuration.
    #[must_use]
    pub fn with_config(handlers: StageHandlers, sink: Arc<dyn EventSink>, config: &AppConfig) -> Self {
        let stages = StageKind::ALL
            .map(|kind| Stage::with_parameters(kind, config.stage_defaults(kind)))
            .into();
        Self::from_stages(stages, handlers, sink)
    }

    fn from_stages(stages: Vec<Stage>, handlers: StageHandlers, sink: Arc<dyn EventSink>) -> Self {
        Self {
            stages,
            current_index: 0,
            status: WorkflowStatus::Idle,
            run_id: None,
            dispatched: 0,
            in_flight: None,
            last_error: None,
            handlers,
            sink,
            cancel: Arc::new(CancellationToken::new()),
        }
    }

    /// Overall workflow status.
    #[must_use]
    pub const fn overall_status(&self) -> WorkflowStatus {
        self.status
    }

    /// Index of the stage to execute next; equals the stage count when done.
    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    /// Number of stages.
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// All stages in pipeline order.
    #[must_use]
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    /// The record for one stage.
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> &Stage {
        &self.stages[kind.index()]
    }

    /// The stage at the current index, if any remain.
    #[must_use]
    pub fn current_stage(&self) -> Option<&Stage> {
        self.stages.get(self.current_index)
    }

    /// Id of the run started by the last [`Sequencer::start`].
    #[must_use]
    pub const fn run_id(&self) -> Option<Uuid> {
        self.run_id
    }

    /// The failure that stopped the current run, if any.
    #[must_use]
    pub const fn last_error(&self) -> Option<&StageExecutionError> {
        self.last_error.as_ref()
    }

    /// The token handed to every handler of this sequencer.
    #[must_use]
    pub fn cancellation_token(&self) -> Arc<CancellationToken> {
        Arc::clone(&self.cancel)
    }

    /// The sink this sequencer reports to.
    #[must_use]
    pub fn event_sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    /// Starts a run from the first stage.
    ///
    /// A finished or failed run is cleared first; parameters are kept.
    ///
    /// # Errors
    ///
    /// `InvalidState` if a run is already in progress.
    pub fn start(&mut self) -> Result<(), ProtocolError> {
        if self.status == WorkflowStatus::Running {
            return Err(self.violation("start", "workflow is already running"));
        }
        if self.status.is_terminal() {
            self.clear_run();
        }

        let run_id = Uuid::new_v4();
        self.status = WorkflowStatus::Running;
        self.current_index = 0;
        self.run_id = Some(run_id);
        self.last_error = None;
        self.cancel.reset();

        info!(%run_id, "Workflow started");
        self.emit(names::WORKFLOW_STARTED, json!({"stage_count": self.stages.len()}));
        Ok(())
    }

    /// Marks the current stage running and hands out the job that performs it.
    ///
    /// The job may be run on another thread; its [`StageCompletion`] must be
    /// fed back through [`Sequencer::finish_current`] before anything else
    /// happens to this sequencer.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the workflow is not running or the current stage
    /// has already been dispatched; `OutOfRange` if no stage remains.
    pub fn begin_current(&mut self) -> Result<StageJob, ProtocolError> {
        if self.status != WorkflowStatus::Running {
            return Err(self.violation("execute_current", "workflow is not running"));
        }
        let index = self.current_index;
        let count = self.stages.len();
        let Some(stage) = self.stages.get_mut(index) else {
            return Err(ProtocolError::OutOfRange { index, count });
        };
        if stage.status != StageStatus::Pending {
            let detail = format!("stage '{}' is already {}", stage.name(), stage.status);
            return Err(self.violation("execute_current", detail));
        }

        stage.status = StageStatus::Running;
        stage.started_at = Some(Utc::now());
        let kind = stage.kind;
        let parameters = stage.parameters.clone();
        self.dispatched += 1;
        let ticket = self.dispatched;
        self.in_flight = Some(ticket);

        info!(stage = kind.display_name(), index, ticket, "Stage started");
        self.emit(names::STAGE_STARTED, json!({"index": index, "stage": kind.display_name()}));

        Ok(StageJob {
            ticket,
            index,
            kind,
            parameters,
            handler: Arc::clone(self.handlers.get(kind)),
            cancel: Arc::clone(&self.cancel),
        })
    }

    /// Records a handler's completion against the running stage.
    ///
    /// Returns `true` if the stage completed and `false` if it failed. A
    /// failure also fails the workflow.
    ///
    /// # Errors
    ///
    /// `StaleCompletion` if the completion does not belong to the job that
    /// is currently running, for example one dispatched before a reset.
    pub fn finish_current(&mut self, completion: StageCompletion) -> Result<bool, ProtocolError> {
        let index = self.current_index;
        let running = self.status == WorkflowStatus::Running
            && self
                .stages
                .get(index)
                .is_some_and(|s| s.status == StageStatus::Running);
        if !running || completion.index != index || Some(completion.ticket) != self.in_flight {
            warn!(
                expected = index,
                got = completion.index,
                ticket = completion.ticket,
                "Discarding completion for a job that is not running"
            );
            return Err(ProtocolError::StaleCompletion {
                expected: running.then_some(index),
                got: completion.index,
            });
        }

        self.in_flight = None;
        let stage = &mut self.stages[index];
        let kind = stage.kind;
        let outcome = completion.outcome;
        stage.ended_at = Some(Utc::now());
        stage.duration_ms = Some(completion.duration_ms);
        stage.result = outcome.result;
        stage.message = (!outcome.message.is_empty()).then_some(outcome.message);

        if outcome.success {
            stage.status = StageStatus::Completed;
            info!(
                stage = kind.display_name(),
                index,
                duration_ms = completion.duration_ms,
                "Stage completed"
            );
            self.emit(
                names::STAGE_COMPLETED,
                json!({
                    "index": index,
                    "stage": kind.display_name(),
                    "duration_ms": completion.duration_ms,
                }),
            );
            return Ok(true);
        }

        stage.status = StageStatus::Failed;
        let message = stage
            .message
            .clone()
            .unwrap_or_else(|| "stage handler reported failure".to_string());
        self.status = WorkflowStatus::Failed;

        error!(stage = kind.display_name(), index, message = %message, "Stage failed");
        self.emit(
            names::STAGE_FAILED,
            json!({"index": index, "stage": kind.display_name(), "message": message}),
        );
        self.emit(names::WORKFLOW_FAILED, json!({"failed_stage": kind.display_name()}));
        self.last_error = Some(StageExecutionError::new(kind, message));
        Ok(false)
    }

    /// Runs the current stage's handler inline.
    ///
    /// Returns `true` on success and `false` on failure. After a failure
    /// the workflow is `failed` and must be reset or restarted.
    ///
    /// # Errors
    ///
    /// See [`Sequencer::begin_current`].
    pub fn execute_current(&mut self) -> Result<bool, ProtocolError> {
        let job = self.begin_current()?;
        let completion = job.run();
        self.finish_current(completion)
    }

    /// Moves past the completed current stage.
    ///
    /// Advancing past the last stage completes the workflow.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the current stage has not completed.
    pub fn advance(&mut self) -> Result<(), ProtocolError> {
        let completed = self.status == WorkflowStatus::Running
            && self
                .current_stage()
                .is_some_and(|s| s.status == StageStatus::Completed);
        if !completed {
            let detail = self.current_stage().map_or_else(
                || "no stage remains".to_string(),
                |s| format!("stage '{}' is {}", s.name(), s.status),
            );
            return Err(self.violation("advance", detail));
        }

        self.current_index += 1;
        if self.current_index == self.stages.len() {
            self.status = WorkflowStatus::Completed;
            info!(run_id = ?self.run_id, "Workflow completed");
            self.emit(names::WORKFLOW_COMPLETED, json!({"stage_count": self.stages.len()}));
        }
        Ok(())
    }

    /// Returns to `idle` with every stage pending. Parameters are kept.
    pub fn reset(&mut self) {
        self.clear_run();
        self.status = WorkflowStatus::Idle;
        self.run_id = None;
        info!("Workflow reset");
        self.emit(names::WORKFLOW_RESET, json!({}));
    }

    /// Executes and advances until the workflow stops running.
    ///
    /// An idle workflow is started first. Stops at the first failed stage,
    /// leaving the current index on it.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the workflow already finished; call
    /// [`Sequencer::start`] or [`Sequencer::reset`] first.
    pub fn run_to_completion(&mut self) -> Result<WorkflowStatus, ProtocolError> {
        match self.status {
            WorkflowStatus::Idle => self.start()?,
            WorkflowStatus::Running => {}
            WorkflowStatus::Completed | WorkflowStatus::Failed => {
                return Err(self.violation("run_to_completion", "workflow already finished"));
            }
        }

        while self.status == WorkflowStatus::Running {
            if !self.execute_current()? {
                break;
            }
            self.advance()?;
        }
        Ok(self.status)
    }

    /// Merges validated values into a stage's parameters.
    ///
    /// # Errors
    ///
    /// `Parameter` if a declared value is out of range or of the wrong
    /// type; `Protocol` while a run is in progress.
    pub fn update_parameters(
        &mut self,
        kind: StageKind,
        parameters: &Parameters,
    ) -> Result<(), CurveflowError> {
        if self.status == WorkflowStatus::Running {
            return Err(self
                .violation("update_parameters", "parameters are frozen while running")
                .into());
        }
        kind.validate_parameters(parameters)?;

        self.stages[kind.index()].parameters.merge(parameters);
        info!(stage = kind.display_name(), keys = parameters.len(), "Stage parameters updated");
        self.emit(
            names::STAGE_PARAMETERS_UPDATED,
            json!({"stage": kind.display_name(), "parameters": parameters.to_json()}),
        );
        Ok(())
    }

    /// A copy of the current state for display.
    #[must_use]
    pub fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            status: self.status,
            current_step: self.current_index,
            total_steps: self.stages.len(),
            run_id: self.run_id,
            steps: self.stages.iter().map(StageSnapshot::from).collect(),
        }
    }

    fn clear_run(&mut self) {
        for stage in &mut self.stages {
            stage.reset();
        }
        self.current_index = 0;
        self.in_flight = None;
        self.last_error = None;
        self.cancel.reset();
    }

    fn violation(&self, operation: &'static str, detail: impl Into<String>) -> ProtocolError {
        let err = ProtocolError::invalid_state(operation, self.status, detail);
        warn!(code = err.code(), "{}", err);
        err
    }

    fn emit(&self, event_type: &str, mut data: serde_json::Value) {
        if let (Some(run_id), Some(map)) = (self.run_id, data.as_object_mut()) {
            map.insert("run_id".to_string(), json!(run_id.to_string()));
        }
        self.sink.try_emit(event_type, Some(data));
    }
}

impl std::fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sequencer")
            .field("status", &self.status)
            .field("current_index", &self.current_index)
            .field("run_id", &self.run_id)
            .field("stages", &self.stages)
            .finish_non_exhaustive()
    }
}
