//! Asynchronous execution of a sequencer.
//!
//! Handlers run on tokio's blocking pool. Their results come back as
//! [`StageCompletion`] messages over an mpsc channel, and only the task
//! that owns the [`WorkflowDriver`] ever touches the [`Sequencer`].

use serde_json::json;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::{Sequencer, StageCompletion, StageJob, WorkflowSnapshot};
use crate::cancellation::CancellationToken;
use crate::config::WorkflowConfig;
use crate::core::{StageStatus, WorkflowStatus};
use crate::errors::ProtocolError;
use crate::events::{names, EventSink};

const COMPLETION_CHANNEL_CAPACITY: usize = 8;

/// Runs stage jobs off the async runtime and posts their completions.
#[derive(Debug, Clone)]
pub struct StageWorker {
    completions: mpsc::Sender<StageCompletion>,
}

impl StageWorker {
    /// Creates a worker that reports to `completions`.
    #[must_use]
    pub const fn new(completions: mpsc::Sender<StageCompletion>) -> Self {
        Self { completions }
    }

    /// Runs the job on the blocking pool.
    ///
    /// The returned handle finishes once the completion has been posted.
    pub fn dispatch(&self, job: StageJob) -> JoinHandle<()> {
        let completions = self.completions.clone();
        tokio::task::spawn_blocking(move || {
            let index = job.index();
            let completion = job.run();
            if completions.blocking_send(completion).is_err() {
                warn!(index, "Completion receiver dropped; discarding stage result");
            }
        })
    }
}

/// Trips a driver's cancellation token from another task.
#[derive(Clone)]
pub struct CancelHandle {
    token: Arc<CancellationToken>,
    sink: Arc<dyn EventSink>,
}

impl CancelHandle {
    /// Asks the running handler to stop.
    ///
    /// The handler decides when to return; its failed outcome then fails
    /// the workflow like any other stage failure. Only the first request of
    /// a run is reported to the event sink.
    pub fn cancel(&self, reason: impl Into<String>) {
        let reason = reason.into();
        if self.token.cancel(reason.clone()) {
            info!(reason = %reason, "Workflow cancellation requested");
            self.sink
                .try_emit(names::WORKFLOW_CANCEL_REQUESTED, Some(json!({"reason": reason})));
        }
    }

    /// Whether cancellation has been requested for the current run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl std::fmt::Debug for CancelHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelHandle")
            .field("cancelled", &self.token.is_cancelled())
            .finish_non_exhaustive()
    }
}

/// Owns a [`Sequencer`] and drives it with handlers running on workers.
///
/// Every sequencer mutation happens on the task that awaits the driver,
/// so the state machine needs no locking. Progress is published as a
/// [`WorkflowSnapshot`] on a watch channel after every transition.
pub struct WorkflowDriver {
    sequencer: Sequencer,
    worker: StageWorker,
    completions: mpsc::Receiver<StageCompletion>,
    progress: watch::Sender<WorkflowSnapshot>,
    auto_advance: bool,
}

impl WorkflowDriver {
    /// Creates a driver whose [`WorkflowDriver::step`] stops after each stage.
    #[must_use]
    pub fn new(sequencer: Sequencer) -> Self {
        let (tx, rx) = mpsc::channel(COMPLETION_CHANNEL_CAPACITY);
        let (progress, _) = watch::channel(sequencer.snapshot());
        Self {
            sequencer,
            worker: StageWorker::new(tx),
            completions: rx,
            progress,
            auto_advance: false,
        }
    }

    /// Creates a driver honoring `workflow.auto_advance`.
    #[must_use]
    pub fn with_config(sequencer: Sequencer, config: &WorkflowConfig) -> Self {
        let mut driver = Self::new(sequencer);
        driver.auto_advance = config.auto_advance;
        driver
    }

    /// The driven sequencer.
    #[must_use]
    pub const fn sequencer(&self) -> &Sequencer {
        &self.sequencer
    }

    /// Mutable access for parameter updates between runs.
    pub fn sequencer_mut(&mut self) -> &mut Sequencer {
        &mut self.sequencer
    }

    /// Gives the sequencer back.
    #[must_use]
    pub fn into_inner(self) -> Sequencer {
        self.sequencer
    }

    /// Subscribes to snapshots published after every transition.
    #[must_use]
    pub fn progress(&self) -> watch::Receiver<WorkflowSnapshot> {
        self.progress.subscribe()
    }

    /// A handle that can cancel the running handler from another task.
    #[must_use]
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.sequencer.cancellation_token(),
            sink: self.sequencer.event_sink(),
        }
    }

    /// Requests cancellation of the running handler.
    pub fn cancel(&self, reason: impl Into<String>) {
        self.cancel_handle().cancel(reason);
    }

    /// Starts a run.
    ///
    /// # Errors
    ///
    /// See [`Sequencer::start`].
    pub fn start(&mut self) -> Result<(), ProtocolError> {
        self.sequencer.start()?;
        self.publish();
        Ok(())
    }

    /// Moves past the completed current stage.
    ///
    /// # Errors
    ///
    /// See [`Sequencer::advance`].
    pub fn advance(&mut self) -> Result<(), ProtocolError> {
        self.sequencer.advance()?;
        self.publish();
        Ok(())
    }

    /// Returns the sequencer to idle.
    pub fn reset(&mut self) {
        self.drain_pending();
        self.sequencer.reset();
        self.publish();
    }

    /// Executes the current stage on a worker.
    ///
    /// An idle workflow is started first. With auto-advance enabled, a
    /// successful stage is also advanced past. Returns whether the stage
    /// succeeded.
    ///
    /// # Errors
    ///
    /// See [`Sequencer::begin_current`] and [`Sequencer::advance`].
    pub async fn step(&mut self) -> Result<bool, ProtocolError> {
        if self.sequencer.overall_status() == WorkflowStatus::Idle {
            self.start()?;
        }
        let success = self.execute_current().await?;
        if success && self.auto_advance {
            self.advance()?;
        }
        Ok(success)
    }

    /// Executes and advances until the workflow stops running.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the workflow already finished.
    pub async fn run(&mut self) -> Result<WorkflowStatus, ProtocolError> {
        match self.sequencer.overall_status() {
            WorkflowStatus::Idle => self.start()?,
            WorkflowStatus::Running => {}
            status @ (WorkflowStatus::Completed | WorkflowStatus::Failed) => {
                let err = ProtocolError::invalid_state("run", status, "workflow already finished");
                warn!(code = err.code(), "{}", err);
                return Err(err);
            }
        }

        while self.sequencer.overall_status() == WorkflowStatus::Running {
            let completed = self
                .sequencer
                .current_stage()
                .is_some_and(|s| s.status == StageStatus::Completed);
            if completed {
                self.advance()?;
                continue;
            }
            if !self.execute_current().await? {
                break;
            }
        }

        let status = self.sequencer.overall_status();
        info!(%status, "Workflow driver finished");
        Ok(status)
    }

    async fn execute_current(&mut self) -> Result<bool, ProtocolError> {
        self.drain_pending();
        let job = self.sequencer.begin_current()?;
        self.publish();

        let (ticket, index, kind) = (job.ticket(), job.index(), job.kind());
        debug!(stage = kind.display_name(), index, ticket, "Dispatching stage to worker");
        let handle = self.worker.dispatch(job);

        let completion = match handle.await {
            Ok(()) => self.receive(ticket).await,
            Err(err) => {
                error!(stage = kind.display_name(), error = %err, "Stage worker failed");
                None
            }
        }
        .unwrap_or_else(|| {
            StageCompletion::lost(ticket, index, kind, "stage worker stopped before reporting")
        });

        let success = self.sequencer.finish_current(completion)?;
        self.publish();
        Ok(success)
    }

    /// Waits for the completion of the job with `ticket`.
    ///
    /// Completions of jobs from abandoned steps may be queued ahead of it;
    /// they are dropped.
    async fn receive(&mut self, ticket: u64) -> Option<StageCompletion> {
        loop {
            let completion = self.completions.recv().await?;
            if completion.ticket == ticket {
                return Some(completion);
            }
            debug!(
                expected = ticket,
                got = completion.ticket,
                "Dropped completion of an abandoned job"
            );
        }
    }

    /// Applies completions left over from an abandoned step.
    fn drain_pending(&mut self) {
        while let Ok(completion) = self.completions.try_recv() {
            if let Err(err) = self.sequencer.finish_current(completion) {
                debug!(code = err.code(), "Dropped pending completion");
            }
        }
    }

    fn publish(&self) {
        self.progress.send_replace(self.sequencer.snapshot());
    }
}

impl std::fmt::Debug for WorkflowDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowDriver")
            .field("sequencer", &self.sequencer)
            .field("auto_advance", &self.auto_advance)
            .finish_non_exhaustive()
    }
}
