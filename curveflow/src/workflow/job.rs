//! A unit of stage work that can run away from the sequencer.

use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use crate::cancellation::CancellationToken;
use crate::core::{Parameters, StageKind};
use crate::stages::{HandlerOutcome, StageHandler};

/// Everything needed to run one stage handler.
///
/// Produced by [`Sequencer::begin_current`](super::Sequencer::begin_current).
/// It owns a copy of the parameters, so it can be moved to another thread
/// while the sequencer stays where it is.
pub struct StageJob {
    pub(crate) ticket: u64,
    pub(crate) index: usize,
    pub(crate) kind: StageKind,
    pub(crate) parameters: Parameters,
    pub(crate) handler: Arc<dyn StageHandler>,
    pub(crate) cancel: Arc<CancellationToken>,
}

impl StageJob {
    /// The dispatch number the sequencer expects back in the completion.
    #[must_use]
    pub const fn ticket(&self) -> u64 {
        self.ticket
    }

    /// The pipeline position of the stage.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// The stage kind.
    #[must_use]
    pub const fn kind(&self) -> StageKind {
        self.kind
    }

    /// The parameters the handler will receive.
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// Runs the handler and packages its outcome.
    ///
    /// Handler errors and panics become failed outcomes; this never panics.
    #[must_use]
    pub fn run(self) -> StageCompletion {
        let start = Instant::now();
        let handler = &self.handler;
        let result = catch_unwind(AssertUnwindSafe(|| {
            handler.handle(self.kind, &self.parameters, &self.cancel)
        }));

        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(err)) => HandlerOutcome::fail(format!("{err:#}")),
            Err(payload) => HandlerOutcome::fail(format!(
                "handler panicked: {}",
                panic_message(payload.as_ref())
            )),
        };

        StageCompletion {
            ticket: self.ticket,
            index: self.index,
            kind: self.kind,
            outcome,
            duration_ms: start.elapsed().as_secs_f64() * 1000.0,
        }
    }
}

impl fmt::Debug for StageJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageJob")
            .field("ticket", &self.ticket)
            .field("index", &self.index)
            .field("kind", &self.kind)
            .field("parameters", &self.parameters)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// The message a worker posts back when a handler finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct StageCompletion {
    /// The dispatch number of the job that produced this completion.
    pub ticket: u64,
    /// The pipeline position of the stage that ran.
    pub index: usize,
    /// The stage kind that ran.
    pub kind: StageKind,
    /// What the handler reported.
    pub outcome: HandlerOutcome,
    /// Handler wall time in milliseconds.
    pub duration_ms: f64,
}

impl StageCompletion {
    /// A failed completion for a job whose handler never reported back.
    #[must_use]
    pub fn lost(ticket: u64, index: usize, kind: StageKind, reason: impl Into<String>) -> Self {
        Self {
            ticket,
            index,
            kind,
            outcome: HandlerOutcome::fail(reason),
            duration_ms: 0.0,
        }
    }
}
