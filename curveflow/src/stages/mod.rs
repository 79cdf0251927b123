//! Stage handler contract and built-in handlers.
//!
//! The actual curve work (loading, optimization, offsetting) happens in
//! external plugins. A [`StageHandler`] is the seam where those plugins are
//! invoked; the sequencer only sees the [`HandlerOutcome`] that comes back.

mod handlers;
mod outcome;
pub mod simulated;

pub use handlers::StageHandlers;
pub use outcome::HandlerOutcome;

use crate::cancellation::CancellationToken;
use crate::core::{Parameters, StageKind};
use std::fmt;

/// Performs the work of one stage.
///
/// Returning `Ok` with an unsuccessful outcome, returning `Err`, and
/// panicking are all recorded by the sequencer as a failed stage.
/// Long-running handlers should poll `cancel` and return a failed outcome
/// once it trips.
#[cfg_attr(test, mockall::automock)]
pub trait StageHandler: Send + Sync {
    /// Runs the stage with its parameter bag.
    fn handle(
        &self,
        kind: StageKind,
        parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome>;
}

/// A handler backed by a closure.
pub struct FnHandler<F>
where
    F: Fn(&Parameters, &CancellationToken) -> anyhow::Result<HandlerOutcome> + Send + Sync,
{
    label: String,
    func: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&Parameters, &CancellationToken) -> anyhow::Result<HandlerOutcome> + Send + Sync,
{
    /// Creates a new closure-backed handler.
    pub fn new(label: impl Into<String>, func: F) -> Self {
        Self {
            label: label.into(),
            func,
        }
    }
}

impl<F> fmt::Debug for FnHandler<F>
where
    F: Fn(&Parameters, &CancellationToken) -> anyhow::Result<HandlerOutcome> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("label", &self.label)
            .finish()
    }
}

impl<F> StageHandler for FnHandler<F>
where
    F: Fn(&Parameters, &CancellationToken) -> anyhow::Result<HandlerOutcome> + Send + Sync,
{
    fn handle(
        &self,
        _kind: StageKind,
        parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        (self.func)(parameters, cancel)
    }
}

/// A handler that succeeds and echoes its parameters as the result.
///
/// Used for stages whose concrete behavior is supplied elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughHandler;

impl StageHandler for PassThroughHandler {
    fn handle(
        &self,
        kind: StageKind,
        parameters: &Parameters,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        Ok(HandlerOutcome::ok(parameters.to_json()).with_message(format!("{kind} passed through")))
    }
}
