//! Mock stage handlers for testing.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

use crate::cancellation::CancellationToken;
use crate::core::{Parameters, StageKind};
use crate::stages::{HandlerOutcome, StageHandler};

/// A handler that records calls and returns a configurable outcome.
#[derive(Debug)]
pub struct MockHandler {
    outcome: Mutex<HandlerOutcome>,
    calls: Mutex<Vec<Parameters>>,
}

impl MockHandler {
    /// Creates a mock handler with a success outcome.
    #[must_use]
    pub fn new() -> Self {
        Self::with_outcome(HandlerOutcome::ok_empty())
    }

    /// Creates a mock handler returning `outcome`.
    #[must_use]
    pub fn with_outcome(outcome: HandlerOutcome) -> Self {
        Self {
            outcome: Mutex::new(outcome),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Sets the outcome to return.
    pub fn set_outcome(&self, outcome: HandlerOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Returns the number of times the handler was called.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the parameters received by each call.
    #[must_use]
    pub fn recorded_parameters(&self) -> Vec<Parameters> {
        self.calls.lock().clone()
    }

    /// Resets call tracking.
    pub fn reset(&self) {
        self.calls.lock().clear();
    }
}

impl Default for MockHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl StageHandler for MockHandler {
    fn handle(
        &self,
        _kind: StageKind,
        parameters: &Parameters,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        self.calls.lock().push(parameters.clone());
        Ok(self.outcome.lock().clone())
    }
}

/// A handler that always fails.
#[derive(Debug)]
pub struct FailingHandler {
    message: String,
    as_error: bool,
}

impl FailingHandler {
    /// Creates a handler that returns a failed outcome.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            as_error: false,
        }
    }

    /// Creates a handler that returns `Err` instead of a failed outcome.
    #[must_use]
    pub fn erroring(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            as_error: true,
        }
    }
}

impl StageHandler for FailingHandler {
    fn handle(
        &self,
        _kind: StageKind,
        _parameters: &Parameters,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        if self.as_error {
            anyhow::bail!("{}", self.message);
        }
        Ok(HandlerOutcome::fail(self.message.clone()))
    }
}

/// A handler that panics.
#[derive(Debug)]
pub struct PanickingHandler {
    message: String,
}

impl PanickingHandler {
    /// Creates a handler that panics with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl StageHandler for PanickingHandler {
    fn handle(
        &self,
        _kind: StageKind,
        _parameters: &Parameters,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        panic!("{}", self.message);
    }
}

/// A handler that takes time and gives up when cancelled.
#[derive(Debug)]
pub struct SlowHandler {
    delay: Duration,
}

impl SlowHandler {
    /// Creates a handler that works for `delay`.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates a slow handler with delay in milliseconds.
    #[must_use]
    pub const fn with_delay_ms(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }
}

impl StageHandler for SlowHandler {
    fn handle(
        &self,
        kind: StageKind,
        _parameters: &Parameters,
        cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        let deadline = Instant::now() + self.delay;
        while Instant::now() < deadline {
            if let Some(message) = cancel.stop_message() {
                return Ok(HandlerOutcome::fail(message));
            }
            std::thread::sleep(Duration::from_millis(2));
        }
        Ok(HandlerOutcome::ok_empty().with_message(format!("{kind} finished")))
    }
}

/// A recorded handler invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Stage the handler ran for.
    pub kind: StageKind,
    /// Parameters it received.
    pub parameters: Parameters,
}

/// A handler that records every invocation and succeeds.
///
/// One instance can be wired to all five stages to observe the order.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    calls: Mutex<Vec<RecordedCall>>,
}

impl RecordingHandler {
    /// Creates a new recording handler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded calls.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns the stage kinds in call order.
    #[must_use]
    pub fn kinds(&self) -> Vec<StageKind> {
        self.calls.lock().iter().map(|c| c.kind).collect()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Clears recorded calls.
    pub fn clear(&self) {
        self.calls.lock().clear();
    }
}

impl StageHandler for RecordingHandler {
    fn handle(
        &self,
        kind: StageKind,
        parameters: &Parameters,
        _cancel: &CancellationToken,
    ) -> anyhow::Result<HandlerOutcome> {
        self.calls.lock().push(RecordedCall {
            kind,
            parameters: parameters.clone(),
        });
        Ok(HandlerOutcome::ok(parameters.to_json()))
    }
}
