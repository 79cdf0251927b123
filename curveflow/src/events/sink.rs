//! Event sinks for workflow lifecycle events.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, info, warn, Level};

/// Receives workflow lifecycle events.
///
/// The sink is handed to the sequencer by whoever constructs it; there is
/// no process-wide default.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Delivers an event, possibly waiting on the receiver.
    async fn emit(&self, event_type: &str, data: Option<Value>);

    /// Delivers an event from synchronous code. Must never block or panic.
    fn try_emit(&self, event_type: &str, data: Option<Value>);
}

/// Drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

#[async_trait]
impl EventSink for NoOpEventSink {
    async fn emit(&self, _event_type: &str, _data: Option<Value>) {}

    fn try_emit(&self, _event_type: &str, _data: Option<Value>) {}
}

/// Turns workflow events into `tracing` records.
///
/// Failure events (`*.failed`) are always logged at `WARN`. Everything else
/// uses the sink's level. The run id, stage name and index are lifted out
/// of the payload into their own fields.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Logs non-failure events at `level`. Only `DEBUG` and `INFO` are
    /// distinguished; anything else logs at `INFO`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// A sink that logs progress at `DEBUG`.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn record(&self, event_type: &str, data: Option<&Value>) {
        let run_id = field(data, "run_id").and_then(Value::as_str).unwrap_or("-");
        let stage = field(data, "stage").and_then(Value::as_str).unwrap_or("-");
        let index = field(data, "index").and_then(Value::as_u64);

        if event_type.ends_with(".failed") {
            let message = field(data, "message").and_then(Value::as_str).unwrap_or_default();
            warn!(event = event_type, run_id, stage, index, failure = message, "Workflow event");
        } else if self.level == Level::DEBUG {
            debug!(event = event_type, run_id, stage, index, data = ?data, "Workflow event");
        } else {
            info!(event = event_type, run_id, stage, index, "Workflow event");
        }
    }
}

fn field<'a>(data: Option<&'a Value>, name: &str) -> Option<&'a Value> {
    data.and_then(|d| d.get(name))
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data.as_ref());
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.record(event_type, data.as_ref());
    }
}

/// Keeps every event in memory, in arrival order.
///
/// Used by tests and by front ends that replay a run's history.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: RwLock<Vec<(String, Option<Value>)>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Event types in arrival order.
    #[must_use]
    pub fn event_types(&self) -> Vec<String> {
        self.events.read().iter().map(|(t, _)| t.clone()).collect()
    }

    /// Events whose type starts with `type_prefix`, e.g. `"stage."`.
    #[must_use]
    pub fn events_of_type(&self, type_prefix: &str) -> Vec<(String, Option<Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(t, _)| t.starts_with(type_prefix))
            .cloned()
            .collect()
    }

    /// Events carrying `run_id`, in arrival order.
    #[must_use]
    pub fn events_for_run(&self, run_id: &str) -> Vec<(String, Option<Value>)> {
        self.events
            .read()
            .iter()
            .filter(|(_, d)| {
                d.as_ref()
                    .and_then(|d| d.get("run_id"))
                    .and_then(Value::as_str)
                    == Some(run_id)
            })
            .cloned()
            .collect()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event_type: &str, data: Option<Value>) {
        self.try_emit(event_type, data);
    }

    fn try_emit(&self, event_type: &str, data: Option<Value>) {
        self.events.write().push((event_type.to_string(), data));
    }
}
