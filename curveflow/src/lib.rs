//! # Curveflow
//!
//! Orchestration for a five-stage curve offset workflow: load an input
//! curve, optimize it, generate offset curves, validate the result and
//! export it.
//!
//! The geometry itself lives in external plugins. Curveflow provides:
//!
//! - **A linear sequencer**: a strict `idle → running → completed/failed`
//!   state machine over the five fixed stages
//! - **Pluggable handlers**: one [`StageHandler`](stages::StageHandler) per
//!   stage kind, checked exhaustively at compile time
//! - **Worker execution**: handlers run off the async runtime and report
//!   back by message, so only one task ever mutates the sequencer
//! - **Parameter suggestions**: heuristics over a curve's points that
//!   pre-fill the optimize and offset stages
//! - **Configuration and events**: a JSON settings file and an injected
//!   event sink instead of process-wide state
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use curveflow::prelude::*;
//! use std::sync::Arc;
//!
//! let mut sequencer = Sequencer::new(StageHandlers::simulated(), Arc::new(NoOpEventSink));
//! sequencer.update_parameters(
//!     StageKind::Load,
//!     &Parameters::new().with("file_path", "outline.svg"),
//! )?;
//!
//! let status = sequencer.run_to_completion()?;
//! assert_eq!(status, WorkflowStatus::Completed);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_precision_loss
)]

pub mod analysis;
pub mod cancellation;
pub mod config;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod stages;
pub mod testing;
pub mod workflow;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analysis::{CurveAnalysis, ParameterSuggestions, Point};
    pub use crate::cancellation::CancellationToken;
    pub use crate::config::{AppConfig, ConfigFile};
    pub use crate::core::{Parameters, Stage, StageKind, StageStatus, WorkflowStatus};
    pub use crate::errors::{
        ConfigError, CurveflowError, ParameterError, ProtocolError, StageExecutionError,
    };
    pub use crate::events::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
    pub use crate::observability::init_tracing;
    pub use crate::stages::{FnHandler, HandlerOutcome, PassThroughHandler, StageHandler, StageHandlers};
    pub use crate::workflow::{
        CancelHandle, Sequencer, StageCompletion, StageJob, WorkflowDriver, WorkflowSnapshot,
    };
}
