//! Logging setup.
//!
//! Everything in the crate logs through `tracing`. A binary embedding the
//! workflow calls [`init_tracing`] once at startup with the `logging`
//! section of its [`AppConfig`](crate::config::AppConfig).

use anyhow::Context;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// Builds the log filter. `RUST_LOG`, when set and valid, wins over the
/// configured level.
pub fn env_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    let from_env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    build_filter(from_env.as_deref(), config)
}

fn build_filter(from_env: Option<&str>, config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    if let Some(filter) = from_env.and_then(|directives| EnvFilter::try_new(directives).ok()) {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid log level '{}'", config.level))
}

/// Installs the global `tracing` subscriber.
///
/// Returns an error instead of panicking when the level does not parse or
/// a subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.json {
        registry
            .with(fmt::layer().json().with_target(true).with_current_span(false))
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_level(true)
                    .with_thread_names(true),
            )
            .try_init()
    };
    installed.context("a tracing subscriber is already installed")
}
