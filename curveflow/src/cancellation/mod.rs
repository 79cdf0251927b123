//! Cooperative cancellation for long-running stage handlers.

mod token;

pub use token::CancellationToken;
