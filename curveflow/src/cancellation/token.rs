//! Cancellation token shared between the driver and running handlers.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// A flag that stage handlers poll to stop early.
///
/// The sequencer never interrupts a handler. A handler that sees the token
/// tripped should return a failed outcome carrying
/// [`CancellationToken::stop_message`], which the sequencer records like
/// any other failure. Only the first reason of a run is kept; the sequencer
/// resets the token whenever a run starts.
#[derive(Debug, Default)]
pub struct CancellationToken {
    cancelled: AtomicBool,
    reason: RwLock<Option<String>>,
}

impl CancellationToken {
    /// Creates an untripped token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Trips the token.
    ///
    /// Returns `true` if this call tripped it and `false` if it was already
    /// tripped, in which case the original reason is kept.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        let mut slot = self.reason.write();
        if self.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        let reason = reason.into();
        debug!(reason = %reason, "Cancellation token tripped");
        *slot = Some(reason);
        true
    }

    /// Whether the token has been tripped in this run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// The reason given when the token was tripped.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        self.reason.read().clone()
    }

    /// The failure message a handler reports once the token is tripped.
    #[must_use]
    pub fn stop_message(&self) -> Option<String> {
        self.is_cancelled()
            .then(|| format!("cancelled: {}", self.reason().unwrap_or_default()))
    }

    /// Clears the token for a new run.
    pub fn reset(&self) {
        let mut slot = self.reason.write();
        self.cancelled.store(false, Ordering::SeqCst);
        *slot = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_fresh_token() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());
        assert!(token.stop_message().is_none());
    }

    #[test]
    fn test_first_reason_wins() {
        let token = CancellationToken::new();
        assert!(token.cancel("user pressed stop"));
        assert!(!token.cancel("window closed"));

        assert!(token.is_cancelled());
        assert_eq!(token.reason().as_deref(), Some("user pressed stop"));
        assert_eq!(
            token.stop_message().as_deref(),
            Some("cancelled: user pressed stop")
        );
    }

    #[test]
    fn test_reset_allows_new_reason() {
        let token = CancellationToken::new();
        token.cancel("first run");
        token.reset();
        assert!(!token.is_cancelled());
        assert!(token.reason().is_none());

        assert!(token.cancel("second run"));
        assert_eq!(token.reason().as_deref(), Some("second run"));
    }

    #[test]
    fn test_only_one_thread_trips() {
        let token = Arc::new(CancellationToken::new());
        let trips: usize = (0..8)
            .map(|i| {
                let token = Arc::clone(&token);
                std::thread::spawn(move || token.cancel(format!("thread {i}")))
            })
            .collect::<Vec<_>>()
            .into_iter()
            .map(|h| usize::from(h.join().unwrap()))
            .sum();

        assert_eq!(trips, 1);
        assert!(token.reason().is_some_and(|r| r.starts_with("thread ")));
    }
}
