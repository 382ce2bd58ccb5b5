//! Deferred cancellation for a send

use std::time::Duration;
use tokio::time::Instant;

/// Fires once `seconds` pass without a completed attempt
///
/// Armed when the send starts and re-armed every time an attempt returns. A
/// timeout too large to represent as an instant never fires.
#[derive(Debug, Clone, Copy)]
pub(super) struct Deadline {
    seconds: u64,
    at: Option<Instant>,
}

impl Deadline {
    pub(super) fn start(seconds: u64) -> Self {
        let mut deadline = Self { seconds, at: None };
        deadline.rearm();
        deadline
    }

    pub(super) fn rearm(&mut self) {
        self.at = Instant::now().checked_add(Duration::from_secs(self.seconds));
    }

    pub(super) fn seconds(&self) -> u64 {
        self.seconds
    }

    /// Resolves when the deadline passes; pending forever when unbounded
    pub(super) async fn expired(&self) {
        match self.at {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    }
}
