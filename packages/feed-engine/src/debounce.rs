//! Search input debouncing.
//!
//! Each keystroke restarts a fixed delay. Only the text present when the delay
//! finally elapses is committed, through an unbounded channel the feed
//! controller drains.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Default delay between the last keystroke and the committed query.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// Collapses rapid text changes into a single delayed commit.
///
/// Must be driven from within a tokio runtime. Dropping the debouncer cancels
/// any pending commit.
pub struct SearchDebouncer {
    delay: Duration,
    commits: mpsc::UnboundedSender<String>,
    pending: Option<JoinHandle<()>>,
}

impl SearchDebouncer {
    /// Create a debouncer and the receiver its commits are delivered on.
    pub fn new(delay: Duration) -> (Self, mpsc::UnboundedReceiver<String>) {
        let (commits, receiver) = mpsc::unbounded_channel();
        (
            Self {
                delay,
                commits,
                pending: None,
            },
            receiver,
        )
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a new input value, restarting the delay.
    pub fn on_input(&mut self, text: impl Into<String>) {
        self.cancel();

        let text = text.into();
        let delay = self.delay;
        let commits = self.commits.clone();

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            debug!(search = %text, "Search input settled");
            // Receiver gone means the feed was torn down
            let _ = commits.send(text);
        }));
    }

    /// Drop the pending commit, if any.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
    }

    /// Whether a commit is still waiting for its delay to elapse.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.is_finished())
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::sleep;

    #[tokio::test(start_paused = true)]
    async fn test_rapid_keystrokes_commit_once_with_final_value() {
        let (mut debouncer, mut commits) = SearchDebouncer::new(DEFAULT_SEARCH_DEBOUNCE);

        for text in ["r", "ru", "rus", "rust", "rusty"] {
            debouncer.on_input(text);
            sleep(Duration::from_millis(50)).await;
        }
        assert!(commits.try_recv().is_err(), "nothing may commit mid-typing");

        sleep(Duration::from_millis(400)).await;

        assert_eq!(commits.try_recv().unwrap(), "rusty");
        assert!(commits.try_recv().is_err(), "exactly one commit expected");
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_commit_separately() {
        let (mut debouncer, mut commits) = SearchDebouncer::new(Duration::from_millis(300));

        debouncer.on_input("alpha");
        sleep(Duration::from_millis(350)).await;
        debouncer.on_input("beta");
        sleep(Duration::from_millis(350)).await;

        assert_eq!(commits.try_recv().unwrap(), "alpha");
        assert_eq!(commits.try_recv().unwrap(), "beta");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_drops_pending_commit() {
        let (mut debouncer, mut commits) = SearchDebouncer::new(Duration::from_millis(300));

        debouncer.on_input("draft");
        assert!(debouncer.is_pending());
        debouncer.cancel();

        sleep(Duration::from_millis(500)).await;
        assert!(commits.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_commit() {
        let (mut debouncer, mut commits) = SearchDebouncer::new(Duration::from_millis(300));
        debouncer.on_input("draft");
        drop(debouncer);

        sleep(Duration::from_millis(500)).await;
        // Sender dropped with the debouncer, and the commit never happened
        assert!(matches!(
            commits.try_recv(),
            Err(mpsc::error::TryRecvError::Disconnected)
        ));
    }
}
