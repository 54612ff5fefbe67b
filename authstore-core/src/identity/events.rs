//! Session change notification
//!
//! Two channels are offered. A `watch` channel always holds the latest
//! [`SessionState`] and is what UI code should gate on (auth redirects must
//! wait for `restored`). A `broadcast` channel carries discrete
//! [`SessionEvent`]s for code that cares about transitions rather than the
//! current value.

use tokio::sync::broadcast;

use super::{Account, AccountId};

/// Current authentication state as seen by readers
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Restoration from the substrate has finished
    pub restored: bool,
    /// Authenticated account, if any
    pub account: Option<Account>,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        self.account.is_some()
    }
}

/// A completed session transition
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Startup restoration finished; `None` when no session was restored
    Restored(Option<AccountId>),
    SignedUp(Account),
    LoggedIn(Account),
    LoggedOut,
    ProfileUpdated(Account),
}

/// Event broadcaster for session transitions
#[derive(Clone)]
pub struct SessionEvents {
    tx: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    /// Create a new broadcaster buffering up to `capacity` events per
    /// subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Emit an event, returning how many subscribers received it
    pub fn emit(&self, event: SessionEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_without_subscribers() {
        let events = SessionEvents::new(4);
        assert_eq!(events.subscriber_count(), 0);
        assert_eq!(events.emit(SessionEvent::LoggedOut), 0);
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let events = SessionEvents::new(4);
        let mut rx1 = events.subscribe();
        let mut rx2 = events.subscribe();

        assert_eq!(events.emit(SessionEvent::Restored(None)), 2);

        assert_eq!(rx1.recv().await.unwrap(), SessionEvent::Restored(None));
        assert_eq!(rx2.recv().await.unwrap(), SessionEvent::Restored(None));
    }

    #[test]
    fn test_default_state() {
        let state = SessionState::default();
        assert!(!state.restored);
        assert!(!state.is_authenticated());
    }
}
